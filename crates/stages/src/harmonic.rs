//! Harmonic profile stage - chroma entropy as a predictability proxy

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

use crate::{dsp, wave};

/// Measures harmonic unpredictability from the chroma distribution.
///
/// High per-frame chroma entropy means diffuse harmonic content; the
/// variance of that entropy over time stands in for expectancy violation.
#[derive(Debug, Default)]
pub struct HarmonicStage;

impl HarmonicStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisStage for HarmonicStage {
    fn name(&self) -> &str {
        "harmonic_profile"
    }

    fn category(&self) -> Category {
        Category::Creative
    }

    #[instrument(name = "harmonic_profile_run", skip(self, input, _metadata), fields(file = %input.filename))]
    async fn run(
        &self,
        input: &InputResource,
        _metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let clip = wave::decode_wav(self.name(), &input.path, None)?;
        let spectra = dsp::magnitude_spectra(&clip);

        let entropy_per_frame: Vec<f32> = spectra
            .iter()
            .map(|spectrum| dsp::entropy(&dsp::chroma(spectrum, clip.sample_rate)) as f32)
            .collect();

        let mut payload = StagePayload::new();
        payload.insert(
            "harmonic_entropy".into(),
            json!(dsp::mean(&entropy_per_frame)),
        );
        payload.insert(
            "expectancy_violation_score".into(),
            json!(dsp::variance(&entropy_per_frame)),
        );
        Ok(payload)
    }
}
