//! Audience stage - hook efficacy of the opening seconds

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

use crate::{dsp, wave};

/// Window analyzed for the hook
const HOOK_WINDOW_SECS: f64 = 5.0;

/// Burstiness above which the hook is predicted to land
const HOOK_THRESHOLD: f64 = 3.0;

/// Spectral burstiness of the first seconds as a hook-efficacy proxy.
#[derive(Debug, Default)]
pub struct AudienceStage;

impl AudienceStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisStage for AudienceStage {
    fn name(&self) -> &str {
        "hook_efficacy"
    }

    fn category(&self) -> Category {
        Category::Audience
    }

    #[instrument(name = "hook_efficacy_run", skip(self, input, _metadata), fields(file = %input.filename))]
    async fn run(
        &self,
        input: &InputResource,
        _metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let clip = wave::decode_wav(self.name(), &input.path, Some(HOOK_WINDOW_SECS))?;
        let envelope = dsp::onset_envelope(&dsp::magnitude_spectra(&clip));

        let max_peak = envelope.iter().copied().fold(0.0f32, f32::max) as f64;
        let avg = dsp::mean(&envelope);
        let burstiness = max_peak / (avg + 1e-6);

        let mut payload = StagePayload::new();
        payload.insert("spectral_burstiness".into(), json!(burstiness));
        payload.insert(
            "hook_efficacy_prediction".into(),
            json!(if burstiness > HOOK_THRESHOLD {
                "High"
            } else {
                "Low"
            }),
        );
        Ok(payload)
    }
}
