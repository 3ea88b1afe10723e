//! Signal features stage - onset strength, flux and rhythm

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

use crate::{dsp, wave};

/// Onset-strength variance below which a mix is flagged as "muddy"
/// (smeared transients).
const MUDDY_FLUX_VARIANCE: f64 = 1.0;

/// Extracts onset strength, spectral flux and rhythm features from the
/// uploaded resource.
#[derive(Debug, Default)]
pub struct SignalFeaturesStage;

impl SignalFeaturesStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisStage for SignalFeaturesStage {
    fn name(&self) -> &str {
        "signal_features"
    }

    fn category(&self) -> Category {
        Category::Creative
    }

    #[instrument(name = "signal_features_run", skip(self, input, _metadata), fields(file = %input.filename))]
    async fn run(
        &self,
        input: &InputResource,
        _metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let clip = wave::decode_wav(self.name(), &input.path, None)?;
        let spectra = dsp::magnitude_spectra(&clip);
        let envelope = dsp::onset_envelope(&spectra);

        let flux_mean = dsp::mean(&envelope);
        let flux_variance = dsp::variance(&envelope);
        let (tempo, beat_strength) = dsp::estimate_tempo(&envelope, clip.sample_rate);

        let mut payload = StagePayload::new();
        payload.insert("spectral_flux_mean".into(), json!(flux_mean));
        payload.insert("spectral_flux_variance".into(), json!(flux_variance));
        payload.insert(
            "is_muddy_mix".into(),
            Value::Bool(flux_variance < MUDDY_FLUX_VARIANCE),
        );
        payload.insert("tempo".into(), json!(tempo));
        payload.insert("beat_strength".into(), json!(beat_strength));
        payload.insert("duration_secs".into(), json!(clip.duration_secs()));
        Ok(payload)
    }
}
