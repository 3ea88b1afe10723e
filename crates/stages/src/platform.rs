//! Platform stage - viral elasticity and per-platform release advice

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

use crate::{dsp, wave};

/// Reference short-video adoption curve (views per period).
const REFERENCE_CLIP_SERIES: [f64; 4] = [100.0, 500.0, 2000.0, 10000.0];

/// Matching streaming adoption curve (streams per period).
const REFERENCE_STREAM_SERIES: [f64; 4] = [50.0, 100.0, 300.0, 1200.0];

/// Seconds of audio used for the tempo check.
const TEMPO_WINDOW_SECS: f64 = 10.0;

/// Platform-fit heuristics driven by clip duration, tempo and the declared
/// release platform.
#[derive(Debug, Default)]
pub struct PlatformStage;

impl PlatformStage {
    pub fn new() -> Self {
        Self
    }

    /// Viral elasticity: mean relative stream growth per unit of mean
    /// relative clip growth.
    fn viral_elasticity(clips: &[f64], streams: &[f64]) -> f64 {
        let mean_pct = |series: &[f64]| {
            let changes: Vec<f64> = series
                .windows(2)
                .filter(|w| w[0] != 0.0)
                .map(|w| (w[1] - w[0]) / w[0])
                .collect();
            if changes.is_empty() {
                0.0
            } else {
                changes.iter().sum::<f64>() / changes.len() as f64
            }
        };

        let clip_change = mean_pct(clips);
        if clip_change == 0.0 {
            return 0.0;
        }
        mean_pct(streams) / clip_change
    }

    fn optimizations(platform: &str, duration_secs: f64, tempo: f64) -> Vec<String> {
        let mut recommendations = Vec::new();
        match platform.to_lowercase().as_str() {
            "spotify" => {
                if duration_secs > 210.0 {
                    recommendations.push(
                        "Consider a 'Radio Edit' under 3:00 to increase replay ratio.".to_string(),
                    );
                }
            }
            "tiktok" => {
                if duration_secs > 60.0 {
                    recommendations.push(
                        "Cut a sub-60s highlight clip around the strongest hook.".to_string(),
                    );
                }
                if tempo > 0.0 && tempo < 110.0 {
                    recommendations.push(
                        "Tempo is low. Release a 'Sped Up' version (+15-20%) for higher energy."
                            .to_string(),
                    );
                }
            }
            _ => {}
        }
        recommendations
    }
}

#[async_trait]
impl AnalysisStage for PlatformStage {
    fn name(&self) -> &str {
        "platform_fit"
    }

    fn category(&self) -> Category {
        Category::Platform
    }

    #[instrument(name = "platform_fit_run", skip(self, input, metadata), fields(platform = %metadata.platform))]
    async fn run(
        &self,
        input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let duration_secs = wave::wav_duration_secs(self.name(), &input.path)?;
        let clip = wave::decode_wav(self.name(), &input.path, Some(TEMPO_WINDOW_SECS))?;
        let envelope = dsp::onset_envelope(&dsp::magnitude_spectra(&clip));
        let (tempo, _) = dsp::estimate_tempo(&envelope, clip.sample_rate);

        let elasticity =
            Self::viral_elasticity(&REFERENCE_CLIP_SERIES, &REFERENCE_STREAM_SERIES);

        let mut payload = StagePayload::new();
        payload.insert("viral_elasticity".into(), json!(elasticity));
        payload.insert(
            "optimizations".into(),
            json!(Self::optimizations(&metadata.platform, duration_secs, tempo)),
        );
        Ok(payload)
    }
}
