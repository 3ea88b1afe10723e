//! Listening stage - fixed-projection audio embeddings
//!
//! The projection matrix is the expensive, read-only resource of the
//! pipeline: built once at startup from a fixed seed, shared across all
//! workers via `Arc`, never mutated per job.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{info, instrument};

use contracts::{
    AnalysisStage, Category, ContractError, InputResource, JobMetadata, ListeningConfig,
    StagePayload,
};

use crate::{dsp, wave};

/// Number of log-spaced frequency bands feeding the projection
const MEL_BANDS: usize = 64;

/// Seconds of audio consumed per embedding
const EMBED_WINDOW_SECS: f64 = 10.0;

/// Read-only embedding model shared across workers.
pub struct ListeningModel {
    /// Row-major `MEL_BANDS x embedding_dim` projection
    projection: Vec<f32>,
    embedding_dim: usize,
    name: String,
}

impl ListeningModel {
    /// Build the projection matrix from the blueprint seed.
    ///
    /// Deterministic: the same seed always yields the same embeddings.
    pub fn load(config: &ListeningConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let scale = 1.0 / (MEL_BANDS as f32).sqrt();
        let projection = (0..MEL_BANDS * config.embedding_dim)
            .map(|_| rng.random_range(-1.0f32..1.0) * scale)
            .collect();

        let name = format!("bandproj-{MEL_BANDS}x{}-v1", config.embedding_dim);
        info!(model = %name, seed = config.seed, "listening model initialized");

        Self {
            projection,
            embedding_dim: config.embedding_dim,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Embed a clip: log-compressed band energies through the projection.
    pub fn embed(&self, clip: &wave::AudioClip) -> Vec<f32> {
        let spectra = dsp::magnitude_spectra(clip);
        let bands = dsp::band_energies(&spectra, clip.sample_rate, MEL_BANDS);
        let compressed: Vec<f32> = bands.iter().map(|e| (1.0 + e).ln() as f32).collect();

        let mut embedding = vec![0.0f32; self.embedding_dim];
        for (band, energy) in compressed.iter().enumerate() {
            if *energy == 0.0 {
                continue;
            }
            let row = &self.projection[band * self.embedding_dim..(band + 1) * self.embedding_dim];
            for (slot, weight) in embedding.iter_mut().zip(row) {
                *slot += energy * weight;
            }
        }
        embedding
    }
}

impl std::fmt::Debug for ListeningModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListeningModel")
            .field("name", &self.name)
            .field("embedding_dim", &self.embedding_dim)
            .finish()
    }
}

/// Stage producing the `embedding` key consumed by the resonance evaluation.
pub struct ListeningStage {
    model: Arc<ListeningModel>,
}

impl ListeningStage {
    pub fn new(model: Arc<ListeningModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl AnalysisStage for ListeningStage {
    fn name(&self) -> &str {
        "listening"
    }

    fn category(&self) -> Category {
        Category::Creative
    }

    #[instrument(name = "listening_run", skip(self, input, _metadata), fields(file = %input.filename))]
    async fn run(
        &self,
        input: &InputResource,
        _metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let clip = wave::decode_wav(self.name(), &input.path, Some(EMBED_WINDOW_SECS))?;
        let embedding = self.model.embed(&clip);

        let mut payload = StagePayload::new();
        payload.insert("embedding".into(), json!(embedding));
        payload.insert("dimensions".into(), json!(embedding.len()));
        payload.insert("model".into(), json!(self.model.name()));
        Ok(payload)
    }
}
