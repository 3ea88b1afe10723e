//! EngineBlueprint - Config Loader output
//!
//! Describes the complete engine configuration: worker pool, temp storage,
//! durable store, graph mirror, listening model, stage toggles.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete engine configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EngineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Worker pool and ingress settings
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Durable record store settings
    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Graph mirror settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Listening model settings
    #[serde(default)]
    #[validate(nested)]
    pub listening: ListeningConfig,

    /// Per-stage enable flags
    #[serde(default)]
    pub stages: StageToggles,
}

/// Worker pool and ingress settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Number of concurrent job executors
    #[serde(default = "default_worker_count")]
    #[validate(range(min = 1, max = 64))]
    pub worker_count: usize,

    /// Directory receiving uploaded temp resources
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_worker_count() -> usize {
    2
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp_uploads")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            temp_dir: default_temp_dir(),
        }
    }
}

/// Durable record store settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    /// SQLite database file path
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Default number of rows returned by the history view
    #[serde(default = "default_history_limit")]
    #[validate(range(min = 1, max = 500))]
    pub history_limit: usize,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("totality.db")
}

fn default_history_limit() -> usize {
    20
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            history_limit: default_history_limit(),
        }
    }
}

/// Graph mirror settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Mirror derived facts into the graph store after each job
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Listening model settings
///
/// The model is an expensive, read-only resource initialized once at startup
/// and shared across all workers; these parameters are fixed for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListeningConfig {
    /// Embedding dimensionality
    #[serde(default = "default_embedding_dim")]
    #[validate(range(min = 8, max = 4096))]
    pub embedding_dim: usize,

    /// Embedding-norm value mapping to neutral audio valence
    #[serde(default = "default_norm_center")]
    pub norm_center: f64,

    /// Spread of the valence squashing function
    #[serde(default = "default_norm_scale")]
    #[validate(range(min = 0.001))]
    pub norm_scale: f64,

    /// Seed for the fixed projection matrix
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_embedding_dim() -> usize {
    768
}

fn default_norm_center() -> f64 {
    25.0
}

fn default_norm_scale() -> f64 {
    5.0
}

fn default_seed() -> u64 {
    0x5eed_ba5e
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            norm_center: default_norm_center(),
            norm_scale: default_norm_scale(),
            seed: default_seed(),
        }
    }
}

/// Per-stage enable flags
///
/// Disabling a stage removes it from the registry entirely; its category is
/// absent from results, same as a metadata-gated skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageToggles {
    #[serde(default = "default_true")]
    pub signal_features: bool,

    #[serde(default = "default_true")]
    pub harmonic_profile: bool,

    #[serde(default = "default_true")]
    pub listening: bool,

    #[serde(default = "default_true")]
    pub lyric_analysis: bool,

    #[serde(default = "default_true")]
    pub industry: bool,

    #[serde(default = "default_true")]
    pub platform: bool,

    #[serde(default = "default_true")]
    pub market: bool,

    #[serde(default = "default_true")]
    pub culture: bool,

    #[serde(default = "default_true")]
    pub audience: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            signal_features: true,
            harmonic_profile: true,
            listening: true,
            lyric_analysis: true,
            industry: true,
            platform: true,
            market: true,
            culture: true,
            audience: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let bp = EngineBlueprint::default();
        assert_eq!(bp.engine.worker_count, 2);
        assert_eq!(bp.listening.embedding_dim, 768);
        assert_eq!(bp.listening.norm_center, 25.0);
        assert_eq!(bp.storage.history_limit, 20);
        assert!(bp.graph.enabled);
        assert!(bp.stages.lyric_analysis);
    }

    #[test]
    fn test_validate_worker_bounds() {
        let mut bp = EngineBlueprint::default();
        bp.engine.worker_count = 0;
        assert!(bp.validate().is_err());

        bp.engine.worker_count = 8;
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_section_defaults() {
        let bp: EngineBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(bp.engine.temp_dir, PathBuf::from("temp_uploads"));
        assert_eq!(bp.listening.norm_scale, 5.0);
    }
}
