//! AnalysisStage trait - Orchestrator input interface
//!
//! Defines the abstract interface for pluggable analysis stages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContractError, InputResource, JobMetadata};

/// Result namespace a stage writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Creative,
    Resonance,
    Industry,
    Audience,
    Platform,
    Market,
    Culture,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Creative => "creative",
            Category::Resonance => "resonance",
            Category::Industry => "industry",
            Category::Audience => "audience",
            Category::Platform => "platform",
            Category::Market => "market",
            Category::Culture => "culture",
        }
    }

    /// All categories, in the canonical report order.
    pub fn all() -> [Category; 7] {
        [
            Category::Creative,
            Category::Resonance,
            Category::Industry,
            Category::Audience,
            Category::Platform,
            Category::Market,
            Category::Culture,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat key/value payload produced by one stage.
pub type StagePayload = Map<String, Value>;

/// What a single stage invocation produced.
///
/// `Success` and `Failed` are mutually exclusive; `Skipped` marks a stage
/// whose required metadata was absent, which is distinct from a stage that
/// ran and failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    Success(StagePayload),
    Failed(String),
    Skipped,
}

/// Recorded outcome of one stage invocation.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Stage name (used for logging/metrics and error trace keys)
    pub stage: String,

    /// Category the payload merges into
    pub category: Category,

    pub status: StageStatus,
}

impl StageOutcome {
    pub fn success(stage: impl Into<String>, category: Category, payload: StagePayload) -> Self {
        Self {
            stage: stage.into(),
            category,
            status: StageStatus::Success(payload),
        }
    }

    pub fn failed(stage: impl Into<String>, category: Category, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            category,
            status: StageStatus::Failed(message.into()),
        }
    }

    pub fn skipped(stage: impl Into<String>, category: Category) -> Self {
        Self {
            stage: stage.into(),
            category,
            status: StageStatus::Skipped,
        }
    }
}

/// Pluggable, independently-invocable analysis unit.
///
/// Implementations must be free of side effects on shared metadata and must
/// not depend on execution order relative to other independent stages; the
/// orchestrator may run them concurrently.
#[async_trait]
pub trait AnalysisStage: Send + Sync {
    /// Stage name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Category this stage's payload merges into
    fn category(&self) -> Category;

    /// Whether the metadata this stage requires is present.
    ///
    /// Returning `false` skips the stage: no category entry, no error.
    fn ready(&self, _metadata: &JobMetadata) -> bool {
        true
    }

    /// Run the analysis against the saved input resource.
    ///
    /// # Errors
    /// An error here is absorbed by the orchestrator into a failed
    /// `StageOutcome`; it never aborts the job or any other stage.
    async fn run(
        &self,
        input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError>;
}
