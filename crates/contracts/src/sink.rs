//! ResultSink trait - Worker Pool output interface
//!
//! Defines the abstract interface for result persistence.

use crate::{AnalysisResult, ContractError, InputResource, JobRecord};

/// Result persistence trait
///
/// Invoked by a worker after the orchestrator returns. `persist` runs only
/// for completed analyses; `cleanup` runs exactly once per job regardless of
/// the analysis outcome.
#[trait_variant::make(ResultSink: Send)]
pub trait LocalResultSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write the durable record projection and mirror derived facts.
    ///
    /// # Errors
    /// Returns persistence error (should include context). Callers log the
    /// error without escalating it to job failure.
    async fn persist(
        &mut self,
        record: &JobRecord,
        result: &AnalysisResult,
    ) -> Result<(), ContractError>;

    /// Remove the temporary input resource.
    ///
    /// # Errors
    /// Returns cleanup error; callers log without escalating.
    async fn cleanup(&mut self, input: &InputResource) -> Result<(), ContractError>;
}
