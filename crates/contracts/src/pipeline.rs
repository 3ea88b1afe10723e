//! JobPipeline trait - Worker Pool input interface

use crate::{AnalysisResult, ContractError, JobRecord};

/// Per-job analysis pipeline invoked by a worker.
///
/// An `Err` here is an orchestrator-level infrastructure failure and flips
/// the job to Failed; ordinary stage failures are absorbed into the result.
#[trait_variant::make(JobPipeline: Send)]
pub trait LocalJobPipeline {
    async fn run(&self, record: &JobRecord) -> Result<AnalysisResult, ContractError>;
}
