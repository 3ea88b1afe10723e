//! Orchestrator - runs the stage set for one job and merges outcomes

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{
    AnalysisResult, AnalysisStage, Category, ContractError, JobPipeline, JobRecord, StageOutcome,
    StagePayload, StageStatus,
};
use observability::{record_stage_duration_ms, record_stage_outcome};
use stages::ResonanceEvaluator;

/// Executes the ordered/concurrent stage set for one job.
///
/// Every stage invocation is individually isolated: an `Err` or a panic
/// inside one stage becomes a failed outcome for its category and never
/// aborts the job or any other stage. The dependent resonance evaluation
/// runs strictly after the independent stages have merged.
pub struct Orchestrator {
    stages: Vec<Arc<dyn AnalysisStage>>,
    resonance: ResonanceEvaluator,
}

/// A stage either spawned into its own task or settled without running.
enum Pending {
    Spawned {
        stage: String,
        category: Category,
        started: Instant,
        handle: JoinHandle<Result<StagePayload, ContractError>>,
    },
    Settled(StageOutcome),
}

impl Orchestrator {
    pub fn new(stages: Vec<Arc<dyn AnalysisStage>>, resonance: ResonanceEvaluator) -> Self {
        Self { stages, resonance }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Spawn every ready stage, then collect outcomes in registry order.
    async fn run_stages(&self, record: &JobRecord) -> Vec<StageOutcome> {
        let mut pending = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if !stage.ready(&record.metadata) {
                debug!(job_id = %record.id, stage = stage.name(), "stage skipped, metadata absent");
                pending.push(Pending::Settled(StageOutcome::skipped(
                    stage.name(),
                    stage.category(),
                )));
                continue;
            }

            let stage = Arc::clone(stage);
            let input = record.input.clone();
            let metadata = record.metadata.clone();
            let name = stage.name().to_string();
            let category = stage.category();
            let handle = tokio::spawn(async move { stage.run(&input, &metadata).await });

            pending.push(Pending::Spawned {
                stage: name,
                category,
                started: Instant::now(),
                handle,
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for entry in pending {
            let outcome = match entry {
                Pending::Settled(outcome) => outcome,
                Pending::Spawned {
                    stage,
                    category,
                    started,
                    handle,
                } => {
                    let outcome = match handle.await {
                        Ok(Ok(payload)) => StageOutcome::success(&stage, category, payload),
                        Ok(Err(e)) => {
                            warn!(job_id = %record.id, stage = %stage, error = %e, "stage failed");
                            StageOutcome::failed(&stage, category, e.to_string())
                        }
                        Err(join_err) => {
                            warn!(job_id = %record.id, stage = %stage, error = %join_err, "stage task aborted");
                            let message = if join_err.is_panic() {
                                "stage panicked".to_string()
                            } else {
                                join_err.to_string()
                            };
                            StageOutcome::failed(&stage, category, message)
                        }
                    };
                    record_stage_duration_ms(&stage, started.elapsed().as_secs_f64() * 1000.0);
                    outcome
                }
            };

            let status = match &outcome.status {
                StageStatus::Success(_) => "success",
                StageStatus::Failed(_) => "failed",
                StageStatus::Skipped => "skipped",
            };
            record_stage_outcome(&outcome.stage, status);
            outcomes.push(outcome);
        }

        outcomes
    }
}

impl JobPipeline for Orchestrator {
    #[instrument(name = "orchestrator_run", skip(self, record), fields(job_id = %record.id))]
    async fn run(&self, record: &JobRecord) -> Result<AnalysisResult, ContractError> {
        let outcomes = self.run_stages(record).await;

        let failed = outcomes
            .iter()
            .filter(|o| matches!(o.status, StageStatus::Failed(_)))
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Skipped)
            .count();

        let mut result = AnalysisResult::from_outcomes(outcomes);

        // Dependent stage: resonance only sees a creative payload whose
        // prerequisite stages produced non-error outcomes.
        let creative = result.payload(Category::Creative).cloned();
        result.set_category(Category::Resonance, self.resonance.evaluate(creative.as_ref()));

        info!(
            job_id = %record.id,
            stages = self.stages.len(),
            failed,
            skipped,
            categories = result.categories.len(),
            "pipeline run complete"
        );
        Ok(result)
    }
}
