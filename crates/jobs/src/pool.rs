//! WorkerPool - bounded set of concurrent job executors
//!
//! N workers pull queued jobs in FIFO submission order and drive each one
//! to a terminal state. A job occupies exactly one executor for its full
//! lifetime; there is no abort path.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{InputResource, JobId, JobPipeline, JobStatus, ResultSink};
use observability::{record_job_completed, record_persist_failure, record_queue_depth};

use crate::metrics::WorkerMetrics;
use crate::store::JobStore;

/// Handle to a running pool worker
pub struct WorkerHandle {
    /// Worker index within the pool
    worker_id: usize,
    /// Shared metrics
    metrics: Arc<WorkerMetrics>,
    /// Worker task handle
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn metrics(&self) -> &Arc<WorkerMetrics> {
        &self.metrics
    }
}

/// Fixed-size pool of job executors.
pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Spawn `workers` executors over the shared FIFO queue.
    ///
    /// Every worker shares the pipeline (read-only, `Arc`) and owns its own
    /// sink built by `make_sink`. Workers exit when the queue's senders are
    /// dropped and the backlog is drained.
    pub fn spawn<P, S, F>(
        workers: usize,
        queue: async_channel::Receiver<JobId>,
        store: Arc<JobStore>,
        pipeline: Arc<P>,
        make_sink: F,
    ) -> Self
    where
        P: JobPipeline + Send + Sync + 'static,
        S: ResultSink + Send + 'static,
        F: Fn(usize) -> S,
    {
        let handles = (0..workers)
            .map(|worker_id| {
                let queue = queue.clone();
                let store = Arc::clone(&store);
                let pipeline = Arc::clone(&pipeline);
                let sink = make_sink(worker_id);
                let metrics = Arc::new(WorkerMetrics::new());
                let worker_metrics = Arc::clone(&metrics);

                let join = tokio::spawn(async move {
                    worker_loop(worker_id, queue, store, pipeline, sink, worker_metrics).await;
                });

                WorkerHandle {
                    worker_id,
                    metrics,
                    join,
                }
            })
            .collect();

        info!(workers, "worker pool started");
        Self { handles }
    }

    /// Per-worker metric snapshots.
    pub fn metrics(&self) -> Vec<(usize, crate::metrics::WorkerMetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.worker_id, h.metrics.snapshot()))
            .collect()
    }

    /// Wait for all workers to drain and exit.
    ///
    /// Callers must drop every queue sender first or this never returns.
    #[instrument(name = "worker_pool_shutdown", skip(self))]
    pub async fn shutdown(self) {
        for handle in self.handles {
            if let Err(e) = handle.join.await {
                error!(worker = handle.worker_id, error = ?e, "worker task panicked");
            }
        }
        info!("worker pool shutdown complete");
    }
}

/// Executor loop: pull, process, repeat until the queue closes.
#[instrument(name = "worker_loop", skip(queue, store, pipeline, sink, metrics))]
async fn worker_loop<P, S>(
    worker_id: usize,
    queue: async_channel::Receiver<JobId>,
    store: Arc<JobStore>,
    pipeline: Arc<P>,
    mut sink: S,
    metrics: Arc<WorkerMetrics>,
) where
    P: JobPipeline + Send + Sync,
    S: ResultSink,
{
    debug!(worker = worker_id, "worker started");

    while let Ok(job_id) = queue.recv().await {
        record_queue_depth(queue.len());
        process_job(worker_id, &job_id, &store, pipeline.as_ref(), &mut sink, &metrics).await;
    }

    debug!(worker = worker_id, "worker stopped");
}

/// Drive one job from Queued to a terminal state.
///
/// Stage failures are already absorbed by the pipeline; only an
/// orchestrator-level error flips the job to Failed. Persistence and
/// cleanup failures are logged and never change the analysis outcome.
/// The temp resource is removed exactly once on every path.
async fn process_job<P, S>(
    worker_id: usize,
    job_id: &JobId,
    store: &JobStore,
    pipeline: &P,
    sink: &mut S,
    metrics: &WorkerMetrics,
) where
    P: JobPipeline + Send + Sync,
    S: ResultSink,
{
    if let Err(e) = store.transition(job_id, JobStatus::Processing) {
        // Record vanished or was tampered with; nothing to execute
        error!(worker = worker_id, job_id = %job_id, error = %e, "cannot start job");
        return;
    }

    let record = match store.get(job_id) {
        Ok(record) => record,
        Err(e) => {
            error!(worker = worker_id, job_id = %job_id, error = %e, "job record missing");
            return;
        }
    };

    let started = Instant::now();
    let analysis = pipeline.run(&record).await;
    let duration_secs = started.elapsed().as_secs_f64();

    match analysis {
        Ok(result) => {
            if let Err(e) = sink.persist(&record, &result).await {
                // Analysis outcome wins over persistence problems
                metrics.inc_persist_failure_count();
                record_persist_failure(sink.name());
                error!(worker = worker_id, job_id = %job_id, error = %e, "persist failed");
            }
            cleanup_input(worker_id, job_id, &record.input, sink, metrics).await;

            if let Err(e) = store.complete(job_id, result) {
                error!(worker = worker_id, job_id = %job_id, error = %e, "complete transition failed");
            } else {
                metrics.inc_completed_count();
                record_job_completed("completed", duration_secs);
                info!(worker = worker_id, job_id = %job_id, duration_secs, "job completed");
            }
        }
        Err(e) => {
            cleanup_input(worker_id, job_id, &record.input, sink, metrics).await;

            if let Err(te) = store.fail(job_id, e.to_string()) {
                error!(worker = worker_id, job_id = %job_id, error = %te, "fail transition failed");
            } else {
                metrics.inc_failed_count();
                record_job_completed("failed", duration_secs);
                warn!(worker = worker_id, job_id = %job_id, error = %e, "job failed");
            }
        }
    }
}

/// Remove the temp resource; called exactly once per job.
async fn cleanup_input<S: ResultSink>(
    worker_id: usize,
    job_id: &JobId,
    input: &InputResource,
    sink: &mut S,
    metrics: &WorkerMetrics,
) {
    if let Err(e) = sink.cleanup(input).await {
        metrics.inc_cleanup_failure_count();
        error!(worker = worker_id, job_id = %job_id, error = %e, "cleanup failed");
    }
}
