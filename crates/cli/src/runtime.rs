//! Engine runtime assembly.
//!
//! All long-lived handles (record store, graph store, listening model, job
//! store) are constructed exactly once here and passed into the components
//! that use them; their lifecycle is owned by the command that built them,
//! not by ambient global state.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use contracts::{EngineBlueprint, GraphQuery};
use jobs::{job_queue, Dispatcher, JobStore, StatusReader, WorkerPool};
use orchestrator::Orchestrator;
use persistence::{AnalysisSink, GraphStore, RecordStore};
use stages::{build_registry, ListeningModel, ResonanceEvaluator};

/// A fully wired engine: dispatcher in, status reader out.
pub struct EngineRuntime {
    pub store: Arc<JobStore>,
    pub records: Arc<RecordStore>,
    pub graph: Arc<GraphStore>,
    pub status: StatusReader,
    dispatcher: Option<Dispatcher>,
    pool: WorkerPool,
}

impl EngineRuntime {
    /// Construct and start the engine from a validated blueprint.
    pub fn start(blueprint: &EngineBlueprint) -> Result<Self> {
        let records = Arc::new(
            RecordStore::open(&blueprint.storage.database_path).with_context(|| {
                format!(
                    "Failed to open record store at {}",
                    blueprint.storage.database_path.display()
                )
            })?,
        );
        let graph = Arc::new(GraphStore::new());
        let model = Arc::new(ListeningModel::load(&blueprint.listening));

        let registry = build_registry(
            blueprint,
            model,
            Arc::clone(&graph) as Arc<dyn GraphQuery>,
        );
        let pipeline = Arc::new(Orchestrator::new(
            registry,
            ResonanceEvaluator::from_config(&blueprint.listening),
        ));

        let store = Arc::new(JobStore::new());
        let (queue_tx, queue_rx) = job_queue();

        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            queue_tx,
            blueprint.engine.temp_dir.clone(),
        )
        .context("Failed to create dispatcher")?;

        let graph_mirror = blueprint.graph.enabled.then(|| Arc::clone(&graph));
        let records_for_sink = Arc::clone(&records);
        let pool = WorkerPool::spawn(
            blueprint.engine.worker_count,
            queue_rx,
            Arc::clone(&store),
            pipeline,
            move |worker_id| {
                AnalysisSink::new(
                    format!("worker-{worker_id}"),
                    Arc::clone(&records_for_sink),
                    graph_mirror.clone(),
                )
            },
        );

        info!(
            workers = blueprint.engine.worker_count,
            graph_mirror = blueprint.graph.enabled,
            "engine runtime started"
        );

        Ok(Self {
            status: StatusReader::new(Arc::clone(&store)),
            store,
            records,
            graph,
            dispatcher: Some(dispatcher),
            pool,
        })
    }

    /// Submission ingress.
    ///
    /// # Panics
    /// Never before `shutdown`; the dispatcher exists until then.
    pub fn dispatcher(&self) -> &Dispatcher {
        self.dispatcher
            .as_ref()
            .expect("dispatcher taken by shutdown")
    }

    /// Drop the ingress and wait for every queued job to finish.
    pub async fn shutdown(mut self) {
        // Dropping the dispatcher closes the queue's only sender
        self.dispatcher.take();
        self.pool.shutdown().await;
    }
}
