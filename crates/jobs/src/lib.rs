//! # Jobs
//!
//! Asynchronous job orchestration.
//!
//! Responsibilities:
//! - Keep the in-memory job registry (`JobStore`)
//! - Accept submissions, persist the upload, enqueue FIFO (`Dispatcher`)
//! - Run a bounded pool of executors over the queue (`WorkerPool`)
//! - Translate internal state for pollers (`StatusReader`)
//!
//! ## Usage Example
//!
//! ```ignore
//! let (queue_tx, queue_rx) = job_queue();
//! let store = Arc::new(JobStore::new());
//! let dispatcher = Dispatcher::new(Arc::clone(&store), queue_tx, temp_dir)?;
//! let pool = WorkerPool::spawn(2, queue_rx, Arc::clone(&store), pipeline, make_sink);
//!
//! let job_id = dispatcher.submit(bytes, "track.wav", metadata).await?;
//! let view = StatusReader::new(store).status(&job_id)?;
//! ```

mod dispatcher;
mod metrics;
mod pool;
mod status;
mod store;

pub use dispatcher::{job_queue, Dispatcher, ALLOWED_EXTENSIONS};
pub use metrics::{WorkerMetrics, WorkerMetricsSnapshot};
pub use pool::{WorkerHandle, WorkerPool};
pub use status::{JobStatusView, StatusReader};
pub use store::JobStore;
