//! Dispatcher - submission ingress
//!
//! Persists the upload, creates the job record and enqueues it. Submission
//! latency is bounded by the cost of copying the resource, never by
//! analysis time.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, instrument};

use contracts::{ContractError, InputResource, JobId, JobMetadata};
use observability::record_job_submitted;

use crate::store::JobStore;
use std::sync::Arc;

/// Upload file types the engine accepts.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["wav", "mp3", "aiff", "flac", "ogg"];

/// Create the FIFO job queue.
///
/// Unbounded by policy: no job is ever dropped at admission; queue depth is
/// exported as a gauge instead.
pub fn job_queue() -> (async_channel::Sender<JobId>, async_channel::Receiver<JobId>) {
    async_channel::unbounded()
}

/// Submission ingress.
pub struct Dispatcher {
    store: Arc<JobStore>,
    queue: async_channel::Sender<JobId>,
    temp_dir: PathBuf,
}

impl Dispatcher {
    /// Create a dispatcher, ensuring the temp directory exists.
    pub fn new(
        store: Arc<JobStore>,
        queue: async_channel::Sender<JobId>,
        temp_dir: impl Into<PathBuf>,
    ) -> Result<Self, ContractError> {
        let temp_dir = temp_dir.into();
        std::fs::create_dir_all(&temp_dir)
            .map_err(|e| ContractError::submission(format!("temp dir unavailable: {e}")))?;

        Ok(Self {
            store,
            queue,
            temp_dir,
        })
    }

    /// Accept an upload: save it durably, create a Queued record, enqueue.
    ///
    /// Returns without waiting for processing. On any failure before the
    /// record exists, the saved file is removed and no job is created.
    #[instrument(name = "dispatcher_submit", skip(self, bytes, metadata), fields(filename = %filename, size = bytes.len()))]
    pub async fn submit(
        &self,
        bytes: Bytes,
        filename: &str,
        metadata: JobMetadata,
    ) -> Result<JobId, ContractError> {
        let safe_name = sanitize_filename(filename);
        check_extension(&safe_name)?;

        if self.queue.is_closed() {
            return Err(ContractError::submission("engine is shutting down"));
        }

        let temp_name = format!("temp_{}_{}", JobId::generate(), safe_name);
        let path = self.temp_dir.join(&temp_name);

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ContractError::submission(format!("failed to save upload: {e}")))?;
        debug!(path = %path.display(), "upload persisted");

        let input = InputResource {
            path: path.clone(),
            filename: safe_name,
        };
        let id = self.store.create(input, metadata);

        if let Err(e) = self.queue.send(id.clone()).await {
            // Shutdown raced the submission; fail the record and undo the save
            let _ = self.store.transition(&id, contracts::JobStatus::Processing);
            let _ = self.store.fail(&id, "engine shut down before execution");
            let _ = tokio::fs::remove_file(&path).await;
            return Err(ContractError::submission(format!("job queue closed: {e}")));
        }

        record_job_submitted();
        info!(job_id = %id, "job queued");
        Ok(id)
    }

    /// Current number of jobs waiting for an executor.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }
}

/// Strip path components and shell-unfriendly characters from an upload name.
fn sanitize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn check_extension(filename: &str) -> Result<(), ContractError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(ContractError::UnsupportedMedia { extension: ext })
    }
}
