//! StatusReader - external status vocabulary for polling
//!
//! Pure reads of the JobStore; never triggers or blocks on processing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use contracts::{AnalysisResult, ContractError, JobRecord, JobStatus};

use crate::store::JobStore;

/// Externally visible job state.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job_id: String,

    pub status: JobStatus,

    pub submitted_at: DateTime<Utc>,

    /// Present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,

    /// Present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobRecord> for JobStatusView {
    fn from(record: JobRecord) -> Self {
        let result = match record.status {
            JobStatus::Completed => record.result,
            _ => None,
        };
        let error = match record.status {
            JobStatus::Failed => record.error,
            _ => None,
        };
        Self {
            job_id: record.id.as_str().to_string(),
            status: record.status,
            submitted_at: record.submitted_at,
            result,
            error,
        }
    }
}

/// Read-only view over the job registry.
#[derive(Clone)]
pub struct StatusReader {
    store: Arc<JobStore>,
}

impl StatusReader {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// Current status of one job.
    pub fn status(&self, job_id: &str) -> Result<JobStatusView, ContractError> {
        Ok(self.store.get(job_id)?.into())
    }

    /// Most recent `n` jobs, newest first.
    pub fn recent(&self, n: usize) -> Vec<JobStatusView> {
        self.store
            .list_recent(n)
            .into_iter()
            .map(JobStatusView::from)
            .collect()
    }
}
