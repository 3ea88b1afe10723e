//! JobStore - keyed, concurrently-accessible job registry
//!
//! Records are partitioned by job id: exactly one writer (the owning
//! worker) mutates a record, many readers poll concurrently. Records are
//! never deleted during the process lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::debug;

use contracts::{
    AnalysisResult, ContractError, InputResource, JobId, JobMetadata, JobRecord, JobStatus,
};

/// In-memory job registry.
///
/// Readers receive cloned snapshots so a concurrent update can never expose
/// a half-written record.
#[derive(Debug, Default)]
pub struct JobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
    seq: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Queued record with a freshly generated id.
    pub fn create(&self, input: InputResource, metadata: JobMetadata) -> JobId {
        let id = JobId::generate();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let record = JobRecord::queued(id.clone(), seq, input, metadata);

        let mut records = self.records.write().expect("job store lock poisoned");
        records.insert(id.clone(), record);
        debug!(job_id = %id, seq, "job record created");
        id
    }

    /// Snapshot of a record.
    pub fn get(&self, id: &str) -> Result<JobRecord, ContractError> {
        let records = self.records.read().expect("job store lock poisoned");
        records.get(id).cloned().ok_or(ContractError::JobNotFound {
            job_id: id.to_string(),
        })
    }

    /// Apply a mutator atomically; concurrent readers observe either the old
    /// or the new record, never a partial write.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<(), ContractError>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut records = self.records.write().expect("job store lock poisoned");
        let record = records.get_mut(id).ok_or(ContractError::JobNotFound {
            job_id: id.to_string(),
        })?;
        mutate(record);
        Ok(())
    }

    /// Move a record to `next`, enforcing the monotonic state machine.
    pub fn transition(&self, id: &str, next: JobStatus) -> Result<(), ContractError> {
        let mut records = self.records.write().expect("job store lock poisoned");
        let record = records.get_mut(id).ok_or(ContractError::JobNotFound {
            job_id: id.to_string(),
        })?;

        if !record.status.can_transition(next) {
            return Err(ContractError::InvalidTransition {
                job_id: id.to_string(),
                from: record.status.to_string(),
                to: next.to_string(),
            });
        }
        record.status = next;
        Ok(())
    }

    /// Terminal transition: Processing -> Completed, attaching the result.
    pub fn complete(&self, id: &str, result: AnalysisResult) -> Result<(), ContractError> {
        let mut records = self.records.write().expect("job store lock poisoned");
        let record = records.get_mut(id).ok_or(ContractError::JobNotFound {
            job_id: id.to_string(),
        })?;

        if !record.status.can_transition(JobStatus::Completed) {
            return Err(ContractError::InvalidTransition {
                job_id: id.to_string(),
                from: record.status.to_string(),
                to: JobStatus::Completed.to_string(),
            });
        }
        record.status = JobStatus::Completed;
        record.result = Some(result);
        Ok(())
    }

    /// Terminal transition: Processing -> Failed, attaching the error.
    pub fn fail(&self, id: &str, error: impl Into<String>) -> Result<(), ContractError> {
        let mut records = self.records.write().expect("job store lock poisoned");
        let record = records.get_mut(id).ok_or(ContractError::JobNotFound {
            job_id: id.to_string(),
        })?;

        if !record.status.can_transition(JobStatus::Failed) {
            return Err(ContractError::InvalidTransition {
                job_id: id.to_string(),
                from: record.status.to_string(),
                to: JobStatus::Failed.to_string(),
            });
        }
        record.status = JobStatus::Failed;
        record.error = Some(error.into());
        Ok(())
    }

    /// Most recent `n` records, newest first.
    pub fn list_recent(&self, n: usize) -> Vec<JobRecord> {
        let records = self.records.read().expect("job store lock poisoned");
        let mut all: Vec<JobRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.seq.cmp(&a.seq));
        all.truncate(n);
        all
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("job store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputResource {
        InputResource {
            path: "temp/x.wav".into(),
            filename: "x.wav".into(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = JobStore::new();
        let id = store.create(input(), JobMetadata::default());

        let record = store.get(&id).unwrap();
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.id, id);
        assert!(record.result.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let store = JobStore::new();
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, ContractError::JobNotFound { .. }));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let store = JobStore::new();
        let id = store.create(input(), JobMetadata::default());

        store.transition(&id, JobStatus::Processing).unwrap();
        store.complete(&id, AnalysisResult::default()).unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert!(record.result.is_some());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let store = JobStore::new();
        let id = store.create(input(), JobMetadata::default());

        store.transition(&id, JobStatus::Processing).unwrap();
        store.complete(&id, AnalysisResult::default()).unwrap();

        // Terminal state reached at most once
        let err = store.fail(&id, "late failure").unwrap_err();
        assert!(matches!(err, ContractError::InvalidTransition { .. }));
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_queued_cannot_complete_directly() {
        let store = JobStore::new();
        let id = store.create(input(), JobMetadata::default());
        assert!(store.complete(&id, AnalysisResult::default()).is_err());
    }

    #[test]
    fn test_update_applies_mutator_atomically() {
        let store = JobStore::new();
        let id = store.create(input(), JobMetadata::default());

        store
            .update(&id, |record| {
                record.metadata.platform = "TikTok".to_string();
            })
            .unwrap();

        assert_eq!(store.get(&id).unwrap().metadata.platform, "TikTok");
        assert!(store.update("missing", |_| {}).is_err());
    }

    #[test]
    fn test_list_recent_newest_first() {
        let store = JobStore::new();
        let first = store.create(input(), JobMetadata::default());
        let second = store.create(input(), JobMetadata::default());
        let third = store.create(input(), JobMetadata::default());

        let recent = store.list_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, third);
        assert_eq!(recent[1].id, second);
        assert_ne!(recent[1].id, first);
    }

    #[test]
    fn test_concurrent_readers_see_consistent_records() {
        use std::sync::Arc;

        let store = Arc::new(JobStore::new());
        let id = store.create(input(), JobMetadata::default());
        store.transition(&id, JobStatus::Processing).unwrap();

        let mut readers = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let id = id.clone();
            readers.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    let record = store.get(&id).unwrap();
                    // A completed record always carries its result
                    if record.status == JobStatus::Completed {
                        assert!(record.result.is_some());
                    }
                }
            }));
        }

        store.complete(&id, AnalysisResult::default()).unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
