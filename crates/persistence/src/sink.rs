//! AnalysisSink - ResultSink over the record store and graph mirror

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use contracts::{AnalysisResult, ContractError, InputResource, JobRecord, ResultSink};
use observability::record_persist_failure;

use crate::graph::GraphStore;
use crate::records::{PersistedRecord, RecordStore};

/// Persists the durable projection, mirrors the graph best-effort and
/// removes the temp resource.
pub struct AnalysisSink {
    name: String,
    records: Arc<RecordStore>,
    graph: Option<Arc<GraphStore>>,
}

impl AnalysisSink {
    pub fn new(
        name: impl Into<String>,
        records: Arc<RecordStore>,
        graph: Option<Arc<GraphStore>>,
    ) -> Self {
        Self {
            name: name.into(),
            records,
            graph,
        }
    }
}

impl ResultSink for AnalysisSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "analysis_sink_persist", skip(self, record, result), fields(sink = %self.name, job_id = %record.id))]
    async fn persist(
        &mut self,
        record: &JobRecord,
        result: &AnalysisResult,
    ) -> Result<(), ContractError> {
        let projected = PersistedRecord::project(record, result)?;
        self.records.insert(&projected)?;

        // Graph mirroring never escalates; a failed mirror only loses derived facts
        if let Some(graph) = &self.graph {
            if let Err(e) = graph.mirror(record, result) {
                record_persist_failure("graph");
                warn!(job_id = %record.id, error = %e, "graph mirror failed");
            }
        }
        Ok(())
    }

    #[instrument(name = "analysis_sink_cleanup", skip(self, input), fields(sink = %self.name, path = %input.path.display()))]
    async fn cleanup(&mut self, input: &InputResource) -> Result<(), ContractError> {
        tokio::fs::remove_file(&input.path).await.map_err(|e| {
            ContractError::cleanup(input.path.display().to_string(), e.to_string())
        })?;
        debug!(path = %input.path.display(), "temp resource removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Category, GraphQuery, InputResource, JobId, JobMetadata, StagePayload};
    use serde_json::json;
    use tempfile::tempdir;

    fn job(path: std::path::PathBuf) -> JobRecord {
        JobRecord::queued(
            JobId::generate(),
            0,
            InputResource {
                filename: path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned(),
                path,
            },
            JobMetadata::default(),
        )
    }

    fn result() -> AnalysisResult {
        let mut result = AnalysisResult::default();
        let mut resonance = StagePayload::new();
        resonance.insert("vibe".into(), json!("Anthemic Joy (Aligned)"));
        resonance.insert("dissonance_score".into(), json!(0.1));
        result.set_category(Category::Resonance, resonance);
        result
    }

    #[tokio::test]
    async fn test_persist_writes_row_and_graph() {
        let dir = tempdir().unwrap();
        let records = Arc::new(RecordStore::open(dir.path().join("t.db")).unwrap());
        let graph = Arc::new(GraphStore::new());
        let mut sink = AnalysisSink::new(
            "worker-0",
            Arc::clone(&records),
            Some(Arc::clone(&graph)),
        );

        let record = job(dir.path().join("track.wav"));
        sink.persist(&record, &result()).await.unwrap();

        assert_eq!(records.count().unwrap(), 1);
        assert_eq!(graph.node_count(), 3);
    }

    #[tokio::test]
    async fn test_cleanup_removes_file_once() {
        let dir = tempdir().unwrap();
        let records = Arc::new(RecordStore::open(dir.path().join("t.db")).unwrap());
        let mut sink = AnalysisSink::new("worker-0", records, None);

        let path = dir.path().join("upload.wav");
        std::fs::write(&path, b"bytes").unwrap();
        let record = job(path.clone());

        sink.cleanup(&record.input).await.unwrap();
        assert!(!path.exists());

        // A second call reports a cleanup error instead of silently passing
        let err = sink.cleanup(&record.input).await.unwrap_err();
        assert!(matches!(err, ContractError::Cleanup { .. }));
    }
}
