//! RecordStore - durable projection of analysis results
//!
//! One SQLite row per job, keyed by job id so a record is written at most
//! once. Each operation opens its own connection; there are no cross-job
//! transactions.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, instrument};

use contracts::{AnalysisResult, ContractError, JobRecord};

const STORE_NAME: &str = "records";

/// Compact, searchable projection of one completed analysis.
#[derive(Debug, Clone)]
pub struct PersistedRecord {
    /// Job id (primary key)
    pub id: String,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    /// Full result, serialized
    pub raw_result: String,
    /// Embedding vector, serialized (absent when the listening stage did not run)
    pub embedding: Option<String>,
    pub dissonance_score: Option<f64>,
    pub vibe_descriptor: Option<String>,
    pub lyrical_sentiment: Option<String>,
    pub artist_id: String,
    /// Target markets, csv
    pub markets: String,
}

impl PersistedRecord {
    /// Derive the projection from a finished job.
    pub fn project(record: &JobRecord, result: &AnalysisResult) -> Result<Self, ContractError> {
        let raw_result = serde_json::to_string(result)
            .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;

        let embedding = match result.embedding() {
            Some(vector) => Some(
                serde_json::to_string(&vector)
                    .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            id: record.id.as_str().to_string(),
            filename: record.input.filename.clone(),
            timestamp: record.submitted_at,
            status: "success".to_string(),
            raw_result,
            embedding,
            dissonance_score: result.dissonance_score(),
            vibe_descriptor: result.vibe_descriptor().map(str::to_string),
            lyrical_sentiment: result.lyrical_sentiment().map(str::to_string),
            artist_id: record.metadata.artist_id.clone(),
            markets: record.metadata.target_markets.join(","),
        })
    }
}

/// History view row.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub artist_id: String,
}

/// SQLite-backed durable store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Open (and migrate) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let store = Self { path: path.into() };
        let conn = store.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS analysis_results (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL,
                raw_result TEXT NOT NULL,
                embedding TEXT,
                dissonance_score REAL,
                vibe_descriptor TEXT,
                lyrical_sentiment TEXT,
                artist_id TEXT,
                markets TEXT
            )",
            [],
        )
        .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Per-call connection; no sessions are shared across jobs.
    fn connect(&self) -> Result<Connection, ContractError> {
        Connection::open(&self.path)
            .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))
    }

    /// Insert a record; a second insert for the same job id is a no-op.
    #[instrument(name = "record_store_insert", skip(self, record), fields(job_id = %record.id))]
    pub fn insert(&self, record: &PersistedRecord) -> Result<(), ContractError> {
        let conn = self.connect()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO analysis_results
                 (id, filename, timestamp, status, raw_result, embedding,
                  dissonance_score, vibe_descriptor, lyrical_sentiment, artist_id, markets)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.filename,
                    record.timestamp.to_rfc3339(),
                    record.status,
                    record.raw_result,
                    record.embedding,
                    record.dissonance_score,
                    record.vibe_descriptor,
                    record.lyrical_sentiment,
                    record.artist_id,
                    record.markets,
                ],
            )
            .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;

        debug!(job_id = %record.id, inserted, "record persisted");
        Ok(())
    }

    /// Most recent `n` records, descending timestamp.
    pub fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>, ContractError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, filename, timestamp, artist_id
                 FROM analysis_results
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )
            .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;

        let rows = stmt
            .query_map([n as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, filename, timestamp, artist_id) =
                row.map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))?
                .with_timezone(&Utc);
            entries.push(HistoryEntry {
                id,
                filename,
                timestamp,
                artist_id: artist_id.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        Ok(entries)
    }

    /// Fetch one row's dissonance score (diagnostics/tests).
    pub fn dissonance_of(&self, job_id: &str) -> Result<Option<f64>, ContractError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT dissonance_score FROM analysis_results WHERE id = ?1",
            [job_id],
            |row| row.get::<_, Option<f64>>(0),
        )
        .optional()
        .map(Option::flatten)
        .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))
    }

    /// Total stored rows.
    pub fn count(&self) -> Result<u64, ContractError> {
        let conn = self.connect()?;
        conn.query_row("SELECT COUNT(*) FROM analysis_results", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|c| c as u64)
        .map_err(|e| ContractError::persistence(STORE_NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{InputResource, JobId, JobMetadata};
    use serde_json::json;
    use tempfile::tempdir;

    fn job(artist: &str) -> JobRecord {
        JobRecord::queued(
            JobId::generate(),
            0,
            InputResource {
                path: "temp/track.wav".into(),
                filename: "track.wav".into(),
            },
            JobMetadata {
                artist_id: artist.to_string(),
                target_markets: vec!["US".into(), "UK".into()],
                ..Default::default()
            },
        )
    }

    fn result_with_resonance() -> AnalysisResult {
        let mut result = AnalysisResult::default();
        let mut resonance = contracts::StagePayload::new();
        resonance.insert("dissonance_score".into(), json!(0.37));
        resonance.insert("vibe".into(), json!("Anthemic Joy (Aligned)"));
        resonance.insert("lyrical_sentiment".into(), json!("POSITIVE"));
        result.set_category(contracts::Category::Resonance, resonance);

        let mut creative = contracts::StagePayload::new();
        creative.insert("embedding".into(), json!([1.0, 2.0, 3.0]));
        result.set_category(contracts::Category::Creative, creative);
        result
    }

    #[test]
    fn test_projection_extracts_resonance_fields() {
        let record = job("artist-1");
        let projected = PersistedRecord::project(&record, &result_with_resonance()).unwrap();

        assert_eq!(projected.dissonance_score, Some(0.37));
        assert_eq!(
            projected.vibe_descriptor.as_deref(),
            Some("Anthemic Joy (Aligned)")
        );
        assert_eq!(projected.lyrical_sentiment.as_deref(), Some("POSITIVE"));
        assert_eq!(projected.embedding.as_deref(), Some("[1.0,2.0,3.0]"));
        assert_eq!(projected.markets, "US,UK");
    }

    #[test]
    fn test_projection_tolerates_missing_resonance() {
        let record = job("artist-1");
        let projected = PersistedRecord::project(&record, &AnalysisResult::default()).unwrap();
        assert!(projected.dissonance_score.is_none());
        assert!(projected.embedding.is_none());
    }

    #[test]
    fn test_insert_is_at_most_once_per_job() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("t.db")).unwrap();

        let record = job("artist-1");
        let mut projected = PersistedRecord::project(&record, &result_with_resonance()).unwrap();
        store.insert(&projected).unwrap();

        // Second write with the same id changes nothing
        projected.dissonance_score = Some(0.99);
        store.insert(&projected).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.dissonance_of(&projected.id).unwrap(), Some(0.37));
    }

    #[test]
    fn test_recent_orders_by_descending_timestamp() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("t.db")).unwrap();

        let mut older = PersistedRecord::project(&job("first"), &AnalysisResult::default()).unwrap();
        older.timestamp = Utc::now() - chrono::Duration::seconds(60);
        let newer = PersistedRecord::project(&job("second"), &AnalysisResult::default()).unwrap();

        store.insert(&older).unwrap();
        store.insert(&newer).unwrap();

        let entries = store.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].artist_id, "second");
        assert_eq!(entries[1].artist_id, "first");

        // Limit respected
        assert_eq!(store.recent(1).unwrap().len(), 1);
    }
}
