//! JobRecord - lifecycle state for one submitted analysis request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{AnalysisResult, JobId};

/// Externally visible job lifecycle states.
///
/// Transitions are monotonic: `Queued -> Processing -> {Completed | Failed}`.
/// A terminal state is reached at most once and is stable under repeated polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether `next` is a legal forward transition from `self`.
    pub fn can_transition(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    /// Whether this state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied metadata accompanying an upload.
///
/// Only `artist_id` is guaranteed present (defaulted); everything else is
/// optional and gates whether the stages consuming it run at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Artist identifier, defaults to "unknown"
    #[serde(default = "default_artist_id")]
    pub artist_id: String,

    /// Release platform, defaults to "Spotify"
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Target market country codes
    #[serde(default)]
    pub target_markets: Vec<String>,

    /// Raw lyrics text; absent or empty means lyric-dependent stages are skipped
    #[serde(default)]
    pub lyrics: Option<String>,
}

fn default_artist_id() -> String {
    "unknown".to_string()
}

fn default_platform() -> String {
    "Spotify".to_string()
}

impl Default for JobMetadata {
    fn default() -> Self {
        Self {
            artist_id: default_artist_id(),
            platform: default_platform(),
            target_markets: Vec::new(),
            lyrics: None,
        }
    }
}

impl JobMetadata {
    /// Lyrics text if present and non-blank.
    pub fn lyrics_text(&self) -> Option<&str> {
        self.lyrics
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Handle to the durable temp resource backing a job.
///
/// Owned exclusively by its job from creation until the single cleanup call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputResource {
    /// Location of the saved upload on disk
    pub path: PathBuf,

    /// Original (sanitized) upload filename
    pub filename: String,
}

/// One submitted analysis request and its tracked lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique, immutable job id
    pub id: JobId,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Submission wall-clock time
    pub submitted_at: DateTime<Utc>,

    /// Monotonic submission sequence number (FIFO tie-breaker)
    pub seq: u64,

    /// Temp resource handle
    pub input: InputResource,

    /// Caller-supplied metadata
    pub metadata: JobMetadata,

    /// Present only when Completed
    pub result: Option<AnalysisResult>,

    /// Present only when Failed
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a freshly queued record.
    pub fn queued(
        id: JobId,
        seq: u64,
        input: InputResource,
        metadata: JobMetadata,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            seq,
            input,
            metadata,
            result: None,
            error: None,
        }
    }
}
