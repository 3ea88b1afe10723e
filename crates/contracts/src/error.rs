//! Layered error definitions
//!
//! Categorized by source: submission / stage / orchestrator / persistence / cleanup / store

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Submission Errors =====
    /// Upload could not be persisted; no job was created
    #[error("submission failed: {message}")]
    Submission { message: String },

    /// Upload file type is not in the allowed set
    #[error("unsupported media type '{extension}'")]
    UnsupportedMedia { extension: String },

    // ===== Stage Errors =====
    /// Failure inside a single analysis stage (absorbed, never aborts the job)
    #[error("stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// Input resource could not be decoded by a stage
    #[error("input decode error for '{stage}': {message}")]
    InputDecode { stage: String, message: String },

    // ===== Orchestrator Errors =====
    /// Failure in merge/aggregation logic itself, surfaces as job-level Failed
    #[error("orchestrator error: {message}")]
    Orchestrator { message: String },

    // ===== Job Store Errors =====
    /// Unknown job id
    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },

    /// Backward or repeated-terminal status transition
    #[error("invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
    },

    // ===== Persistence Errors =====
    /// Durable store write failure (logged, never escalated to job failure)
    #[error("persistence error in '{store}': {message}")]
    Persistence { store: String, message: String },

    /// Temp-resource deletion failure (logged, never escalated)
    #[error("cleanup error for '{path}': {message}")]
    Cleanup { path: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create submission error
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }

    /// Create stage failure error
    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create input decode error
    pub fn input_decode(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputDecode {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create orchestrator error
    pub fn orchestrator(message: impl Into<String>) -> Self {
        Self::Orchestrator {
            message: message.into(),
        }
    }

    /// Create persistence error
    pub fn persistence(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create cleanup error
    pub fn cleanup(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cleanup {
            path: path.into(),
            message: message.into(),
        }
    }
}
