//! # Persistence
//!
//! Result sink and durable stores.
//!
//! Responsibilities:
//! - Project the full `AnalysisResult` into a compact durable row (SQLite)
//! - Mirror derived facts into the in-process industry graph (idempotent)
//! - Guarantee single removal of the temporary input resource

mod graph;
mod records;
mod sink;

pub use graph::GraphStore;
pub use records::{HistoryEntry, PersistedRecord, RecordStore};
pub use sink::AnalysisSink;
