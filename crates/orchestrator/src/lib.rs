//! # Orchestrator
//!
//! Per-job pipeline execution.
//!
//! Responsibilities:
//! - Run every ready independent stage, each isolated in its own task
//! - Absorb stage errors and panics into per-category outcome markers
//! - Merge stage payloads into the namespaced `AnalysisResult`
//! - Run the dependent resonance evaluation from the merged creative payload

mod orchestrator;

pub use orchestrator::Orchestrator;
pub use stages::ResonanceEvaluator;
