//! # Stages
//!
//! Analysis stage implementations.
//!
//! Responsibilities:
//! - Decode the saved input resource (WAV) and extract per-stage features
//! - Wrap each heuristic behind the `AnalysisStage` contract
//! - Hold the expensive listening model as a read-only shared resource
//! - Provide the cross-modal resonance evaluator and the stage registry
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stages::{build_registry, ListeningModel, ResonanceEvaluator};
//!
//! let model = Arc::new(ListeningModel::load(&blueprint.listening));
//! let registry = build_registry(&blueprint, model, graph);
//! let evaluator = ResonanceEvaluator::from_config(&blueprint.listening);
//! ```

mod audience;
mod culture;
mod dsp;
mod harmonic;
mod industry;
mod listening;
mod lyrical;
mod market;
mod platform;
mod registry;
mod resonance;
mod signal;
mod wave;

pub use audience::AudienceStage;
pub use culture::CultureStage;
pub use harmonic::HarmonicStage;
pub use industry::IndustryStage;
pub use listening::{ListeningModel, ListeningStage};
pub use lyrical::LyricalStage;
pub use market::MarketStage;
pub use platform::PlatformStage;
pub use registry::build_registry;
pub use resonance::ResonanceEvaluator;
pub use signal::SignalFeaturesStage;
pub use wave::AudioClip;
