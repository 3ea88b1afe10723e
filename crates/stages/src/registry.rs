//! Stage registry construction
//!
//! Explicit mapping from blueprint toggles to stage implementations,
//! resolved once at startup. Registry order is the merge order: a later
//! stage wins key collisions inside a shared category.

use std::sync::Arc;

use tracing::info;

use contracts::{AnalysisStage, EngineBlueprint, GraphQuery};

use crate::{
    AudienceStage, CultureStage, HarmonicStage, IndustryStage, ListeningModel, ListeningStage,
    LyricalStage, MarketStage, PlatformStage, SignalFeaturesStage,
};

/// Build the independent-stage registry from the blueprint.
pub fn build_registry(
    blueprint: &EngineBlueprint,
    model: Arc<ListeningModel>,
    graph: Arc<dyn GraphQuery>,
) -> Vec<Arc<dyn AnalysisStage>> {
    let toggles = &blueprint.stages;
    let mut stages: Vec<Arc<dyn AnalysisStage>> = Vec::new();

    if toggles.listening {
        stages.push(Arc::new(ListeningStage::new(model)));
    }
    if toggles.signal_features {
        stages.push(Arc::new(SignalFeaturesStage::new()));
    }
    if toggles.harmonic_profile {
        stages.push(Arc::new(HarmonicStage::new()));
    }
    if toggles.lyric_analysis {
        stages.push(Arc::new(LyricalStage::new()));
    }
    if toggles.industry {
        stages.push(Arc::new(IndustryStage::new(graph)));
    }
    if toggles.platform {
        stages.push(Arc::new(PlatformStage::new()));
    }
    if toggles.market {
        stages.push(Arc::new(MarketStage::new()));
    }
    if toggles.culture {
        stages.push(Arc::new(CultureStage::new()));
    }
    if toggles.audience {
        stages.push(Arc::new(AudienceStage::new()));
    }

    info!(
        stages = stages.len(),
        names = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
        "stage registry built"
    );
    stages
}
