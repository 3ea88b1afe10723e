//! Industry stage - graph centrality lookup for the submitting artist

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use contracts::{
    AnalysisStage, Category, ContractError, GraphQuery, InputResource, JobMetadata, StagePayload,
};

/// Looks up the artist's degree centrality in the mirrored industry graph.
///
/// First submissions from an unknown artist report 0.0; the graph fills in
/// as completed jobs are mirrored.
pub struct IndustryStage {
    graph: Arc<dyn GraphQuery>,
}

impl IndustryStage {
    pub fn new(graph: Arc<dyn GraphQuery>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl AnalysisStage for IndustryStage {
    fn name(&self) -> &str {
        "industry_network"
    }

    fn category(&self) -> Category {
        Category::Industry
    }

    #[instrument(name = "industry_network_run", skip(self, _input, metadata), fields(artist = %metadata.artist_id))]
    async fn run(
        &self,
        _input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let centrality = self.graph.artist_centrality(&metadata.artist_id);

        let mut payload = StagePayload::new();
        payload.insert("artist_centrality".into(), json!(centrality));
        payload.insert("graph_nodes".into(), json!(self.graph.node_count()));
        Ok(payload)
    }
}
