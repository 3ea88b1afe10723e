//! Market stage - geopolitical release risk per target market

use async_trait::async_trait;
use serde_json::{json, Map};
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

const HIGH_RISK_MARKETS: &[&str] = &["CN", "RU", "IR", "KP"];

/// Flags target markets with elevated release risk.
///
/// Skipped when the submission names no target markets.
#[derive(Debug, Default)]
pub struct MarketStage;

impl MarketStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisStage for MarketStage {
    fn name(&self) -> &str {
        "market_risk"
    }

    fn category(&self) -> Category {
        Category::Market
    }

    fn ready(&self, metadata: &JobMetadata) -> bool {
        !metadata.target_markets.is_empty()
    }

    #[instrument(name = "market_risk_run", skip_all, fields(markets = metadata.target_markets.len()))]
    async fn run(
        &self,
        _input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let mut risks = Map::new();
        for market in &metadata.target_markets {
            let code = market.trim().to_uppercase();
            if HIGH_RISK_MARKETS.contains(&code.as_str()) {
                risks.insert(code, json!("High Geopolitical Volatility"));
            }
        }

        let mut payload = StagePayload::new();
        payload.insert("geopolitical_risks".into(), json!(risks));
        payload.insert(
            "markets_assessed".into(),
            json!(metadata.target_markets.len()),
        );
        Ok(payload)
    }
}
