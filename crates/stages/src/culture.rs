//! Culture stage - distance between the track profile and market norms

use async_trait::async_trait;
use serde_json::{json, Map};
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

/// Market centroids over [acousticness, energy, valence].
const MARKET_CENTROIDS: &[(&str, [f64; 3])] = &[
    ("TW", [0.7, 0.4, 0.5]),
    ("JP", [0.2, 0.9, 0.8]),
    ("US", [0.3, 0.7, 0.6]),
    ("BR", [0.4, 0.8, 0.9]),
];

// TODO: derive the track vector from the creative features once a
// calibrated acousticness/energy/valence mapping exists.
const TRACK_VECTOR: [f64; 3] = [0.5, 0.5, 0.5];

/// Euclidean distance of the track profile to each target market centroid.
///
/// Skipped when the submission names no target markets. Unknown markets
/// report distance 0.0.
#[derive(Debug, Default)]
pub struct CultureStage;

impl CultureStage {
    pub fn new() -> Self {
        Self
    }

    fn distance(track: &[f64; 3], market: &str) -> f64 {
        MARKET_CENTROIDS
            .iter()
            .find(|(code, _)| *code == market)
            .map(|(_, centroid)| {
                track
                    .iter()
                    .zip(centroid)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt()
            })
            .unwrap_or(0.0)
    }

    fn interpret(distance: f64) -> &'static str {
        if distance < 0.2 {
            "Low Distance (Safe/Generic)"
        } else if distance < 0.5 {
            "Moderate Distance (Sweet Spot)"
        } else {
            "High Distance (Outlier/Risk)"
        }
    }
}

#[async_trait]
impl AnalysisStage for CultureStage {
    fn name(&self) -> &str {
        "cultural_distance"
    }

    fn category(&self) -> Category {
        Category::Culture
    }

    fn ready(&self, metadata: &JobMetadata) -> bool {
        !metadata.target_markets.is_empty()
    }

    #[instrument(name = "cultural_distance_run", skip_all, fields(markets = metadata.target_markets.len()))]
    async fn run(
        &self,
        _input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let mut distances = Map::new();
        for market in &metadata.target_markets {
            let code = market.trim().to_uppercase();
            let d = Self::distance(&TRACK_VECTOR, &code);
            distances.insert(
                code,
                json!({ "score": d, "interpretation": Self::interpret(d) }),
            );
        }

        let mut payload = StagePayload::new();
        payload.insert("distances".into(), json!(distances));
        Ok(payload)
    }
}
