//! AnalysisResult - Orchestrator output
//!
//! Namespaced mapping from category to merged payload. Categories whose
//! stages were skipped are absent; categories whose stages all failed carry
//! an error marker. Failures are never silently dropped.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Category, StageOutcome, StagePayload, StageStatus};

/// Result schema version, bumped on any breaking change to category payload shapes.
pub const RESULT_SCHEMA_VERSION: u32 = 1;

/// Merged payload of one category, or an error marker when every stage
/// writing the category failed.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    Ok(StagePayload),
    Err { error: String },
}

impl CategoryOutcome {
    pub fn payload(&self) -> Option<&StagePayload> {
        match self {
            CategoryOutcome::Ok(p) => Some(p),
            CategoryOutcome::Err { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CategoryOutcome::Ok(_) => None,
            CategoryOutcome::Err { error } => Some(error),
        }
    }
}

// A category serializes as its payload object directly, or as {"error": "..."}.
impl Serialize for CategoryOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CategoryOutcome::Ok(payload) => payload.serialize(serializer),
            CategoryOutcome::Err { error } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CategoryOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        // The single-key {"error": "..."} shape is the failure marker;
        // anything else is a payload (which may itself contain an "errors"
        // sub-map for partially failed categories).
        if map.len() == 1 {
            if let Some(Value::String(msg)) = map.get("error") {
                return Ok(CategoryOutcome::Err { error: msg.clone() });
            }
        }
        Ok(CategoryOutcome::Ok(map))
    }
}

/// Complete, versioned analysis report for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Payload schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Category name -> merged payload or error marker
    pub categories: BTreeMap<Category, CategoryOutcome>,
}

fn default_schema_version() -> u32 {
    RESULT_SCHEMA_VERSION
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            schema_version: RESULT_SCHEMA_VERSION,
            categories: BTreeMap::new(),
        }
    }
}

impl AnalysisResult {
    /// Merge stage outcomes into a result, in the given order.
    ///
    /// Merge policy per category:
    /// - keys from successful stages merge flatly; on a key collision the
    ///   later stage wins (explicit last-write-wins)
    /// - skipped stages contribute nothing
    /// - failed stages are traced: a category with at least one success
    ///   carries an `errors` sub-map naming each failed stage; a category
    ///   with only failures collapses to the `{error}` marker
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = StageOutcome>) -> Self {
        let mut merged: BTreeMap<Category, StagePayload> = BTreeMap::new();
        let mut failures: BTreeMap<Category, Vec<(String, String)>> = BTreeMap::new();

        for outcome in outcomes {
            match outcome.status {
                StageStatus::Success(payload) => {
                    let slot = merged.entry(outcome.category).or_default();
                    for (key, value) in payload {
                        slot.insert(key, value);
                    }
                }
                StageStatus::Failed(message) => {
                    failures
                        .entry(outcome.category)
                        .or_default()
                        .push((outcome.stage, message));
                }
                StageStatus::Skipped => {}
            }
        }

        let mut categories = BTreeMap::new();
        for (category, mut payload) in merged {
            if let Some(failed) = failures.remove(&category) {
                let mut errors = Map::new();
                for (stage, message) in failed {
                    errors.insert(stage, Value::String(message));
                }
                payload.insert("errors".to_string(), Value::Object(errors));
            }
            categories.insert(category, CategoryOutcome::Ok(payload));
        }
        for (category, failed) in failures {
            let error = failed
                .iter()
                .map(|(stage, message)| format!("{stage}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
            categories.insert(category, CategoryOutcome::Err { error });
        }

        Self {
            schema_version: RESULT_SCHEMA_VERSION,
            categories,
        }
    }

    /// Insert (or replace) a whole category payload.
    pub fn set_category(&mut self, category: Category, payload: StagePayload) {
        self.categories.insert(category, CategoryOutcome::Ok(payload));
    }

    pub fn category(&self, category: Category) -> Option<&CategoryOutcome> {
        self.categories.get(&category)
    }

    pub fn payload(&self, category: Category) -> Option<&StagePayload> {
        self.categories.get(&category).and_then(|c| c.payload())
    }

    fn resonance_value(&self, key: &str) -> Option<&Value> {
        self.payload(Category::Resonance).and_then(|p| p.get(key))
    }

    /// Dissonance score from the resonance category, if computed.
    pub fn dissonance_score(&self) -> Option<f64> {
        self.resonance_value("dissonance_score").and_then(Value::as_f64)
    }

    /// Vibe descriptor from the resonance category, if computed.
    pub fn vibe_descriptor(&self) -> Option<&str> {
        self.resonance_value("vibe").and_then(Value::as_str)
    }

    /// Lyrical sentiment label from the resonance category, if computed.
    pub fn lyrical_sentiment(&self) -> Option<&str> {
        self.resonance_value("lyrical_sentiment").and_then(Value::as_str)
    }

    /// Audio embedding from the creative category, if the listening stage ran.
    pub fn embedding(&self) -> Option<Vec<f64>> {
        let values = self
            .payload(Category::Creative)?
            .get("embedding")?
            .as_array()?;
        values.iter().map(Value::as_f64).collect()
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisResult(v{}, ", self.schema_version)?;
        let mut first = true;
        for (category, outcome) in &self.categories {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            match outcome {
                CategoryOutcome::Ok(p) => write!(f, "{category}:{} keys", p.len())?,
                CategoryOutcome::Err { .. } => write!(f, "{category}:error")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(pairs: &[(&str, Value)]) -> StagePayload {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_flat_merge_last_write_wins() {
        let result = AnalysisResult::from_outcomes([
            StageOutcome::success(
                "signal_features",
                Category::Creative,
                payload(&[("tempo", json!(120.0)), ("shared", json!("first"))]),
            ),
            StageOutcome::success(
                "harmonic_profile",
                Category::Creative,
                payload(&[("shared", json!("second"))]),
            ),
        ]);

        let creative = result.payload(Category::Creative).unwrap();
        assert_eq!(creative.get("tempo"), Some(&json!(120.0)));
        assert_eq!(creative.get("shared"), Some(&json!("second")));
    }

    #[test]
    fn test_all_failed_category_collapses_to_error_marker() {
        let result = AnalysisResult::from_outcomes([StageOutcome::failed(
            "signal_features",
            Category::Creative,
            "decode failed",
        )]);

        let outcome = result.category(Category::Creative).unwrap();
        assert!(outcome.error().unwrap().contains("signal_features"));
        assert!(outcome.error().unwrap().contains("decode failed"));
    }

    #[test]
    fn test_mixed_outcomes_keep_success_and_trace_failure() {
        let result = AnalysisResult::from_outcomes([
            StageOutcome::success(
                "signal_features",
                Category::Creative,
                payload(&[("tempo", json!(98.0))]),
            ),
            StageOutcome::failed("harmonic_profile", Category::Creative, "fft blew up"),
        ]);

        let creative = result.payload(Category::Creative).unwrap();
        assert_eq!(creative.get("tempo"), Some(&json!(98.0)));
        let errors = creative.get("errors").unwrap().as_object().unwrap();
        assert_eq!(errors.get("harmonic_profile"), Some(&json!("fft blew up")));
    }

    #[test]
    fn test_skipped_stage_leaves_no_trace() {
        let result = AnalysisResult::from_outcomes([
            StageOutcome::skipped("lyric_analysis", Category::Creative),
            StageOutcome::skipped("market_risk", Category::Market),
        ]);

        assert!(result.category(Category::Market).is_none());
        assert!(result.category(Category::Creative).is_none());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut result = AnalysisResult::from_outcomes([StageOutcome::success(
            "signal_features",
            Category::Creative,
            payload(&[("tempo", json!(120.0))]),
        )]);
        result.set_category(
            Category::Market,
            payload(&[("geopolitical_risks", json!({}))]),
        );
        result.categories.insert(
            Category::Culture,
            CategoryOutcome::Err {
                error: "distance failed".to_string(),
            },
        );

        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
        assert_eq!(
            back.category(Category::Culture).unwrap().error(),
            Some("distance failed")
        );
    }

    #[test]
    fn test_resonance_accessors() {
        let mut result = AnalysisResult::default();
        result.set_category(
            Category::Resonance,
            payload(&[
                ("dissonance_score", json!(0.42)),
                ("vibe", json!("Anthemic Joy (Aligned)")),
                ("lyrical_sentiment", json!("POSITIVE")),
            ]),
        );

        assert_eq!(result.dissonance_score(), Some(0.42));
        assert_eq!(result.vibe_descriptor(), Some("Anthemic Joy (Aligned)"));
        assert_eq!(result.lyrical_sentiment(), Some("POSITIVE"));
        assert!(result.embedding().is_none());
    }
}
