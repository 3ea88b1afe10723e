//! Cross-modal resonance evaluation
//!
//! The only dependent computation in the pipeline: runs after the merged
//! creative payload exists and combines lyrical sentiment with the audio
//! embedding. All functions here are pure and deterministic.

use serde_json::{json, Value};
use tracing::debug;

use contracts::{ListeningConfig, StagePayload};

/// Valence threshold separating the aligned/dissonant quadrants
const QUADRANT_THRESHOLD: f64 = 0.3;

/// Computes dissonance and vibe from the merged creative payload.
#[derive(Debug, Clone, Copy)]
pub struct ResonanceEvaluator {
    /// Embedding-norm value mapping to neutral audio valence
    norm_center: f64,
    /// Spread of the squashing function
    norm_scale: f64,
}

impl ResonanceEvaluator {
    pub fn new(norm_center: f64, norm_scale: f64) -> Self {
        Self {
            norm_center,
            norm_scale,
        }
    }

    pub fn from_config(config: &ListeningConfig) -> Self {
        Self::new(config.norm_center, config.norm_scale)
    }

    /// Signed sentiment score in [-1, 1]: positive sign and magnitude from
    /// the positive-class probability, negative from the negative-class one.
    pub fn lyrical_valence(sentiment: &str, positive_score: f64, negative_score: f64) -> f64 {
        if sentiment == "POSITIVE" {
            positive_score.clamp(0.0, 1.0)
        } else {
            -negative_score.clamp(0.0, 1.0)
        }
    }

    /// Squash an embedding L2 norm into [-1, 1], centered so a norm near the
    /// corpus-typical value maps near 0.
    pub fn audio_valence(&self, embedding_norm: f64) -> f64 {
        let energy = 1.0 / (1.0 + (-(embedding_norm - self.norm_center) / self.norm_scale).exp());
        (energy - 0.5) * 2.0
    }

    /// Normalized divergence of the two valence estimates, always in [0, 1].
    pub fn dissonance(lyrical: f64, audio: f64) -> f64 {
        ((lyrical - audio).abs() / 2.0).min(1.0)
    }

    /// Deterministic quadrant classification at +-0.3 on each axis.
    pub fn vibe(lyrical: f64, audio: f64) -> &'static str {
        let t = QUADRANT_THRESHOLD;
        if lyrical > t && audio > t {
            "Anthemic Joy (Aligned)"
        } else if lyrical < -t && audio < -t {
            "Dark/Depressive (Aligned)"
        } else if lyrical > t && audio < -t {
            "Bittersweet / Melancholy (High Dissonance)"
        } else if lyrical < -t && audio > t {
            "Angsty Banger (High Dissonance)"
        } else {
            "Neutral / Ambiguous"
        }
    }

    /// Neutral default reported when a prerequisite is missing or errored.
    pub fn skipped_payload() -> StagePayload {
        let mut payload = StagePayload::new();
        payload.insert("dissonance_score".into(), json!(0.0));
        payload.insert("vibe".into(), json!("Neutral"));
        payload.insert("lyrical_sentiment".into(), json!("Unknown"));
        payload.insert("status".into(), json!("skipped"));
        payload
    }

    /// Evaluate resonance from the merged creative payload.
    ///
    /// Returns the skipped default unless both prerequisites (a sentiment
    /// classification and an embedding) produced non-error outcomes.
    pub fn evaluate(&self, creative: Option<&StagePayload>) -> StagePayload {
        let Some(creative) = creative else {
            return Self::skipped_payload();
        };

        let sentiment = creative.get("sentiment").and_then(Value::as_str);
        let positive = creative.get("positive_score").and_then(Value::as_f64);
        let negative = creative.get("negative_score").and_then(Value::as_f64);
        let embedding: Option<Vec<f64>> = creative
            .get("embedding")
            .and_then(Value::as_array)
            .and_then(|vs| vs.iter().map(Value::as_f64).collect());

        let (Some(sentiment), Some(positive), Some(negative), Some(embedding)) =
            (sentiment, positive, negative, embedding)
        else {
            debug!("resonance prerequisites missing, reporting neutral default");
            return Self::skipped_payload();
        };

        let norm = embedding.iter().map(|v| v * v).sum::<f64>().sqrt();
        let lyrical = Self::lyrical_valence(sentiment, positive, negative);
        let audio = self.audio_valence(norm);

        let mut payload = StagePayload::new();
        payload.insert("dissonance_score".into(), json!(Self::dissonance(lyrical, audio)));
        payload.insert("vibe".into(), json!(Self::vibe(lyrical, audio)));
        payload.insert("lyrical_valence".into(), json!(lyrical));
        payload.insert("audio_valence".into(), json!(audio));
        payload.insert("lyrical_sentiment".into(), json!(sentiment));
        payload.insert("status".into(), json!("success"));
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> ResonanceEvaluator {
        ResonanceEvaluator::new(25.0, 5.0)
    }

    #[test]
    fn test_lyrical_valence_sign() {
        assert!(ResonanceEvaluator::lyrical_valence("POSITIVE", 0.9, 0.1) > 0.0);
        assert!(ResonanceEvaluator::lyrical_valence("NEGATIVE", 0.1, 0.9) < 0.0);
        assert_eq!(ResonanceEvaluator::lyrical_valence("POSITIVE", 0.9, 0.1), 0.9);
        assert_eq!(ResonanceEvaluator::lyrical_valence("NEGATIVE", 0.2, 0.8), -0.8);
    }

    #[test]
    fn test_audio_valence_centered_and_bounded() {
        let eval = evaluator();
        assert!(eval.audio_valence(25.0).abs() < 1e-12);
        assert!(eval.audio_valence(100.0) > 0.99);
        assert!(eval.audio_valence(0.0) < -0.9);
        for norm in [0.0, 5.0, 25.0, 40.0, 1000.0] {
            let v = eval.audio_valence(norm);
            assert!((-1.0..=1.0).contains(&v), "valence {v} for norm {norm}");
        }
    }

    #[test]
    fn test_dissonance_always_in_unit_interval() {
        let mut v = -1.0;
        while v <= 1.0 {
            let mut w = -1.0;
            while w <= 1.0 {
                let d = ResonanceEvaluator::dissonance(v, w);
                assert!((0.0..=1.0).contains(&d), "d={d} for ({v},{w})");
                w += 0.125;
            }
            v += 0.125;
        }
        assert_eq!(ResonanceEvaluator::dissonance(1.0, -1.0), 1.0);
        assert_eq!(ResonanceEvaluator::dissonance(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_vibe_quadrants() {
        assert_eq!(
            ResonanceEvaluator::vibe(0.8, 0.8),
            "Anthemic Joy (Aligned)"
        );
        assert_eq!(
            ResonanceEvaluator::vibe(-0.8, -0.8),
            "Dark/Depressive (Aligned)"
        );
        assert_eq!(
            ResonanceEvaluator::vibe(0.8, -0.8),
            "Bittersweet / Melancholy (High Dissonance)"
        );
        assert_eq!(
            ResonanceEvaluator::vibe(-0.8, 0.8),
            "Angsty Banger (High Dissonance)"
        );
        assert_eq!(ResonanceEvaluator::vibe(0.1, 0.1), "Neutral / Ambiguous");
        // Threshold is strict: exactly 0.3 stays ambiguous
        assert_eq!(ResonanceEvaluator::vibe(0.3, 0.3), "Neutral / Ambiguous");
    }

    #[test]
    fn test_vibe_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                ResonanceEvaluator::vibe(0.55, -0.62),
                "Bittersweet / Melancholy (High Dissonance)"
            );
        }
    }

    #[test]
    fn test_evaluate_with_full_prerequisites() {
        let mut creative = StagePayload::new();
        creative.insert("sentiment".into(), json!("POSITIVE"));
        creative.insert("positive_score".into(), json!(0.95));
        creative.insert("negative_score".into(), json!(0.05));
        creative.insert("embedding".into(), json!(vec![3.0; 100])); // norm 30

        let payload = evaluator().evaluate(Some(&creative));
        assert_eq!(payload["status"], json!("success"));
        let d = payload["dissonance_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&d));
        assert_eq!(payload["lyrical_sentiment"], json!("POSITIVE"));
        assert!(payload["audio_valence"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_evaluate_skips_without_embedding() {
        let mut creative = StagePayload::new();
        creative.insert("sentiment".into(), json!("POSITIVE"));
        creative.insert("positive_score".into(), json!(0.9));
        creative.insert("negative_score".into(), json!(0.1));

        let payload = evaluator().evaluate(Some(&creative));
        assert_eq!(payload["status"], json!("skipped"));
        assert_eq!(payload["vibe"], json!("Neutral"));
        assert_eq!(payload["lyrical_sentiment"], json!("Unknown"));
    }

    #[test]
    fn test_evaluate_skips_without_creative() {
        let payload = evaluator().evaluate(None);
        assert_eq!(payload["status"], json!("skipped"));
        assert_eq!(payload["dissonance_score"], json!(0.0));
    }
}
