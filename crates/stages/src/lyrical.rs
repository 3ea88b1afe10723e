//! Lyric analysis stage - lexicon sentiment, imagery and structure
//!
//! Skipped entirely when the submission carries no lyrics text.

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use contracts::{AnalysisStage, Category, ContractError, InputResource, JobMetadata, StagePayload};

const CONCRETE_NOUNS: &[&str] = &[
    "water", "blood", "light", "neon", "skin", "bone", "glass", "metal", "stone", "fire", "rain",
    "car", "street", "ocean", "tide", "floor", "door", "window", "knife", "gun", "breath", "smoke",
    "ash", "dust", "gold", "silver", "chrome", "wire", "body", "face", "eye", "hand", "lip",
    "mouth", "tooth", "teeth", "sun", "moon", "star", "sky", "cloud", "storm", "wave", "shore",
    "sand", "ice", "snow", "wind", "shadow", "mirror", "screen", "pixel", "static", "saltwater",
    "flash", "pulse", "abyss", "undertow", "pressure", "void",
];

const ABSTRACT_CONCEPTS: &[&str] = &[
    "love", "hate", "soul", "mind", "dream", "hope", "fear", "faith", "truth", "lie", "time",
    "memory", "thought", "feeling", "heart", "spirit", "life", "death", "eternity", "forever",
    "nothing", "everything", "reason", "doubt", "pain", "joy", "sorrow", "regret", "threat",
    "permission", "warning",
];

const POSITIVE_WORDS: &[&str] = &[
    "happy", "joy", "joyful", "love", "light", "shine", "alive", "dream", "gold", "sun", "high",
    "fly", "smile", "dance", "free", "sweet", "heaven", "bright", "hope", "star", "glow", "warm",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "cry", "tear", "tears", "dark", "death", "kill", "blood", "pain", "hate", "cold",
    "alone", "lost", "gone", "fear", "break", "burn", "grave", "void", "empty", "scream", "hurt",
];

const MOOD_LEXICON: &[(&str, &[&str])] = &[
    (
        "dark",
        &[
            "black", "dark", "night", "shadow", "void", "abyss", "grave", "death", "kill", "blood",
        ],
    ),
    (
        "euphoric",
        &[
            "light", "sun", "sky", "high", "fly", "dream", "star", "gold", "shine", "alive",
        ],
    ),
    (
        "aggressive",
        &[
            "fight", "burn", "fire", "break", "cut", "scream", "hate", "enemy", "war",
        ],
    ),
    (
        "melancholic",
        &[
            "cry", "tear", "rain", "blue", "cold", "alone", "miss", "lost", "gone",
        ],
    ),
];

const EXPLICIT_KEYWORDS: &[&str] = &["explicit", "profanity"];

/// Text analysis of optional lyrics.
#[derive(Debug, Default)]
pub struct LyricalStage;

impl LyricalStage {
    pub fn new() -> Self {
        Self
    }

    fn clean_words(text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|w| {
                w.chars()
                    .filter(|c| c.is_alphanumeric() || *c == '\'')
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// Laplace-smoothed positive-class probability from lexicon hits.
    fn sentiment_scores(words: &[String]) -> (f64, f64) {
        let pos = words
            .iter()
            .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
            .count() as f64;
        let neg = words
            .iter()
            .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
            .count() as f64;
        let positive = (pos + 1.0) / (pos + neg + 2.0);
        (positive, 1.0 - positive)
    }

    /// Last `n` characters of a word (char-safe).
    fn suffix(word: &str, n: usize) -> String {
        let chars: Vec<char> = word.chars().collect();
        chars[chars.len().saturating_sub(n)..].iter().collect()
    }

    /// Crude end-rhyme count over consecutive lines.
    fn count_rhymes(lines: &[&str]) -> usize {
        let last_words: Vec<String> = lines
            .iter()
            .filter_map(|line| Self::clean_words(line).into_iter().next_back())
            .collect();

        last_words
            .windows(2)
            .filter(|pair| {
                let (a, b) = (&pair[0], &pair[1]);
                let (la, lb) = (a.chars().count(), b.chars().count());
                if la > 2 && lb > 2 && Self::suffix(a, 3) == Self::suffix(b, 3) {
                    true
                } else {
                    la >= 2 && la < 4 && lb >= 2 && Self::suffix(a, 2) == Self::suffix(b, 2)
                }
            })
            .count()
    }

    fn dominant_moods(words: &[String]) -> Vec<String> {
        let mut hits: Vec<(&str, usize)> = MOOD_LEXICON
            .iter()
            .map(|(mood, keywords)| {
                let count = words
                    .iter()
                    .filter(|w| keywords.contains(&w.as_str()))
                    .count();
                (*mood, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits.into_iter().take(2).map(|(m, _)| m.to_string()).collect()
    }

    fn detect_code_switching(words: &[String]) -> (bool, Vec<&'static str>, usize) {
        let spanish = ["amor", "corazon", "noche", "fuego", "vida"];
        let es_hits = words
            .iter()
            .filter(|w| spanish.contains(&w.as_str()))
            .count();
        if es_hits > 0 && words.len() > es_hits {
            (true, vec!["en", "es"], es_hits)
        } else {
            (false, vec!["en"], 0)
        }
    }
}

#[async_trait]
impl AnalysisStage for LyricalStage {
    fn name(&self) -> &str {
        "lyric_analysis"
    }

    fn category(&self) -> Category {
        Category::Creative
    }

    fn ready(&self, metadata: &JobMetadata) -> bool {
        metadata.lyrics_text().is_some()
    }

    #[instrument(name = "lyric_analysis_run", skip_all)]
    async fn run(
        &self,
        _input: &InputResource,
        metadata: &JobMetadata,
    ) -> Result<StagePayload, ContractError> {
        let text = metadata
            .lyrics_text()
            .ok_or_else(|| ContractError::stage_failed(self.name(), "lyrics absent"))?;

        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let words = Self::clean_words(text);
        let total_words = words.len().max(1);

        let concrete = words
            .iter()
            .filter(|w| CONCRETE_NOUNS.contains(&w.as_str()))
            .count();
        let abstract_count = words
            .iter()
            .filter(|w| ABSTRACT_CONCEPTS.contains(&w.as_str()))
            .count();
        let visual_density = concrete as f64 / total_words as f64 * 100.0;

        let rhymes = Self::count_rhymes(&lines);
        let rhyme_density = if lines.is_empty() {
            0.0
        } else {
            rhymes as f64 / lines.len() as f64 * 10.0
        };

        let (positive_score, negative_score) = Self::sentiment_scores(&words);
        let sentiment = if positive_score >= 0.5 {
            "POSITIVE"
        } else {
            "NEGATIVE"
        };

        let flagged: Vec<&str> = EXPLICIT_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| words.iter().any(|w| w.as_str() == *kw))
            .collect();
        let explicitness = flagged.len() as f64 / total_words as f64;

        let (code_switched, languages, switch_points) = Self::detect_code_switching(&words);

        let mut payload = StagePayload::new();
        payload.insert("sentiment".into(), json!(sentiment));
        payload.insert("positive_score".into(), json!(positive_score));
        payload.insert("negative_score".into(), json!(negative_score));
        payload.insert("visual_density_score".into(), json!(visual_density));
        payload.insert("concrete_noun_count".into(), json!(concrete));
        payload.insert("abstract_concept_count".into(), json!(abstract_count));
        payload.insert("rhyme_density_score".into(), json!(rhyme_density));
        payload.insert("dominant_moods".into(), json!(Self::dominant_moods(&words)));
        payload.insert("explicitness_score".into(), json!(explicitness));
        payload.insert("has_taboo_content".into(), json!(explicitness > 0.0));
        payload.insert("flagged_terms".into(), json!(flagged));
        payload.insert("is_code_switched".into(), json!(code_switched));
        payload.insert("languages".into(), json!(languages));
        payload.insert("switch_points".into(), json!(switch_points));
        payload.insert(
            "stats".into(),
            json!({ "lines": lines.len(), "words": words.len() }),
        );
        Ok(payload)
    }
}
