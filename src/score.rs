//! Positivity scoring.
//!
//! The pipeline only depends on the [`Scorer`] contract: pure, deterministic,
//! every component bounded to [-1, 1]. The default implementation is a small
//! valence-lexicon analyzer with a negation window; it keeps two sub-scores
//! (a normalized intensity and a mean polarity) so the persisted composite
//! matches the legacy schema. Scoring accuracy is explicitly not a goal —
//! swap in a smarter `Scorer` if you care.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../valence_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid valence lexicon")
});

/// Composite score for one headline. All components are in [-1, 1].
/// Sub-score names follow the persisted JSON schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub mean: f64,
    pub vader: f64,
    pub textblob: f64,
}

/// Pure text → bounded score. Implementations must be deterministic for
/// identical input and must not fail.
pub trait Scorer: Send + Sync {
    fn score(&self, text: &str) -> ScoreBreakdown;
}

#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }
}

impl Scorer for LexiconScorer {
    fn score(&self, text: &str) -> ScoreBreakdown {
        let tokens: Vec<String> = tokenize(text).collect();

        let mut sum: i32 = 0;
        let mut matched: u32 = 0;
        let mut polarity_sum: f64 = 0.0;

        for i in 0..tokens.len() {
            let base = *LEXICON.get(tokens[i].as_str()).unwrap_or(&0);
            if base == 0 {
                continue;
            }
            // A negator within the previous three tokens flips the sign.
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            let adj = if negated { -base } else { base };

            sum += adj;
            matched += 1;
            polarity_sum += f64::from(adj) / 3.0;
        }

        // Intensity: the usual sum / sqrt(sum^2 + alpha) squashing, keeping
        // strong multi-word headlines away from saturation.
        let s = f64::from(sum);
        let vader = s / (s * s + 15.0).sqrt();

        // Polarity: mean valence of matched words only, zero when nothing
        // matched.
        let textblob = if matched > 0 {
            (polarity_sum / f64::from(matched)).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        ScoreBreakdown {
            mean: (vader + textblob) / 2.0,
            vader,
            textblob,
        }
    }
}

/// Apostrophes survive tokenization so contractions ("won't") stay distinct
/// from lexicon words ("won").
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
    )
}
