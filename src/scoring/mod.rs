//! # Phrase Scoring
//!
//! Decides how closely a spoken (transcribed) phrase matches the phrase the
//! learner was asked to say, and turns that number into a verdict the UI can show.
//!
//! ## Key Components:
//! - **Matcher**: Ratcliff/Obershelp similarity over Unicode characters
//! - **MatchScore**: The similarity as a percentage in [0, 100]
//! - **Verdict**: Excellent / Almost / Incorrect buckets with feedback text
//!
//! ## Case handling:
//! Both phrases are lowercased before comparison, so "Bonjour" and "bonjour"
//! are a perfect match. Punctuation and spacing are compared as-is.

pub mod matcher;   // Longest-matching-block similarity ratio
pub mod verdict;   // Score buckets and feedback messages

pub use matcher::similarity_ratio;
pub use verdict::Verdict;

use serde::Serialize;
use std::fmt;

/// Similarity between an utterance and the expected phrase, as a percentage.
///
/// ## Invariant:
/// The wrapped value is always within [0.0, 100.0]. The only way to build one
/// is through [`MatchScore::new`], which clamps, or [`score`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MatchScore(f64);

impl MatchScore {
    /// A score of zero, used whenever a round has no observed attempt.
    pub const ZERO: MatchScore = MatchScore(0.0);

    #[cfg(test)]
    pub const PERFECT: MatchScore = MatchScore(100.0);

    /// Build a score, clamping into [0, 100]. NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        MatchScore(value.clamp(0.0, 100.0))
    }

    /// The raw percentage.
    pub fn value(self) -> f64 {
        self.0
    }

}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Score an utterance against the expected phrase.
///
/// ## Algorithm:
/// 1. Lowercase both strings
/// 2. Compute the sequence-similarity ratio R = 2 * M / (|utterance| + |expected|)
///    where M is the number of characters in matching blocks
/// 3. Return R * 100, clamped to [0, 100]
///
/// The utterance is the first sequence and the expected phrase the second; the
/// order only affects which blocks win ties, and is fixed here so results are
/// stable across calls.
pub fn score(utterance: &str, expected: &str) -> MatchScore {
    let utterance = utterance.to_lowercase();
    let expected = expected.to_lowercase();

    let ratio = similarity_ratio(&utterance, &expected);
    MatchScore::new(ratio * 100.0)
}

/// Bucket a score into a verdict (`> 85` Excellent, `> 60` Almost, else Incorrect).
pub fn classify(score: MatchScore) -> Verdict {
    Verdict::from_score(score.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_phrases_score_one_hundred() {
        for phrase in ["hello", "Je voudrais un café", "नमस्ते", "a", "  spaced  out  "] {
            assert_eq!(score(phrase, phrase), MatchScore::PERFECT, "phrase: {phrase}");
        }
    }

    #[test]
    fn comparison_ignores_case() {
        let result = score("i want to learn french", "I want to learn French");
        assert_eq!(result.value(), 100.0);
        assert_eq!(classify(result), Verdict::Excellent);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(score("", "good morning").value(), 0.0);
        assert_eq!(score("good morning", "").value(), 0.0);
        assert_eq!(classify(score("", "bonjour")), Verdict::Incorrect);
    }

    #[test]
    fn both_empty_is_a_perfect_match() {
        assert_eq!(score("", ""), MatchScore::PERFECT);
    }

    #[test]
    fn partial_answer_is_incorrect() {
        // 4 matched characters out of 4 + 12: 2 * 4 / 16 = 0.5
        let result = score("good", "Good morning");
        assert!((result.value() - 50.0).abs() < 1e-9);
        assert_eq!(classify(result), Verdict::Incorrect);
    }

    #[test]
    fn near_miss_lands_in_almost() {
        // "learn french" vs "learn frensh": 11 of 12 characters line up
        let result = score("i want to learn frensh", "I want to learn French");
        assert!(result.value() > 85.0, "got {result}");

        let result = score("i want learn", "I want to learn French");
        assert_eq!(classify(result), Verdict::Almost, "got {result}");
    }

    #[test]
    fn scores_stay_in_bounds() {
        let samples = [
            ("", ""),
            ("abc", "xyz"),
            ("ünïcödé", "UNICODE"),
            ("the quick brown fox", "jumps over the lazy dog"),
            ("aaaaaaaaaa", "a"),
        ];
        for (utterance, expected) in samples {
            let value = score(utterance, expected).value();
            assert!((0.0..=100.0).contains(&value), "{utterance:?} vs {expected:?} -> {value}");
        }
    }

    #[test]
    fn match_score_clamps() {
        assert_eq!(MatchScore::new(140.0).value(), 100.0);
        assert_eq!(MatchScore::new(-3.0).value(), 0.0);
        assert_eq!(MatchScore::new(f64::NAN).value(), 0.0);
        assert_eq!(MatchScore::new(42.5).value(), 42.5);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(MatchScore::new(66.666_666).to_string(), "66.67");
    }
}
