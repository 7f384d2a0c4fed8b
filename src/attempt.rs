//! # Attempt Evaluation
//!
//! One spoken attempt, shared by the practice flow and the quiz: transcribe
//! the recording, score the transcript against the expected phrase and ask
//! for pronunciation metrics.
//!
//! External failures never fail the attempt. A transcription failure yields
//! score 0 and `Incorrect`; an assessment failure leaves the report empty.
//! Both are reported as warnings alongside the result.

use crate::scoring::{self, MatchScore, Verdict};
use crate::services::{PronunciationReport, ServiceError, SpeechServices};
use serde::Serialize;
use tracing::{debug, warn};

/// A non-fatal problem encountered while evaluating an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptWarning {
    pub kind: &'static str,
    pub message: String,
}

impl From<&ServiceError> for AttemptWarning {
    fn from(err: &ServiceError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of evaluating one recording.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcome {
    /// What the learner said, if anything was recognized.
    pub transcript: Option<String>,
    pub expected: String,
    pub score: MatchScore,
    pub verdict: Verdict,
    pub feedback: &'static str,
    pub pronunciation: Option<PronunciationReport>,
    pub warnings: Vec<AttemptWarning>,
}

impl AttemptOutcome {
    pub fn warn(&mut self, kind: &'static str, message: impl Into<String>) {
        self.warnings.push(AttemptWarning {
            kind,
            message: message.into(),
        });
    }
}

/// Evaluate a canonical WAV recording against `expected`, spoken in `locale`.
pub async fn evaluate_attempt(
    services: &SpeechServices,
    wav: &[u8],
    expected: &str,
    locale: &str,
) -> AttemptOutcome {
    let (transcription, assessment) = tokio::join!(
        services.transcriber.transcribe(wav, locale),
        services.assessor.assess(wav, expected, locale),
    );

    let mut warnings = Vec::new();

    let (transcript, score) = match transcription {
        Ok(text) => {
            let score = scoring::score(&text, expected);
            (Some(text), score)
        }
        Err(err) => {
            warn!(locale, error = %err, "Transcription failed, scoring attempt as zero");
            warnings.push(AttemptWarning::from(&err));
            (None, MatchScore::ZERO)
        }
    };

    let pronunciation = match assessment {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(locale, error = %err, "Pronunciation assessment unavailable");
            warnings.push(AttemptWarning::from(&err));
            None
        }
    };

    let verdict = scoring::classify(score);
    debug!(locale, %score, verdict = %verdict, "Attempt evaluated");

    AttemptOutcome {
        transcript,
        expected: expected.to_string(),
        score,
        verdict,
        feedback: verdict.message(),
        pronunciation,
        warnings,
    }
}
