use serde::{Deserialize, Serialize};
use std::fmt;

/// Score above which an attempt is `Excellent`.
pub const EXCELLENT_ABOVE: f64 = 85.0;

/// Score above which an attempt is at least `Almost`.
pub const ALMOST_ABOVE: f64 = 60.0;

/// Qualitative bucket for a match score.
///
/// Lower bounds are exclusive: exactly 85 is `Almost`, exactly 60 is `Incorrect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Almost,
    Incorrect,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score > EXCELLENT_ABOVE {
            Verdict::Excellent
        } else if score > ALMOST_ABOVE {
            Verdict::Almost
        } else {
            Verdict::Incorrect
        }
    }

    /// Feedback shown to the learner.
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent!",
            Verdict::Almost => "Almost correct. Try again!",
            Verdict::Incorrect => "Not quite right. Speak clearly and try again.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Excellent => "excellent",
            Verdict::Almost => "almost",
            Verdict::Incorrect => "incorrect",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
