//! # Quiz Session State Machine
//!
//! One learner's pass through a shuffled list of questions.
//!
//! ## State Transitions:
//! ```text
//! NotStarted --start--> InRound(1)
//! InRound(n) | RoundScored(n) --await_answer--> AwaitingAnswer(n)
//! AwaitingAnswer(n) --abandon_answer--> InRound(n) | RoundScored(n)
//! InRound(n) | AwaitingAnswer(n) | RoundScored(n) --record_score--> RoundScored(n)
//! any round state --advance--> InRound(n + 1) | Finished
//! any state --reset--> NotStarted (reshuffled)
//! ```
//!
//! ## Scoring rule:
//! The cumulative score only changes in `advance`. It adds the round's latest
//! recorded score, or an explicit zero when the learner moved on without a
//! scored attempt. A score recorded before a retry stays in effect until the
//! retry produces a new one.

use crate::languages::Language;
use crate::quiz::{QuizError, QuizQuestion};
use crate::scoring::MatchScore;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Where a session is in its lifecycle. Round numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizPhase {
    NotStarted,
    InRound { round: usize },
    AwaitingAnswer {
        round: usize,
        last_score: Option<MatchScore>,
    },
    RoundScored { round: usize, score: MatchScore },
    Finished,
}

impl QuizPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizPhase::NotStarted => "not_started",
            QuizPhase::InRound { .. } => "in_round",
            QuizPhase::AwaitingAnswer { .. } => "awaiting_answer",
            QuizPhase::RoundScored { .. } => "round_scored",
            QuizPhase::Finished => "finished",
        }
    }

    /// The active round, if the session is inside one.
    pub fn round(&self) -> Option<usize> {
        match self {
            QuizPhase::InRound { round }
            | QuizPhase::AwaitingAnswer { round, .. }
            | QuizPhase::RoundScored { round, .. } => Some(*round),
            QuizPhase::NotStarted | QuizPhase::Finished => None,
        }
    }
}

/// Mutable quiz state for one learner.
#[derive(Debug, Clone)]
pub struct QuizSession {
    language: Language,
    ordering: Vec<QuizQuestion>,
    current_index: usize,
    round_number: usize,
    cumulative_score: f64,
    phase: QuizPhase,
}

impl QuizSession {
    /// Create a session over `questions`, shuffled with `rng`.
    ///
    /// ## Errors:
    /// `NoQuestionsAvailable` when `questions` is empty; no round can be entered.
    pub fn new<R: Rng + ?Sized>(
        language: Language,
        mut questions: Vec<QuizQuestion>,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestionsAvailable {
                locale: language.locale().to_string(),
            });
        }

        questions.shuffle(rng);
        Ok(Self {
            language,
            ordering: questions,
            current_index: 0,
            round_number: 1,
            cumulative_score: 0.0,
            phase: QuizPhase::NotStarted,
        })
    }

    /// Enter the first round.
    pub fn start(&mut self) -> Result<(), QuizError> {
        match self.phase {
            QuizPhase::NotStarted => {
                self.phase = QuizPhase::InRound { round: self.round_number };
                Ok(())
            }
            other => Err(QuizError::InvalidTransition {
                action: "start",
                state: other.as_str(),
            }),
        }
    }

    /// Mark the current round as waiting on an external transcription/score.
    ///
    /// Returns the round number the answer belongs to; pass it back to
    /// [`QuizSession::record_score`] once the result arrives.
    pub fn await_answer(&mut self) -> Result<usize, QuizError> {
        let (round, last_score) = match self.phase {
            QuizPhase::InRound { round } => (round, None),
            QuizPhase::AwaitingAnswer { round, last_score } => (round, last_score),
            QuizPhase::RoundScored { round, score } => (round, Some(score)),
            QuizPhase::Finished => return Err(QuizError::Finished),
            QuizPhase::NotStarted => {
                return Err(QuizError::InvalidTransition {
                    action: "answer",
                    state: "not_started",
                })
            }
        };

        self.phase = QuizPhase::AwaitingAnswer { round, last_score };
        Ok(round)
    }

    /// Give up on the pending answer for `round` (the evaluation failed).
    /// The round goes back to its last recorded score, if it had one.
    ///
    /// Does nothing if the session is no longer waiting on `round`.
    pub fn abandon_answer(&mut self, round: usize) {
        if let QuizPhase::AwaitingAnswer { round: pending, last_score } = self.phase {
            if pending == round {
                self.phase = match last_score {
                    Some(score) => QuizPhase::RoundScored { round, score },
                    None => QuizPhase::InRound { round },
                };
            }
        }
    }

    /// Record the observed score for `round`. A later attempt in the same round
    /// replaces the earlier one.
    ///
    /// ## Errors:
    /// `StaleRound` if the session already moved past `round` (the learner
    /// pressed "next" while the result was in flight).
    pub fn record_score(&mut self, round: usize, score: MatchScore) -> Result<(), QuizError> {
        let current = match self.phase {
            QuizPhase::InRound { round }
            | QuizPhase::AwaitingAnswer { round, .. }
            | QuizPhase::RoundScored { round, .. } => round,
            QuizPhase::Finished => return Err(QuizError::Finished),
            QuizPhase::NotStarted => {
                return Err(QuizError::InvalidTransition {
                    action: "record a score",
                    state: "not_started",
                })
            }
        };

        if current != round {
            return Err(QuizError::StaleRound {
                submitted: round,
                current,
            });
        }

        self.phase = QuizPhase::RoundScored { round, score };
        Ok(())
    }

    /// Close the current round and move to the next one (or finish).
    ///
    /// Returns the score that was committed for the closed round.
    pub fn advance(&mut self) -> Result<MatchScore, QuizError> {
        let committed = match self.phase {
            QuizPhase::RoundScored { score, .. } => score,
            QuizPhase::AwaitingAnswer { last_score, .. } => last_score.unwrap_or(MatchScore::ZERO),
            // Moving on without a scored attempt counts the round as zero.
            QuizPhase::InRound { .. } => MatchScore::ZERO,
            QuizPhase::Finished => return Err(QuizError::Finished),
            QuizPhase::NotStarted => {
                return Err(QuizError::InvalidTransition {
                    action: "advance",
                    state: "not_started",
                })
            }
        };

        self.cumulative_score += committed.value();
        self.round_number += 1;
        self.current_index += 1;

        self.phase = if self.round_number > self.total_rounds() {
            QuizPhase::Finished
        } else {
            QuizPhase::InRound { round: self.round_number }
        };

        Ok(committed)
    }

    /// Reshuffle the same questions and go back to `NotStarted`.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.ordering.shuffle(rng);
        self.current_index = 0;
        self.round_number = 1;
        self.cumulative_score = 0.0;
        self.phase = QuizPhase::NotStarted;
    }

    /// Question for the active round.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.phase.round()?;
        self.ordering.get(self.current_index)
    }

    /// Average over all rounds; only available once the quiz is finished.
    pub fn average_score(&self) -> Option<f64> {
        match self.phase {
            QuizPhase::Finished => Some(self.cumulative_score / self.total_rounds() as f64),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn language(&self) -> Language {
        self.language
    }

    #[cfg(test)]
    pub fn round_number(&self) -> usize {
        self.round_number
    }

    #[cfg(test)]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[cfg(test)]
    pub fn cumulative_score(&self) -> f64 {
        self.cumulative_score
    }

    pub fn total_rounds(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, QuizPhase::Finished)
    }

    #[cfg(test)]
    pub fn ordering(&self) -> &[QuizQuestion] {
        &self.ordering
    }

    /// Serializable view for API responses. The expected answer is left out.
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            language: self.language.name(),
            locale: self.language.locale(),
            phase: self.phase,
            round_number: self.round_number,
            total_rounds: self.total_rounds(),
            prompt: self.current_question().map(|question| question.prompt.clone()),
            cumulative_score: self.cumulative_score,
            average_score: self.average_score(),
            is_complete: self.is_complete(),
        }
    }
}

/// What a client sees of a quiz session.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSnapshot {
    pub language: &'static str,
    pub locale: &'static str,
    pub phase: QuizPhase,
    pub round_number: usize,
    pub total_rounds: usize,
    pub prompt: Option<String>,
    pub cumulative_score: f64,
    pub average_score: Option<f64>,
    pub is_complete: bool,
}
