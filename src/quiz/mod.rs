//! # Quiz Game
//!
//! The game mode: the learner gets a shuffled list of prompts for one
//! language, answers each one by speaking, and ends with an average score.
//!
//! ## Key Components:
//! - **QuizBank**: The static question dataset (CSV: `lang,question,answer`)
//! - **QuizSession**: Round-by-round state machine for one learner
//! - **QuizStore**: Registry of live sessions, keyed by session id
//!
//! ## Round Lifecycle:
//! 1. **NotStarted**: Questions loaded and shuffled
//! 2. **InRound(n)**: Question n is shown
//! 3. **AwaitingAnswer(n)**: Recording submitted, waiting for transcription/scoring
//! 4. **RoundScored(n)**: A score is available for the round (retries replace it)
//! 5. **Finished**: Every round advanced; average score available until reset

pub mod bank;      // CSV question dataset
pub mod session;   // Per-learner state machine
pub mod store;     // Live session registry

pub use bank::{BankError, QuizBank, QuizQuestion};
pub use session::{QuizSession, QuizSnapshot};
pub use store::QuizStore;

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by quiz state transitions and the session registry.
#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("no quiz questions available for {locale}")]
    NoQuestionsAvailable { locale: String },

    #[error("cannot {action} while the quiz is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("the quiz is already finished")]
    Finished,

    #[error("round {submitted} is over, the quiz is on round {current}")]
    StaleRound { submitted: usize, current: usize },

    #[error("quiz session {0} not found")]
    UnknownSession(Uuid),

    #[error("maximum concurrent quiz sessions ({max}) reached")]
    Capacity { max: usize },
}
