//! # Quiz Session Registry
//!
//! Holds the live quiz sessions, one per learner, keyed by a random session id
//! handed to the client when the quiz starts.
//!
//! ## Thread Safety:
//! Sessions live in an `Arc<RwLock<HashMap<..>>>`. Handlers take the lock only
//! to read or mutate a session, never across an external service call, so a
//! slow transcription for one learner does not block anyone else.
//!
//! ## Resource Management:
//! - Enforces the configured maximum number of concurrent sessions
//! - When full, sessions idle for longer than the idle limit are evicted first

use crate::languages::{ChallengeLevel, Language};
use crate::quiz::{QuizError, QuizQuestion, QuizSession, QuizSnapshot};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// A live session plus the learner's settings.
#[derive(Debug, Clone)]
pub struct QuizEntry {
    pub session: QuizSession,
    pub challenge: ChallengeLevel,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Registry of live quiz sessions.
#[derive(Debug, Clone)]
pub struct QuizStore {
    sessions: Arc<RwLock<HashMap<Uuid, QuizEntry>>>,
    max_sessions: usize,
    idle_limit: Duration,
}

impl QuizStore {
    pub fn new(max_sessions: usize, idle_limit: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions,
            idle_limit,
        }
    }

    /// Create and start a session; returns its id and first-round view.
    ///
    /// ## Errors:
    /// - `NoQuestionsAvailable` if `questions` is empty (nothing is stored)
    /// - `Capacity` if the registry is still full after evicting idle sessions
    pub fn create<R: Rng + ?Sized>(
        &self,
        language: Language,
        challenge: ChallengeLevel,
        questions: Vec<QuizQuestion>,
        rng: &mut R,
    ) -> Result<(Uuid, QuizSnapshot), QuizError> {
        let mut session = QuizSession::new(language, questions, rng)?;
        session.start()?;

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.len() >= self.max_sessions {
            let evicted = Self::evict_idle(&mut sessions, Utc::now() - self.idle_limit);
            if evicted > 0 {
                info!(evicted, "Evicted idle quiz sessions");
            }
        }
        if sessions.len() >= self.max_sessions {
            return Err(QuizError::Capacity { max: self.max_sessions });
        }

        let id = Uuid::new_v4();
        let snapshot = session.snapshot();
        let now = Utc::now();
        sessions.insert(
            id,
            QuizEntry {
                session,
                challenge,
                created_at: now,
                last_active: now,
            },
        );
        debug!(session_id = %id, language = %language, "Quiz session created");

        Ok((id, snapshot))
    }

    /// Run `f` against one session under the write lock.
    pub fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut QuizEntry) -> T,
    ) -> Result<T, QuizError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(&id).ok_or(QuizError::UnknownSession(id))?;
        entry.last_active = Utc::now();
        Ok(f(entry))
    }

    /// Copy of a session's state.
    pub fn get(&self, id: Uuid) -> Option<QuizEntry> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(&id).cloned()
    }

    /// Drop a session, handing back its final state.
    pub fn remove(&self, id: Uuid) -> Option<QuizEntry> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    fn evict_idle(sessions: &mut HashMap<Uuid, QuizEntry>, cutoff: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_active >= cutoff);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::session::QuizPhase;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn questions() -> Vec<QuizQuestion> {
        vec![
            QuizQuestion {
                prompt: "How do you say 'please'?".into(),
                expected_answer: "Bitte".into(),
                locale: "de-DE".into(),
            },
            QuizQuestion {
                prompt: "How do you say 'good evening'?".into(),
                expected_answer: "Guten Abend".into(),
                locale: "de-DE".into(),
            },
        ]
    }

    #[test]
    fn created_sessions_start_in_round_one() {
        let store = QuizStore::new(4, Duration::minutes(30));
        let mut rng = StdRng::seed_from_u64(5);
        let (id, snapshot) = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();

        assert_eq!(snapshot.phase, QuizPhase::InRound { round: 1 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().challenge, ChallengeLevel::Normal);
    }

    #[test]
    fn empty_dataset_creates_nothing() {
        let store = QuizStore::new(4, Duration::minutes(30));
        let mut rng = StdRng::seed_from_u64(5);
        let err = store
            .create(Language::Tamil, ChallengeLevel::Hard, Vec::new(), &mut rng)
            .unwrap_err();
        assert_eq!(err, QuizError::NoQuestionsAvailable { locale: "ta-IN".into() });
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_is_enforced() {
        let store = QuizStore::new(1, Duration::minutes(30));
        let mut rng = StdRng::seed_from_u64(5);
        store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();
        let err = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap_err();
        assert_eq!(err, QuizError::Capacity { max: 1 });
    }

    #[test]
    fn idle_sessions_make_room() {
        let store = QuizStore::new(1, Duration::zero());
        let mut rng = StdRng::seed_from_u64(5);
        let (first, _) = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let (second, _) = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();

        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
    }

    #[test]
    fn with_session_mutates_in_place() {
        let store = QuizStore::new(2, Duration::minutes(30));
        let mut rng = StdRng::seed_from_u64(5);
        let (id, _) = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();

        store
            .with_session(id, |entry| entry.session.advance())
            .unwrap()
            .unwrap();
        assert_eq!(store.get(id).unwrap().session.round_number(), 2);
    }

    #[test]
    fn unknown_and_removed_sessions() {
        let store = QuizStore::new(2, Duration::minutes(30));
        let missing = Uuid::new_v4();
        assert_eq!(
            store.with_session(missing, |_| ()).unwrap_err(),
            QuizError::UnknownSession(missing)
        );

        let mut rng = StdRng::seed_from_u64(5);
        let (id, _) = store
            .create(Language::German, ChallengeLevel::Normal, questions(), &mut rng)
            .unwrap();
        assert_eq!(store.remove(id).unwrap().challenge, ChallengeLevel::Normal);
        assert!(store.remove(id).is_none());
    }
}
