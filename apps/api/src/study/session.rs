//! Study session state machine.
//!
//! Phases: NotStarted → Loading → Active → Finished, with a parallel Error
//! phase reachable from Loading. Single logical thread of control: the one
//! suspension point is the deck load; every other transition is a synchronous
//! state replacement driven by a user action.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::models::flashcard::FlashcardDto;

/// A session reviews at most this many of the newest cards.
pub const SESSION_DECK_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Loading,
    Active,
    Finished,
    Error,
}

/// Self-assessed difficulty. Accepted by the interface but deliberately
/// discarded: in this MVP a rating only advances the deck pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Easy,
    Hard,
    Again,
}

#[derive(Debug, Error)]
pub enum CardSourceError {
    /// Session expired or missing. The caller leaves the study view entirely;
    /// the machine never renders this as an in-session error.
    #[error("not authenticated")]
    Unauthorized,

    #[error("{0}")]
    Other(String),
}

/// Collaborator that supplies the deck. The production implementation is
/// [`crate::study::http_source::HttpCardSource`]; tests use in-memory mocks.
#[async_trait]
pub trait CardSource {
    /// Up to `limit` flashcards, newest first.
    async fn recent_cards(&self, limit: i64) -> Result<Vec<FlashcardDto>, CardSourceError>;
}

pub struct StudySession {
    cards: Vec<FlashcardDto>,
    current_index: usize,
    phase: SessionPhase,
    answer_revealed: bool,
    error: Option<String>,
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StudySession {
    pub fn new() -> Self {
        StudySession {
            cards: Vec::new(),
            current_index: 0,
            phase: SessionPhase::NotStarted,
            answer_revealed: false,
            error: None,
        }
    }

    /// Fetches and shuffles the deck. An empty result still lands in
    /// `NotStarted` (the caller distinguishes "no cards" by `total_cards`).
    /// `Unauthorized` propagates to the caller; any other failure becomes the
    /// `Error` phase with a human-readable message.
    pub async fn load(&mut self, source: &dyn CardSource) -> Result<(), CardSourceError> {
        self.phase = SessionPhase::Loading;
        self.error = None;

        let cards = match source.recent_cards(SESSION_DECK_LIMIT).await {
            Ok(cards) => cards,
            Err(CardSourceError::Unauthorized) => return Err(CardSourceError::Unauthorized),
            Err(CardSourceError::Other(message)) => {
                self.phase = SessionPhase::Error;
                self.error = Some(message);
                return Ok(());
            }
        };

        self.cards = cards;
        self.cards.shuffle(&mut rand::thread_rng());
        self.current_index = 0;
        self.answer_revealed = false;
        self.phase = SessionPhase::NotStarted;
        Ok(())
    }

    /// User-initiated `NotStarted → Active`.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::NotStarted {
            return;
        }
        self.phase = SessionPhase::Active;
        self.current_index = 0;
        self.answer_revealed = false;
    }

    /// Flips the reveal flag. Meaningful only while active.
    pub fn toggle_answer(&mut self) {
        if self.phase == SessionPhase::Active {
            self.answer_revealed = !self.answer_revealed;
        }
    }

    /// Records nothing and advances. Rating persistence is an explicit
    /// non-goal; do not add scheduling logic here.
    pub fn rate(&mut self, _rating: Rating) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.advance();
    }

    fn advance(&mut self) {
        let next_index = self.current_index + 1;
        if next_index >= self.cards.len() {
            self.phase = SessionPhase::Finished;
            return;
        }
        self.current_index = next_index;
        self.answer_revealed = false;
    }

    /// Re-enters `Active` over the already-loaded deck with a fresh shuffle.
    /// No re-fetch: functionally a new session over the same cards.
    pub fn restart(&mut self) {
        if self.phase != SessionPhase::Finished {
            return;
        }
        self.cards.shuffle(&mut rand::thread_rng());
        self.current_index = 0;
        self.answer_revealed = false;
        self.phase = SessionPhase::Active;
    }

    /// Re-runs the load. Only valid from the `Error` phase.
    pub async fn retry(&mut self, source: &dyn CardSource) -> Result<(), CardSourceError> {
        if self.phase != SessionPhase::Error {
            return Ok(());
        }
        self.load(source).await
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_card(&self) -> Option<&FlashcardDto> {
        self.cards.get(self.current_index)
    }

    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    /// 1-based position for display.
    pub fn current_card_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn is_answer_revealed(&self) -> bool {
        self.answer_revealed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Deterministic shuffle entry point for tests.
    #[cfg(test)]
    fn shuffle_with<R: rand::Rng>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    fn card(id: i64) -> FlashcardDto {
        FlashcardDto {
            id,
            generation_id: None,
            front: format!("front {id}"),
            back: format!("back {id}"),
            source: "manual".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct FixedSource(Vec<FlashcardDto>);

    #[async_trait]
    impl CardSource for FixedSource {
        async fn recent_cards(&self, limit: i64) -> Result<Vec<FlashcardDto>, CardSourceError> {
            Ok(self.0.iter().take(limit as usize).cloned().collect())
        }
    }

    /// Pops one scripted response per call.
    struct ScriptedSource(Mutex<Vec<Result<Vec<FlashcardDto>, CardSourceError>>>);

    #[async_trait]
    impl CardSource for ScriptedSource {
        async fn recent_cards(&self, _limit: i64) -> Result<Vec<FlashcardDto>, CardSourceError> {
            self.0.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_load_empty_deck_lands_in_not_started() {
        let mut session = StudySession::new();
        session.load(&FixedSource(vec![])).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.total_cards(), 0);
        assert!(session.current_card().is_none());
    }

    #[tokio::test]
    async fn test_load_caps_deck_at_session_limit() {
        let cards: Vec<_> = (0..150).map(card).collect();
        let mut session = StudySession::new();
        session.load(&FixedSource(cards)).await.unwrap();
        assert_eq!(session.total_cards(), SESSION_DECK_LIMIT as usize);
    }

    #[tokio::test]
    async fn test_load_shuffles_a_permutation() {
        let cards: Vec<_> = (0..50).map(card).collect();
        let mut session = StudySession::new();
        session.load(&FixedSource(cards.clone())).await.unwrap();

        let mut loaded_ids: Vec<i64> = session.cards.iter().map(|c| c.id).collect();
        loaded_ids.sort_unstable();
        let expected: Vec<i64> = (0..50).collect();
        assert_eq!(loaded_ids, expected, "shuffle must preserve the multiset");
    }

    #[test]
    fn test_seeded_shuffle_reorders() {
        let mut session = StudySession::new();
        session.cards = (0..50).map(card).collect();
        let before: Vec<i64> = session.cards.iter().map(|c| c.id).collect();

        let mut rng = StdRng::seed_from_u64(7);
        session.shuffle_with(&mut rng);
        let after: Vec<i64> = session.cards.iter().map(|c| c.id).collect();

        assert_ne!(before, after);
        let mut sorted = after.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, before);
    }

    #[tokio::test]
    async fn test_three_card_session_phase_sequence() {
        let mut session = StudySession::new();
        session
            .load(&FixedSource((0..3).map(card).collect()))
            .await
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::NotStarted);

        session.start();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.current_card_number(), 1);

        session.toggle_answer();
        assert!(session.is_answer_revealed());

        session.rate(Rating::Easy);
        assert_eq!(session.current_card_number(), 2);
        assert!(!session.is_answer_revealed(), "reveal resets after rating");

        session.toggle_answer();
        session.rate(Rating::Hard);
        assert_eq!(session.current_card_number(), 3);
        assert!(!session.is_answer_revealed());

        session.rate(Rating::Again);
        assert_eq!(session.phase(), SessionPhase::Finished);
    }

    #[tokio::test]
    async fn test_rating_outside_active_is_a_no_op() {
        let mut session = StudySession::new();
        session
            .load(&FixedSource((0..2).map(card).collect()))
            .await
            .unwrap();

        session.rate(Rating::Easy); // still NotStarted
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.current_card_number(), 1);

        session.toggle_answer(); // reveal is also gated on Active
        assert!(!session.is_answer_revealed());
    }

    #[tokio::test]
    async fn test_restart_reenters_active_without_refetch() {
        let mut session = StudySession::new();
        session
            .load(&FixedSource((0..2).map(card).collect()))
            .await
            .unwrap();
        session.start();
        session.rate(Rating::Easy);
        session.rate(Rating::Easy);
        assert_eq!(session.phase(), SessionPhase::Finished);

        session.restart();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.current_card_number(), 1);
        assert_eq!(session.total_cards(), 2);
        assert!(!session.is_answer_revealed());
    }

    #[tokio::test]
    async fn test_load_failure_enters_error_and_retry_recovers() {
        let source = ScriptedSource(Mutex::new(vec![
            Err(CardSourceError::Other("could not load flashcards".to_string())),
            Ok((0..2).map(card).collect()),
        ]));

        let mut session = StudySession::new();
        session.load(&source).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Error);
        assert_eq!(session.error(), Some("could not load flashcards"));

        session.retry(&source).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.total_cards(), 2);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_propagates_to_caller() {
        let source = ScriptedSource(Mutex::new(vec![Err(CardSourceError::Unauthorized)]));
        let mut session = StudySession::new();
        let result = session.load(&source).await;
        assert!(matches!(result, Err(CardSourceError::Unauthorized)));
        // Not an in-session error: the caller redirects instead.
        assert!(session.error().is_none());
    }
}
