//! Quiz engine
//!
//! Drives the pure transitions against the session store and repository.
//! Session state is only committed after all storage effects succeed.

use super::question::draw_question;
use super::transition::{self, AddWordStep, AnswerOutcome, Effect, TransitionResult};
use super::{QuizError, Question, SessionState};
use crate::db::{UserId, WordPair};
use crate::runtime::WordRepository;
use crate::session::SessionStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

/// Outcome of deleting the current word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The pair was in the user's own pool and is gone
    Deleted(WordPair),
    /// Nothing removed: the pair belongs to the global pool or was already deleted
    NotOwned(WordPair),
}

pub struct QuizEngine<R, S>
where
    R: WordRepository,
    S: SessionStore,
{
    repo: R,
    sessions: S,
    /// Identities confirmed to exist in storage
    registered: RwLock<HashSet<UserId>>,
    rng: Mutex<StdRng>,
}

impl<R, S> QuizEngine<R, S>
where
    R: WordRepository,
    S: SessionStore,
{
    pub fn new(repo: R, sessions: S) -> Self {
        Self {
            repo,
            sessions,
            registered: RwLock::new(HashSet::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Identities already stored by an earlier run
    pub fn with_registered(self, identities: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            registered: RwLock::new(identities.into_iter().collect()),
            ..self
        }
    }

    /// Use a fixed random source (deterministic tests)
    #[allow(dead_code)] // Used in tests
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Register the user in storage. Returns `true` for a first-time user.
    pub async fn register(
        &self,
        identity: UserId,
        display_name: &str,
    ) -> Result<bool, QuizError> {
        let inserted = self.repo.add_user(identity, display_name).await?;
        self.registered.write().await.insert(identity);
        self.sessions.get(identity).await;
        Ok(inserted)
    }

    /// Register users not yet confirmed in storage; no-op for the rest.
    /// A failed attempt is retried on the user's next message.
    pub async fn ensure_registered(
        &self,
        identity: UserId,
        display_name: &str,
    ) -> Result<(), QuizError> {
        if !self.registered.read().await.contains(&identity) {
            self.register(identity, display_name).await?;
        }
        Ok(())
    }

    pub async fn current_state(&self, identity: UserId) -> SessionState {
        self.sessions.get(identity).await
    }

    /// Effective vocabulary of the user
    pub async fn vocabulary(&self, identity: UserId) -> Result<Vec<WordPair>, QuizError> {
        Ok(self.repo.list_user_words(identity).await?)
    }

    pub async fn start_quiz(&self, identity: UserId) -> Result<Question, QuizError> {
        let vocabulary = self.repo.list_user_words(identity).await?;
        let question = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            draw_question(&vocabulary, &mut *rng)?
        };

        let state = self.sessions.get(identity).await;
        self.commit(identity, transition::pose_question(&state, &question))
            .await?;

        tracing::info!(identity, word = %question.source_text, "Quiz started");
        Ok(question)
    }

    pub async fn submit_answer(
        &self,
        identity: UserId,
        chosen: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        let state = self.sessions.get(identity).await;
        let outcome = self
            .commit(identity, transition::submit_answer(&state, chosen)?)
            .await?;

        tracing::info!(
            identity,
            correct = matches!(outcome, AnswerOutcome::Correct(_)),
            "Answer checked"
        );
        Ok(outcome)
    }

    pub async fn begin_add_word(&self, identity: UserId) {
        let state = self.sessions.get(identity).await;
        let result = transition::begin_add_word(&state);
        self.sessions.set(identity, result.new_state).await;
        tracing::info!(identity, "Add-word dialog started");
    }

    pub async fn submit_add_word_step(
        &self,
        identity: UserId,
        text: &str,
    ) -> Result<AddWordStep, QuizError> {
        let state = self.sessions.get(identity).await;
        let step = self
            .commit(identity, transition::submit_add_word_step(&state, text)?)
            .await?;

        if let AddWordStep::Completed(pair) = &step {
            tracing::info!(identity, word = %pair, "Word added");
        }
        Ok(step)
    }

    pub async fn delete_current_word(
        &self,
        identity: UserId,
    ) -> Result<DeleteOutcome, QuizError> {
        let state = self.sessions.get(identity).await;
        let result = transition::delete_current_word(&state)?;
        let removed = self.apply_effects(identity, &result.effects).await?;
        let pair = result.outcome;
        self.sessions.set(identity, result.new_state).await;

        if removed > 0 {
            tracing::info!(identity, word = %pair, "Word deleted");
            Ok(DeleteOutcome::Deleted(pair))
        } else {
            tracing::info!(identity, word = %pair, "Nothing to delete in user pool");
            Ok(DeleteOutcome::NotOwned(pair))
        }
    }

    /// Apply effects, then store the new state. On failure the old state stays.
    async fn commit<T>(
        &self,
        identity: UserId,
        result: TransitionResult<T>,
    ) -> Result<T, QuizError> {
        self.apply_effects(identity, &result.effects).await?;
        self.sessions.set(identity, result.new_state).await;
        Ok(result.outcome)
    }

    /// Returns the number of rows affected
    async fn apply_effects(
        &self,
        identity: UserId,
        effects: &[Effect],
    ) -> Result<usize, QuizError> {
        let mut affected = 0;
        for effect in effects {
            affected += match effect {
                Effect::AddUserWord(pair) => {
                    self.repo.add_user_word(identity, pair).await?;
                    1
                }
                Effect::DeleteUserWord(pair) => {
                    self.repo
                        .delete_user_word(identity, &pair.target_text)
                        .await?
                }
            };
        }
        Ok(affected)
    }
}
