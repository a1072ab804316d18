//! Quiz error types

use crate::db::{UserId, WordPair};
use crate::runtime::RepoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Not enough words for a quiz: {available} of {required}")]
    InsufficientVocabulary { available: usize, required: usize },
    #[error("No active question")]
    NoActiveQuestion,
    #[error("Not in the add-word dialog")]
    NotInAddFlow,
    #[error("Word text must not be empty")]
    EmptyText,
    #[error("Word already exists: {0}")]
    DuplicateWord(WordPair),
}

impl QuizError {
    /// Failures of the storage layer, as opposed to user-facing flow errors
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, QuizError::Storage(_) | QuizError::UserNotFound(_))
    }
}

impl From<RepoError> for QuizError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UserNotFound(identity) => QuizError::UserNotFound(identity),
            RepoError::DuplicateWord(pair) => QuizError::DuplicateWord(pair),
            other @ (RepoError::Storage(_) | RepoError::TimedOut(_)) => {
                QuizError::Storage(other.to_string())
            }
        }
    }
}
