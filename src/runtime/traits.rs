//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the quiz engine and dispatcher with mock
//! implementations.

use crate::db::{DbError, DbResult, UserId, WordPair};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Repository
// ============================================================================

/// Repository failure as seen by the quiz engine
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Storage call timed out after {0:?}")]
    TimedOut(Duration),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Word already exists: {0}")]
    DuplicateWord(WordPair),
}

impl From<DbError> for RepoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound(identity) => RepoError::UserNotFound(identity),
            DbError::DuplicateWord(pair) => RepoError::DuplicateWord(pair),
            other @ (DbError::Sqlite(_) | DbError::LockPoisoned) => {
                RepoError::Storage(other.to_string())
            }
        }
    }
}

/// Persistence for the word pools and users
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// The global pool in insertion order
    async fn list_global_words(&self) -> Result<Vec<WordPair>, RepoError>;

    /// Global pool followed by the user's own pairs
    async fn list_user_words(&self, identity: UserId) -> Result<Vec<WordPair>, RepoError>;

    /// Idempotent; returns `true` when the user was newly created
    async fn add_user(&self, identity: UserId, display_name: &str) -> Result<bool, RepoError>;

    async fn add_user_word(&self, identity: UserId, pair: &WordPair) -> Result<(), RepoError>;

    /// Removes the user's own pair with this translation; returns the count removed
    async fn delete_user_word(&self, identity: UserId, target_text: &str)
        -> Result<usize, RepoError>;

    /// Identities of all registered users
    async fn list_user_ids(&self) -> Result<Vec<UserId>, RepoError>;
}

// ============================================================================
// Transport
// ============================================================================

/// One inbound message from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub identity: UserId,
    pub display_name: String,
    pub payload: String,
}

impl InboundEvent {
    pub fn new(
        identity: UserId,
        display_name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            payload: payload.into(),
        }
    }
}

/// One outbound message. `buttons: None` leaves the user's current keyboard as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<String>>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: None,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<String>) -> Self {
        self.buttons = Some(buttons);
        self
    }
}

/// Transport error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Api, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connectivity, timeouts, 5xx, rate limits - retryable
    Network,
    /// Rejected by the platform (4xx)
    Api,
    /// Response could not be parsed
    Decode,
}

impl TransportErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network)
    }
}

/// Messaging platform: receives batches of events and sends replies
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next batch of inbound events (may be empty)
    async fn poll(&self) -> Result<Vec<InboundEvent>, TransportError>;

    async fn send_message(
        &self,
        identity: UserId,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: WordRepository + ?Sized> WordRepository for Arc<T> {
    async fn list_global_words(&self) -> Result<Vec<WordPair>, RepoError> {
        (**self).list_global_words().await
    }

    async fn list_user_words(&self, identity: UserId) -> Result<Vec<WordPair>, RepoError> {
        (**self).list_user_words(identity).await
    }

    async fn add_user(&self, identity: UserId, display_name: &str) -> Result<bool, RepoError> {
        (**self).add_user(identity, display_name).await
    }

    async fn add_user_word(&self, identity: UserId, pair: &WordPair) -> Result<(), RepoError> {
        (**self).add_user_word(identity, pair).await
    }

    async fn delete_user_word(
        &self,
        identity: UserId,
        target_text: &str,
    ) -> Result<usize, RepoError> {
        (**self).delete_user_word(identity, target_text).await
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, RepoError> {
        (**self).list_user_ids().await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn poll(&self) -> Result<Vec<InboundEvent>, TransportError> {
        (**self).poll().await
    }

    async fn send_message(
        &self,
        identity: UserId,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        (**self).send_message(identity, message).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;

/// Default bound on a single storage call
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Adapter to use Database as `WordRepository`.
///
/// Each call runs on the blocking pool so a slow disk never stalls other
/// users' handlers, and is bounded by `timeout`.
#[derive(Clone)]
pub struct DatabaseRepository {
    db: Database,
    timeout: Duration,
}

impl DatabaseRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, RepoError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        let task = tokio::task::spawn_blocking(move || f(&db));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result.map_err(|e| {
                if matches!(e, DbError::Sqlite(_) | DbError::LockPoisoned) {
                    tracing::error!(op, error = %e, "Storage call failed");
                }
                RepoError::from(e)
            }),
            Ok(Err(join_err)) => {
                tracing::error!(op, error = %join_err, "Storage task aborted");
                Err(RepoError::Storage(join_err.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    op,
                    timeout_ms = %self.timeout.as_millis(),
                    "Storage call timed out"
                );
                Err(RepoError::TimedOut(self.timeout))
            }
        }
    }
}

#[async_trait]
impl WordRepository for DatabaseRepository {
    async fn list_global_words(&self) -> Result<Vec<WordPair>, RepoError> {
        self.run("list_global_words", Database::list_global_words).await
    }

    async fn list_user_words(&self, identity: UserId) -> Result<Vec<WordPair>, RepoError> {
        self.run("list_user_words", move |db| db.list_user_words(identity))
            .await
    }

    async fn add_user(&self, identity: UserId, display_name: &str) -> Result<bool, RepoError> {
        let display_name = display_name.to_string();
        let inserted = self
            .run("add_user", move |db| db.add_user(identity, &display_name))
            .await?;
        if inserted {
            tracing::info!(identity, "User registered");
        } else {
            tracing::debug!(identity, "User already registered");
        }
        Ok(inserted)
    }

    async fn add_user_word(&self, identity: UserId, pair: &WordPair) -> Result<(), RepoError> {
        let pair = pair.clone();
        self.run("add_user_word", move |db| db.add_user_word(identity, &pair))
            .await
    }

    async fn delete_user_word(
        &self,
        identity: UserId,
        target_text: &str,
    ) -> Result<usize, RepoError> {
        let target_text = target_text.to_string();
        self.run("delete_user_word", move |db| {
            db.delete_user_word(identity, &target_text)
        })
        .await
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, RepoError> {
        self.run("list_user_ids", Database::list_user_ids).await
    }
}
