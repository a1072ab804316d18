//! Session store
//!
//! Process-local mapping from user identity to dialog state. Nothing here is
//! persisted; a restart drops every user back to `Idle`.

use crate::db::UserId;
use crate::quiz::SessionState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for per-user session state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state, `Idle` if none. Registers the identity as known.
    async fn get(&self, identity: UserId) -> SessionState;

    /// Replace the state atomically
    async fn set(&self, identity: UserId, state: SessionState);

    /// Whether the identity has been seen by this process
    async fn is_known(&self, identity: UserId) -> bool;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, identity: UserId) -> SessionState {
        (**self).get(identity).await
    }

    async fn set(&self, identity: UserId, state: SessionState) {
        (**self).set(identity, state).await;
    }

    async fn is_known(&self, identity: UserId) -> bool {
        (**self).is_known(identity).await
    }
}

/// In-memory session store backed by a `HashMap` under a `RwLock`.
///
/// Entries are only ever replaced whole, so one user's update never touches
/// another user's state. Ordering of updates for a single user is provided by
/// the per-user actor in `runtime`.
#[derive(Default)]
pub struct InMemorySessionStore {
    states: RwLock<HashMap<UserId, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register identities loaded from storage
    pub fn with_known(identities: impl IntoIterator<Item = UserId>) -> Self {
        let states = identities
            .into_iter()
            .map(|identity| (identity, SessionState::Idle))
            .collect();
        Self {
            states: RwLock::new(states),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, identity: UserId) -> SessionState {
        if let Some(state) = self.states.read().await.get(&identity) {
            return state.clone();
        }
        let mut states = self.states.write().await;
        let state = states.entry(identity).or_default().clone();
        tracing::debug!(identity, "New session");
        state
    }

    async fn set(&self, identity: UserId, state: SessionState) {
        tracing::debug!(identity, state = state.name(), "Session state updated");
        self.states.write().await.insert(identity, state);
    }

    async fn is_known(&self, identity: UserId) -> bool {
        self.states.read().await.contains_key(&identity)
    }
}
