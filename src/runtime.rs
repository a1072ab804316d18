//! Runtime for handling conversations
//!
//! Every identity gets its own actor task, so one user's messages are
//! handled strictly in order while different users proceed concurrently.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::db::UserId;
use crate::dispatcher::Dispatcher;
use crate::session::SessionStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Upper bound for the transport retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Per-user event queue depth
const USER_QUEUE_CAPACITY: usize = 32;

/// Actors with no events for this long shut down
const ACTOR_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Exponential backoff: 1s, 2s, 4s, ... capped at `MAX_RETRY_DELAY`
pub fn retry_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    Duration::from_secs(1 << exponent).min(MAX_RETRY_DELAY)
}

/// Handle to a running conversation actor
struct ActorHandle {
    generation: u64,
    tx: mpsc::Sender<InboundEvent>,
}

type ActorMap = Arc<RwLock<HashMap<UserId, ActorHandle>>>;

/// Manager for all per-user conversation actors
pub struct RuntimeManager<R, S, T>
where
    R: WordRepository + 'static,
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    dispatcher: Arc<Dispatcher<R, S, T>>,
    actors: ActorMap,
    next_generation: AtomicU64,
    idle_timeout: Duration,
}

impl<R, S, T> RuntimeManager<R, S, T>
where
    R: WordRepository + 'static,
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub fn new(dispatcher: Dispatcher<R, S, T>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            actors: Arc::new(RwLock::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            idle_timeout: ACTOR_IDLE_TIMEOUT,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Queue an event on its user's actor, starting the actor if needed.
    ///
    /// Never waits on a busy actor: when the user's queue is full the event
    /// is dropped so other users keep moving.
    pub async fn dispatch(&self, event: InboundEvent) {
        let identity = event.identity;
        // Sends happen under the map lock so an idle actor cannot retire
        // between lookup and send
        let mut actors = self.actors.write().await;
        let handle = actors
            .entry(identity)
            .or_insert_with(|| self.spawn_actor(identity));

        match handle.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    identity,
                    capacity = USER_QUEUE_CAPACITY,
                    "User queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(identity, "Conversation actor stopped, restarting");
                let handle = self.spawn_actor(identity);
                if handle.tx.try_send(event).is_err() {
                    tracing::error!(identity, "Dropped event: conversation actor unavailable");
                }
                actors.insert(identity, handle);
            }
        }
    }

    fn spawn_actor(&self, identity: UserId) -> ActorHandle {
        let (tx, mut rx) = mpsc::channel::<InboundEvent>(USER_QUEUE_CAPACITY);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let dispatcher = Arc::clone(&self.dispatcher);
        let actors = Arc::clone(&self.actors);
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            tracing::debug!(identity, "Conversation actor started");
            loop {
                match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(event)) => dispatcher.handle_event(event).await,
                    Ok(None) => break,
                    Err(_) => {
                        let mut actors = actors.write().await;
                        // An event may have been queued while waiting for the lock
                        if let Ok(event) = rx.try_recv() {
                            drop(actors);
                            dispatcher.handle_event(event).await;
                            continue;
                        }
                        if actors
                            .get(&identity)
                            .is_some_and(|handle| handle.generation == generation)
                        {
                            actors.remove(&identity);
                        }
                        break;
                    }
                }
            }
            tracing::debug!(identity, "Conversation actor finished");
        });

        ActorHandle { generation, tx }
    }

    /// Number of running actors
    #[allow(dead_code)] // Used in tests
    pub async fn actor_count(&self) -> usize {
        self.actors.read().await.len()
    }

    /// Poll the transport forever. Failures are retried with backoff and
    /// never stop the loop.
    pub async fn run<P: Transport>(&self, transport: &P) {
        tracing::info!("Polling for updates");
        let mut attempt: u32 = 0;

        loop {
            match transport.poll().await {
                Ok(events) => {
                    if attempt > 0 {
                        tracing::info!(attempts = attempt, "Transport recovered");
                    }
                    attempt = 0;
                    for event in events {
                        self.dispatch(event).await;
                    }
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    let delay = retry_delay(attempt);
                    if e.kind.is_retryable() {
                        tracing::warn!(
                            error = %e,
                            attempt,
                            delay_secs = delay.as_secs(),
                            "Polling failed, retrying"
                        );
                    } else {
                        tracing::error!(
                            error = %e,
                            attempt,
                            delay_secs = delay.as_secs(),
                            "Polling rejected, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
