//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::db::{UserId, WordPair};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Repository
// ============================================================================

#[derive(Default)]
struct RepoData {
    global: Vec<WordPair>,
    users: HashMap<UserId, String>,
    user_words: HashMap<UserId, Vec<WordPair>>,
}

/// In-memory repository that mirrors the database semantics
#[allow(dead_code)]
#[derive(Default)]
pub struct MockRepository {
    data: Mutex<RepoData>,
    failure: Mutex<Option<String>>,
    mutations: Mutex<usize>,
    add_user_calls: Mutex<usize>,
}

#[allow(dead_code)]
impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(pairs: &[(&str, &str)]) -> Self {
        let repo = Self::new();
        repo.data.lock().unwrap().global = pairs
            .iter()
            .map(|(source, target)| WordPair::new(*source, *target))
            .collect();
        repo
    }

    /// Make every subsequent call fail with a storage error
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// The user's own pairs
    pub fn user_words(&self, identity: UserId) -> Vec<WordPair> {
        self.data
            .lock()
            .unwrap()
            .user_words
            .get(&identity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_user(&self, identity: UserId) -> bool {
        self.data.lock().unwrap().users.contains_key(&identity)
    }

    /// Number of word insertions and deletions that reached storage
    pub fn mutation_count(&self) -> usize {
        *self.mutations.lock().unwrap()
    }

    pub fn add_user_calls(&self) -> usize {
        *self.add_user_calls.lock().unwrap()
    }

    fn check(&self) -> Result<(), RepoError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(RepoError::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WordRepository for MockRepository {
    async fn list_global_words(&self) -> Result<Vec<WordPair>, RepoError> {
        self.check()?;
        Ok(self.data.lock().unwrap().global.clone())
    }

    async fn list_user_words(&self, identity: UserId) -> Result<Vec<WordPair>, RepoError> {
        self.check()?;
        let data = self.data.lock().unwrap();
        let mut words = data.global.clone();
        if let Some(own) = data.user_words.get(&identity) {
            words.extend(own.iter().cloned());
        }
        Ok(words)
    }

    async fn add_user(&self, identity: UserId, display_name: &str) -> Result<bool, RepoError> {
        *self.add_user_calls.lock().unwrap() += 1;
        self.check()?;
        let mut data = self.data.lock().unwrap();
        if data.users.contains_key(&identity) {
            return Ok(false);
        }
        data.users.insert(identity, display_name.to_string());
        Ok(true)
    }

    async fn add_user_word(&self, identity: UserId, pair: &WordPair) -> Result<(), RepoError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        if !data.users.contains_key(&identity) {
            return Err(RepoError::UserNotFound(identity));
        }
        let own = data.user_words.entry(identity).or_default();
        if own
            .iter()
            .any(|w| w.source_text == pair.source_text || w.target_text == pair.target_text)
        {
            return Err(RepoError::DuplicateWord(pair.clone()));
        }
        own.push(pair.clone());
        *self.mutations.lock().unwrap() += 1;
        Ok(())
    }

    async fn delete_user_word(
        &self,
        identity: UserId,
        target_text: &str,
    ) -> Result<usize, RepoError> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        let Some(own) = data.user_words.get_mut(&identity) else {
            return Ok(0);
        };
        let before = own.len();
        own.retain(|w| w.target_text != target_text);
        let removed = before - own.len();
        *self.mutations.lock().unwrap() += removed;
        Ok(removed)
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>, RepoError> {
        self.check()?;
        Ok(self.data.lock().unwrap().users.keys().copied().collect())
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued poll batches and records sends
#[allow(dead_code)]
pub struct MockTransport {
    polls: Mutex<VecDeque<Result<Vec<InboundEvent>, TransportError>>>,
    /// Record of all messages sent
    pub sent: Mutex<Vec<(UserId, OutgoingMessage)>>,
    /// Notified after every send (for test synchronization)
    pub message_sent: Notify,
    /// Delay applied to each send, to widen race windows in tests
    send_delay: Duration,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            polls: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            message_sent: Notify::new(),
            send_delay: Duration::ZERO,
        }
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub fn queue_events(&self, events: Vec<InboundEvent>) {
        self.polls.lock().unwrap().push_back(Ok(events));
    }

    pub fn queue_error(&self, error: TransportError) {
        self.polls.lock().unwrap().push_back(Err(error));
    }

    /// Messages sent to one user, in order
    pub fn sent_to(&self, identity: UserId) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == identity)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Wait until at least `count` messages were sent, or panic after a timeout
    pub async fn wait_for_sent(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.sent_count() < count {
                let notified = self.message_sent.notified();
                if self.sent_count() >= count {
                    break;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for sent messages");
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn poll(&self) -> Result<Vec<InboundEvent>, TransportError> {
        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Behave like an idle long poll
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(vec![])
            }
        }
    }

    async fn send_message(
        &self,
        identity: UserId,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        self.sent.lock().unwrap().push((identity, message.clone()));
        self.message_sent.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_repository_effective_vocabulary() {
        let repo = MockRepository::with_global(&[("Кот", "Cat")]);
        repo.add_user(1, "Anna").await.unwrap();
        repo.add_user_word(1, &WordPair::new("Дом", "House"))
            .await
            .unwrap();

        assert_eq!(
            repo.list_user_words(1).await.unwrap(),
            vec![WordPair::new("Кот", "Cat"), WordPair::new("Дом", "House")]
        );
        assert_eq!(repo.list_user_words(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_repository_failure_switch() {
        let repo = MockRepository::with_global(&[("Кот", "Cat")]);
        repo.fail_with("boom");
        assert!(matches!(
            repo.list_global_words().await,
            Err(RepoError::Storage(_))
        ));
        repo.recover();
        assert!(repo.list_global_words().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_transport_replays_queue() {
        let transport = MockTransport::new();
        transport.queue_error(TransportError::network("offline"));
        transport.queue_events(vec![InboundEvent::new(1, "Anna", "/start")]);

        assert!(transport.poll().await.is_err());
        assert_eq!(transport.poll().await.unwrap().len(), 1);
        assert!(transport.poll().await.unwrap().is_empty());
    }
}
