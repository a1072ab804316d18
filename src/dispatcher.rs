//! Conversation dispatcher
//!
//! Classifies inbound messages, routes them to the quiz engine, and renders
//! the results. Session state is only ever changed through the engine.

pub mod render;

use crate::db::UserId;
use crate::quiz::{AddWordStep, AnswerOutcome, QuizEngine, QuizError, SessionState};
use crate::runtime::{InboundEvent, OutgoingMessage, Transport, WordRepository};
use crate::session::SessionStore;

/// Slash commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    List,
    Learn,
    Unknown(String),
}

/// Labeled keyboard buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Next,
    AddWord,
    DeleteWord,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Next, Button::AddWord, Button::DeleteWord];

    pub fn label(self) -> &'static str {
        match self {
            Button::Next => "Дальше ➡️",
            Button::AddWord => "Добавить слово ✏️",
            Button::DeleteWord => "Удалить слово 🗑️",
        }
    }
}

/// Classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    Button(Button),
    Text(String),
}

/// Classify a raw payload. Commands may carry a `@botname` suffix.
pub fn classify(payload: &str) -> Inbound {
    let trimmed = payload.trim();

    if let Some(rest) = trimmed.strip_prefix('/') {
        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();
        let command = match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "list" => Command::List,
            "learn" => Command::Learn,
            _ => Command::Unknown(format!("/{name}")),
        };
        return Inbound::Command(command);
    }

    Button::ALL
        .into_iter()
        .find(|button| button.label() == trimmed)
        .map_or_else(|| Inbound::Text(payload.to_string()), Inbound::Button)
}

pub struct Dispatcher<R, S, T>
where
    R: WordRepository,
    S: SessionStore,
    T: Transport,
{
    engine: QuizEngine<R, S>,
    transport: T,
}

impl<R, S, T> Dispatcher<R, S, T>
where
    R: WordRepository,
    S: SessionStore,
    T: Transport,
{
    pub fn new(engine: QuizEngine<R, S>, transport: T) -> Self {
        Self { engine, transport }
    }

    /// Handle one inbound event end to end. Never fails: every error is
    /// turned into a reply and logged.
    pub async fn handle_event(&self, event: InboundEvent) {
        let InboundEvent {
            identity,
            display_name,
            payload,
        } = event;

        let inbound = classify(&payload);
        tracing::debug!(identity, inbound = ?inbound, "Inbound message");

        // `/start` registers on its own and needs to know whether the user is new
        if inbound != Inbound::Command(Command::Start) {
            if let Err(e) = self.engine.ensure_registered(identity, &display_name).await {
                tracing::warn!(identity, error = %e, "Lazy registration failed");
            }
        }

        let replies = self.route(identity, &display_name, inbound).await;
        for reply in replies {
            if let Err(e) = self.transport.send_message(identity, &reply).await {
                tracing::error!(
                    identity,
                    error = %e,
                    retryable = e.kind.is_retryable(),
                    "Failed to send reply"
                );
                break;
            }
        }
    }

    async fn route(
        &self,
        identity: UserId,
        display_name: &str,
        inbound: Inbound,
    ) -> Vec<OutgoingMessage> {
        let result = match inbound {
            Inbound::Command(Command::Start) => self.start(identity, display_name).await,
            Inbound::Command(Command::Help) => Ok(vec![render::help()]),
            Inbound::Command(Command::List) => self
                .engine
                .vocabulary(identity)
                .await
                .map(|words| vec![render::word_list(&words)]),
            Inbound::Command(Command::Learn) | Inbound::Button(Button::Next) => {
                self.learn(identity).await
            }
            Inbound::Command(Command::Unknown(name)) => Ok(vec![render::unknown_command(&name)]),
            Inbound::Button(Button::AddWord) => {
                self.engine.begin_add_word(identity).await;
                Ok(vec![render::ask_source()])
            }
            Inbound::Button(Button::DeleteWord) => self
                .engine
                .delete_current_word(identity)
                .await
                .map(|outcome| vec![render::deleted(&outcome)]),
            Inbound::Text(text) => self.free_text(identity, &text).await,
        };

        result.unwrap_or_else(|e| {
            if e.is_storage_failure() {
                tracing::error!(identity, error = %e, "Request failed");
            } else {
                tracing::info!(identity, error = %e, "Request rejected");
            }
            vec![render::error(&e)]
        })
    }

    async fn start(
        &self,
        identity: UserId,
        display_name: &str,
    ) -> Result<Vec<OutgoingMessage>, QuizError> {
        let is_new = self.engine.register(identity, display_name).await?;
        if is_new {
            tracing::info!(identity, display_name, "User started the bot");
            Ok(vec![render::greeting(display_name)])
        } else {
            tracing::info!(identity, display_name, "Returning user");
            Ok(vec![render::welcome_back(display_name)])
        }
    }

    async fn learn(&self, identity: UserId) -> Result<Vec<OutgoingMessage>, QuizError> {
        let question = self.engine.start_quiz(identity).await?;
        Ok(vec![render::question(&question)])
    }

    async fn free_text(
        &self,
        identity: UserId,
        text: &str,
    ) -> Result<Vec<OutgoingMessage>, QuizError> {
        match self.engine.current_state(identity).await {
            SessionState::AwaitingAnswer { .. } => {
                match self.engine.submit_answer(identity, text).await? {
                    AnswerOutcome::Correct(pair) => Ok(vec![render::correct(&pair)]),
                    AnswerOutcome::Incorrect => Ok(vec![render::incorrect()]),
                }
            }
            SessionState::AddingWordSource | SessionState::AddingWordTarget { .. } => {
                match self.engine.submit_add_word_step(identity, text).await? {
                    AddWordStep::AwaitingTarget { source_text } => {
                        Ok(vec![render::ask_target(&source_text)])
                    }
                    AddWordStep::Completed(pair) => {
                        // Continue the session with a fresh question
                        let mut replies = vec![render::word_added(&pair)];
                        match self.learn(identity).await {
                            Ok(question) => replies.extend(question),
                            Err(e) => replies.push(render::error(&e)),
                        }
                        Ok(replies)
                    }
                }
            }
            SessionState::Idle => Ok(vec![render::idle_hint()]),
        }
    }
}
