//! Telegram Bot API transport (long polling)

use crate::db::UserId;
use crate::runtime::{InboundEvent, OutgoingMessage, Transport, TransportError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

/// Buttons per keyboard row
const KEYBOARD_ROW_WIDTH: usize = 2;

/// Telegram transport
pub struct TelegramTransport {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
    /// Next `update_id` to request
    offset: AtomicI64,
}

impl TelegramTransport {
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        Self::with_base_url(API_BASE, token, poll_timeout)
    }

    pub fn with_base_url(
        api_base: &str,
        token: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        // The HTTP timeout must outlast the server-side long poll
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
            poll_timeout,
            offset: AtomicI64::new(0),
        })
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::network(format!("{method}: request timeout"))
                } else if e.is_connect() {
                    TransportError::network(format!("{method}: connection failed"))
                } else {
                    TransportError::network(format!(
                        "{method}: request failed: {}",
                        e.without_url()
                    ))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                TransportError::network(format!(
                    "{method}: failed to read response: {}",
                    e.without_url()
                ))
            })?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                TransportError::decode(format!("{method}: failed to parse response: {e}"))
            } else {
                classify_status(method, status, &body)
            }
        })?;

        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(classify_status(
                method,
                status,
                description.as_deref().unwrap_or("no description"),
            )),
        }
    }
}

fn classify_status(method: &str, status: StatusCode, message: &str) -> TransportError {
    let message = format!("{method}: HTTP {}: {message}", status.as_u16());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TransportError::network(message)
    } else {
        TransportError::api(message)
    }
}

/// Text messages become events; everything else is skipped. Returns the
/// events and the offset acknowledging every update in the batch.
fn events_from_updates(updates: Vec<Update>) -> (Vec<InboundEvent>, Option<i64>) {
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();
    let events = updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            let text = message.text?;
            let display_name = message
                .from
                .map(|user| user.first_name)
                .unwrap_or_default();
            Some(InboundEvent::new(message.chat.id, display_name, text))
        })
        .collect();
    (events, next_offset)
}

fn reply_markup(buttons: &[String]) -> ReplyMarkup {
    ReplyMarkup {
        keyboard: buttons
            .chunks(KEYBOARD_ROW_WIDTH)
            .map(|row| {
                row.iter()
                    .map(|text| KeyboardButton { text: text.clone() })
                    .collect()
            })
            .collect(),
        resize_keyboard: true,
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn poll(&self) -> Result<Vec<InboundEvent>, TransportError> {
        let request = GetUpdatesRequest {
            offset: self.offset.load(Ordering::SeqCst),
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: vec!["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;

        let (events, next_offset) = events_from_updates(updates);
        if let Some(next) = next_offset {
            self.offset.fetch_max(next, Ordering::SeqCst);
        }
        tracing::debug!(count = events.len(), "Received updates");
        Ok(events)
    }

    async fn send_message(
        &self,
        identity: UserId,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id: identity,
            text: &message.text,
            reply_markup: message.buttons.as_deref().map(reply_markup),
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}

// Telegram API types

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    first_name: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct ReplyMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}
