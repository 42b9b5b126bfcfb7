//! Telegram Bot API client.
//!
//! Thin JSON wrapper over the handful of methods the bot uses:
//! `sendMessage`, `getUpdates` long polling, `answerCallbackQuery`, and
//! `getChatMember` for the membership gate.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Errors from the Telegram API.
#[derive(Debug, Error)]
pub enum SendError {
    /// Transport-level failure (timeout, DNS, connection, body decode).
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("telegram returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The API answered `ok: false`.
    #[error("telegram rejected the call: {0}")]
    Api(String),
}

/// Anything that can deliver a text message to a chat.
///
/// Implemented by [`TelegramClient`]; notifier tests substitute an
/// in-memory recorder.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `chat_id` (a broadcast chat or an individual user).
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}

/// An incoming update from long polling.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id, used as the polling offset.
    pub update_id: i64,
    /// Present for plain messages.
    #[serde(default)]
    pub message: Option<Message>,
    /// Present for inline-keyboard button presses.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat.
    pub message_id: i64,
    /// The chat the message was sent in.
    pub chat: Chat,
    /// Sender, absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Text content, if any.
    #[serde(default)]
    pub text: Option<String>,
}

/// A chat identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Telegram chat id.
    pub id: i64,
}

/// A Telegram user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Telegram user id.
    pub id: i64,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Query id, echoed back via `answerCallbackQuery`.
    pub id: String,
    /// The user who pressed the button.
    pub from: User,
    /// The message carrying the keyboard.
    #[serde(default)]
    pub message: Option<Message>,
    /// The button's callback data.
    #[serde(default)]
    pub data: Option<String>,
}

/// An inline keyboard attached to a message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineKeyboardMarkup {
    /// Rows of buttons.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// One inline-keyboard button: either a callback or a URL button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    /// Button label.
    pub text: String,
    /// Callback data delivered on press.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    /// URL opened on press.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that fires a callback query.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// A button that opens a URL.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

/// HTTP client for the Bot API.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client for the bot identified by `token`.
    pub fn new(token: &str) -> Result<Self, SendError> {
        // Long polls hold the connection open for up to 30s; leave slack.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(40))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, SendError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SendError::Status(response.status()));
        }

        let body: ApiResponse<T> = response.json().await?;
        if !body.ok {
            return Err(SendError::Api(
                body.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        body.result
            .ok_or_else(|| SendError::Api("missing result".to_string()))
    }

    /// Send a text message, optionally with an inline keyboard.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, SendError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| SendError::Api(format!("keyboard encode failed: {e}")))?;
        }
        self.call("sendMessage", &payload).await
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, SendError> {
        let payload = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &payload).await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback_query(&self, query_id: &str) -> Result<(), SendError> {
        let payload = json!({ "callback_query_id": query_id });
        let _: bool = self.call("answerCallbackQuery", &payload).await?;
        Ok(())
    }

    /// Whether `user_id` currently belongs to `group_chat_id`.
    pub async fn is_member(&self, group_chat_id: i64, user_id: i64) -> Result<bool, SendError> {
        let payload = json!({ "chat_id": group_chat_id, "user_id": user_id });
        let member: ChatMember = self.call("getChatMember", &payload).await?;
        Ok(matches!(
            member.status.as_str(),
            "creator" | "administrator" | "member"
        ))
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.send_message(chat_id, text, None).await.map(|_| ())
    }
}
