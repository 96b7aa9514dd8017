//! Telegram Bot API client.

use crate::NotifyError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Formatting mode for outgoing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    /// Legacy Markdown: `*bold*`, `[text](url)`
    #[default]
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::MarkdownV2 => "MarkdownV2",
            Self::Html => "HTML",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// An incoming update. Only message-like updates are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

impl Update {
    /// The message carried by this update, if any.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.channel_post.as_ref())
    }
}

/// `{ok, result, description, error_code}` wrapper around every answer.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramBot {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramBot {
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at a different API host (local Bot API server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base.trim_end_matches('/'), self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, NotifyError> {
        debug!(%method, "Calling bot API");

        let mut request = self.http.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }

    /// Send a text message to `chat_id` (numeric id or `@channel`).
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<Message, NotifyError> {
        let params = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": parse_mode.as_str(),
            "disable_web_page_preview": true,
        });
        self.call("sendMessage", &params, None).await
    }

    /// Long-poll for updates after `offset`, waiting up to `timeout_secs`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        let mut params = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post"],
        });
        if let Some(offset) = offset {
            params["offset"] = json!(offset);
        }
        // The request must outlive the server-side wait.
        let timeout = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &params, Some(timeout)).await
    }

    /// Register `url` for push delivery. Telegram echoes `secret_token` in
    /// the `X-Telegram-Bot-Api-Secret-Token` header of every delivery.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<bool, NotifyError> {
        let mut params = json!({
            "url": url,
            "allowed_updates": ["message", "channel_post"],
        });
        if let Some(secret) = secret_token {
            params["secret_token"] = json!(secret);
        }
        self.call("setWebhook", &params, None).await
    }

    /// Remove any webhook so `getUpdates` can be used.
    pub async fn delete_webhook(&self) -> Result<bool, NotifyError> {
        self.call("deleteWebhook", &json!({}), None).await
    }
}

/// Decode a bot API answer.
pub fn decode_response<T: DeserializeOwned>(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<T, NotifyError> {
    let response: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            })
        }
        Err(e) => return Err(NotifyError::Decode(e)),
    };

    match response {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(NotifyError::Api {
            code: error_code.unwrap_or(i64::from(status.as_u16())),
            description: description.unwrap_or_else(|| "missing result".to_string()),
        }),
    }
}
