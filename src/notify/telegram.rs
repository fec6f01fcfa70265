use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{MessageBody, MessageTransport, ParseMode, Recipient, TransportError};

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Thin Telegram Bot API client: `sendMessage` and `getUpdates`.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, poll_secs: u64) -> Result<Vec<Update>> {
        let req = GetUpdatesRequest {
            offset,
            timeout: poll_secs,
            allowed_updates: vec!["message"],
        };
        let rsp = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(self.timeout + Duration::from_secs(poll_secs))
            .json(&req)
            .send()
            .await
            .map_err(|e| anyhow!("telegram getUpdates failed: {}", e.without_url()))?;

        let body: ApiResponse<Vec<Update>> = rsp.json().await.context("telegram getUpdates body")?;
        if !body.ok {
            return Err(anyhow!(
                "telegram getUpdates error {}: {}",
                body.error_code.unwrap_or_default(),
                body.description.unwrap_or_default()
            ));
        }
        Ok(body.result.unwrap_or_default())
    }
}

#[async_trait]
impl MessageTransport for TelegramClient {
    async fn send_message(&self, to: Recipient, body: &MessageBody) -> Result<(), TransportError> {
        let req = SendMessageRequest {
            chat_id: to.0,
            text: &body.text,
            parse_mode: match body.parse_mode {
                ParseMode::MarkdownV2 => Some("MarkdownV2"),
                ParseMode::Plain => None,
            },
            disable_web_page_preview: true,
        };

        let rsp = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            // without_url(): the request URL carries the bot token
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = rsp.status();
        let body: ApiResponse<serde_json::Value> = rsp
            .json()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        if body.ok && status.is_success() {
            return Ok(());
        }
        Err(classify_error(
            body.error_code.unwrap_or(status.as_u16()),
            body.description.unwrap_or_default(),
            body.parameters.and_then(|p| p.retry_after),
        ))
    }
}

/// Map a Bot API failure onto a distinguishable error kind.
pub fn classify_error(code: u16, description: String, retry_after: Option<u64>) -> TransportError {
    let d = description.to_ascii_lowercase();
    if code == 429 {
        return TransportError::RateLimited { retry_after };
    }
    if d.contains("can't parse entities") || d.contains("can't find end of") {
        return TransportError::MalformedMarkup(description);
    }
    if code == 403
        || d.contains("chat not found")
        || d.contains("bot was blocked")
        || d.contains("user is deactivated")
    {
        return TransportError::Unreachable(description);
    }
    TransportError::Api { code, description }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}
