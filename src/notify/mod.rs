// src/notify/mod.rs
pub mod admin;
pub mod dispatch;
pub mod format;
pub mod telegram;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque chat id of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(pub i64);

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
    Plain,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::MarkdownV2 => "markdown",
            ParseMode::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    pub text: String,
    pub parse_mode: ParseMode,
}

impl MessageBody {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Plain,
        }
    }
}

/// Why the messaging transport refused a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("api error {code}: {description}")]
    Api { code: u16, description: String },
}

impl TransportError {
    /// Short label for metrics/logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::MalformedMarkup(_) => "malformed_markup",
            TransportError::Unreachable(_) => "unreachable",
            TransportError::RateLimited { .. } => "rate_limited",
            TransportError::Network(_) => "network",
            TransportError::Api { .. } => "api",
        }
    }
}

#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    /// One send attempt; link previews are always suppressed.
    async fn send_message(&self, to: Recipient, body: &MessageBody) -> Result<(), TransportError>;
}
