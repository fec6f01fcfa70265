// src/config/runtime.rs
//! Process settings read once from the environment (after `dotenvy`).

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::dedup::DEFAULT_DEDUP_CAPACITY;
use crate::ingest::providers::newsapi::DEFAULT_NEWSAPI_BASE_URL;
use crate::notify::telegram::DEFAULT_TELEGRAM_API_BASE;
use crate::notify::Recipient;
use crate::subscribers::DEFAULT_SUBSCRIBERS_FILE;

#[derive(Clone)]
pub struct RelayConfig {
    pub newsapi_key: String,
    pub newsapi_base_url: String,
    pub telegram_token: String,
    pub telegram_api_base: String,
    /// Second bot + chat for operator notices; both required to enable.
    pub admin: Option<(String, Recipient)>,
    pub subscribers_file: PathBuf,
    pub dedup_state_file: Option<PathBuf>,
    pub dedup_capacity: usize,
    pub fetch_interval: Duration,
    pub lookback: chrono::Duration,
    pub fetch_timeout: Duration,
    pub send_timeout_secs: u64,
    pub commands_enabled: bool,
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("newsapi_base_url", &self.newsapi_base_url)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("admin_chat", &self.admin.as_ref().map(|(_, chat)| chat))
            .field("subscribers_file", &self.subscribers_file)
            .field("dedup_state_file", &self.dedup_state_file)
            .field("dedup_capacity", &self.dedup_capacity)
            .field("fetch_interval", &self.fetch_interval)
            .field("lookback", &self.lookback)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .field("commands_enabled", &self.commands_enabled)
            .finish()
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env`, with an injectable lookup (used by tests).
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| var(k).ok_or_else(|| anyhow!("{k} missing"));
        let number = |k: &str, default: u64| -> Result<u64> {
            match var(k) {
                Some(v) => v.parse().with_context(|| format!("{k} must be a number, got `{v}`")),
                None => Ok(default),
            }
        };

        let admin = match (var("NOTIFY_BOT_TOKEN"), var("NOTIFY_CHAT_ID")) {
            (Some(token), Some(chat)) => {
                let id: i64 = chat
                    .parse()
                    .with_context(|| format!("NOTIFY_CHAT_ID must be a chat id, got `{chat}`"))?;
                Some((token, Recipient(id)))
            }
            _ => None,
        };

        let lookback_hours = number("LOOKBACK_HOURS", 24)?;
        let commands_enabled = match var("COMMANDS_ENABLED").as_deref() {
            None => true,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
        };

        Ok(Self {
            newsapi_key: required("NEWSAPI_KEY")?,
            newsapi_base_url: var("NEWSAPI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NEWSAPI_BASE_URL.to_string()),
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_api_base: var("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            admin,
            subscribers_file: var("SUBSCRIBERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSCRIBERS_FILE)),
            dedup_state_file: var("DEDUP_STATE_FILE").map(PathBuf::from),
            dedup_capacity: number("DEDUP_CAPACITY", DEFAULT_DEDUP_CAPACITY as u64)? as usize,
            fetch_interval: Duration::from_secs(number("FETCH_INTERVAL_SECS", 300)?.max(1)),
            lookback: chrono::Duration::hours(lookback_hours.clamp(1, 24 * 30) as i64),
            fetch_timeout: Duration::from_secs(number("FETCH_TIMEOUT_SECS", 20)?.max(1)),
            send_timeout_secs: number("SEND_TIMEOUT_SECS", 10)?.max(1),
            commands_enabled,
        })
    }
}
