// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

/// One article as reported by the search API. Absent fields are empty/None.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub url: Option<String>,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub source_name: String,
    pub published_at: String, // raw, source-reported (RFC 3339 when well-formed)
}

/// Time span `from..=to` queried each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl FetchWindow {
    /// Window ending at `now` and reaching `lookback` into the past.
    pub fn ending_at(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            from: now - lookback,
            to: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts <= self.to
    }
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    /// Articles for the window, in the order the API returned them.
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
