// src/ingest/providers/newsapi.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ingest::types::{Article, ArticleSource, FetchWindow};

pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";

/// Search parameters for the `/v2/everything` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRules {
    /// OR-combined into the `q` expression.
    pub terms: Vec<String>,
    pub language: String,
    pub page_size: u32,
}

impl Default for QueryRules {
    fn default() -> Self {
        let terms = [
            "finance",
            "stock market",
            "inflation",
            "interest rates",
            "bonds",
            "central bank",
            "RBI",
            "Fed",
            "crypto",
            "bitcoin",
            "ethereum",
            "tariffs",
            "monetary policy",
            "fiscal policy",
            "economy",
            "GDP",
            "recession",
        ];
        Self {
            terms: terms.iter().map(|s| s.to_string()).collect(),
            language: "en".to_string(),
            page_size: 10,
        }
    }
}

impl QueryRules {
    pub fn expression(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    articles: Option<Vec<RawArticle>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArticle {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    source: Option<RawSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(it: RawArticle) -> Self {
        Article {
            url: it.url,
            title: it.title.unwrap_or_default(),
            description: it.description.unwrap_or_default(),
            content: it.content,
            source_name: it.source.and_then(|s| s.name).unwrap_or_default(),
            published_at: it.published_at.unwrap_or_default(),
        }
    }
}

pub struct NewsApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    query: QueryRules,
}

impl NewsApiSource {
    pub fn new(api_key: impl Into<String>, query: QueryRules, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("market-news-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building newsapi http client")?;
        Ok(Self {
            client,
            base_url: DEFAULT_NEWSAPI_BASE_URL.to_string(),
            api_key: api_key.into(),
            query,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Query string for one window (the API key is appended separately).
    pub fn params(&self, window: &FetchWindow) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.expression()),
            ("from", window.from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("to", window.to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("language", self.query.language.clone()),
            ("pageSize", self.query.page_size.to_string()),
            ("sortBy", "publishedAt".to_string()),
        ]
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Article>> {
        let url = format!("{}/v2/everything", self.base_url);
        let mut params = self.params(window);
        params.push(("apiKey", self.api_key.clone()));

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("newsapi get()")?;
        let status = resp.status();
        let body = resp.text().await.context("newsapi .text()")?;

        let parsed: NewsApiResponse = serde_json::from_str(&body)
            .with_context(|| format!("parsing newsapi response (http {status})"))?;

        if !status.is_success() || parsed.status.as_deref() == Some("error") {
            return Err(anyhow!(
                "newsapi error (http {status}): {} {}",
                parsed.code.unwrap_or_default(),
                parsed.message.unwrap_or_default()
            ));
        }
        let Some(articles) = parsed.articles else {
            bail!("newsapi response without `articles`");
        };

        Ok(articles.into_iter().map(Article::from).collect())
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
