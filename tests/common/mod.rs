// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use market_news_relay::ingest::scheduler::{Scheduler, SchedulerCfg};
use market_news_relay::notify::dispatch::Dispatcher;
use market_news_relay::subscribers::SubscriberStore;
use market_news_relay::{
    Article, ArticleSource, FetchWindow, MessageBody, MessageTransport, ParseMode, Recipient,
    TransportError,
};

/// RFC 3339 timestamp `hours_ago` before now.
pub fn hours_ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn article(url: &str, title: &str, source: &str) -> Article {
    Article {
        url: Some(url.to_string()),
        title: title.to_string(),
        description: "Officials said the decision reflected cooling price pressures \
                      across the economy this quarter."
            .to_string(),
        content: None,
        source_name: source.to_string(),
        published_at: hours_ago(1),
    }
}

/// Returns one scripted batch per fetch; `Err` entries simulate outages.
/// Once the script runs out, every fetch returns an empty batch.
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<Article>, String>>>,
    pub fetches: Arc<Mutex<usize>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Result<Vec<Article>, String>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn repeating(batch: Vec<Article>, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(batch.clone())).collect())
    }
}

#[async_trait]
impl ArticleSource for ScriptedSource {
    async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<Article>> {
        *self.fetches.lock().unwrap() += 1;
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}

/// Every fetch returns one article with a URL never seen before.
#[derive(Default)]
pub struct FreshSource {
    pub fetches: Arc<Mutex<usize>>,
}

#[async_trait]
impl ArticleSource for FreshSource {
    async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<Article>> {
        let mut n = self.fetches.lock().unwrap();
        *n += 1;
        let url = format!("https://x/fresh/{}", *n);
        Ok(vec![article(&url, "Bitcoin climbs again", "AP")])
    }

    fn name(&self) -> &'static str {
        "Fresh"
    }
}

/// A fetch that never resolves.
pub struct StalledSource;

#[async_trait]
impl ArticleSource for StalledSource {
    async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<Article>> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "Stalled"
    }
}

/// Records every send; recipients in `fail_rich` reject MarkdownV2 bodies,
/// recipients in `fail_all` reject everything.
#[derive(Default)]
pub struct RecordingTransport {
    pub fail_rich: Vec<i64>,
    pub fail_all: Vec<i64>,
    pub sent: Mutex<Vec<(i64, ParseMode, String)>>,
}

impl RecordingTransport {
    pub fn sent_to(&self, who: i64) -> Vec<(ParseMode, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _, _)| *r == who)
            .map(|(_, m, t)| (*m, t.clone()))
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(&self, to: Recipient, body: &MessageBody) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.0, body.parse_mode, body.text.clone()));
        if self.fail_all.contains(&to.0) {
            return Err(TransportError::Unreachable(
                "Forbidden: bot was blocked by the user".into(),
            ));
        }
        if body.parse_mode == ParseMode::MarkdownV2 && self.fail_rich.contains(&to.0) {
            return Err(TransportError::MalformedMarkup("can't parse entities".into()));
        }
        Ok(())
    }
}

/// Subscriber store backed by a file in `dir`, pre-filled with `ids`.
pub fn subscribers(dir: &Path, ids: &[i64]) -> Arc<SubscriberStore> {
    let p = dir.join("subs.json");
    std::fs::write(&p, serde_json::to_string(ids).unwrap()).unwrap();
    Arc::new(SubscriberStore::load(p))
}

pub fn scheduler(
    source: impl ArticleSource + 'static,
    transport: Arc<RecordingTransport>,
    subs: Arc<SubscriberStore>,
    cfg: SchedulerCfg,
) -> Scheduler {
    Scheduler::new(Box::new(source), Dispatcher::new(transport), subs, cfg)
}
