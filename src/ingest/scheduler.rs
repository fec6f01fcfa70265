// src/ingest/scheduler.rs
//! The relay loop: fetch → dedup/classify/filter → format → fan-out, then sleep.
//!
//! A single task owns the `Scheduler` mutably, so exactly one pass runs at a
//! time. Timer ticks and on-demand triggers arrive through the same `select!`
//! and are served one after the other. The interval is measured from the end
//! of the previous periodic pass; on-demand passes do not move it.

use chrono::Utc;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::analyze::classify::Classifier;
use crate::analyze::filter::{Filter, Rejection};
use crate::ingest::dedup::{dedup_keys, save_snapshot, DedupCache};
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{ArticleSource, FetchWindow};
use crate::notify::dispatch::{Delivery, Dispatcher};
use crate::notify::format::{empty_notice, Formatter};
use crate::notify::Recipient;
use crate::subscribers::SubscriberStore;

/// When recipients get an explicit "no new news" message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyNotice {
    Never,
    #[default]
    OnDemand,
    Always,
}

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Periodic,
    /// On-demand, every subscriber.
    All,
    /// On-demand, a single chat (e.g. `/update`).
    One(Recipient),
}

impl Trigger {
    pub fn is_on_demand(&self) -> bool {
        !matches!(self, Trigger::Periodic)
    }
}

/// Cloneable handle used by the HTTP surface and the command poller.
#[derive(Clone, Debug)]
pub struct TriggerHandle {
    tx: mpsc::Sender<Trigger>,
}

impl TriggerHandle {
    pub async fn request(&self, trigger: Trigger) -> anyhow::Result<()> {
        self.tx
            .send(trigger)
            .await
            .map_err(|_| anyhow::anyhow!("scheduler is not running"))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub fn trigger_channel(capacity: usize) -> (TriggerHandle, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TriggerHandle { tx }, rx)
}

#[derive(Clone, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    pub lookback: chrono::Duration,
    pub fetch_timeout: Duration,
    pub empty_notice: EmptyNotice,
    /// Dedup snapshot written after every pass that admitted new ids.
    pub state_path: Option<PathBuf>,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            lookback: chrono::Duration::hours(24),
            fetch_timeout: Duration::from_secs(20),
            empty_notice: EmptyNotice::default(),
            state_path: None,
        }
    }
}

/// Outcome of one pass, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub skipped: bool,
    pub fetch_failed: bool,
    pub fetched: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
    pub delivered: usize,
    pub fallbacks: usize,
    pub failed: usize,
    pub empty_notices: usize,
}

impl CycleReport {
    pub fn rejected_for(&self, reason: Rejection) -> usize {
        self.rejected.get(reason.as_str()).copied().unwrap_or(0)
    }
}

pub struct Scheduler {
    source: Box<dyn ArticleSource>,
    classifier: Classifier,
    filter: Filter,
    formatter: Formatter,
    dispatcher: Dispatcher,
    cache: DedupCache,
    subscribers: Arc<SubscriberStore>,
    cfg: SchedulerCfg,
}

impl Scheduler {
    pub fn new(
        source: Box<dyn ArticleSource>,
        dispatcher: Dispatcher,
        subscribers: Arc<SubscriberStore>,
        cfg: SchedulerCfg,
    ) -> Self {
        Self {
            source,
            classifier: Classifier::default(),
            filter: Filter::default(),
            formatter: Formatter::default(),
            dispatcher,
            cache: DedupCache::default(),
            subscribers,
            cfg,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_cache(mut self, cache: DedupCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// One full pass. Never fails: every error is logged and counted.
    pub async fn run_cycle(&mut self, trigger: Trigger) -> CycleReport {
        ensure_metrics_described();
        let mut report = CycleReport::default();

        let recipients = match trigger {
            Trigger::One(r) => vec![r],
            Trigger::Periodic | Trigger::All => self.subscribers.snapshot(),
        };
        if recipients.is_empty() {
            tracing::debug!(target: "scheduler", ?trigger, "no recipients, skipping pass");
            report.skipped = true;
            return report;
        }

        let window = FetchWindow::ending_at(Utc::now(), self.cfg.lookback);
        let fetch = tokio::time::timeout(self.cfg.fetch_timeout, self.source.fetch(&window));
        let articles = match fetch.await {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                tracing::warn!(
                    target: "ingest",
                    error = ?e,
                    source = self.source.name(),
                    "fetch failed"
                );
                counter!("relay_fetch_errors_total").increment(1);
                report.fetch_failed = true;
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    target: "ingest",
                    source = self.source.name(),
                    timeout_secs = self.cfg.fetch_timeout.as_secs(),
                    "fetch timed out"
                );
                counter!("relay_fetch_errors_total").increment(1);
                report.fetch_failed = true;
                Vec::new()
            }
        };
        report.fetched = articles.len();
        counter!("relay_articles_fetched_total").increment(articles.len() as u64);

        let mut admitted = false;
        for article in &articles {
            let category = self.classifier.classify(&article.title, &article.description);
            if let Err(reason) = self.filter.check(article, &category, &self.cache, &window) {
                *report.rejected.entry(reason.as_str()).or_default() += 1;
                counter!("relay_articles_rejected_total", "reason" => reason.as_str()).increment(1);
                tracing::debug!(target: "ingest", url = ?article.url, %reason, "article dropped");
                continue;
            }

            // Remember before sending so a repeat later in this batch is caught.
            for key in dedup_keys(article, self.filter.rules().dedup_on_title) {
                admitted |= self.cache.remember(key);
            }
            report.accepted += 1;
            counter!("relay_articles_accepted_total", "category" => category.kind().as_str())
                .increment(1);

            let rendered = self.formatter.render(article, &category);
            for &recipient in &recipients {
                match self.dispatcher.send(recipient, &rendered).await {
                    Ok(Delivery::Rich) => report.delivered += 1,
                    Ok(Delivery::PlainFallback) => {
                        report.delivered += 1;
                        report.fallbacks += 1;
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(target: "scheduler", error = %e, "recipient skipped");
                    }
                }
            }
        }

        let wants_notice = match self.cfg.empty_notice {
            EmptyNotice::Never => false,
            EmptyNotice::OnDemand => trigger.is_on_demand(),
            EmptyNotice::Always => true,
        };
        if report.accepted == 0 && wants_notice {
            let notice = empty_notice();
            for &recipient in &recipients {
                match self.dispatcher.send_text(recipient, &notice).await {
                    Ok(()) => report.empty_notices += 1,
                    Err(e) => {
                        tracing::warn!(target: "scheduler", error = %e, "empty notice failed")
                    }
                }
            }
        }

        if admitted {
            if let Some(path) = &self.cfg.state_path {
                if let Err(e) = save_snapshot(path, &self.cache).await {
                    tracing::warn!(target: "scheduler", "dedup state: {e:#}");
                }
            }
        }

        gauge!("relay_cycle_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "scheduler",
            ?trigger,
            recipients = recipients.len(),
            fetched = report.fetched,
            accepted = report.accepted,
            delivered = report.delivered,
            failed = report.failed,
            dedup_size = self.cache.len(),
            "pass finished"
        );
        report
    }

    /// Runs until the process exits. The first pass starts immediately.
    ///
    /// The periodic deadline is reset only by periodic passes; on-demand
    /// passes are served in between without moving it.
    pub async fn run_forever(mut self, mut triggers: mpsc::Receiver<Trigger>) {
        let mut open = true;
        let mut next = Trigger::Periodic;
        let mut deadline = Instant::now();
        loop {
            self.run_cycle(next).await;
            if next == Trigger::Periodic {
                deadline = Instant::now() + self.cfg.interval;
            }
            next = loop {
                tokio::select! {
                    biased;
                    _ = tokio::time::sleep_until(deadline) => break Trigger::Periodic,
                    t = triggers.recv(), if open => match t {
                        Some(t) => break t,
                        None => {
                            tracing::debug!(
                                target: "scheduler",
                                "trigger queue closed, timer only"
                            );
                            open = false;
                        }
                    },
                }
            };
        }
    }
}
