// src/app.rs
//! Wiring: builds the owned pipeline objects once and hands out handles.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analyze::classify::Classifier;
use crate::analyze::filter::Filter;
use crate::api::AppState;
use crate::commands::CommandPoller;
use crate::config::{RelayConfig, RelayRules};
use crate::ingest::dedup::{load_snapshot, DedupCache};
use crate::ingest::providers::newsapi::NewsApiSource;
use crate::ingest::scheduler::{trigger_channel, Scheduler, SchedulerCfg, Trigger, TriggerHandle};
use crate::notify::admin::AdminNotifier;
use crate::notify::dispatch::Dispatcher;
use crate::notify::format::Formatter;
use crate::notify::telegram::TelegramClient;
use crate::subscribers::SubscriberStore;

const TRIGGER_QUEUE: usize = 32;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter; `LOG_FORMAT=json` switches to JSON lines. No-op if a subscriber is
/// already installed (e.g. by the hosting runtime).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_news_relay=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

pub struct Relay {
    pub scheduler: Scheduler,
    pub subscribers: Arc<SubscriberStore>,
    pub triggers: TriggerHandle,
    trigger_rx: mpsc::Receiver<Trigger>,
    commands: Option<CommandPoller>,
}

impl Relay {
    pub async fn build(cfg: &RelayConfig, rules: RelayRules) -> Result<Self> {
        let subscribers = Arc::new(SubscriberStore::load(&cfg.subscribers_file));

        let cache = match &cfg.dedup_state_file {
            Some(p) => DedupCache::from_ids(cfg.dedup_capacity, load_snapshot(p).await),
            None => DedupCache::new(cfg.dedup_capacity),
        };

        let source = NewsApiSource::new(&cfg.newsapi_key, rules.query.clone(), cfg.fetch_timeout)
            .context("newsapi source")?
            .with_base_url(&cfg.newsapi_base_url);

        let bot = TelegramClient::new(&cfg.telegram_token)
            .with_base_url(&cfg.telegram_api_base)
            .with_timeout(cfg.send_timeout_secs);
        let dispatcher = Dispatcher::new(Arc::new(bot.clone()))
            .with_plain_fallback(rules.dispatch.plain_fallback);

        let sched_cfg = SchedulerCfg {
            interval: cfg.fetch_interval,
            lookback: cfg.lookback,
            fetch_timeout: cfg.fetch_timeout,
            empty_notice: rules.dispatch.empty_notice,
            state_path: cfg.dedup_state_file.clone(),
        };
        let scheduler = Scheduler::new(Box::new(source), dispatcher, subscribers.clone(), sched_cfg)
            .with_classifier(Classifier::new(rules.classifier))
            .with_filter(Filter::new(rules.filter))
            .with_formatter(Formatter::new(rules.format.summary_words))
            .with_cache(cache);

        let (triggers, trigger_rx) = trigger_channel(TRIGGER_QUEUE);

        let commands = if cfg.commands_enabled {
            let admin = match &cfg.admin {
                Some((token, chat)) => {
                    let notify_bot = TelegramClient::new(token)
                        .with_base_url(&cfg.telegram_api_base)
                        .with_timeout(cfg.send_timeout_secs);
                    AdminNotifier::new(Arc::new(notify_bot), *chat)
                }
                None => AdminNotifier::disabled(),
            };
            Some(CommandPoller::new(bot, subscribers.clone(), triggers.clone(), admin))
        } else {
            None
        };

        Ok(Self {
            scheduler,
            subscribers,
            triggers,
            trigger_rx,
            commands,
        })
    }

    /// Spawn the scheduler (and the command poller, if enabled). Returns the
    /// state the HTTP surface needs.
    pub fn spawn(self) -> AppState {
        tokio::spawn(self.scheduler.run_forever(self.trigger_rx));
        if let Some(cmds) = self.commands {
            tokio::spawn(cmds.run());
        }
        AppState {
            triggers: self.triggers,
            subscribers: self.subscribers,
        }
    }
}
