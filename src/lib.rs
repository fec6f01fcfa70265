// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod metrics;
pub mod subscribers;

// Fetch → dedup → schedule
pub mod ingest;

// Classification + acceptance rules
pub mod analyze;

// Formatting, transport, fan-out
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::analyze::classify::{Category, CategoryKind, Classifier};
pub use crate::analyze::filter::{Filter, Rejection};
pub use crate::ingest::dedup::DedupCache;
pub use crate::ingest::scheduler::{CycleReport, Scheduler, Trigger};
pub use crate::ingest::types::{Article, ArticleSource, FetchWindow};
pub use crate::notify::dispatch::Dispatcher;
pub use crate::notify::format::Formatter;
pub use crate::notify::{MessageBody, MessageTransport, ParseMode, Recipient, TransportError};
