//! Acceptance predicates applied after classification.
//!
//! All predicates must pass; the first failure short-circuits and is reported
//! as a `Rejection` so the scheduler can count it.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::analyze::classify::{Category, CategoryKind};
use crate::ingest::dedup::{dedup_keys, DedupCache};
use crate::ingest::normalize_text;
use crate::ingest::types::{Article, FetchWindow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Case-insensitive substrings of `source_name` that are never delivered.
    pub source_blocklist: Vec<String>,
    /// If non-empty, `source_name` must contain one of these.
    pub source_allowlist: Vec<String>,
    /// Categories eligible for delivery. `other` is never delivered.
    pub categories: Vec<CategoryKind>,
    /// Minimum word count of description + content.
    pub min_words: usize,
    pub check_recency: bool,
    /// Also suppress re-posts that share a normalized title.
    pub dedup_on_title: bool,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            source_blocklist: vec![
                "biztoc".into(),
                "pypi".into(),
                "slickdeals".into(),
            ],
            source_allowlist: Vec::new(),
            categories: vec![
                CategoryKind::Company,
                CategoryKind::Crypto,
                CategoryKind::Economic,
                CategoryKind::GlobalEconomic,
            ],
            min_words: 10,
            check_recency: true,
            dedup_on_title: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingUrl,
    Seen,
    BlockedSource,
    SourceNotAllowed,
    BadTimestamp,
    Stale,
    Category,
    TooShort,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingUrl => "missing_url",
            Rejection::Seen => "seen",
            Rejection::BlockedSource => "blocked_source",
            Rejection::SourceNotAllowed => "source_not_allowed",
            Rejection::BadTimestamp => "bad_timestamp",
            Rejection::Stale => "stale",
            Rejection::Category => "category",
            Rejection::TooShort => "too_short",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    rules: FilterRules,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(FilterRules::default())
    }
}

impl Filter {
    pub fn new(mut rules: FilterRules) -> Self {
        rules.source_blocklist = lower_nonempty(rules.source_blocklist);
        rules.source_allowlist = lower_nonempty(rules.source_allowlist);
        Self { rules }
    }

    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }

    pub fn accept(
        &self,
        article: &Article,
        category: &Category,
        cache: &DedupCache,
        window: &FetchWindow,
    ) -> bool {
        self.check(article, category, cache, window).is_ok()
    }

    pub fn check(
        &self,
        article: &Article,
        category: &Category,
        cache: &DedupCache,
        window: &FetchWindow,
    ) -> Result<(), Rejection> {
        let keys = dedup_keys(article, self.rules.dedup_on_title);
        if !keys.iter().any(|k| k.starts_with("url:")) {
            return Err(Rejection::MissingUrl);
        }
        if keys.iter().any(|k| cache.seen(k)) {
            return Err(Rejection::Seen);
        }

        let source = article.source_name.to_lowercase();
        if self.rules.source_blocklist.iter().any(|b| source.contains(b.as_str())) {
            return Err(Rejection::BlockedSource);
        }
        if !self.rules.source_allowlist.is_empty()
            && !self.rules.source_allowlist.iter().any(|a| source.contains(a.as_str()))
        {
            return Err(Rejection::SourceNotAllowed);
        }

        if self.rules.check_recency {
            let ts = parse_published_at(&article.published_at).ok_or(Rejection::BadTimestamp)?;
            if !window.contains(ts) {
                return Err(Rejection::Stale);
            }
        }

        let kind = category.kind();
        if kind == CategoryKind::Other || !self.rules.categories.contains(&kind) {
            return Err(Rejection::Category);
        }

        if content_words(article) < self.rules.min_words {
            return Err(Rejection::TooShort);
        }
        Ok(())
    }
}

/// Parse the wire timestamp (RFC 3339, e.g. `2025-09-06T09:00:00Z`).
pub fn parse_published_at(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let dt = OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()?;
    chrono::DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// Words in the description plus words in the content, each normalized
/// (markup and the `[+N chars]` tail do not count).
pub fn content_words(article: &Article) -> usize {
    let content = article.content.as_deref().map(normalize_text).unwrap_or_default();
    word_count(&normalize_text(&article.description)) + word_count(&content)
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

fn lower_nonempty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
