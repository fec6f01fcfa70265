//! Bounded duplicate suppression for delivered articles.
//!
//! - `seen(id)` is an O(1) set lookup.
//! - `remember(id)` appends to a FIFO queue; a repeat is a no-op and keeps the
//!   original position.
//! - Admitting a new id while the queue holds `capacity` ids evicts the single
//!   oldest one first, so the queue never grows past `capacity`.
//!
//! The set and the queue always hold the same ids, each exactly once.

use anyhow::{Context, Result};
use std::collections::{HashSet, VecDeque};
use std::path::Path;

use crate::ingest::types::Article;

pub const DEFAULT_DEDUP_CAPACITY: usize = 500;

#[derive(Debug, Clone)]
pub struct DedupCache {
    capacity: usize,
    order: VecDeque<String>,
    index: HashSet<String>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

impl DedupCache {
    /// `capacity` of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            index: HashSet::with_capacity(capacity),
        }
    }

    /// Seed from a persisted oldest-first snapshot. Eviction rules apply as if
    /// the ids had been remembered one by one.
    pub fn from_ids<I, S>(capacity: usize, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cache = Self::new(capacity);
        for id in ids {
            cache.remember(id);
        }
        cache
    }

    pub fn seen(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Returns `true` when the id was newly admitted.
    pub fn remember<S: Into<String>>(&mut self, id: S) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.index.remove(&oldest);
            }
        }
        self.index.insert(id.clone());
        self.order.push_back(id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first copy of the remembered ids.
    pub fn snapshot(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }
}

/// Keys an article is suppressed under. Always the URL (when present); the
/// normalized title too when `with_title` is set.
pub fn dedup_keys(article: &Article, with_title: bool) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(url) = article.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        keys.push(format!("url:{url}"));
    }
    if with_title {
        let norm = article
            .title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if !norm.is_empty() {
            keys.push(format!("title:{}", title_digest(&norm)));
        }
    }
    keys
}

fn title_digest(norm_title: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(norm_title.as_bytes());
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Read a persisted snapshot. Missing or unreadable state yields an empty list.
pub async fn load_snapshot(path: &Path) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(
                target: "ingest",
                path = %path.display(),
                error = %e,
                "corrupt dedup state, starting empty"
            );
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

/// Rewrite the snapshot file in full.
pub async fn save_snapshot(path: &Path, cache: &DedupCache) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = serde_json::to_vec(&cache.snapshot()).context("serializing dedup state")?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("writing dedup state to {}", path.display()))
}
