//! Subscriber set persisted as a JSON array of chat ids.
//!
//! Loaded once at startup; every change rewrites the whole file. A missing or
//! corrupt file starts an empty set.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::notify::Recipient;

pub const DEFAULT_SUBSCRIBERS_FILE: &str = "subscribed_users.json";

#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    inner: Mutex<BTreeSet<Recipient>>,
}

impl SubscriberStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Vec<Recipient>>(&s) {
                Ok(v) => v.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "corrupt subscribers file, starting empty"
                    );
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };
        tracing::info!(path = %path.display(), count = set.len(), "subscribers loaded");
        Self {
            path,
            inner: Mutex::new(set),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the recipient was new (and the file was rewritten).
    pub async fn add(&self, who: Recipient) -> Result<bool> {
        let snapshot = {
            let mut set = self.inner.lock().expect("subscribers mutex poisoned");
            if !set.insert(who) {
                return Ok(false);
            }
            set.iter().copied().collect::<Vec<_>>()
        };
        self.persist(&snapshot).await?;
        Ok(true)
    }

    pub async fn remove(&self, who: Recipient) -> Result<bool> {
        let snapshot = {
            let mut set = self.inner.lock().expect("subscribers mutex poisoned");
            if !set.remove(&who) {
                return Ok(false);
            }
            set.iter().copied().collect::<Vec<_>>()
        };
        self.persist(&snapshot).await?;
        Ok(true)
    }

    pub fn contains(&self, who: Recipient) -> bool {
        self.inner
            .lock()
            .expect("subscribers mutex poisoned")
            .contains(&who)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("subscribers mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy, taken once per cycle.
    pub fn snapshot(&self) -> Vec<Recipient> {
        self.inner
            .lock()
            .expect("subscribers mutex poisoned")
            .iter()
            .copied()
            .collect()
    }

    async fn persist(&self, ids: &[Recipient]) -> Result<()> {
        let body = serde_json::to_vec(ids).context("serializing subscribers")?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing subscribers to {}", self.path.display()))
    }
}
