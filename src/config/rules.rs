// src/config/rules.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::classify::ClassifierRules;
use crate::analyze::filter::FilterRules;
use crate::ingest::providers::newsapi::QueryRules;
use crate::ingest::scheduler::EmptyNotice;
use crate::notify::format::DEFAULT_SUMMARY_WORDS;

pub const ENV_RULES_PATH: &str = "RELAY_RULES_PATH";
pub const DEFAULT_RULES_PATH: &str = "config/relay.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatRules {
    pub summary_words: usize,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            summary_words: DEFAULT_SUMMARY_WORDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchRules {
    pub plain_fallback: bool,
    pub empty_notice: EmptyNotice,
}

impl Default for DispatchRules {
    fn default() -> Self {
        Self {
            plain_fallback: true,
            empty_notice: EmptyNotice::OnDemand,
        }
    }
}

/// Keyword lists and pipeline switches. Every section is optional; missing
/// sections and keys fall back to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayRules {
    pub query: QueryRules,
    pub filter: FilterRules,
    pub format: FormatRules,
    pub dispatch: DispatchRules,
    pub classifier: ClassifierRules,
}

impl RelayRules {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let rules: RelayRules = toml::from_str(s).context("parsing relay rules")?;
        Ok(rules)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading relay rules from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load rules using env var + fallbacks:
    /// 1) $RELAY_RULES_PATH (must exist)
    /// 2) config/relay.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_RULES_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_RULES_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_RULES_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::classify::CategoryKind;

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(RelayRules::from_toml_str("").unwrap(), RelayRules::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let s = r#"
[filter]
min_words = 25
categories = ["crypto"]

[dispatch]
empty_notice = "always"
"#;
        let r = RelayRules::from_toml_str(s).unwrap();
        assert_eq!(r.filter.min_words, 25);
        assert_eq!(r.filter.categories, vec![CategoryKind::Crypto]);
        assert!(r.filter.check_recency);
        assert_eq!(r.dispatch.empty_notice, EmptyNotice::Always);
        assert!(r.dispatch.plain_fallback);
        assert_eq!(r.query, QueryRules::default());
    }

    #[test]
    fn unknown_category_is_an_error() {
        let s = r#"
[filter]
categories = ["sports"]
"#;
        assert!(RelayRules::from_toml_str(s).is_err());
    }
}
