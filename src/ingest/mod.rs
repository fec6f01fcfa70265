// src/ingest/mod.rs
pub mod dedup;
pub mod providers;
pub mod scheduler;
pub mod types;

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::Article;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_articles_fetched_total",
            "Articles returned by the news source."
        );
        describe_counter!(
            "relay_articles_accepted_total",
            "Articles that passed dedup + filtering."
        );
        describe_counter!(
            "relay_articles_rejected_total",
            "Articles dropped, labelled by reason."
        );
        describe_counter!("relay_fetch_errors_total", "Failed or timed out fetches.");
        describe_counter!(
            "relay_messages_sent_total",
            "Messages delivered, labelled by mode (markdown/plain)."
        );
        describe_counter!(
            "relay_send_failures_total",
            "Per-recipient send failures, labelled by kind."
        );
        describe_gauge!("relay_dedup_capacity", "Configured dedup cache capacity.");
        describe_gauge!(
            "relay_cycle_last_run_ts",
            "Unix ts when the relay cycle last finished."
        );
    });
}

/// Normalize API text: decode entities, strip tags, drop NewsAPI's
/// `[+123 chars]` tail, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_TAIL: OnceCell<regex::Regex> = OnceCell::new();
    let re_tail = RE_TAIL.get_or_init(|| {
        regex::Regex::new(r"\s*(…|\.\.\.)?\s*\[\+\d+ chars\]\s*$").unwrap()
    });
    out = re_tail.replace(&out, "").to_string();

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text the summary is built from: the description, followed by the content
/// when the content adds something beyond it.
pub fn summary_source(article: &Article) -> String {
    let desc = normalize_text(&article.description);
    let content = article
        .content
        .as_deref()
        .map(normalize_text)
        .unwrap_or_default();

    if content.is_empty() || (!desc.is_empty() && desc.contains(&content)) {
        return desc;
    }
    if desc.is_empty() || content.contains(&desc) {
        return content;
    }
    format!("{desc} {content}")
}
