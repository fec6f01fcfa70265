//! Telegram MarkdownV2 rendering.
//!
//! Every user-supplied field goes through [`escape_markdown_v2`], a single
//! left-to-right pass over the input driven by [`MARKDOWN_V2_RESERVED`]. The
//! output is never fed back through the escaper, so inserted backslashes are
//! never escaped a second time.

use crate::analyze::classify::Category;
use crate::analyze::filter::parse_published_at;
use crate::ingest::summary_source;
use crate::ingest::types::Article;
use crate::notify::{MessageBody, ParseMode};

pub const ESCAPE_MARKER: char = '\\';

/// Characters with syntactic meaning in MarkdownV2, escape marker included.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

pub const TRUNCATION_MARKER: &str = "…";
pub const DEFAULT_SUMMARY_WORDS: usize = 100;

pub fn escape_markdown_v2(s: &str) -> String {
    escape_with(s, MARKDOWN_V2_RESERVED)
}

/// Inside `(...)` of an inline link only `)` and `\` are significant.
pub fn escape_link_url(s: &str) -> String {
    escape_with(s, &[')', '\\'])
}

fn escape_with(s: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for ch in s.chars() {
        if reserved.contains(&ch) {
            out.push(ESCAPE_MARKER);
        }
        out.push(ch);
    }
    out
}

/// First `max_words` words of `text`; appends [`TRUNCATION_MARKER`] when cut.
pub fn truncate_words(text: &str, max_words: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return (words.join(" "), false);
    }
    let mut out = words[..max_words].join(" ");
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}

/// Both renderings of one accepted article, plus what the dispatcher logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArticle {
    pub url: String,
    pub markdown: MessageBody,
    pub plain: MessageBody,
}

#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    summary_words: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_WORDS)
    }
}

impl Formatter {
    pub fn new(summary_words: usize) -> Self {
        Self {
            summary_words: summary_words.max(1),
        }
    }

    pub fn render(&self, article: &Article, category: &Category) -> RenderedArticle {
        RenderedArticle {
            url: article.url.clone().unwrap_or_default(),
            markdown: self.format(article, category),
            plain: self.format_plain(article, category),
        }
    }

    pub fn format(&self, article: &Article, category: &Category) -> MessageBody {
        let f = Fields::of(article, self.summary_words);
        let text = format!(
            "*{tag}*\n\
             📌 *{title}*\n\
             📰 _{source}_ \\| 🗓️ {published}\n\
             \n\
             🧠 *Summary:* {summary}\n\
             \n\
             🔗 [Read Full Article]({url})",
            tag = escape_markdown_v2(&category.label()),
            title = escape_markdown_v2(&f.title),
            source = escape_markdown_v2(&f.source),
            published = escape_markdown_v2(&f.published),
            summary = escape_markdown_v2(&f.summary),
            url = escape_link_url(&f.url),
        );
        MessageBody {
            text,
            parse_mode: ParseMode::MarkdownV2,
        }
    }

    /// No-markup fallback: tag, title, raw summary and link.
    pub fn format_plain(&self, article: &Article, category: &Category) -> MessageBody {
        let f = Fields::of(article, self.summary_words);
        let text = format!(
            "{}\n{}\n{} | {}\n\n{}\n\n{}",
            category.label(),
            f.title,
            f.source,
            f.published,
            f.summary,
            f.url
        );
        MessageBody {
            text,
            parse_mode: ParseMode::Plain,
        }
    }
}

/// "No new news" notice for recipients with nothing to receive.
pub fn empty_notice() -> MessageBody {
    MessageBody {
        text: "📭 No new finance news since your last update. Check back soon!".to_string(),
        parse_mode: ParseMode::Plain,
    }
}

struct Fields {
    title: String,
    source: String,
    published: String,
    summary: String,
    url: String,
}

impl Fields {
    fn of(article: &Article, summary_words: usize) -> Self {
        let title = crate::ingest::normalize_text(&article.title);
        let summary_raw = summary_source(article);
        let summary = if summary_raw.is_empty() {
            "No summary available.".to_string()
        } else {
            truncate_words(&summary_raw, summary_words).0
        };
        Self {
            title: if title.is_empty() { "No Title".to_string() } else { title },
            source: match article.source_name.trim() {
                "" => "Unknown source".to_string(),
                s => s.to_string(),
            },
            published: display_date(&article.published_at),
            summary,
            url: article.url.clone().unwrap_or_default(),
        }
    }
}

fn display_date(raw: &str) -> String {
    match parse_published_at(raw) {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => raw.chars().take(10).collect(),
    }
}
