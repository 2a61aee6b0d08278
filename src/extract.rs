//! Best-effort first-sentence extraction from article pages.
//!
//! This is a fuzzy text heuristic, not core logic; the pipeline only sees the
//! [`SnippetExtractor`] contract (url → maybe a sentence, never an error).
//! The HTTP implementation scans `<p>` blocks, skips obvious boilerplate and
//! returns the first sentence of the first paragraph that looks like prose.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// url → snippet. May do network I/O; must never let a failure escape —
/// any problem becomes `None` plus a warning.
#[async_trait]
pub trait SnippetExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Option<String>;
}

static RE_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("valid tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strip tags and entities, collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let no_tags = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(no_tags.trim(), " ").to_string()
}

/// Take text up to the first sentence boundary, re-terminated with a period.
pub fn first_sentence_of(text: &str) -> String {
    let head = text.split(". ").next().unwrap_or(text);
    format!("{}.", head.trim_end_matches('.'))
}

#[derive(Debug, Clone)]
pub struct ExtractorHeuristics {
    /// Paragraphs containing any of these are boilerplate, not prose.
    pub ignored_phrases: Vec<String>,
    /// Minimum paragraph length before it counts as article text.
    pub min_paragraph_len: usize,
}

impl Default for ExtractorHeuristics {
    fn default() -> Self {
        Self {
            ignored_phrases: [
                "Copyright",
                "Find any issues using dark mode",
                "Use BBC",
                "terms of use",
                "privacy policy",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_paragraph_len: 60,
        }
    }
}

/// Pick the first prose-looking paragraph out of an HTML document and return
/// its first sentence. Pure so it can be tested without a server.
pub fn first_sentence_from_html(html: &str, heuristics: &ExtractorHeuristics) -> Option<String> {
    for cap in RE_PARAGRAPH.captures_iter(html) {
        let text = strip_markup(&cap[1]);
        if heuristics
            .ignored_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
        {
            continue;
        }
        // Menus and captions are short and rarely end with punctuation.
        let ends_like_prose = text.ends_with(['.', '!', '?']);
        if text.len() > heuristics.min_paragraph_len && ends_like_prose {
            return Some(first_sentence_of(&text));
        }
    }
    None
}

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.114 Safari/537.36";

pub struct HttpSnippetExtractor {
    client: reqwest::Client,
    heuristics: ExtractorHeuristics,
}

impl HttpSnippetExtractor {
    pub fn new(timeout: Duration, heuristics: ExtractorHeuristics) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building article http client")?;
        Ok(Self { client, heuristics })
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching article {url}"))?
            .error_for_status()
            .with_context(|| format!("article {url} returned an error status"))?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl SnippetExtractor for HttpSnippetExtractor {
    async fn extract(&self, url: &str) -> Option<String> {
        match self.fetch_page(url).await {
            Ok(html) => first_sentence_from_html(&html, &self.heuristics),
            Err(e) => {
                warn!(url, error = %e, "failed to fetch article content");
                None
            }
        }
    }
}
