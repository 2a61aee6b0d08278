//! Feed retrieval.
//!
//! The transport is a trait so tests can script responses; the HTTP
//! implementation pulls RSS over reqwest and decodes it with quick-xml.
//! Retrieval failures are retried with exponential backoff; parse problems
//! come back as a status so the caller can distinguish "proceed with a
//! warning" from "skip this feed".

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::warn;

/// One raw entry as delivered by a feed, before any curation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Clean,
    /// The document needed repair but yielded entries; accepted with a warning.
    Irregular(String),
    /// The document is beyond repair; the feed is skipped for this run.
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    pub feed_title: Option<String>,
    pub entries: Vec<FeedEntry>,
    pub status: ParseStatus,
}

/// Retrieval of a single feed. `Err` means a transport failure (unreachable,
/// HTTP error, timeout) and is retryable; parse trouble is reported in-band
/// via [`ParseStatus`].
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed>;
}

// -- RSS decoding ----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Decode an RSS document. A strict parse failure gets one lenient retry
/// after trimming anything before the opening `<rss`/`<?xml` marker (some
/// endpoints prepend BOMs or stray whitespace); recovering that way is
/// reported as [`ParseStatus::Irregular`], mirroring how permissive feed
/// parsers flag "bozo but usable" documents.
pub fn parse_rss(body: &str) -> FetchedFeed {
    match from_str::<Rss>(body) {
        Ok(rss) => feed_from(rss, ParseStatus::Clean),
        Err(first_err) => {
            let start = body.find("<?xml").or_else(|| body.find("<rss"));
            if let Some(idx) = start.filter(|&idx| idx > 0) {
                if let Ok(rss) = from_str::<Rss>(&body[idx..]) {
                    return feed_from(
                        rss,
                        ParseStatus::Irregular(format!(
                            "recovered after stripping {idx} leading bytes"
                        )),
                    );
                }
            }
            FetchedFeed {
                feed_title: None,
                entries: Vec::new(),
                status: ParseStatus::Fatal(first_err.to_string()),
            }
        }
    }
}

fn feed_from(rss: Rss, status: ParseStatus) -> FetchedFeed {
    let entries = rss
        .channel
        .items
        .into_iter()
        .map(|it| FeedEntry {
            title: it.title.unwrap_or_default(),
            link: it.link,
            description: it.description,
            pub_date: it.pub_date,
        })
        .collect();
    FetchedFeed {
        feed_title: rss.channel.title,
        entries,
        status,
    }
}

// -- HTTP transport --------------------------------------------------------

/// Some feed endpoints 403 the default reqwest agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36";

pub struct HttpFeedTransport {
    client: reqwest::Client,
}

impl HttpFeedTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpFeedTransport {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed> {
        let resp = self
            .client
            .get(feed_url)
            .send()
            .await
            .with_context(|| format!("fetching feed {feed_url}"))?
            .error_for_status()
            .with_context(|| format!("feed {feed_url} returned an error status"))?;
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading feed body from {feed_url}"))?;
        Ok(parse_rss(&body))
    }
}

// -- Retry wrapper ---------------------------------------------------------

/// Fetch one feed with bounded exponential backoff.
///
/// Attempt `i` (zero-based) that fails a transport-level fetch sleeps
/// `initial_delay * 2^i` before the next try; the final failure is returned
/// so the caller can skip the feed and continue the run. A fatal parse
/// status is not retried — the same document would come back again.
pub async fn fetch_with_retry(
    transport: &dyn FeedTransport,
    feed_url: &str,
    max_attempts: u32,
    initial_delay: Duration,
) -> Result<FetchedFeed> {
    debug_assert!(max_attempts > 0);
    let mut last_err = anyhow!("no fetch attempts were made for {feed_url}");

    for attempt in 0..max_attempts {
        match transport.fetch(feed_url).await {
            Ok(feed) => match &feed.status {
                ParseStatus::Fatal(reason) => {
                    return Err(anyhow!("feed {feed_url} failed to parse: {reason}"));
                }
                ParseStatus::Irregular(reason) => {
                    warn!(feed = feed_url, reason = %reason, "feed parsed with irregularities, proceeding");
                    return Ok(feed);
                }
                ParseStatus::Clean => return Ok(feed),
            },
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay = backoff_delay(initial_delay, attempt);
                    warn!(
                        feed = feed_url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "feed fetch failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = e;
            }
        }
    }
    Err(last_err)
}

/// `initial * 2^attempt`, with the exponent capped so absurd attempt counts
/// cannot overflow the multiplier.
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(2u32.saturating_pow(attempt.min(16)))
}
