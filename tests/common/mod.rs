//! Shared doubles for integration tests: scripted transports, fixed-value
//! scorers, canned extractors.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use good_news_curator::extract::SnippetExtractor;
use good_news_curator::fetch::{FeedEntry, FeedTransport, FetchedFeed, ParseStatus};
use good_news_curator::score::{ScoreBreakdown, Scorer};

pub fn entry(title: &str, link: &str, pub_date: Option<&str>) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: Some(link.to_string()),
        description: None,
        pub_date: pub_date.map(str::to_string),
    }
}

pub fn feed(title: &str, entries: Vec<FeedEntry>) -> FetchedFeed {
    FetchedFeed {
        feed_title: Some(title.to_string()),
        entries,
        status: ParseStatus::Clean,
    }
}

/// Serves a fixed response per feed URL; unknown URLs fail like an
/// unreachable host.
pub struct ScriptedTransport {
    pub feeds: HashMap<String, FetchedFeed>,
}

impl ScriptedTransport {
    pub fn new(feeds: Vec<(&str, FetchedFeed)>) -> Self {
        Self {
            feeds: feeds
                .into_iter()
                .map(|(url, feed)| (url.to_string(), feed))
                .collect(),
        }
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed> {
        self.feeds
            .get(feed_url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {feed_url}"))
    }
}

/// Fails the first `fail_times` fetches, then serves `feed`. Counts calls.
pub struct FlakyTransport {
    pub fail_times: u32,
    pub calls: Mutex<u32>,
    pub feed: FetchedFeed,
}

#[async_trait]
impl FeedTransport for FlakyTransport {
    async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls <= self.fail_times {
            return Err(anyhow!("timed out fetching {feed_url}"));
        }
        Ok(self.feed.clone())
    }
}

/// Every headline gets the same score.
pub struct FixedScorer(pub f64);

impl Scorer for FixedScorer {
    fn score(&self, _text: &str) -> ScoreBreakdown {
        ScoreBreakdown {
            mean: self.0,
            vader: self.0,
            textblob: self.0,
        }
    }
}

/// Headlines containing "dreary" score low, everything else high. Lets a
/// test mix acceptances and rejections without a real lexicon.
pub struct MarkerScorer;

impl Scorer for MarkerScorer {
    fn score(&self, text: &str) -> ScoreBreakdown {
        let mean = if text.to_lowercase().contains("dreary") {
            0.05
        } else {
            0.8
        };
        ScoreBreakdown {
            mean,
            vader: mean,
            textblob: mean,
        }
    }
}

/// Returns a canned snippet per URL and records every URL it was asked for.
pub struct CannedExtractor {
    pub snippets: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl CannedExtractor {
    pub fn new(snippets: Vec<(&str, &str)>) -> Self {
        Self {
            snippets: snippets
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnippetExtractor for CannedExtractor {
    async fn extract(&self, url: &str) -> Option<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.snippets.get(url).cloned()
    }
}
