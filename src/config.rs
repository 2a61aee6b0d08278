//! Run configuration.
//!
//! Everything the pipeline treats as policy — feed list, blocklists, the
//! score threshold, retention caps, source tables — is explicit data here,
//! loaded from a TOML file with per-field defaults. The defaults reproduce
//! the long-standing production values, so an empty file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::source::SourceResolver;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// RSS feed URLs checked each run.
    pub feeds: Vec<String>,
    /// Accept only stories whose mean score is strictly above this.
    pub sentiment_threshold: f64,
    /// Case-insensitive headline substrings that reject an entry outright.
    pub block_list: Vec<String>,
    /// Link substrings that reject an entry before anything else runs.
    pub url_blocklist: Vec<String>,
    /// Retention bound for the current collection.
    pub max_stories: usize,

    pub data_file: PathBuf,
    pub archive_file: PathBuf,
    pub cache_file: PathBuf,
    pub metrics_file: PathBuf,
    pub lock_file: PathBuf,

    pub fetch_max_attempts: u32,
    pub fetch_initial_delay_secs: u64,
    pub http_timeout_secs: u64,

    pub cache_max_entries: usize,
    pub metrics_keep_last: usize,
    /// Locks older than this are considered abandoned and broken.
    pub lock_stale_secs: u64,

    /// Feed/article URL fragment → canonical publisher label.
    pub source_map: Vec<(String, String)>,
    /// Secondary domain fragments for articles the primary map misses.
    pub domain_hints: Vec<(String, String)>,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        let defaults = SourceResolver::with_default_tables();
        Self {
            feeds: [
                "http://feeds.bbci.co.uk/news/rss.xml",
                "https://www.abc.net.au/news/feed/45910/rss.xml",
                "https://www.theguardian.com/world/rss",
                "https://www.sbs.com.au/news/feed",
                "https://feeds.arstechnica.com/arstechnica/index",
                "https://feedx.net/rss/ap.xml",
                "https://feeds.npr.org/1001/rss.xml",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sentiment_threshold: 0.2,
            block_list: ["kill", "bomb", "murder", "rampage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            url_blocklist: Vec::new(),
            max_stories: 100,
            data_file: PathBuf::from("data/good_news.json"),
            archive_file: PathBuf::from("data/old_news.json"),
            cache_file: PathBuf::from("data/content_cache.json"),
            metrics_file: PathBuf::from("data/run_metrics.json"),
            lock_file: PathBuf::from("data/curator.lock"),
            fetch_max_attempts: 3,
            fetch_initial_delay_secs: 2,
            http_timeout_secs: 10,
            cache_max_entries: 5_000,
            metrics_keep_last: 50,
            lock_stale_secs: 3_600,
            source_map: defaults.identity_pairs(),
            domain_hints: defaults.domain_hint_pairs(),
        }
    }
}

impl CuratorConfig {
    /// Read a TOML config; absent file means all defaults. Fields not present
    /// in the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn resolver(&self) -> SourceResolver {
        SourceResolver::new(self.source_map.clone(), self.domain_hints.clone())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn fetch_initial_delay(&self) -> Duration {
        Duration::from_secs(self.fetch_initial_delay_secs)
    }
}
