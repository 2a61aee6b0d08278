//! The curation pipeline.
//!
//! One [`Curator`] lives for one run. It starts from the loaded current
//! collection, streams candidate entries through the policy gates and keeps
//! the in-memory sequence continuously sorted by binary-search insertion —
//! entries arrive feed by feed, never globally ordered, so a full re-sort
//! per item would be wasted work. `finish` splits the sequence into the
//! bounded keep set and the overflow destined for the archive.
//!
//! Gate order matters and is part of the contract:
//! url blocklist → dedup → headline blocklist → score threshold. Blocked
//! links must never reach extraction or the cache, and must not consume a
//! dedup slot.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::cache::SnippetCache;
use crate::config::CuratorConfig;
use crate::extract::{self, SnippetExtractor};
use crate::fetch::{FeedEntry, FetchedFeed};
use crate::score::Scorer;
use crate::source::SourceResolver;
use crate::stats::RunMetrics;
use crate::store::{self, Story};
use crate::timeutil;

pub const PLACEHOLDER_SNIPPET: &str = "Summary not available.";

pub struct Curator<'a> {
    cfg: &'a CuratorConfig,
    resolver: SourceResolver,
    scorer: &'a dyn Scorer,
    extractor: &'a dyn SnippetExtractor,
    cache: &'a mut SnippetCache,

    stories: Vec<Story>,
    /// Parallel to `stories`: negated normalized instants, ascending. The
    /// negation turns "newest first" into a plain ascending binary search.
    sort_keys: Vec<i64>,
    known_links: HashSet<String>,
    metrics: RunMetrics,
    accepted_this_run: usize,
}

/// What a finished run hands back to the orchestrator.
#[derive(Debug)]
pub struct RunOutcome {
    /// The new current collection, bounded and sorted.
    pub keep: Vec<Story>,
    /// Items displaced past the retention bound, for the archive merger.
    pub overflow: Vec<Story>,
    pub accepted: usize,
    pub metrics: RunMetrics,
}

impl<'a> Curator<'a> {
    pub fn new(
        cfg: &'a CuratorConfig,
        scorer: &'a dyn Scorer,
        extractor: &'a dyn SnippetExtractor,
        cache: &'a mut SnippetCache,
        mut current: Vec<Story>,
    ) -> Self {
        // Normalize whatever came off disk; everything after this point
        // relies on the sequence being sorted.
        store::sort_stories(&mut current);
        let sort_keys = current.iter().map(|s| negate(s.sort_key())).collect();
        let known_links = current.iter().map(|s| s.link.clone()).collect();
        Self {
            cfg,
            resolver: cfg.resolver(),
            scorer,
            extractor,
            cache,
            stories: current,
            sort_keys,
            known_links,
            metrics: RunMetrics::default(),
            accepted_this_run: 0,
        }
    }

    pub fn note_feed_checked(&mut self) {
        self.metrics.feeds_checked += 1;
    }

    pub fn note_feed_failed(&mut self) {
        self.metrics.feeds_failed += 1;
    }

    /// Run every entry of a fetched feed through the gates.
    pub async fn ingest(&mut self, feed_url: &str, feed: &FetchedFeed) {
        for entry in &feed.entries {
            self.metrics.entries_seen += 1;
            self.process_entry(feed_url, feed.feed_title.as_deref(), entry)
                .await;
        }
    }

    async fn process_entry(
        &mut self,
        feed_url: &str,
        feed_title: Option<&str>,
        entry: &FeedEntry,
    ) {
        let Some(link) = entry.link.as_deref() else {
            debug!(feed = feed_url, title = %entry.title, "entry without a link, skipping");
            return;
        };

        // Link policy comes first: a blocked link never counts against dedup
        // and never triggers network work.
        if self
            .cfg
            .url_blocklist
            .iter()
            .any(|frag| link.contains(frag.as_str()))
        {
            self.metrics.entries_blocked += 1;
            debug!(link, "link matches url blocklist");
            return;
        }

        if self.known_links.contains(link) {
            return;
        }

        let headline_lower = entry.title.to_lowercase();
        if self
            .cfg
            .block_list
            .iter()
            .any(|term| headline_lower.contains(&term.to_lowercase()))
        {
            self.metrics.entries_blocked += 1;
            debug!(headline = %entry.title, "headline matches blocklist");
            return;
        }

        let score = self.scorer.score(&entry.title);
        if score.mean <= self.cfg.sentiment_threshold {
            self.metrics.entries_rejected += 1;
            return;
        }

        let first_sentence = self.resolve_snippet(link, entry).await;

        // Feed time when parseable, otherwise the processing instant.
        let epoch = match timeutil::normalize(entry.pub_date.as_deref()) {
            timeutil::EPOCH_SENTINEL => timeutil::now_epoch(),
            e => e,
        };
        let timestamp = timeutil::format_utc(epoch);

        let source = self.resolver.resolve(feed_url, feed_title, Some(link));

        info!(
            headline = %entry.title,
            mean = format!("{:.4}", score.mean),
            source = %source,
            "accepted story"
        );

        let story = Story {
            headline: entry.title.clone(),
            link: link.to_string(),
            mean_score: round4(score.mean),
            vader_score: round4(score.vader),
            textblob_score: round4(score.textblob),
            first_sentence,
            timestamp,
            source: source.clone(),
        };

        self.insert_sorted(story, epoch);
        self.known_links.insert(link.to_string());
        self.metrics.accepted_for(&source);
        self.accepted_this_run += 1;
    }

    /// Snippet chain: cache → extractor (caching a usable result) → entry
    /// description with markup stripped, up to the first `.` → placeholder.
    async fn resolve_snippet(&mut self, link: &str, entry: &FeedEntry) -> String {
        if let Some(hit) = self.cache.get(link) {
            self.metrics.cache_hits += 1;
            return hit.to_string();
        }
        self.metrics.cache_misses += 1;

        if let Some(extracted) = self.extractor.extract(link).await {
            if !extracted.trim().is_empty() {
                self.cache.put(link, &extracted);
                return extracted;
            }
        }

        if let Some(desc) = entry.description.as_deref() {
            let text = extract::strip_markup(desc);
            if !text.is_empty() {
                let head = text.split('.').next().unwrap_or(&text);
                return format!("{head}.");
            }
        }

        PLACEHOLDER_SNIPPET.to_string()
    }

    /// Rightmost binary-search insertion on the negated-instant key: equal
    /// timestamps land after the items already present, keeping first-seen
    /// order stable.
    fn insert_sorted(&mut self, story: Story, epoch: i64) {
        let key = negate(epoch);
        let idx = self.sort_keys.partition_point(|&k| k <= key);
        self.sort_keys.insert(idx, key);
        self.stories.insert(idx, story);
    }

    /// Split the sequence into the bounded current set and the overflow. On
    /// a run with zero acceptances the content is unchanged and the overflow
    /// empty; the caller still records the run's completion instant.
    pub fn finish(mut self) -> RunOutcome {
        self.metrics.run_at = timeutil::now_utc_string();

        let overflow = if self.accepted_this_run > 0 && self.stories.len() > self.cfg.max_stories {
            self.stories.split_off(self.cfg.max_stories)
        } else {
            Vec::new()
        };

        RunOutcome {
            keep: self.stories,
            overflow,
            accepted: self.accepted_this_run,
            metrics: self.metrics,
        }
    }
}

/// Negate an epoch without overflowing on the sentinel.
fn negate(epoch: i64) -> i64 {
    0i64.saturating_sub(epoch)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
