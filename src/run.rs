//! One curation run, end to end.
//!
//! Load → fetch each feed with retry → pipeline → save current → migrate
//! overflow → flush cache → record metrics. Feed failures are contained to
//! their feed; only lock contention or a failed collection write aborts the
//! run. Collections are rewritten whole each run, so a crashed run leaves
//! nothing to repair beyond what the next run rebuilds anyway.

use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::archive;
use crate::cache::SnippetCache;
use crate::config::CuratorConfig;
use crate::extract::SnippetExtractor;
use crate::fetch::{fetch_with_retry, FeedTransport};
use crate::pipeline::Curator;
use crate::runlock::RunLock;
use crate::score::Scorer;
use crate::stats::{self, RunMetrics};
use crate::store;
use crate::timeutil;

#[derive(Debug)]
pub struct RunReport {
    pub accepted: usize,
    pub archived: usize,
    pub metrics: RunMetrics,
}

pub async fn run_curation(
    cfg: &CuratorConfig,
    transport: &dyn FeedTransport,
    scorer: &dyn Scorer,
    extractor: &dyn SnippetExtractor,
) -> Result<RunReport> {
    let started = Instant::now();
    let _lock = RunLock::acquire(&cfg.lock_file, Duration::from_secs(cfg.lock_stale_secs))?;

    if let Some(parent) = cfg.data_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    let current = store::load_collection(&cfg.data_file);
    let mut cache = SnippetCache::load(&cfg.cache_file, cfg.cache_max_entries);

    let mut curator = Curator::new(cfg, scorer, extractor, &mut cache, current.stories);

    for feed_url in &cfg.feeds {
        info!(feed = %feed_url, "checking feed");
        curator.note_feed_checked();
        match fetch_with_retry(
            transport,
            feed_url,
            cfg.fetch_max_attempts,
            cfg.fetch_initial_delay(),
        )
        .await
        {
            Ok(feed) => curator.ingest(feed_url, &feed).await,
            Err(e) => {
                error!(feed = %feed_url, error = %e, "feed skipped for this run");
                curator.note_feed_failed();
            }
        }
    }

    let outcome = curator.finish();

    // The completion marker updates even on a no-op run.
    store::save_collection(
        &cfg.data_file,
        &outcome.keep,
        Some(&timeutil::now_utc_string()),
    )
    .context("saving current collection")?;

    let archived = archive::merge_into_archive(outcome.overflow, &cfg.archive_file)
        .context("merging overflow into archive")?;

    // Advisory state: losing it is a latency cost, not a correctness one.
    if let Err(e) = cache.flush() {
        tracing::warn!(error = %e, "snippet cache flush failed");
    }

    let mut metrics = outcome.metrics;
    metrics.duration_ms = started.elapsed().as_millis() as u64;
    stats::record_run(&cfg.metrics_file, &metrics, cfg.metrics_keep_last);

    Ok(RunReport {
        accepted: outcome.accepted,
        archived,
        metrics,
    })
}
