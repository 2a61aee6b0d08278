//! Per-run counters and their rolling history.
//!
//! Metrics are a best-effort side channel: failure to persist them logs a
//! warning and nothing else. Counters are mirrored onto the `metrics` facade
//! so an embedding service with an exporter sees them too; the batch binary
//! installs no recorder and the mirror is a no-op there.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use metrics::{counter, describe_counter, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::timeutil;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Completion instant in the legacy UTC shape.
    pub run_at: String,
    pub feeds_checked: u32,
    pub feeds_failed: u32,
    pub entries_seen: u32,
    pub entries_blocked: u32,
    pub entries_rejected: u32,
    pub entries_accepted: u32,
    pub accepted_by_source: BTreeMap<String, u32>,
    pub cache_hits: u32,
    pub cache_misses: u32,
    pub duration_ms: u64,
}

impl RunMetrics {
    pub fn accepted_for(&mut self, source: &str) {
        self.entries_accepted += 1;
        *self.accepted_by_source.entry(source.to_string()).or_default() += 1;
    }
}

fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("curator_feeds_checked_total", "Feeds fetched per run.");
        describe_counter!("curator_feeds_failed_total", "Feeds that failed all retries.");
        describe_counter!("curator_entries_seen_total", "Raw feed entries examined.");
        describe_counter!("curator_entries_blocked_total", "Entries rejected by blocklists.");
        describe_counter!(
            "curator_entries_rejected_total",
            "Entries below the sentiment threshold."
        );
        describe_counter!("curator_entries_accepted_total", "Entries accepted into the collection.");
        describe_counter!("curator_cache_hits_total", "Snippet cache hits.");
        describe_counter!("curator_cache_misses_total", "Snippet cache misses.");
    });
}

fn mirror_to_facade(m: &RunMetrics) {
    ensure_described();
    counter!("curator_feeds_checked_total").increment(u64::from(m.feeds_checked));
    counter!("curator_feeds_failed_total").increment(u64::from(m.feeds_failed));
    counter!("curator_entries_seen_total").increment(u64::from(m.entries_seen));
    counter!("curator_entries_blocked_total").increment(u64::from(m.entries_blocked));
    counter!("curator_entries_rejected_total").increment(u64::from(m.entries_rejected));
    counter!("curator_entries_accepted_total").increment(u64::from(m.entries_accepted));
    counter!("curator_cache_hits_total").increment(u64::from(m.cache_hits));
    counter!("curator_cache_misses_total").increment(u64::from(m.cache_misses));
    gauge!("curator_last_run_ts").set(timeutil::now_epoch() as f64);
}

/// Append one record to the rolling history, keeping only the most recent
/// `keep_last`, then log a single summary line. Never fails the run.
pub fn record_run(path: &Path, metrics: &RunMetrics, keep_last: usize) {
    mirror_to_facade(metrics);

    info!(
        feeds_checked = metrics.feeds_checked,
        feeds_failed = metrics.feeds_failed,
        entries_seen = metrics.entries_seen,
        blocked = metrics.entries_blocked,
        rejected = metrics.entries_rejected,
        accepted = metrics.entries_accepted,
        cache_hits = metrics.cache_hits,
        cache_misses = metrics.cache_misses,
        duration_ms = metrics.duration_ms,
        "curation run complete"
    );

    if let Err(e) = append_history(path, metrics, keep_last) {
        warn!(path = %path.display(), error = %e, "failed to persist run metrics");
    }
}

fn append_history(path: &Path, metrics: &RunMetrics, keep_last: usize) -> anyhow::Result<()> {
    let mut history: Vec<RunMetrics> = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "metrics history corrupt, starting fresh");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };

    history.push(metrics.clone());
    if history.len() > keep_last {
        let excess = history.len() - keep_last;
        history.drain(0..excess);
    }

    let json = serde_json::to_string_pretty(&history)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
