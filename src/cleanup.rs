//! Out-of-band policy cleanup.
//!
//! Policy tables evolve; stories accepted under yesterday's rules can
//! violate today's. This pass re-applies the headline blocklist, the score
//! threshold and the link blocklist to the current collection, and the link
//! blocklist alone to the archive, rewriting each file only when something
//! was removed. Shape and `last run` are preserved.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::CuratorConfig;
use crate::store::{self, Story};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_current: usize,
    pub removed_archive: usize,
}

fn violates_full_policy(story: &Story, cfg: &CuratorConfig) -> bool {
    let headline = story.headline.to_lowercase();
    let headline_blocked = cfg
        .block_list
        .iter()
        .any(|term| headline.contains(&term.to_lowercase()));
    let below_threshold = story.mean_score <= cfg.sentiment_threshold;
    headline_blocked || below_threshold || link_blocked(story, cfg)
}

fn link_blocked(story: &Story, cfg: &CuratorConfig) -> bool {
    cfg.url_blocklist
        .iter()
        .any(|frag| story.link.contains(frag.as_str()))
}

fn cleanup_file<F>(path: &Path, violates: F) -> Result<usize>
where
    F: Fn(&Story) -> bool,
{
    let collection = store::load_collection(path);
    let before = collection.stories.len();
    let kept: Vec<Story> = collection
        .stories
        .into_iter()
        .filter(|s| {
            if violates(s) {
                info!(headline = %s.headline, link = %s.link, "removing policy-violating story");
                false
            } else {
                true
            }
        })
        .collect();

    let removed = before - kept.len();
    if removed > 0 {
        store::save_collection(path, &kept, collection.last_run.as_deref())?;
    }
    Ok(removed)
}

/// Apply the current policy to both collections.
pub fn cleanup_collections(cfg: &CuratorConfig) -> Result<CleanupReport> {
    let removed_current = cleanup_file(&cfg.data_file, |s| violates_full_policy(s, cfg))?;
    // The archive keeps low-scoring overflow by design; only hard link
    // blocks apply there.
    let removed_archive = cleanup_file(&cfg.archive_file, |s| link_blocked(s, cfg))?;
    Ok(CleanupReport {
        removed_current,
        removed_archive,
    })
}
