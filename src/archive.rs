//! Overflow migration into the unbounded archive.
//!
//! Archive writes are infrequent, so a full re-sort after the merge is
//! cheaper to reason about than incremental insertion — it also repairs any
//! ordering damage from hand edits to the file.

use std::path::Path;

use anyhow::Result;
use std::collections::HashSet;
use tracing::info;

use crate::store::{self, Story};

/// Merge overflow stories into the archive at `path`. Links already present
/// are dropped, making the merge idempotent; the file is rewritten only when
/// something was actually added.
pub fn merge_into_archive(overflow: Vec<Story>, path: &Path) -> Result<usize> {
    if overflow.is_empty() {
        return Ok(0);
    }

    let mut archive = store::load_collection(path);
    let mut known: HashSet<String> = archive.stories.iter().map(|s| s.link.clone()).collect();

    let mut added = 0usize;
    for story in overflow {
        if known.insert(story.link.clone()) {
            archive.stories.push(story);
            added += 1;
        }
    }

    if added > 0 {
        store::sort_stories(&mut archive.stories);
        store::save_collection(path, &archive.stories, archive.last_run.as_deref())?;
        info!(added, path = %path.display(), "archived overflow stories");
    }
    Ok(added)
}
