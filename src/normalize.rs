//! Out-of-band source relabeling.
//!
//! When the resolver tables change, stored stories keep whatever label they
//! were accepted under. This pass re-resolves `source` for every story in
//! the current collection, feeding the stored label back in as the display
//! title so it still wins when nothing stronger matches. The file is
//! rewritten only when a label actually changed; shape and `last run` are
//! preserved.

use anyhow::Result;
use tracing::info;

use crate::config::CuratorConfig;
use crate::store;

/// Re-apply the canonical-source mapping to the current collection.
/// Returns the number of stories whose label changed.
pub fn normalize_sources(cfg: &CuratorConfig) -> Result<usize> {
    let resolver = cfg.resolver();
    let mut collection = store::load_collection(&cfg.data_file);

    let mut changed = 0usize;
    for story in &mut collection.stories {
        let old = story.source.clone();
        let title = if old.is_empty() { None } else { Some(old.as_str()) };
        let new = resolver.resolve(&story.link, title, Some(&story.link));
        if new != old {
            info!(link = %story.link, from = %old, to = %new, "relabeling story source");
            story.source = new;
            changed += 1;
        }
    }

    if changed > 0 {
        store::save_collection(
            &cfg.data_file,
            &collection.stories,
            collection.last_run.as_deref(),
        )?;
    }
    Ok(changed)
}
