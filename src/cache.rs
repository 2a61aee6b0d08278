//! Cross-run snippet cache.
//!
//! Maps article URL → extracted first sentence so a story seen again (e.g.
//! after overflowing into archive territory and back through a feed) is not
//! re-fetched. Purely advisory: losing the file costs latency, never
//! correctness.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error};

#[derive(Debug)]
pub struct SnippetCache {
    path: PathBuf,
    entries: HashMap<String, String>,
    /// Insertion order, oldest first. Drives eviction once `max_entries` is
    /// reached; article URLs never change meaning, so FIFO beats TTL here.
    order: VecDeque<String>,
    max_entries: usize,
    dirty: bool,
}

impl SnippetCache {
    /// Load the cache file, treating a missing, unreadable or corrupt file
    /// as empty.
    pub fn load(path: &Path, max_entries: usize) -> Self {
        let entries: HashMap<String, String> = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "snippet cache corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "snippet cache unreadable, starting empty");
                HashMap::new()
            }
        };
        // Order after a reload is arbitrary; that only skews which entries
        // evict first, which is acceptable for an advisory cache.
        let order: VecDeque<String> = entries.keys().cloned().collect();
        Self {
            path: path.to_path_buf(),
            entries,
            order,
            max_entries,
            dirty: false,
        }
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    pub fn put(&mut self, url: &str, snippet: &str) {
        if self.entries.insert(url.to_string(), snippet.to_string()).is_none() {
            self.order.push_back(url.to_string());
            while self.entries.len() > self.max_entries {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                    debug!(url = %oldest, "evicted oldest snippet cache entry");
                } else {
                    break;
                }
            }
        }
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the full mapping with a write-then-rename so readers never see
    /// a torn file. No-op when nothing changed this run.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("writing snippet cache to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming snippet cache into {}", self.path.display()))?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_flush_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let mut cache = SnippetCache::load(&path, 100);
        assert!(cache.is_empty());
        cache.put("https://a.example/1", "First sentence.");
        cache.flush().unwrap();

        let reloaded = SnippetCache::load(&path, 100);
        assert_eq!(reloaded.get("https://a.example/1"), Some("First sentence."));
        assert_eq!(reloaded.get("https://a.example/2"), None);
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        fs::write(&path, "{not valid json").unwrap();

        let cache = SnippetCache::load(&path, 100);
        assert!(cache.is_empty());
    }

    #[test]
    fn unreadable_path_degrades_to_empty() {
        // Read errors other than NotFound (here: the path is a directory)
        // must degrade the same way a missing file does.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");
        fs::create_dir(&path).unwrap();

        let cache = SnippetCache::load(&path, 100);
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_drops_oldest_insert_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let mut cache = SnippetCache::load(&path, 2);
        cache.put("u1", "one");
        cache.put("u2", "two");
        cache.put("u3", "three");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("u1"), None);
        assert_eq!(cache.get("u2"), Some("two"));
        assert_eq!(cache.get("u3"), Some("three"));
    }

    #[test]
    fn overwriting_an_entry_does_not_grow_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let mut cache = SnippetCache::load(&path, 2);
        cache.put("u1", "one");
        cache.put("u1", "one, revised");
        cache.put("u2", "two");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("u1"), Some("one, revised"));
    }

    #[test]
    fn flush_without_changes_does_not_create_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippets.json");

        let mut cache = SnippetCache::load(&path, 10);
        cache.flush().unwrap();
        assert!(!path.exists());
    }
}
