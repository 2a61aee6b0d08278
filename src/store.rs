//! Durable collection storage.
//!
//! Two JSON shapes exist in the wild: a bare array of stories (the original
//! schema) and an envelope `{"last run": "...", "stories": [...]}` added
//! later for run bookkeeping. Both decode into one canonical record and both
//! survive a save unchanged in shape. The envelope key really is `"last run"`
//! with a space; existing data files depend on it.

use std::cmp::Reverse;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::timeutil;

/// One curated story. Field names mirror the persisted JSON schema; the
/// two sub-scores are retained individually alongside their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub headline: String,
    pub link: String,
    #[serde(default)]
    pub mean_score: f64,
    #[serde(default)]
    pub vader_score: f64,
    #[serde(default)]
    pub textblob_score: f64,
    #[serde(default)]
    pub first_sentence: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub source: String,
}

impl Story {
    /// Sort key: the normalized instant in epoch seconds. Collections order
    /// by this descending; callers that need ascending key order negate it.
    pub fn sort_key(&self) -> i64 {
        timeutil::normalize(Some(&self.timestamp))
    }
}

/// Canonical in-memory form of either persisted shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredCollection {
    pub stories: Vec<Story>,
    /// Present only when the file used the enveloped shape.
    pub last_run: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "last run")]
    last_run: Option<String>,
    stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedShape {
    Enveloped(Envelope),
    Bare(Vec<Story>),
}

/// Load a collection file. Missing file → empty; unreadable or malformed
/// content → empty with an error logged. Corruption never aborts a run.
pub fn load_collection(path: &Path) -> StoredCollection {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return StoredCollection::default(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "unreadable collection file, starting fresh");
            return StoredCollection::default();
        }
    };
    match serde_json::from_str::<PersistedShape>(&raw) {
        Ok(PersistedShape::Enveloped(env)) => StoredCollection {
            stories: env.stories,
            last_run: env.last_run,
        },
        Ok(PersistedShape::Bare(stories)) => StoredCollection {
            stories,
            last_run: None,
        },
        Err(e) => {
            error!(path = %path.display(), error = %e, "malformed collection file, starting fresh");
            StoredCollection::default()
        }
    }
}

/// Save a collection, honoring the shape already on disk.
///
/// An explicit `last_run` forces the enveloped shape. Without one, a file
/// that was enveloped stays enveloped and keeps its prior `last run`
/// (defaulting to now only if it never had one); a bare file stays bare.
pub fn save_collection(path: &Path, stories: &[Story], last_run: Option<&str>) -> Result<()> {
    let prior = prior_envelope_last_run(path);
    let json = match (last_run, prior) {
        (Some(run), _) => envelope_json(stories, Some(run.to_string()))?,
        (None, Some(prior)) => {
            let run = prior.unwrap_or_else(timeutil::now_utc_string);
            envelope_json(stories, Some(run))?
        }
        (None, None) => serde_json::to_string_pretty(stories)?,
    };
    write_atomic(path, &json)
}

/// `None` if the file is absent, unreadable, or bare-shaped; `Some(prior)`
/// if enveloped (the inner option being the stored `last run`, if any).
fn prior_envelope_last_run(path: &Path) -> Option<Option<String>> {
    let raw = fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    let obj = value.as_object()?;
    if !obj.contains_key("stories") {
        return None;
    }
    Some(
        obj.get("last run")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    )
}

fn envelope_json(stories: &[Story], last_run: Option<String>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Envelope {
        last_run,
        stories: stories.to_vec(),
    })?)
}

/// Write-then-rename so a concurrent reader sees either the old or the new
/// complete document, never a partial one.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Full stable re-sort, newest first; unparseable timestamps sort last.
pub fn sort_stories(stories: &mut [Story]) {
    stories.sort_by_key(|s| Reverse(s.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(link: &str, ts: &str) -> Story {
        Story {
            headline: format!("Headline for {link}"),
            link: link.to_string(),
            mean_score: 0.5,
            vader_score: 0.6,
            textblob_score: 0.4,
            first_sentence: "Something nice happened.".to_string(),
            timestamp: ts.to_string(),
            source: "BBC News".to_string(),
        }
    }

    #[test]
    fn bare_shape_round_trips_and_stays_bare() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        let stories = vec![story("l1", "2026-01-01T00:00:00Z")];

        save_collection(&path, &stories, None).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.is_array(), "no last_run and no prior envelope → bare");

        let loaded = load_collection(&path);
        assert_eq!(loaded.stories, stories);
        assert_eq!(loaded.last_run, None);
    }

    #[test]
    fn explicit_last_run_writes_the_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        let stories = vec![story("l2", "2026-01-02T00:00:00Z")];

        save_collection(&path, &stories, Some("2026-01-03T12:00:00Z")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["last run"], "2026-01-03T12:00:00Z");
        assert!(raw["stories"].is_array());

        let loaded = load_collection(&path);
        assert_eq!(loaded.stories, stories);
        assert_eq!(loaded.last_run.as_deref(), Some("2026-01-03T12:00:00Z"));
    }

    #[test]
    fn enveloped_file_keeps_its_last_run_across_plain_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        let stories = vec![story("l3", "2026-01-01T00:00:00Z")];

        save_collection(&path, &stories, Some("2026-01-01T08:00:00Z")).unwrap();
        // A later save without an explicit marker must not lose the old one.
        save_collection(&path, &stories, None).unwrap();

        let loaded = load_collection(&path);
        assert_eq!(loaded.last_run.as_deref(), Some("2026-01-01T08:00:00Z"));
    }

    #[test]
    fn malformed_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        fs::write(&path, "{\"stories\": [{\"broken\"").unwrap();

        let loaded = load_collection(&path);
        assert!(loaded.stories.is_empty());
        assert_eq!(loaded.last_run, None);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_collection(&dir.path().join("nope.json"));
        assert!(loaded.stories.is_empty());
    }

    #[test]
    fn unreadable_path_loads_as_empty() {
        // A directory where the file should be is a read error that is not
        // NotFound; loading must still degrade to empty instead of aborting.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        fs::create_dir(&path).unwrap();

        let loaded = load_collection(&path);
        assert!(loaded.stories.is_empty());
        assert_eq!(loaded.last_run, None);
    }

    #[test]
    fn legacy_partial_records_decode_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good_news.json");
        fs::write(
            &path,
            r#"[{"headline": "h", "link": "l", "timestamp": "2026-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let loaded = load_collection(&path);
        assert_eq!(loaded.stories.len(), 1);
        assert_eq!(loaded.stories[0].mean_score, 0.0);
        assert_eq!(loaded.stories[0].source, "");
    }

    #[test]
    fn sort_is_descending_with_sentinels_last_and_stable_ties() {
        let mut stories = vec![
            story("old", "2024-01-01T00:00:00Z"),
            story("undated", "not a date"),
            story("tie-a", "2024-01-02T00:00:00Z"),
            story("tie-b", "2024-01-02T00:00:00Z"),
            story("new", "2024-01-03T00:00:00Z"),
        ];
        sort_stories(&mut stories);
        let order: Vec<&str> = stories.iter().map(|s| s.link.as_str()).collect();
        assert_eq!(order, vec!["new", "tie-a", "tie-b", "old", "undated"]);
    }
}
