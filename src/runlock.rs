//! Advisory run lock.
//!
//! The persisted collections assume exactly one writer. The scheduler is
//! supposed to guarantee non-overlapping runs; this lock makes that
//! assumption explicit instead of silently risking concurrent corruption. A
//! lock left behind by a crashed run is broken once it is older than the
//! stale threshold.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock or fail fast. A fresh lock file means another run is
    /// active; a stale one (older than `stale_after`) is removed with a
    /// warning and acquisition retried once.
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self> {
        match Self::try_create(path) {
            Ok(lock) => Ok(lock),
            Err(first_err) => {
                if Self::is_stale(path, stale_after) {
                    warn!(path = %path.display(), "breaking stale run lock");
                    let _ = fs::remove_file(path);
                    return Self::try_create(path);
                }
                Err(first_err)
            }
        }
    }

    fn try_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating lock directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                anyhow!(
                    "another run appears to be active (lock {} exists): {e}",
                    path.display()
                )
            })?;
        let _ = writeln!(file, "pid {}", std::process::id());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        meta.modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .is_some_and(|age| age > stale_after)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove run lock");
        }
    }
}
