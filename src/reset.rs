//! Workspace reset.
//!
//! A package tree is always rebuilt from scratch. Directory removal can lag
//! behind `remove_dir_all` on some filesystems, so the reset waits until the
//! path is gone before handing the location back to the stager.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Bounded wait applied by `reset_workspace`.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(5);

const INITIAL_POLL: Duration = Duration::from_millis(5);
const MAX_POLL: Duration = Duration::from_millis(200);

/// Remove `path` and everything below it, then wait for the removal to land.
pub fn reset_workspace(path: &Path) -> Result<()> {
    reset_workspace_with_timeout(path, DEFAULT_RESET_TIMEOUT)
}

pub fn reset_workspace_with_timeout(path: &Path, timeout: Duration) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed previous package tree");
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("remove {}", path.display()));
        }
    }
    wait_until_absent(path, timeout)
}

/// Poll with exponential backoff until `path` no longer exists.
pub fn wait_until_absent(path: &Path, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    let mut delay = INITIAL_POLL;
    while path.exists() {
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(anyhow!(
                "{} still exists {}ms after removal",
                path.display(),
                elapsed.as_millis()
            ));
        }
        thread::sleep(delay.min(timeout - elapsed));
        delay = (delay * 2).min(MAX_POLL);
    }
    Ok(())
}
