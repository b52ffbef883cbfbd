// src/lock.rs
//! Single-writer guard for the history file. Two overlapping runs would
//! otherwise both read the old history and deliver the same stories.

use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCK_PATH: &str = "news-digest.lock";
pub const ENV_LOCK_PATH: &str = "DIGEST_LOCK_PATH";

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Create the lock file holding our pid. Fails if it already exists.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create lock dir {}", parent.display()))?;
        }
        match OpenOptions::new().create_new(true).write(true).open(path) {
            Ok(mut file) => {
                // guard first: a failed write drops it and removes the file
                let lock = Self {
                    path: path.to_path_buf(),
                };
                writeln!(file, "{}", std::process::id())
                    .and_then(|()| file.sync_all())
                    .with_context(|| format!("write pid to {}", path.display()))?;
                Ok(lock)
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = std::fs::read_to_string(path).unwrap_or_default();
                bail!(
                    "another digest run holds {} (pid {}); remove it if no run is active",
                    path.display(),
                    holder.trim()
                )
            }
            Err(err) => Err(err).with_context(|| format!("open lock {}", path.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
