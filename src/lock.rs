// src/lock.rs

//! Exclusive run lock
//!
//! Every sync run holds an exclusive lock on `.addonrepo.lock` in its work
//! directory for its whole duration, so two runs sharing a work directory
//! execute one after the other.
//!
//! # Example
//!
//! ```ignore
//! use addonrepo::lock::RunLock;
//!
//! let _lock = RunLock::acquire(&config.work_dir)?;
//! // ... clone, fetch, publish ...
//! // Lock released on drop
//! ```

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lock file name inside the work directory
pub const LOCK_FILE: &str = ".addonrepo.lock";

/// Exclusive lock on a work directory
pub struct RunLock {
    /// Kept open to hold the lock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock for `work_dir`, blocking until it is available
    pub fn acquire(work_dir: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(work_dir)?;

        file.lock_exclusive()
            .map_err(|e| Error::IoError(format!("Failed to acquire run lock: {e}")))?;

        info!("Acquired run lock at {}", path.display());
        Ok(Self { file, path })
    }

    /// Path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Closing the file releases the lock
        debug!("Released run lock at {}", self.path.display());
    }
}

fn open_lock_file(work_dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(work_dir).map_err(|e| {
        Error::IoError(format!(
            "Failed to create work directory {}: {e}",
            work_dir.display()
        ))
    })?;

    let path = work_dir.join(LOCK_FILE);
    let file = File::create(&path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;
    Ok((file, path))
}
