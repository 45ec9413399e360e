//! Single-instance guard for the background scheduler.
//!
//! The lock file lives next to the config file, so two schedulers sharing one config never
//! push the same work directory concurrently.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = ".git_push.lock";

/// Exclusive lock guard; unlocks on drop and leaves the lock file in place.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Never unlink: a waiter may already hold a handle to this inode.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Lock path for the config file at `config_path`.
pub fn lock_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from(LOCK_FILE_NAME), |p| p.join(LOCK_FILE_NAME))
}

/// Acquire a non-blocking exclusive lock at `p`. A lock held elsewhere yields
/// `ErrorKind::WouldBlock`.
pub fn acquire_lock_at(p: &Path) -> io::Result<InstanceLock> {
    if let Some(parent) = p.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(p)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(InstanceLock { file }),
        Err(e)
            if e.kind() == io::ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
        {
            Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!(
                    "another scheduler is already running (lock held at {})",
                    p.display()
                ),
            ))
        }
        Err(e) => Err(e),
    }
}
