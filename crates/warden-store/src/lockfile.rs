use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::StoreError;

/// Exclusive `<target>.lock` marker, removed on drop.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    _handle: std::fs::File,
}

impl LockFile {
    pub fn acquire(target: &Path) -> Result<Self, StoreError> {
        let lock_path = target.with_extension("lock");
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(handle) => Ok(Self {
                path: lock_path,
                _handle: handle,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::LockContention(target.to_path_buf()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Retry `acquire` up to `attempts` times, sleeping `backoff` in between.
    pub fn acquire_with_retry(
        target: &Path,
        attempts: u32,
        backoff: Duration,
    ) -> Result<Self, StoreError> {
        let mut remaining = attempts.max(1);
        loop {
            match Self::acquire(target) {
                Err(StoreError::LockContention(_)) if remaining > 1 => {
                    remaining -= 1;
                    std::thread::sleep(backoff);
                }
                other => return other,
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
