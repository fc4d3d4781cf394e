//! File locking that keeps the background rebuild singly-instanced.
//!
//! Uses flock() for advisory locking on the base directory. `update-index`
//! holds the lock for the whole rebuild; a second rebuild process that finds
//! it held exits without doing anything.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Lock file name placed in the base directory
const LOCK_FILE_NAME: &str = "rebuild.lock";

/// A held file lock that releases on drop
pub struct RebuildLock {
    #[allow(dead_code)]
    file: File,
}

impl RebuildLock {
    /// Attempt to acquire the rebuild lock without blocking.
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(base_path: &Path) -> io::Result<Option<Self>> {
        let lock_path = base_path.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if Self::try_lock_exclusive(&file)? {
            Ok(Some(RebuildLock { file }))
        } else {
            Ok(None)
        }
    }

    #[cfg(unix)]
    fn try_lock_exclusive(file: &File) -> io::Result<bool> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == Some(libc::EWOULDBLOCK)
                || err.raw_os_error() == Some(libc::EAGAIN)
            {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(true)
    }

    #[cfg(not(unix))]
    fn try_lock_exclusive(_file: &File) -> io::Result<bool> {
        // On non-Unix platforms only the in-progress flag guards rebuilds
        Ok(true)
    }
}

#[cfg(unix)]
impl Drop for RebuildLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // Release the lock - ignore errors on drop
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();

        // First lock should succeed
        let lock1 = RebuildLock::try_acquire(dir.path()).unwrap();
        assert!(lock1.is_some(), "First lock should succeed");

        // Second lock should be refused (non-blocking)
        let lock2 = RebuildLock::try_acquire(dir.path()).unwrap();
        assert!(lock2.is_none(), "Second lock should be refused");

        // Drop first lock
        drop(lock1);

        // Now third lock should succeed
        let lock3 = RebuildLock::try_acquire(dir.path()).unwrap();
        assert!(lock3.is_some(), "Third lock should succeed after release");
    }

    #[test]
    fn test_missing_base_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(RebuildLock::try_acquire(&missing).is_err());
    }
}
