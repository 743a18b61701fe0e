// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Advisory File Lock
//!
//! A thin `flock`-based mutex over a path, used by
//! [`super::disk::SharedDiskCacheBackend`] to serialize concurrent access
//! to one cache entry across processes sharing a cache directory. Same
//! Unix/Windows platform split as `dagflow-bootstrap::platform`, kept
//! local here since locking is a cache-adapter concern rather than a
//! general platform capability.

use dagflow_domain::error::EngineError;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    pub async fn acquire(path: &Path) -> Result<Self, EngineError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&path)
                .map_err(EngineError::from)?;
            lock_exclusive(&file)?;
            Ok(FileLock { _file: file, path })
        })
        .await
        .map_err(|e| EngineError::internal(format!("lock task panicked: {e}")))?
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = unlock(&self._file);
        let _ = &self.path;
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> Result<(), EngineError> {
    use std::os::unix::io::AsRawFd;
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if ret != 0 {
        return Err(EngineError::Io(std::io::Error::last_os_error().to_string()));
    }
    Ok(())
}

#[cfg(unix)]
fn unlock(file: &File) -> Result<(), EngineError> {
    use std::os::unix::io::AsRawFd;
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if ret != 0 {
        return Err(EngineError::Io(std::io::Error::last_os_error().to_string()));
    }
    Ok(())
}

#[cfg(windows)]
fn lock_exclusive(file: &File) -> Result<(), EngineError> {
    use std::os::windows::io::AsRawHandle;
    use winapi::um::fileapi::LockFile;
    let handle = file.as_raw_handle() as winapi::um::winnt::HANDLE;
    let ok = unsafe { LockFile(handle, 0, 0, u32::MAX, u32::MAX) };
    if ok == 0 {
        return Err(EngineError::Io(std::io::Error::last_os_error().to_string()));
    }
    Ok(())
}

#[cfg(windows)]
fn unlock(file: &File) -> Result<(), EngineError> {
    use std::os::windows::io::AsRawHandle;
    use winapi::um::fileapi::UnlockFile;
    let handle = file.as_raw_handle() as winapi::um::winnt::HANDLE;
    let ok = unsafe { UnlockFile(handle, 0, 0, u32::MAX, u32::MAX) };
    if ok == 0 {
        return Err(EngineError::Io(std::io::Error::last_os_error().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_and_drop_round_trips() {
        let path = std::env::temp_dir().join(format!("dagflow-lock-test-{}.lock", std::process::id()));
        let lock = FileLock::acquire(&path).await.unwrap();
        drop(lock);
        std::fs::remove_file(&path).ok();
    }
}
