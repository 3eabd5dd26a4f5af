use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, trace, warn};

use crate::classify::{classify, LockErrorClass};
use crate::error::{LockError, LockResult};
use crate::mode::LockMode;

/// Options for opening a lock file.
#[derive(Clone, Debug)]
pub struct LockOptions {
    /// Create missing parent directories of the lock file (default: true).
    pub create_parent_dirs: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            create_parent_dirs: true,
        }
    }
}

/// A lock file that guards one store.
///
/// The file is only used as a lock handle; its content is never read,
/// written, or truncated. Each acquisition opens its own handle, so holders
/// in different threads of one process contend exactly like holders in
/// different processes.
#[derive(Clone, Debug)]
pub struct FileLock {
    path: PathBuf,
    options: LockOptions,
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, LockOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: LockOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held at `mode` and return a guard for it.
    ///
    /// The OS call blocks the thread; there is no polling. Reports of
    /// "resource deadlock would occur" are retried without bound, any other
    /// error closes the handle and is returned.
    pub fn acquire(&self, mode: LockMode) -> LockResult<FileLockGuard> {
        let file = self.open()?;

        let retries = acquire_with_retry(|| lock_file(&file, mode)).map_err(|source| {
            LockError::Acquire {
                path: self.path.clone(),
                mode,
                source,
            }
        })?;

        debug!(path = %self.path.display(), %mode, retries, "file lock acquired");
        Ok(FileLockGuard {
            file,
            path: self.path.clone(),
            mode,
        })
    }

    /// Run `action` while holding the lock at `mode`.
    ///
    /// `action` runs exactly once, and only if the lock was acquired. The lock
    /// is released before this returns, including when `action` panics.
    pub fn with_lock<T, F>(&self, mode: LockMode, action: F) -> LockResult<T>
    where
        F: FnOnce() -> T,
    {
        let guard = self.acquire(mode)?;
        let out = action();
        drop(guard);
        Ok(out)
    }

    fn open(&self) -> LockResult<File> {
        let open_err = |source| LockError::Open {
            path: self.path.clone(),
            source,
        };

        if self.options.create_parent_dirs {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        // Exclusive locks need a writable handle on some platforms, so the
        // file is always opened read-write.
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(open_err)
    }
}

/// Run `action` under a lock on `path` with default [`LockOptions`].
pub fn with_lock<T, F>(path: impl AsRef<Path>, mode: LockMode, action: F) -> LockResult<T>
where
    F: FnOnce() -> T,
{
    FileLock::new(path.as_ref()).with_lock(mode, action)
}

/// A held advisory lock.
///
/// Dropping the guard unlocks the file and then closes the handle.
#[derive(Debug)]
pub struct FileLockGuard {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl FileLockGuard {
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // Closing the handle releases the lock as well; unlocking first keeps
        // the release independent of when the descriptor is actually freed.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to unlock file");
        }
        debug!(path = %self.path.display(), mode = %self.mode, "file lock released");
    }
}

fn lock_file(file: &File, mode: LockMode) -> io::Result<()> {
    match mode {
        LockMode::Shared => FileExt::lock_shared(file),
        LockMode::Exclusive => FileExt::lock_exclusive(file),
    }
}

/// Call `attempt` until it succeeds or fails with a non-transient error.
///
/// Returns the number of transient failures that were retried.
pub(crate) fn acquire_with_retry<F>(mut attempt: F) -> io::Result<u64>
where
    F: FnMut() -> io::Result<()>,
{
    let mut retries: u64 = 0;
    loop {
        match attempt() {
            Ok(()) => return Ok(retries),
            Err(e) => match classify(&e) {
                LockErrorClass::DeadlockTransient => {
                    retries += 1;
                    trace!(retries, "lock reported a same-process deadlock; retrying");
                }
                LockErrorClass::Other => return Err(e),
            },
        }
    }
}
