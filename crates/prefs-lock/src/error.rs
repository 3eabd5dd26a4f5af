use std::io;
use std::path::PathBuf;

use crate::mode::LockMode;

/// Errors produced while acquiring a file lock.
///
/// Any of these means the critical section was not run.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock file (or its parent directory) could not be opened or created.
    #[error("failed to open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS refused the lock with a non-transient error.
    #[error("failed to acquire {mode} lock on {path}: {source}")]
    Acquire {
        path: PathBuf,
        mode: LockMode,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Path of the lock file involved.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. } | Self::Acquire { path, .. } => path,
        }
    }
}

/// Result alias for lock operations.
pub type LockResult<T> = Result<T, LockError>;
