use std::io;
use std::path::PathBuf;

use prefs_codec::CodecError;
use prefs_lock::LockError;
use prefs_types::TypeError;

/// Errors from snapshot file operations.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The lock could not be taken; nothing was read or written.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The document could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An update closure tried to build an invalid snapshot.
    #[error("invalid snapshot: {0}")]
    Type(#[from] TypeError),

    /// I/O error on the data file or its directory.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result alias for snapshot file operations.
pub type FileResult<T> = Result<T, FileError>;
