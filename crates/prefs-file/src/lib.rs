//! Lock-guarded snapshot files for prefs.
//!
//! Puts `prefs-lock` and `prefs-codec` together the way a store uses them:
//!
//! - read: shared lock → read data file → decode → release
//! - write: exclusive lock → encode → replace data file → release
//!
//! The data file is only touched while the paired lock file is held. No
//! caching and no change notification happen here; callers that want
//! either build it on top of [`SnapshotFile`].

pub mod error;
pub mod file;
pub mod paths;

pub use error::{FileError, FileResult};
pub use file::{FileConfig, SnapshotFile, SyncMode};
pub use paths::StorePaths;

// Re-export key types
pub use prefs_codec::{CodecConfig, MalformedEntryPolicy};
pub use prefs_lock::{LockMode, LockOptions};
pub use prefs_types::{Snapshot, TypeTag, Value};
