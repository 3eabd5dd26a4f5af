//! Cross-process advisory file locking for prefs.
//!
//! A store's data file is paired with a separate lock file. Readers take a
//! shared lock on it, writers an exclusive one, and the data file is only
//! touched inside the critical section.
//!
//! # Rules
//!
//! 1. Acquisition blocks in the OS; it never polls.
//! 2. "Resource deadlock would occur" is retried without bound. Same-process
//!    threads can trigger it because advisory locks are owned per process.
//! 3. Every other error is returned and the critical section does not run.
//! 4. The lock is released, then the handle closed, on every exit path.
//! 5. There is no in-process mutex in front of the OS lock.

pub mod classify;
pub mod error;
pub mod guard;
pub mod mode;

pub use classify::{classify, LockErrorClass};
pub use error::{LockError, LockResult};
pub use guard::{with_lock, FileLock, FileLockGuard, LockOptions};
pub use mode::LockMode;
