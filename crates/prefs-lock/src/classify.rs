use std::io;

/// How the acquisition loop should treat a failed lock call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockErrorClass {
    /// The OS reported "resource deadlock would occur".
    ///
    /// Advisory locks are owned per process, so a second thread of the same
    /// process asking for a conflicting mode can be reported as a deadlock
    /// although the other thread will release. Retried immediately.
    DeadlockTransient,
    /// Anything else. Acquisition is abandoned.
    Other,
}

/// Classify an error returned by the OS lock call.
///
/// std maps `EDEADLK` on Unix and `ERROR_POSSIBLE_DEADLOCK` on Windows to
/// [`io::ErrorKind::Deadlock`], so the decision is made on the kind alone.
pub fn classify(err: &io::Error) -> LockErrorClass {
    match err.kind() {
        io::ErrorKind::Deadlock => LockErrorClass::DeadlockTransient,
        _ => LockErrorClass::Other,
    }
}
