//! Foundation types for prefs.
//!
//! A store is a single named map from non-empty string keys to tagged
//! values, persisted as one file and shared between processes. This crate
//! holds the in-memory model; `prefs-codec` turns it into bytes and
//! `prefs-lock` guards the file it lives in.
//!
//! # Key Types
//!
//! - [`Value`]: closed tagged union of the supported value kinds
//! - [`TypeTag`]: the persisted name of each value kind
//! - [`Snapshot`]: store name plus the full entry map, as read or written in one go

pub mod error;
pub mod snapshot;
pub mod value;

pub use error::TypeError;
pub use snapshot::Snapshot;
pub use value::{TypeTag, Value};
