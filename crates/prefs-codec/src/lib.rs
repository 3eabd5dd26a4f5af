//! Store document codec for prefs.
//!
//! Encodes a store name plus its entry map as a tagged JSON document and
//! decodes it back. See [`format`] for the layout.
//!
//! # Guarantees
//!
//! - `decode(encode(s)) == s` for every snapshot whose floats are finite.
//! - An empty document decodes to an unnamed, empty snapshot.
//! - Unknown members are ignored at every level.
//! - A corrupt document is an error or an empty store, never invented data.

pub mod codec;
pub mod config;
mod decode;
pub mod error;
pub mod format;

pub use codec::{decode, encode, StoreCodec};
pub use config::{CodecConfig, MalformedEntryPolicy};
pub use error::{CodecError, CodecResult, MalformedReason};
