use std::io;

use prefs_types::{TypeError, TypeTag};

/// Why a single data element could not be turned into an entry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("element is not an object")]
    NotAnObject,

    #[error("element has no string key")]
    MissingKey,

    #[error("element key is empty")]
    EmptyKey,

    #[error("element has no string type tag")]
    MissingType,

    #[error("unknown type tag {0:?}")]
    UnknownTag(String),

    #[error("element has no value")]
    MissingValue,

    #[error("{tag} value cannot be read from {found}")]
    ValueMismatch { tag: TypeTag, found: &'static str },

    #[error("value is out of range for {tag}")]
    OutOfRange { tag: TypeTag },
}

/// Errors produced while encoding or decoding a store document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input stream failed after content started arriving.
    #[error("failed to read store document: {0}")]
    StreamRead(#[source] io::Error),

    /// The output stream failed.
    #[error("failed to write store document: {0}")]
    StreamWrite(#[source] io::Error),

    /// The document is not well-formed JSON.
    #[error("store document is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Well-formed JSON that is not a store document.
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),

    /// A data element was rejected under `MalformedEntryPolicy::Reject`.
    #[error("malformed data element at index {index}: {reason}")]
    MalformedEntry {
        index: usize,
        reason: MalformedReason,
    },

    /// NaN and infinities have no representation in the document.
    #[error("float value for key {key:?} is not finite")]
    NonFiniteFloat { key: String },

    /// Entry map rejected by the data model (e.g. an empty key).
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
