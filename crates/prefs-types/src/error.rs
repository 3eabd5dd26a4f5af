use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("entry keys must not be empty")]
    EmptyKey,

    #[error("unknown type tag: {0:?}")]
    UnknownTag(String),
}
