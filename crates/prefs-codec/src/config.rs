/// What to do with a data element that cannot become an entry.
///
/// Covers elements without a key, with an empty key, with an unknown or
/// missing type tag, without a value, or with a value that does not fit its
/// tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedEntryPolicy {
    /// Drop the element, log a warning, and keep decoding.
    #[default]
    Skip,
    /// Fail the whole decode with `CodecError::MalformedEntry`.
    Reject,
}

/// Configuration for [`StoreCodec`](crate::StoreCodec).
#[derive(Clone, Debug, Default)]
pub struct CodecConfig {
    /// Handling of malformed data elements (default: skip).
    pub malformed_entries: MalformedEntryPolicy,
    /// Emit indented JSON instead of a single line (default: false).
    pub pretty: bool,
}
