//! On-disk document layout.
//!
//! ```text
//! {
//!   "metaData": { "name": "<store name>" },
//!   "data": [
//!     { "type": "int|long|float|boolean|string|set", "key": "<key>", "value": <scalar or [string]> }
//!   ]
//! }
//! ```
//!
//! There is no version field. Readers skip members they do not know, at
//! every level, so new members can be added without breaking old readers.

use serde::{Serialize, Serializer};

use prefs_types::{TypeTag, Value};

pub const METADATA: &str = "metaData";
pub const DATA: &str = "data";
pub const NAME: &str = "name";

pub const TYPE: &str = "type";
pub const KEY: &str = "key";
pub const VALUE: &str = "value";

#[derive(Serialize)]
pub(crate) struct DocumentOut<'a> {
    #[serde(rename = "metaData")]
    pub meta_data: MetaDataOut<'a>,
    pub data: Vec<EntryOut<'a>>,
}

#[derive(Serialize)]
pub(crate) struct MetaDataOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// One data element. Field order puts `type` ahead of `value`, which
/// streaming readers of this format depend on.
#[derive(Serialize)]
pub(crate) struct EntryOut<'a> {
    #[serde(rename = "type")]
    pub tag: TypeTag,
    pub key: &'a str,
    pub value: ValueOut<'a>,
}

/// A value in the shape its tag calls for: a bare scalar, or an array of
/// strings for sets.
pub(crate) struct ValueOut<'a>(pub &'a Value);

impl Serialize for ValueOut<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::StringSet(items) => serializer.collect_seq(items),
        }
    }
}

/// Name of a JSON value's kind, for diagnostics.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
