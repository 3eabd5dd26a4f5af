use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

use prefs_types::{Snapshot, TypeTag, Value};

use crate::config::MalformedEntryPolicy;
use crate::error::{CodecError, CodecResult, MalformedReason};
use crate::format::{kind_of, DATA, KEY, METADATA, NAME, TYPE, VALUE};

/// Decode a complete document held in memory.
///
/// Whitespace-only input is an empty store. Members are looked up by name,
/// so their order in the source does not matter, including `type` and
/// `value` inside a data element.
pub(crate) fn decode_document(bytes: &[u8], policy: MalformedEntryPolicy) -> CodecResult<Snapshot> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        debug!("store document is empty");
        return Ok(Snapshot::empty());
    }

    let members = match serde_json::from_slice::<Json>(bytes)? {
        Json::Object(members) => members,
        other => {
            return Err(CodecError::UnexpectedShape(format!(
                "expected a top-level object, found {}",
                kind_of(&other)
            )))
        }
    };

    let mut snapshot = Snapshot::empty();
    snapshot.name = read_name(&members);

    let mut skipped = 0usize;
    // Repeated top-level members collapse when the tree is built, so only the
    // last `data` array of a document is read.
    match members.get(DATA) {
        Some(Json::Array(elements)) => {
            for (index, element) in elements.iter().enumerate() {
                match read_entry(element) {
                    Ok((key, value)) => {
                        // Later elements overwrite earlier ones with the same key.
                        snapshot.insert(key, value)?;
                    }
                    Err(reason) => match policy {
                        MalformedEntryPolicy::Skip => {
                            warn!(index, %reason, "skipping malformed data element");
                            skipped += 1;
                        }
                        MalformedEntryPolicy::Reject => {
                            return Err(CodecError::MalformedEntry { index, reason });
                        }
                    },
                }
            }
        }
        Some(other) => debug!(found = kind_of(other), "ignoring non-array data member"),
        None => {}
    }

    debug!(
        name = ?snapshot.name,
        entries = snapshot.len(),
        skipped,
        "decoded store document"
    );
    Ok(snapshot)
}

fn read_name(members: &Map<String, Json>) -> Option<String> {
    match members.get(METADATA)? {
        Json::Object(meta) => match meta.get(NAME)? {
            Json::String(name) => Some(name.clone()),
            other => {
                warn!(found = kind_of(other), "store name is not a string; ignoring it");
                None
            }
        },
        other => {
            debug!(found = kind_of(other), "ignoring non-object metadata member");
            None
        }
    }
}

/// Turn one data element into a key and a value.
fn read_entry(element: &Json) -> Result<(String, Value), MalformedReason> {
    let Json::Object(fields) = element else {
        return Err(MalformedReason::NotAnObject);
    };

    let key = match fields.get(KEY) {
        Some(Json::String(key)) if !key.is_empty() => key.clone(),
        Some(Json::String(_)) => return Err(MalformedReason::EmptyKey),
        _ => return Err(MalformedReason::MissingKey),
    };

    let tag = match fields.get(TYPE) {
        Some(Json::String(tag)) => tag
            .parse::<TypeTag>()
            .map_err(|_| MalformedReason::UnknownTag(tag.clone()))?,
        _ => return Err(MalformedReason::MissingType),
    };

    let raw = fields.get(VALUE).ok_or(MalformedReason::MissingValue)?;
    Ok((key, read_value(tag, raw)?))
}

fn read_value(tag: TypeTag, raw: &Json) -> Result<Value, MalformedReason> {
    let mismatch = || MalformedReason::ValueMismatch {
        tag,
        found: kind_of(raw),
    };

    let value = match tag {
        TypeTag::Int => {
            let n = read_integer(raw).ok_or_else(mismatch)?;
            Value::Int32(i32::try_from(n).map_err(|_| MalformedReason::OutOfRange { tag })?)
        }
        TypeTag::Long => Value::Int64(read_integer(raw).ok_or_else(mismatch)?),
        TypeTag::Float => {
            let v = read_float(raw).ok_or_else(mismatch)?;
            if !v.is_finite() {
                return Err(MalformedReason::OutOfRange { tag });
            }
            Value::Float32(v)
        }
        TypeTag::Boolean => Value::Bool(raw.as_bool().ok_or_else(mismatch)?),
        TypeTag::String => Value::String(raw.as_str().ok_or_else(mismatch)?.to_string()),
        TypeTag::Set => {
            let items = raw.as_array().ok_or_else(mismatch)?;
            let set = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<_>>()
                .ok_or_else(mismatch)?;
            Value::StringSet(set)
        }
    };
    Ok(value)
}

/// Integers are read from JSON numbers or from strings holding one. A
/// number written with a fraction or exponent is accepted when it is an
/// exact integer in range.
fn read_integer(raw: &Json) -> Option<i64> {
    match raw {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(exact_integer)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn exact_integer(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

/// Floats are parsed from the number's own decimal text straight into f32.
/// Going through f64 first rounds twice and can land on the neighbouring f32.
fn read_float(raw: &Json) -> Option<f32> {
    match raw {
        Json::Number(n) => n.to_string().parse().ok(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
