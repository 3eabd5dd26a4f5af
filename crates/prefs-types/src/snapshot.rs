use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::value::Value;

/// One complete key-value map plus its store name.
///
/// A snapshot is the unit a decode produces and an encode consumes. Entries
/// are kept in key order so that encoding the same snapshot twice produces
/// the same bytes; callers must not attach meaning to that order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Logical store name. `None` when the document was empty or unnamed.
    pub name: Option<String>,
    entries: BTreeMap<String, Value>,
}

impl Snapshot {
    /// An unnamed, empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty snapshot carrying the given store name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            entries: BTreeMap::new(),
        }
    }

    /// Build a snapshot from a prepared entry map.
    ///
    /// Fails if any key is empty.
    pub fn from_entries(
        name: Option<String>,
        entries: BTreeMap<String, Value>,
    ) -> Result<Self, TypeError> {
        if entries.contains_key("") {
            return Err(TypeError::EmptyKey);
        }
        Ok(Self { name, entries })
    }

    /// Insert or replace an entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::EmptyKey);
        }
        Ok(self.entries.insert(key, value.into()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, Value> {
        self.entries
    }
}
