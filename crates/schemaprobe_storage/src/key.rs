//! Record keys and key path evaluation.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A primary or index key.
///
/// Integers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// String key.
    Text(String),
}

impl Key {
    /// Converts a JSON value into a key.
    ///
    /// Returns `None` for values that are not integers or strings.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Key::Int),
            Value::String(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }

    /// Converts the key into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::from(*n),
            Key::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

/// Resolves a dotted key path (`"author.id"`) against a record.
///
/// Returns `Ok(None)` when the path is absent.
///
/// # Errors
///
/// Returns `DataError` if the path resolves to a value that is not a valid key.
pub fn extract_key(record: &Value, key_path: &str) -> StorageResult<Option<Key>> {
    let mut current = record;
    for segment in key_path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Key::from_value(current).map(Some).ok_or_else(|| {
        StorageError::data_error(format!(
            "value at key path '{key_path}' is not an integer or string"
        ))
    })
}

/// Writes `key` into `record` at a dotted key path, creating objects on the way.
///
/// # Errors
///
/// Returns `DataError` if an intermediate value is not an object.
pub fn inject_key(record: &mut Value, key_path: &str, key: &Key) -> StorageResult<()> {
    let mut segments = key_path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        let map = current.as_object_mut().ok_or_else(|| {
            StorageError::data_error(format!("cannot inject key at '{key_path}' into non-object"))
        })?;
        if segments.peek().is_none() {
            map.insert(segment.to_string(), key.to_value());
            return Ok(());
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    Ok(())
}
