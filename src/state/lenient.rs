//! Forgiving decoders for server payloads.
//!
//! One bad field costs that field, never the whole frame. A field that fails
//! to decode is logged and treated as absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// `null` decodes as the field's default instead of failing.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Remove `key` from `fields` and decode it. Absent, `null` and malformed
/// values all yield `None`; malformed ones are logged.
pub(crate) fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Option<T> {
    match fields.remove(key)? {
        Value::Null => None,
        raw => match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(field = key, %err, "skipping malformed field");
                None
            }
        },
    }
}

/// Decode each entry of a list on its own, dropping the ones that fail.
/// Anything that is not a list decodes as empty.
pub(crate) fn list_entries<T: DeserializeOwned>(raw: Value, what: &str) -> Vec<T> {
    let Value::Array(entries) = raw else {
        tracing::warn!(field = what, "expected a list, treating as empty");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(field = what, %err, "dropping malformed entry");
                None
            }
        })
        .collect()
}
