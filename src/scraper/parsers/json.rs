//! Tolerant field access for JSON documents whose key names drift between
//! API generations.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Render a string or number identifier as a string.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First key, in the given order, holding a string or numeric value.
pub fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value.get(*key).and_then(id_string))
}

/// First key, in the given order, holding an array.
pub fn first_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_array))
}

/// Serde adapter for identifiers that arrive as either strings or numbers.
pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_string(&value).ok_or_else(|| serde::de::Error::custom("expected string or numeric id"))
}

/// Optional variant of [`de_id`]; `null` and empty strings become `None`.
pub fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_string))
}

/// Optional number that some payloads send as a string ("1.5", "−2.5").
pub fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => super::odds::parse_line(&s),
        _ => None,
    })
}

/// Decode each element of a JSON array on its own, skipping the ones that
/// do not fit. Anything other than an array yields nothing.
pub fn decode_entries<T: DeserializeOwned>(items: Option<Value>, kind: &str) -> Vec<T> {
    let Some(Value::Array(items)) = items else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping undecodable {}: {}", kind, e);
                None
            }
        })
        .collect()
}

/// Serde adapter for arrays whose entries are decoded one by one.
pub fn de_lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(decode_entries(value, "entry"))
}

/// Serde adapter for arrays of rows, each row decoded entry by entry.
pub fn de_lenient_rows<'de, D, T>(deserializer: D) -> Result<Vec<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(rows)) = value else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .map(|row| decode_entries(Some(row), "row entry"))
        .filter(|row: &Vec<T>| !row.is_empty())
        .collect())
}
