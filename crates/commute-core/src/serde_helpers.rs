//! Tolerant deserializers for loosely-typed JSON.
//!
//! Persisted settings, public feeds and model output all disagree on whether
//! numbers arrive as numbers or strings, and on whether absent values are
//! omitted or `null`. These helpers absorb those differences at the edge.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::station::TransportKind;

/// Interpret a JSON value as a finite number, accepting numeric strings.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Interpret a JSON value as display text; numbers and booleans are rendered.
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A required number that may be encoded as a string.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

/// An optional number; `null`, blanks and garbage all become `None`.
pub fn lenient_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

/// A count that may be encoded as a string; anything unreadable counts as zero.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}

/// Text that may arrive as a number or `null`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_from_value(&value).unwrap_or_default())
}

/// Treat an explicit `null` the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// A list of transport kinds where unknown tags are dropped instead of failing.
pub fn lenient_kinds<'de, D>(deserializer: D) -> Result<Vec<TransportKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    let mut kinds = Vec::with_capacity(items.len());
    for item in items {
        if let Some(kind) = item.as_str().and_then(|s| s.parse::<TransportKind>().ok()) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_f64_opt")]
        lat: Option<f64>,
        #[serde(default, deserialize_with = "lenient_count")]
        count: u32,
        #[serde(default, deserialize_with = "lenient_string")]
        label: String,
        #[serde(default, deserialize_with = "lenient_kinds")]
        kinds: Vec<TransportKind>,
    }

    #[test]
    fn test_numbers_as_strings() {
        let probe: Probe =
            serde_json::from_value(json!({"lat": "24.95", "count": "7", "label": 30})).unwrap();
        assert_eq!(probe.lat, Some(24.95));
        assert_eq!(probe.count, 7);
        assert_eq!(probe.label, "30");
    }

    #[test]
    fn test_nulls_and_garbage() {
        let probe: Probe =
            serde_json::from_value(json!({"lat": null, "count": "n/a", "label": null})).unwrap();
        assert_eq!(probe.lat, None);
        assert_eq!(probe.count, 0);
        assert_eq!(probe.label, "");
    }

    #[test]
    fn test_unknown_kinds_dropped() {
        let probe: Probe =
            serde_json::from_value(json!({"kinds": ["train", "hsr", "bike", "train"]})).unwrap();
        assert_eq!(probe.kinds, vec![TransportKind::Rail, TransportKind::Bikeshare]);
    }

    #[test]
    fn test_missing_fields_default() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert_eq!(probe.lat, None);
        assert!(probe.kinds.is_empty());
    }
}
