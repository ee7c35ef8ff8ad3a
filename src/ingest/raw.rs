// src/ingest/raw.rs
//! Lenient field deserializers for third-party payloads.
//!
//! Upstream JSON is noisy: ids arrive as numbers or strings, optional fields
//! carry the wrong type. Each helper accepts any JSON value and keeps it only
//! when it has the expected shape, so one bad field never rejects a record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Keep strings only; blank strings count as missing.
pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match &v {
        Some(s @ Value::String(_)) => scalar_text(s),
        _ => None,
    })
}

/// Keep strings or numbers, rendered as text (ids, roll-call numbers).
pub fn opt_scalar<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(scalar_text))
}

/// Keep only string entries of an array; anything else becomes empty.
pub fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|x| match x {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Keep the raw entries of an array; anything else becomes empty.
pub fn value_list<'de, D>(d: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

/// Nested object that is itself parsed leniently; wrong shape → `None`.
pub fn opt_object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj).ok(),
        _ => None,
    })
}

/// Parse one raw record into a source's lenient record type.
/// Non-objects are rejected.
pub fn parse_record<T: DeserializeOwned>(v: &Value) -> Option<T> {
    if !v.is_object() {
        return None;
    }
    serde_json::from_value(v.clone()).ok()
}

/// Walk `path` through nested objects and return the array found there.
pub fn array_at(payload: &Value, path: &[&str]) -> Vec<Value> {
    let mut cur = payload;
    for key in path {
        match cur.get(key) {
            Some(next) => cur = next,
            None => return Vec::new(),
        }
    }
    match cur {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "opt_scalar")]
        id: Option<String>,
        #[serde(default, deserialize_with = "string_list")]
        tags: Vec<String>,
    }

    #[test]
    fn wrong_types_degrade_to_missing() {
        let p: Probe = parse_record(&json!({ "name": 7, "id": 42, "tags": ["a", 1, "b"] })).unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.id.as_deref(), Some("42"));
        assert_eq!(p.tags, vec!["a", "b"]);
    }

    #[test]
    fn blank_strings_are_missing() {
        let p: Probe = parse_record(&json!({ "name": "  ", "id": "" })).unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.id, None);
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(parse_record::<Probe>(&json!("x")).is_none());
        assert!(parse_record::<Probe>(&json!(null)).is_none());
    }

    #[test]
    fn array_at_follows_path() {
        let payload = json!({ "results": { "votes": [1, 2] } });
        assert_eq!(array_at(&payload, &["results", "votes"]).len(), 2);
        assert!(array_at(&payload, &["results"]).is_empty());
        assert!(array_at(&payload, &["missing"]).is_empty());
    }
}
