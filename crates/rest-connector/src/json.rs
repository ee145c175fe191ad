//! Lenient readers over `serde_json` objects.
//!
//! Every reader returns `None` for missing or mistyped fields so that
//! document parsing can fall back to defaults field by field.

use crate::StringMap;
use serde_json::{Map, Value as JsonValue};

pub(crate) type JsonObject = Map<String, JsonValue>;

/// First string value among `names`
pub(crate) fn str_field<'a>(obj: &'a JsonObject, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| obj.get(*name).and_then(JsonValue::as_str))
}

/// First non-blank string value among `names`
pub(crate) fn non_blank<'a>(obj: &'a JsonObject, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        obj.get(*name)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.trim().is_empty())
    })
}

pub(crate) fn bool_field(obj: &JsonObject, name: &str) -> Option<bool> {
    match obj.get(name)? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn i64_field(obj: &JsonObject, name: &str) -> Option<i64> {
    match obj.get(name)? {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Object of scalars as an ordered string map; non-scalar entries are skipped
pub(crate) fn string_map(obj: &JsonObject, name: &str) -> StringMap {
    let Some(JsonValue::Object(entries)) = obj.get(name) else {
        return StringMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

pub(crate) fn map_to_json(map: &StringMap) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}
