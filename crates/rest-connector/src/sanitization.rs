//! Masking of secrets in anything that may reach a log line

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Field and header names that always carry secrets (compared normalized)
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "token",
    "keyvalue",
    "apikeyvalue",
    "apikey",
    "clientsecret",
    "secret",
    "authorization",
    "proxyauthorization",
    "cookie",
    "setcookie",
    "credential",
    "credentials",
];

/// Suffixes that mark a normalized name as sensitive
const SENSITIVE_SUFFIXES: &[&str] = &["secret", "password", "token", "apikey"];

pub const SANITIZED_PLACEHOLDER: &str = "***REDACTED***";

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check if a field or header name indicates sensitive data
pub fn is_sensitive_field(field_name: &str) -> bool {
    let normalized = normalize(field_name);
    SENSITIVE_FIELDS.contains(&normalized.as_str())
        || SENSITIVE_SUFFIXES.iter().any(|s| normalized.ends_with(s))
}

/// Sanitize a JSON value by replacing sensitive fields with placeholders
pub fn sanitize_json_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let sanitized: Map<String, JsonValue> = map
                .iter()
                .map(|(key, val)| {
                    let val = match val {
                        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
                            if is_sensitive_field(key) =>
                        {
                            JsonValue::String(SANITIZED_PLACEHOLDER.to_string())
                        }
                        other => sanitize_json_value(other),
                    };
                    (key.clone(), val)
                })
                .collect();
            JsonValue::Object(sanitized)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(sanitize_json_value).collect()),
        other => other.clone(),
    }
}

/// Copy of a header map with secret-bearing values masked
pub fn redact_headers(headers: &IndexMap<String, String>) -> IndexMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive_field(name) {
                SANITIZED_PLACEHOLDER.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}
