//! Outcome of one executed REST call

use crate::http::is_json_media_type;
use crate::sanitization::redact_headers;
use crate::StringMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Status code recorded when no HTTP response was received
pub const TRANSPORT_FAILURE_STATUS: i32 = -1;

const PREVIEW_CHARS: usize = 100;

/// Immutable response record; `with_*` methods return modified copies
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    status_code: i32,
    headers: StringMap,
    body: Option<String>,
    content_type: Option<String>,
    execution_time_ms: u64,
    error_message: Option<String>,
    url: String,
}

impl ResponseDescriptor {
    pub fn new(status_code: i32, url: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: StringMap::new(),
            body: None,
            content_type: None,
            execution_time_ms: 0,
            error_message: None,
            url: url.into(),
        }
    }

    /// Response actually received from the server, whatever its status
    pub fn success(
        status_code: i32,
        headers: StringMap,
        body: Option<String>,
        content_type: Option<String>,
        execution_time_ms: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            headers,
            body,
            content_type,
            execution_time_ms,
            error_message: None,
            url: url.into(),
        }
    }

    /// Transport-level failure: no response was received
    pub fn error(message: impl Into<String>, execution_time_ms: u64, url: impl Into<String>) -> Self {
        Self {
            execution_time_ms,
            error_message: Some(message.into()),
            ..Self::new(TRANSPORT_FAILURE_STATUS, url)
        }
    }

    /// [`ResponseDescriptor::error`] from an error value. A blank message is
    /// replaced by the error's type name.
    pub fn from_error<E>(err: &E, execution_time_ms: u64, url: impl Into<String>) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            short_type_name::<E>().to_string()
        } else {
            message
        };
        Self::error(message, execution_time_ms, url)
    }

    pub fn with_headers(&self, headers: StringMap) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }

    pub fn with_body(&self, body: Option<String>) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    pub fn with_content_type(&self, content_type: Option<String>) -> Self {
        Self {
            content_type,
            ..self.clone()
        }
    }

    pub fn with_execution_time(&self, execution_time_ms: u64) -> Self {
        Self {
            execution_time_ms,
            ..self.clone()
        }
    }

    pub fn with_error(&self, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..self.clone()
        }
    }

    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Error message present, 4xx/5xx status, or a transport failure
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
            || self.is_client_error()
            || self.is_server_error()
            || self.status_code < 0
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_json_body(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_json_media_type)
            && self.body.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    /// Body parsed as JSON; `None` when absent, blank or malformed
    pub fn body_as_json(&self) -> Option<JsonValue> {
        let body = self.body.as_deref().filter(|b| !b.trim().is_empty())?;
        match serde_json::from_str(body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Response body is not valid JSON");
                None
            }
        }
    }

    pub fn body_as<T: DeserializeOwned>(&self) -> Option<T> {
        let body = self.body.as_deref().filter(|b| !b.trim().is_empty())?;
        serde_json::from_str(body).ok()
    }

    /// Top-level field of a JSON object body, or a JSON pointer when `name`
    /// starts with `/`
    pub fn json_field(&self, name: &str) -> Option<JsonValue> {
        let json = self.body_as_json()?;
        if name.starts_with('/') {
            json.pointer(name).cloned()
        } else {
            json.get(name).cloned()
        }
    }

    pub fn to_summary(&self) -> String {
        let head = format!("HTTP {} ({}ms)", self.status_code, self.execution_time_ms);
        if let Some(message) = &self.error_message {
            return format!("{} - ERROR: {}", head, message);
        }
        format!("{} - {}", head, body_preview(self.body.as_deref()))
    }
}

fn body_preview(body: Option<&str>) -> String {
    match body {
        None | Some("") => "(empty body)".to_string(),
        Some(body) if body.chars().count() > PREVIEW_CHARS => {
            format!("{}...", body.chars().take(PREVIEW_CHARS).collect::<String>())
        }
        Some(body) => body.to_string(),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // drop generic arguments before taking the last path segment
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl std::fmt::Debug for ResponseDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDescriptor")
            .field("status_code", &self.status_code)
            .field("url", &self.url)
            .field("headers", &redact_headers(&self.headers))
            .field("body_len", &self.body.as_ref().map(String::len))
            .field("content_type", &self.content_type)
            .field("execution_time_ms", &self.execution_time_ms)
            .field("error_message", &self.error_message)
            .finish()
    }
}
