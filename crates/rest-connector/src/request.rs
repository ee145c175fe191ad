//! Immutable description of one outbound REST call
//!
//! A `RequestDescriptor` is validated once when it is built and never changes
//! afterwards; the `with_*` helpers return modified copies.

use crate::auth::{ApiKeyLocation, AuthStrategy};
use crate::encryption::{master_cipher, SecretCipher};
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::{ContentType, HttpMethod};
use crate::json::{bool_field, i64_field, map_to_json, str_field, string_map};
use crate::sanitization::redact_headers;
use crate::url_builder::append_query;
use crate::StringMap;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

/// Timeout applied when none (or a non-positive one) is given
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const CONTENT_TYPE: &str = "Content-Type";

#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: String,
    method: HttpMethod,
    headers: StringMap,
    query_params: StringMap,
    body: Option<String>,
    content_type: ContentType,
    timeout_ms: u64,
    follow_redirects: bool,
    verify_ssl: bool,
    auth: AuthStrategy,
}

impl RequestDescriptor {
    /// GET request with every other field defaulted
    pub fn new(url: impl Into<String>) -> ConnectorResult<Self> {
        Self::builder(url).build()
    }

    pub fn builder(url: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(url)
    }

    pub fn to_builder(&self) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            url: self.url.clone(),
            method: self.method,
            headers: self.headers.clone(),
            query_params: self.query_params.clone(),
            body: self.body.clone(),
            content_type: self.content_type,
            timeout_ms: self.timeout_ms as i64,
            follow_redirects: self.follow_redirects,
            verify_ssl: self.verify_ssl,
            auth: self.auth.clone(),
            error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    pub fn query_params(&self) -> &StringMap {
        &self.query_params
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    /// Only an absent or empty body counts as no body
    pub fn has_body(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.is_empty())
    }

    /// URL with explicit query parameters, then any API key query parameter,
    /// appended in order
    pub fn full_url(&self) -> String {
        let auth_params = self.auth.auth_query_params();
        append_query(
            &self.url,
            self.query_params
                .iter()
                .chain(auth_params.iter())
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Explicit headers, the body content type, then auth headers.
    ///
    /// Auth headers replace explicit headers of the same name (compared
    /// case-insensitively). An explicit `Content-Type` header is kept.
    pub fn full_headers(&self) -> StringMap {
        let mut headers = self.headers.clone();
        if self.has_body() && !contains_header(&headers, CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE.to_string(), self.content_type.mime_type().to_string());
        }
        for (name, value) in self.auth.auth_headers() {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            headers.insert(name, value);
        }
        headers
    }

    pub fn with_auth(&self, auth: impl Into<AuthStrategy>) -> Self {
        Self {
            auth: auth.into(),
            ..self.clone()
        }
    }

    /// Copy authenticated with a bearer token, typically obtained from an
    /// OAuth2 token exchange
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        self.with_auth(AuthStrategy::bearer(token))
    }

    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.headers.insert(name.into(), value.into());
        copy
    }

    pub fn with_query_param(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.query_params.insert(name.into(), value.into());
        copy
    }

    pub fn with_body(&self, body: Option<String>) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> JsonValue {
        self.to_json_with(None)
    }

    /// Same as [`RequestDescriptor::to_json`] with auth secrets sealed by the
    /// process master cipher
    pub fn to_json_encrypted(&self) -> JsonValue {
        self.to_json_with(master_cipher().map(|c| c as &dyn SecretCipher))
    }

    pub fn to_json_with(&self, cipher: Option<&dyn SecretCipher>) -> JsonValue {
        let mut node = json!({
            "url": self.url,
            "method": self.method.as_str(),
            "contentType": self.content_type.mime_type(),
            "timeoutMs": self.timeout_ms,
            "followRedirects": self.follow_redirects,
            "verifySsl": self.verify_ssl,
            "auth": self.auth.to_json_with(cipher),
        });
        if !self.headers.is_empty() {
            node["headers"] = map_to_json(&self.headers);
        }
        if !self.query_params.is_empty() {
            node["queryParams"] = map_to_json(&self.query_params);
        }
        if let Some(body) = &self.body {
            node["body"] = json!(body);
        }
        node
    }

    /// Parse a stored request. Only a missing or blank `url` is an error;
    /// every other field falls back to its default.
    pub fn from_json(node: &JsonValue) -> ConnectorResult<Self> {
        Self::from_json_with(node, master_cipher().map(|c| c as &dyn SecretCipher))
    }

    pub fn from_json_with(node: &JsonValue, cipher: Option<&dyn SecretCipher>) -> ConnectorResult<Self> {
        let obj = node
            .as_object()
            .ok_or_else(|| ConnectorError::invalid("request must be a JSON object"))?;
        let url = str_field(obj, &["url"]).unwrap_or_default();

        let mut builder = Self::builder(url)
            .method(HttpMethod::parse_or_default(str_field(obj, &["method"])))
            .headers(string_map(obj, "headers"))
            .query_params(string_map(obj, "queryParams"));

        builder.body = match obj.get("body") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        if let Some(ct) = str_field(obj, &["contentType"]) {
            builder.content_type = ContentType::parse(ct).unwrap_or_else(|| {
                tracing::debug!(content_type = %ct, "Unknown content type, using JSON");
                ContentType::Json
            });
        }
        if let Some(ms) = i64_field(obj, "timeoutMs") {
            builder.timeout_ms = ms;
        }
        if let Some(flag) = bool_field(obj, "followRedirects") {
            builder.follow_redirects = flag;
        }
        if let Some(flag) = bool_field(obj, "verifySsl") {
            builder.verify_ssl = flag;
        }
        if let Some(auth) = obj.get("auth") {
            builder.auth = AuthStrategy::from_json_with(auth, cipher);
        }
        builder.build()
    }
}

fn contains_header(headers: &StringMap, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redact_headers(&self.headers))
            .field("query_params", &self.query_params.keys().collect::<Vec<_>>())
            .field("body_len", &self.body.as_ref().map(String::len))
            .field("content_type", &self.content_type)
            .field("timeout_ms", &self.timeout_ms)
            .field("follow_redirects", &self.follow_redirects)
            .field("verify_ssl", &self.verify_ssl)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Mutable staging area for a [`RequestDescriptor`]
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    url: String,
    method: HttpMethod,
    headers: StringMap,
    query_params: StringMap,
    body: Option<String>,
    content_type: ContentType,
    timeout_ms: i64,
    follow_redirects: bool,
    verify_ssl: bool,
    auth: AuthStrategy,
    error: Option<String>,
}

impl RequestDescriptorBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: StringMap::new(),
            query_params: StringMap::new(),
            body: None,
            content_type: ContentType::Json,
            timeout_ms: DEFAULT_TIMEOUT_MS as i64,
            follow_redirects: true,
            verify_ssl: true,
            auth: AuthStrategy::None,
            error: None,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn get(self) -> Self {
        self.method(HttpMethod::Get)
    }

    pub fn post(self) -> Self {
        self.method(HttpMethod::Post)
    }

    pub fn put(self) -> Self {
        self.method(HttpMethod::Put)
    }

    pub fn patch(self) -> Self {
        self.method(HttpMethod::Patch)
    }

    pub fn delete(self) -> Self {
        self.method(HttpMethod::Delete)
    }

    pub fn head(self) -> Self {
        self.method(HttpMethod::Head)
    }

    pub fn options(self) -> Self {
        self.method(HttpMethod::Options)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: StringMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn query_params(mut self, params: StringMap) -> Self {
        self.query_params.extend(params);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and switch the content type to JSON.
    ///
    /// A serialization failure is reported by [`RequestDescriptorBuilder::build`].
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => {
                self.body = Some(body);
                self.content_type = ContentType::Json;
            }
            Err(e) => self.error = Some(format!("body is not serializable: {}", e)),
        }
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Non-positive values select [`DEFAULT_TIMEOUT_MS`]
    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn auth(mut self, auth: impl Into<AuthStrategy>) -> Self {
        self.auth = auth.into();
        self
    }

    pub fn basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth(AuthStrategy::basic(username, password))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.auth(AuthStrategy::bearer(token))
    }

    pub fn api_key_auth(
        self,
        key_name: impl Into<String>,
        key_value: impl Into<String>,
        location: ApiKeyLocation,
    ) -> Self {
        self.auth(AuthStrategy::api_key(key_name, key_value, location))
    }

    pub fn build(self) -> ConnectorResult<RequestDescriptor> {
        if let Some(error) = self.error {
            return Err(ConnectorError::InvalidArgument(error));
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConnectorError::invalid("url must not be blank"));
        }
        Ok(RequestDescriptor {
            url: url.to_string(),
            method: self.method,
            headers: self.headers,
            query_params: self.query_params,
            body: self.body,
            content_type: self.content_type,
            timeout_ms: if self.timeout_ms > 0 {
                self.timeout_ms as u64
            } else {
                DEFAULT_TIMEOUT_MS
            },
            follow_redirects: self.follow_redirects,
            verify_ssl: self.verify_ssl,
            auth: self.auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OAuth2ClientCredentials;

    #[test]
    fn test_defaults() {
        let req = RequestDescriptor::new("  https://api.test.com/items  ").unwrap();
        assert_eq!(req.url(), "https://api.test.com/items");
        assert_eq!(req.method(), HttpMethod::Get);
        assert!(req.headers().is_empty());
        assert!(req.query_params().is_empty());
        assert_eq!(req.body(), None);
        assert_eq!(req.content_type(), ContentType::Json);
        assert_eq!(req.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(req.follow_redirects());
        assert!(req.verify_ssl());
        assert!(req.auth().is_none());
    }

    #[test]
    fn test_blank_url_rejected() {
        for url in ["", "   ", "\t\n"] {
            assert!(matches!(
                RequestDescriptor::new(url),
                Err(ConnectorError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_non_positive_timeout_defaults() {
        for ms in [0, -5] {
            let req = RequestDescriptor::builder("https://a").timeout_ms(ms).build().unwrap();
            assert_eq!(req.timeout_ms(), DEFAULT_TIMEOUT_MS);
        }
        let req = RequestDescriptor::builder("https://a").timeout_ms(1500).build().unwrap();
        assert_eq!(req.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_full_url_without_params_is_unchanged() {
        let req = RequestDescriptor::new("https://a.test/x?y=1").unwrap();
        assert_eq!(req.full_url(), "https://a.test/x?y=1");
    }

    #[test]
    fn test_full_url_separators() {
        let req = RequestDescriptor::builder("https://api.test.com/search")
            .query_param("a", "1")
            .query_param("b", "2")
            .build()
            .unwrap();
        let url = req.full_url();
        assert!(url.starts_with("https://api.test.com/search?"));
        assert!(url.contains("a=1"));
        assert!(url.contains("b=2"));
        assert_eq!(url, "https://api.test.com/search?a=1&b=2");

        let req = RequestDescriptor::builder("https://api.test.com/search?x=1")
            .query_param("q", "hello world")
            .build()
            .unwrap();
        assert_eq!(req.full_url(), "https://api.test.com/search?x=1&q=hello+world");
    }

    #[test]
    fn test_full_url_appends_query_api_key_last() {
        let req = RequestDescriptor::builder("https://api.test.com")
            .query_param("page", "2")
            .api_key_auth("api_key", "k&v", ApiKeyLocation::Query)
            .build()
            .unwrap();
        assert_eq!(req.full_url(), "https://api.test.com?page=2&api_key=k%26v");

        let only_key = RequestDescriptor::builder("https://api.test.com")
            .api_key_auth("key", "v", ApiKeyLocation::Query)
            .build()
            .unwrap();
        assert_eq!(only_key.full_url(), "https://api.test.com?key=v");

        let header_key = req.with_auth(AuthStrategy::api_key("key", "v", ApiKeyLocation::Header));
        assert_eq!(header_key.full_url(), "https://api.test.com?page=2");
    }

    #[test]
    fn test_builder_scenario_json_body_with_bearer() {
        let req = RequestDescriptor::builder("https://api.test.com")
            .post()
            .json_body(&json!({ "k": "v" }))
            .bearer_auth("T")
            .build()
            .unwrap();
        let headers = req.full_headers();
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(headers["Authorization"], "Bearer T");
        assert!(req.has_body());
        assert_eq!(req.body(), Some(r#"{"k":"v"}"#));
        assert_eq!(req.method(), HttpMethod::Post);
    }

    #[test]
    fn test_json_body_forces_json_content_type() {
        let req = RequestDescriptor::builder("https://a")
            .content_type(ContentType::Xml)
            .json_body(&vec![1, 2, 3])
            .build()
            .unwrap();
        assert_eq!(req.content_type(), ContentType::Json);
        assert_eq!(req.body(), Some("[1,2,3]"));
    }

    #[test]
    fn test_json_body_serialization_failure_surfaces_on_build() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], "non-string key");
        let result = RequestDescriptor::builder("https://a").json_body(&map).build();
        assert!(matches!(result, Err(ConnectorError::InvalidArgument(_))));
    }

    #[test]
    fn test_has_body() {
        let base = RequestDescriptor::new("https://a").unwrap();
        assert!(!base.has_body());
        assert!(!base.with_body(Some(String::new())).has_body());
        assert!(base.with_body(Some("  ".to_string())).has_body());
    }

    #[test]
    fn test_content_type_only_with_body() {
        let req = RequestDescriptor::builder("https://a")
            .header("Accept", "application/json")
            .build()
            .unwrap();
        assert!(!req.full_headers().contains_key("Content-Type"));

        let req = req.with_body(Some("<a/>".to_string()));
        let req = req.to_builder().content_type(ContentType::Xml).build().unwrap();
        assert_eq!(req.full_headers()["Content-Type"], "application/xml");

        let explicit = req.with_header("content-type", "text/csv");
        let headers = explicit.full_headers();
        assert_eq!(headers["content-type"], "text/csv");
        assert!(!headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_auth_headers_win_over_explicit_headers() {
        let req = RequestDescriptor::builder("https://a")
            .header("authorization", "Bearer stale")
            .header("X-Trace", "1")
            .basic_auth("user", "pass")
            .build()
            .unwrap();
        let headers = req.full_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Trace"], "1");
        assert_eq!(headers["Authorization"], "Basic dXNlcjpwYXNz");
        assert!(!headers.contains_key("authorization"));
    }

    #[test]
    fn test_caller_maps_are_copied() {
        let mut headers = StringMap::new();
        headers.insert("X-A".to_string(), "1".to_string());
        let req = RequestDescriptor::builder("https://a")
            .headers(headers.clone())
            .build()
            .unwrap();
        headers.insert("X-B".to_string(), "2".to_string());
        assert_eq!(req.headers().len(), 1);

        let copy = req.with_header("X-C", "3");
        assert_eq!(req.headers().len(), 1);
        assert_eq!(copy.headers().len(), 2);
    }

    #[test]
    fn test_from_json_full_document() {
        let node = json!({
            "url": " https://api.test.com/orders ",
            "method": "put",
            "headers": { "X-Trace": "abc" },
            "queryParams": { "dryRun": true },
            "body": { "id": 7 },
            "contentType": "JSON",
            "timeoutMs": 5000,
            "followRedirects": false,
            "verifySsl": false,
            "auth": { "authType": "bearer", "token": "T" }
        });
        let req = RequestDescriptor::from_json_with(&node, None).unwrap();
        assert_eq!(req.url(), "https://api.test.com/orders");
        assert_eq!(req.method(), HttpMethod::Put);
        assert_eq!(req.headers()["X-Trace"], "abc");
        assert_eq!(req.query_params()["dryRun"], "true");
        assert_eq!(req.body(), Some(r#"{"id":7}"#));
        assert_eq!(req.timeout_ms(), 5000);
        assert!(!req.follow_redirects());
        assert!(!req.verify_ssl());
        assert_eq!(req.auth(), &AuthStrategy::bearer("T"));
    }

    #[test]
    fn test_from_json_requires_url() {
        for node in [json!({}), json!({ "url": "  " }), json!({ "url": 5 }), json!(null)] {
            assert!(matches!(
                RequestDescriptor::from_json_with(&node, None),
                Err(ConnectorError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_from_json_bad_auth_degrades_to_none() {
        let node = json!({ "url": "https://a", "auth": { "authType": "kerberos" }, "method": "BREW" });
        let req = RequestDescriptor::from_json_with(&node, None).unwrap();
        assert!(req.auth().is_none());
        assert_eq!(req.method(), HttpMethod::Get);
    }

    #[test]
    fn test_json_roundtrip() {
        let req = RequestDescriptor::builder("https://api.test.com/x")
            .patch()
            .header("X-A", "1")
            .query_param("q", "a b")
            .body("payload")
            .content_type(ContentType::TextPlain)
            .timeout_ms(1234)
            .verify_ssl(false)
            .auth(OAuth2ClientCredentials::new("https://t", "id", "s").unwrap())
            .build()
            .unwrap();
        let node = req.to_json();
        assert_eq!(node["contentType"], "text/plain");
        assert_eq!(RequestDescriptor::from_json_with(&node, None).unwrap(), req);

        let bare = RequestDescriptor::new("https://a").unwrap().to_json();
        assert!(bare.get("headers").is_none());
        assert!(bare.get("queryParams").is_none());
        assert!(bare.get("body").is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = RequestDescriptor::builder("https://a")
            .header("Authorization", "Bearer explicit-secret")
            .bearer_auth("auth-secret")
            .build()
            .unwrap();
        let debug = format!("{:?}", req);
        assert!(!debug.contains("explicit-secret"));
        assert!(!debug.contains("auth-secret"));
    }

    #[test]
    fn test_with_access_token() {
        let req = RequestDescriptor::builder("https://a")
            .auth(OAuth2ClientCredentials::new("https://t", "id", "s").unwrap())
            .build()
            .unwrap();
        assert!(req.full_headers().get("Authorization").is_none());
        let authed = req.with_access_token("tok");
        assert_eq!(authed.full_headers()["Authorization"], "Bearer tok");
    }
}
