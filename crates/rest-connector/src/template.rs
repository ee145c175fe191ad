//! Named, persistable bundle of REST integration settings
//!
//! An [`ApiTemplate`] stores everything needed to call one API (base URL,
//! default headers, timeout and TLS policy, authentication) plus a list of
//! reusable [`TemplateMethod`]s. [`ApiTemplate::request_for`] turns a method
//! into a ready-to-execute [`RequestDescriptor`].

use crate::auth::AuthStrategy;
use crate::encryption::{master_cipher, SecretCipher};
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::{ContentType, HttpMethod};
use crate::json::{bool_field, i64_field, map_to_json, non_blank, str_field, string_map, JsonObject};
use crate::request::{RequestDescriptor, DEFAULT_TIMEOUT_MS};
use crate::url_builder::{join, substitute_path_vars};
use crate::StringMap;
use serde_json::{json, Value as JsonValue};

/// Headers used when a template declares none.
///
/// An explicitly empty header set is not persisted (`to_json` omits empty
/// maps), so it reads back as these defaults.
pub fn default_headers() -> StringMap {
    let mut headers = StringMap::new();
    headers.insert("Accept".to_string(), ContentType::Json.mime_type().to_string());
    headers.insert("Content-Type".to_string(), ContentType::Json.mime_type().to_string());
    headers
}

/// One callable operation of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMethod {
    name: String,
    display_name: String,
    description: Option<String>,
    http_method: HttpMethod,
    path: String,
    query_params: StringMap,
    headers: StringMap,
    body_template: Option<String>,
}

impl TemplateMethod {
    pub fn new(name: impl Into<String>, http_method: HttpMethod, path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: None,
            http_method,
            path: path.into(),
            query_params: StringMap::new(),
            headers: StringMap::new(),
            body_template: None,
        }
    }

    /// Blank values keep the method name as display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        if !display_name.trim().is_empty() {
            self.display_name = display_name;
        }
        self
    }

    /// Blank descriptions are dropped
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = Some(description).filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_query_params(mut self, query_params: StringMap) -> Self {
        self.query_params = query_params;
        self
    }

    pub fn with_headers(mut self, headers: StringMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body_template(mut self, body_template: impl Into<String>) -> Self {
        self.body_template = Some(body_template.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &StringMap {
        &self.query_params
    }

    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    pub fn body_template(&self) -> Option<&str> {
        self.body_template.as_deref()
    }

    pub fn to_json(&self) -> JsonValue {
        let mut node = json!({
            "name": self.name,
            "displayName": self.display_name,
            "httpMethod": self.http_method.as_str(),
            "path": self.path,
        });
        if let Some(description) = non_blank_opt(&self.description) {
            node["description"] = json!(description);
        }
        if !self.query_params.is_empty() {
            node["queryParams"] = map_to_json(&self.query_params);
        }
        if !self.headers.is_empty() {
            node["headers"] = map_to_json(&self.headers);
        }
        if let Some(body) = non_blank_opt(&self.body_template) {
            node["bodyTemplate"] = json!(body);
        }
        node
    }

    /// `None` for non-objects or entries without a name
    fn from_json_object(obj: &JsonObject) -> Option<Self> {
        let name = non_blank(obj, &["name"])?;
        let mut method = Self::new(
            name,
            HttpMethod::parse_or_default(str_field(obj, &["httpMethod", "method"])),
            str_field(obj, &["path"]).unwrap_or_default(),
        )
        .with_query_params(string_map(obj, "queryParams"))
        .with_headers(string_map(obj, "headers"));
        if let Some(display_name) = str_field(obj, &["displayName"]) {
            method = method.with_display_name(display_name);
        }
        if let Some(description) = str_field(obj, &["description"]) {
            method = method.with_description(description);
        }
        method.body_template = str_field(obj, &["bodyTemplate"]).map(str::to_string);
        Some(method)
    }
}

fn non_blank_opt(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTemplate {
    name: String,
    display_name: String,
    description: Option<String>,
    base_url: String,
    timeout_ms: u64,
    verify_ssl: bool,
    auth: AuthStrategy,
    headers: StringMap,
    methods: Vec<TemplateMethod>,
}

impl ApiTemplate {
    /// Template with default headers, timeout and TLS policy and no auth
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> ConnectorResult<Self> {
        Self::builder(name, base_url).build()
    }

    pub fn builder(name: impl Into<String>, base_url: impl Into<String>) -> ApiTemplateBuilder {
        ApiTemplateBuilder::new(name, base_url)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    pub fn methods(&self) -> &[TemplateMethod] {
        &self.methods
    }

    /// First method with the given name
    pub fn method(&self, name: &str) -> Option<&TemplateMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Build the request for one method.
    ///
    /// `{var}` placeholders in the method path are replaced from `path_vars`;
    /// method headers override template headers of the same name.
    pub fn request_for(&self, method_name: &str, path_vars: &StringMap) -> ConnectorResult<RequestDescriptor> {
        let method = self
            .method(method_name)
            .ok_or_else(|| ConnectorError::MethodNotFound(method_name.to_string()))?;

        let path = substitute_path_vars(
            &method.path,
            path_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let mut builder = RequestDescriptor::builder(join(&self.base_url, &path))
            .method(method.http_method)
            .timeout_ms(self.timeout_ms as i64)
            .verify_ssl(self.verify_ssl)
            .auth(self.auth.clone())
            .query_params(method.query_params.clone());

        let mut headers = self.headers.clone();
        for (name, value) in &method.headers {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }
        builder = builder.headers(headers);

        if let Some(body) = &method.body_template {
            builder = builder.body(body.clone());
        }
        tracing::debug!(template = %self.name, method = %method.name, "Built request from template");
        builder.build()
    }

    pub fn to_json(&self) -> JsonValue {
        self.to_json_with(None)
    }

    pub fn to_json_encrypted(&self) -> JsonValue {
        self.to_json_with(master_cipher().map(|c| c as &dyn SecretCipher))
    }

    pub fn to_json_with(&self, cipher: Option<&dyn SecretCipher>) -> JsonValue {
        let mut node = json!({
            "name": self.name,
            "displayName": self.display_name,
            "baseUrl": self.base_url,
            "timeoutMs": self.timeout_ms,
            "verifySsl": self.verify_ssl,
            "auth": self.auth.to_json_with(cipher),
        });
        if let Some(description) = non_blank_opt(&self.description) {
            node["description"] = json!(description);
        }
        if !self.headers.is_empty() {
            node["headers"] = map_to_json(&self.headers);
        }
        if !self.methods.is_empty() {
            node["methods"] = JsonValue::Array(self.methods.iter().map(TemplateMethod::to_json).collect());
        }
        node
    }

    pub fn from_json(node: &JsonValue) -> ConnectorResult<Self> {
        Self::from_json_with(node, master_cipher().map(|c| c as &dyn SecretCipher))
    }

    /// Parse a stored template. `name` and `baseUrl` are required; other
    /// fields fall back to defaults and malformed methods are skipped.
    pub fn from_json_with(node: &JsonValue, cipher: Option<&dyn SecretCipher>) -> ConnectorResult<Self> {
        let obj = node
            .as_object()
            .ok_or_else(|| ConnectorError::invalid("template must be a JSON object"))?;

        let mut builder = Self::builder(
            str_field(obj, &["name"]).unwrap_or_default(),
            str_field(obj, &["baseUrl"]).unwrap_or_default(),
        );
        if let Some(display_name) = str_field(obj, &["displayName"]) {
            builder = builder.display_name(display_name);
        }
        if let Some(description) = str_field(obj, &["description"]) {
            builder = builder.description(description);
        }
        if let Some(ms) = i64_field(obj, "timeoutMs") {
            builder = builder.timeout_ms(ms);
        }
        if let Some(verify) = bool_field(obj, "verifySsl") {
            builder = builder.verify_ssl(verify);
        }
        if let Some(auth) = obj.get("auth") {
            builder = builder.auth(AuthStrategy::from_json_with(auth, cipher));
        }
        if matches!(obj.get("headers"), Some(JsonValue::Object(_))) {
            builder.headers = Some(string_map(obj, "headers"));
        }
        if let Some(JsonValue::Array(entries)) = obj.get("methods") {
            for entry in entries {
                match entry.as_object().and_then(TemplateMethod::from_json_object) {
                    Some(method) => builder = builder.method(method),
                    None => tracing::warn!("Skipping template method without a name"),
                }
            }
        }
        builder.build()
    }
}

/// Staging struct for [`ApiTemplate`]
#[derive(Debug, Clone)]
pub struct ApiTemplateBuilder {
    name: String,
    display_name: Option<String>,
    description: Option<String>,
    base_url: String,
    timeout_ms: i64,
    verify_ssl: bool,
    auth: AuthStrategy,
    headers: Option<StringMap>,
    methods: Vec<TemplateMethod>,
}

impl ApiTemplateBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS as i64,
            verify_ssl: true,
            auth: AuthStrategy::None,
            headers: None,
            methods: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Non-positive values select the default timeout
    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
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

    /// Any explicit header replaces the default header set
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(StringMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: StringMap) -> Self {
        self.headers.get_or_insert_with(StringMap::new).extend(headers);
        self
    }

    pub fn method(mut self, method: TemplateMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn add_method(self, name: impl Into<String>, http_method: HttpMethod, path: impl Into<String>) -> Self {
        self.method(TemplateMethod::new(name, http_method, path))
    }

    pub fn add_method_with_query(
        self,
        name: impl Into<String>,
        http_method: HttpMethod,
        path: impl Into<String>,
        query_params: StringMap,
    ) -> Self {
        self.method(TemplateMethod::new(name, http_method, path).with_query_params(query_params))
    }

    pub fn build(self) -> ConnectorResult<ApiTemplate> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConnectorError::invalid("template name must not be blank"));
        }
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(ConnectorError::invalid("template baseUrl must not be blank"));
        }
        let display_name = self
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| name.to_string());

        Ok(ApiTemplate {
            name: name.to_string(),
            display_name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            base_url: base_url.to_string(),
            timeout_ms: if self.timeout_ms > 0 {
                self.timeout_ms as u64
            } else {
                DEFAULT_TIMEOUT_MS
            },
            verify_ssl: self.verify_ssl,
            auth: self.auth,
            headers: self.headers.unwrap_or_else(default_headers),
            methods: self.methods,
        })
    }
}
