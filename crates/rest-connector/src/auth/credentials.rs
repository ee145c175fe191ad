//! Static-credential strategies: basic, bearer, API key and custom headers

use crate::StringMap;
use base64::{engine::general_purpose::STANDARD, Engine};

pub const DEFAULT_API_KEY_NAME: &str = "X-API-Key";
pub(crate) const AUTHORIZATION: &str = "Authorization";

pub(crate) fn basic_credentials(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// HTTP Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
    preemptive: bool,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            preemptive: true,
        }
    }

    pub fn with_preemptive(mut self, preemptive: bool) -> Self {
        self.preemptive = preemptive;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Send credentials on the first request instead of waiting for a challenge
    pub fn preemptive(&self) -> bool {
        self.preemptive
    }

    pub fn header_value(&self) -> String {
        basic_credentials(&self.username, &self.password)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("preemptive", &self.preemptive)
            .finish()
    }
}

/// Bearer token authentication
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").field("token", &"[REDACTED]").finish()
    }
}

/// Where an API key travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

impl ApiKeyLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "queryParam",
        }
    }

    /// Lenient parse; anything unrecognized means header
    pub fn parse(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "query" | "queryparam" | "queryparams" | "querystring" => ApiKeyLocation::Query,
            _ => ApiKeyLocation::Header,
        }
    }
}

/// API key sent as a header or a query parameter
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyAuth {
    key_name: String,
    key_value: String,
    location: ApiKeyLocation,
}

impl ApiKeyAuth {
    /// A blank key name falls back to `X-API-Key`
    pub fn new(
        key_name: impl Into<String>,
        key_value: impl Into<String>,
        location: ApiKeyLocation,
    ) -> Self {
        let key_name = key_name.into();
        let key_name = if key_name.trim().is_empty() {
            DEFAULT_API_KEY_NAME.to_string()
        } else {
            key_name
        };
        Self {
            key_name,
            key_value: key_value.into(),
            location,
        }
    }

    pub fn header(key_name: impl Into<String>, key_value: impl Into<String>) -> Self {
        Self::new(key_name, key_value, ApiKeyLocation::Header)
    }

    pub fn query(key_name: impl Into<String>, key_value: impl Into<String>) -> Self {
        Self::new(key_name, key_value, ApiKeyLocation::Query)
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn key_value(&self) -> &str {
        &self.key_value
    }

    pub fn location(&self) -> ApiKeyLocation {
        self.location
    }

    pub(crate) fn pair(&self) -> StringMap {
        let mut map = StringMap::new();
        map.insert(self.key_name.clone(), self.key_value.clone());
        map
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("key_name", &self.key_name)
            .field("key_value", &"[REDACTED]")
            .field("location", &self.location)
            .finish()
    }
}

/// Arbitrary headers supplied verbatim
#[derive(Clone, PartialEq, Eq, Default)]
pub struct CustomAuth {
    headers: StringMap,
}

impl CustomAuth {
    pub fn new(headers: StringMap) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &StringMap {
        &self.headers
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CustomAuth {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl std::fmt::Debug for CustomAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // header values may be credentials, only names are shown
        f.debug_struct("CustomAuth")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}
