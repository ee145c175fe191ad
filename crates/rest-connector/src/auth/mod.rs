//! Authentication strategies for outbound REST calls
//!
//! `AuthStrategy` is a closed set of mechanisms. Each one knows which
//! headers and query parameters it adds to a call, and the OAuth2 grants
//! additionally know how to ask their token endpoint for a bearer token.

mod codec;
mod credentials;
mod oauth2;

pub use credentials::{ApiKeyAuth, ApiKeyLocation, BasicAuth, BearerAuth, CustomAuth, DEFAULT_API_KEY_NAME};
pub use oauth2::{ClientAuthMethod, OAuth2ClientCredentials, OAuth2Password, FORM_CONTENT_TYPE};

use crate::StringMap;
use credentials::AUTHORIZATION;

pub const NONE: &str = "none";
pub const BASIC: &str = "basic";
pub const BEARER: &str = "bearer";
pub const API_KEY: &str = "api_key";
pub const OAUTH2_CLIENT_CREDENTIALS: &str = "oauth2_client_credentials";
pub const OAUTH2_PASSWORD: &str = "oauth2_password";
pub const CUSTOM: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStrategy {
    #[default]
    None,
    Basic(BasicAuth),
    Bearer(BearerAuth),
    ApiKey(ApiKeyAuth),
    OAuth2ClientCredentials(OAuth2ClientCredentials),
    OAuth2Password(OAuth2Password),
    Custom(CustomAuth),
}

impl AuthStrategy {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthStrategy::Basic(BasicAuth::new(username, password))
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        AuthStrategy::Bearer(BearerAuth::new(token))
    }

    pub fn api_key(
        key_name: impl Into<String>,
        key_value: impl Into<String>,
        location: ApiKeyLocation,
    ) -> Self {
        AuthStrategy::ApiKey(ApiKeyAuth::new(key_name, key_value, location))
    }

    pub fn custom(headers: StringMap) -> Self {
        AuthStrategy::Custom(CustomAuth::new(headers))
    }

    /// Stable lowercase tag used on the wire
    pub fn auth_type(&self) -> &'static str {
        match self {
            AuthStrategy::None => NONE,
            AuthStrategy::Basic(_) => BASIC,
            AuthStrategy::Bearer(_) => BEARER,
            AuthStrategy::ApiKey(_) => API_KEY,
            AuthStrategy::OAuth2ClientCredentials(_) => OAUTH2_CLIENT_CREDENTIALS,
            AuthStrategy::OAuth2Password(_) => OAUTH2_PASSWORD,
            AuthStrategy::Custom(_) => CUSTOM,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AuthStrategy::None)
    }

    /// OAuth2 grants only authenticate after a token exchange
    pub fn requires_token_exchange(&self) -> bool {
        matches!(
            self,
            AuthStrategy::OAuth2ClientCredentials(_) | AuthStrategy::OAuth2Password(_)
        )
    }

    /// Headers this strategy adds to an outbound call
    pub fn auth_headers(&self) -> StringMap {
        match self {
            AuthStrategy::None
            | AuthStrategy::OAuth2ClientCredentials(_)
            | AuthStrategy::OAuth2Password(_) => StringMap::new(),
            AuthStrategy::Basic(basic) => authorization(basic.header_value()),
            AuthStrategy::Bearer(bearer) => authorization(bearer.header_value()),
            AuthStrategy::ApiKey(key) => match key.location() {
                ApiKeyLocation::Header => key.pair(),
                ApiKeyLocation::Query => StringMap::new(),
            },
            AuthStrategy::Custom(custom) => custom.headers().clone(),
        }
    }

    /// Query parameters this strategy adds to an outbound call
    pub fn auth_query_params(&self) -> StringMap {
        match self {
            AuthStrategy::ApiKey(key) if key.location() == ApiKeyLocation::Query => key.pair(),
            _ => StringMap::new(),
        }
    }

    pub fn token_url(&self) -> Option<&str> {
        match self {
            AuthStrategy::OAuth2ClientCredentials(cc) => Some(cc.token_url()),
            AuthStrategy::OAuth2Password(pw) => Some(pw.token_url()),
            _ => None,
        }
    }

    /// Form body for the token endpoint, `None` for non-OAuth2 strategies
    pub fn token_request_body(&self) -> Option<String> {
        match self {
            AuthStrategy::OAuth2ClientCredentials(cc) => Some(cc.token_request_body()),
            AuthStrategy::OAuth2Password(pw) => Some(pw.token_request_body()),
            _ => None,
        }
    }

    pub fn token_request_headers(&self) -> Option<StringMap> {
        match self {
            AuthStrategy::OAuth2ClientCredentials(cc) => Some(cc.token_request_headers()),
            AuthStrategy::OAuth2Password(pw) => Some(pw.token_request_headers()),
            _ => None,
        }
    }
}

fn authorization(value: String) -> StringMap {
    let mut headers = StringMap::new();
    headers.insert(AUTHORIZATION.to_string(), value);
    headers
}

impl From<BasicAuth> for AuthStrategy {
    fn from(auth: BasicAuth) -> Self {
        AuthStrategy::Basic(auth)
    }
}

impl From<BearerAuth> for AuthStrategy {
    fn from(auth: BearerAuth) -> Self {
        AuthStrategy::Bearer(auth)
    }
}

impl From<ApiKeyAuth> for AuthStrategy {
    fn from(auth: ApiKeyAuth) -> Self {
        AuthStrategy::ApiKey(auth)
    }
}

impl From<OAuth2ClientCredentials> for AuthStrategy {
    fn from(auth: OAuth2ClientCredentials) -> Self {
        AuthStrategy::OAuth2ClientCredentials(auth)
    }
}

impl From<OAuth2Password> for AuthStrategy {
    fn from(auth: OAuth2Password) -> Self {
        AuthStrategy::OAuth2Password(auth)
    }
}

impl From<CustomAuth> for AuthStrategy {
    fn from(auth: CustomAuth) -> Self {
        AuthStrategy::Custom(auth)
    }
}
