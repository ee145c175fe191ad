//! OAuth2 grants whose bearer token is obtained by a separate token exchange

use super::credentials::{basic_credentials, AUTHORIZATION};
use crate::error::{ConnectorError, ConnectorResult};
use crate::url_builder::encode_pairs;
use crate::StringMap;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How client credentials reach the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthMethod {
    /// `client_id`/`client_secret` in the form body
    #[default]
    Body,
    /// HTTP Basic `Authorization` header
    Header,
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientAuthMethod::Body => "body",
            ClientAuthMethod::Header => "header",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "header" | "basic" | "client_secret_basic" => ClientAuthMethod::Header,
            _ => ClientAuthMethod::Body,
        }
    }
}

fn require(value: &str, field: &str) -> ConnectorResult<()> {
    if value.trim().is_empty() {
        return Err(ConnectorError::invalid(format!("{} must not be blank", field)));
    }
    Ok(())
}

fn form_headers() -> StringMap {
    let mut headers = StringMap::new();
    headers.insert("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string());
    headers
}

/// OAuth2 client-credentials grant
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2ClientCredentials {
    pub(crate) token_url: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) scope: Option<String>,
    pub(crate) audience: Option<String>,
    pub(crate) client_auth_method: ClientAuthMethod,
}

impl OAuth2ClientCredentials {
    /// Fails with `InvalidArgument` when `token_url` or `client_id` is blank
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> ConnectorResult<Self> {
        let token_url = token_url.into();
        let client_id = client_id.into();
        require(&token_url, "tokenUrl")?;
        require(&client_id, "clientId")?;
        Ok(Self {
            token_url: token_url.trim().to_string(),
            client_id,
            client_secret: client_secret.into(),
            scope: None,
            audience: None,
            client_auth_method: ClientAuthMethod::Body,
        })
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into()).filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into()).filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.client_auth_method = method;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn client_auth_method(&self) -> ClientAuthMethod {
        self.client_auth_method
    }

    /// Form body for the token endpoint.
    ///
    /// With `ClientAuthMethod::Header` the secret travels in the
    /// `Authorization` header and is left out of the body.
    pub fn token_request_body(&self) -> String {
        let mut pairs = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
        ];
        if self.client_auth_method == ClientAuthMethod::Body && !self.client_secret.is_empty() {
            pairs.push(("client_secret", self.client_secret.as_str()));
        }
        if let Some(scope) = &self.scope {
            pairs.push(("scope", scope.as_str()));
        }
        if let Some(audience) = &self.audience {
            pairs.push(("audience", audience.as_str()));
        }
        encode_pairs(pairs)
    }

    pub fn token_request_headers(&self) -> StringMap {
        let mut headers = form_headers();
        if self.client_auth_method == ClientAuthMethod::Header {
            headers.insert(
                AUTHORIZATION.to_string(),
                basic_credentials(&self.client_id, &self.client_secret),
            );
        }
        headers
    }
}

impl std::fmt::Debug for OAuth2ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .field("client_auth_method", &self.client_auth_method)
            .finish()
    }
}

/// OAuth2 resource-owner password grant
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Password {
    pub(crate) token_url: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<String>,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) scope: Option<String>,
}

impl OAuth2Password {
    /// Fails with `InvalidArgument` when `token_url`, `client_id` or
    /// `username` is blank
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ConnectorResult<Self> {
        let token_url = token_url.into();
        let client_id = client_id.into();
        let username = username.into();
        require(&token_url, "tokenUrl")?;
        require(&client_id, "clientId")?;
        require(&username, "username")?;
        Ok(Self {
            token_url: token_url.trim().to_string(),
            client_id,
            client_secret: None,
            username,
            password: password.into(),
            scope: None,
        })
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into()).filter(|s| !s.trim().is_empty());
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn token_request_body(&self) -> String {
        let mut pairs = vec![
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            pairs.push(("client_secret", secret.as_str()));
        }
        pairs.push(("username", self.username.as_str()));
        pairs.push(("password", self.password.as_str()));
        if let Some(scope) = &self.scope {
            pairs.push(("scope", scope.as_str()));
        }
        encode_pairs(pairs)
    }

    pub fn token_request_headers(&self) -> StringMap {
        form_headers()
    }
}

impl std::fmt::Debug for OAuth2Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Password")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}
