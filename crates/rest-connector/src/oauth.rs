//! OAuth2 token acquisition for the client-credentials and password grants

use crate::auth::AuthStrategy;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::ContentType;
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use crate::transport::{execute, HttpTransport};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are treated as expired
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Successful token endpoint response (RFC 6749 section 5.1)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Absolute expiry for a token issued at `issued_at`
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| issued_at + Duration::seconds(secs))
    }

    /// True once `now` is within [`EXPIRY_SKEW_SECS`] of the expiry.
    /// Tokens without `expires_in` never expire.
    pub fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.expires_at(issued_at)
            .is_some_and(|at| at <= now + Duration::seconds(EXPIRY_SKEW_SECS))
    }

    pub fn into_bearer(self) -> AuthStrategy {
        AuthStrategy::bearer(self.access_token)
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Token endpoint call for an OAuth2 strategy, `None` for anything else
pub fn token_request(auth: &AuthStrategy) -> Option<RequestDescriptor> {
    let token_url = auth.token_url()?;
    let body = auth.token_request_body()?;
    let headers = auth.token_request_headers()?;
    match RequestDescriptor::builder(token_url)
        .post()
        .headers(headers)
        .body(body)
        .content_type(ContentType::FormUrlencoded)
        .build()
    {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::warn!(auth_type = auth.auth_type(), error = %e, "Cannot build token request");
            None
        }
    }
}

/// Token from a token endpoint response; `None` unless the call succeeded
/// and returned a non-blank access token
pub fn parse_token_response(response: &ResponseDescriptor) -> Option<TokenResponse> {
    if !response.is_successful() || response.error_message().is_some() {
        tracing::debug!(status = response.status_code(), "Token endpoint did not succeed");
        return None;
    }
    response
        .body_as::<TokenResponse>()
        .filter(|token| !token.access_token.trim().is_empty())
}

/// Exchange the strategy's credentials for a token
pub async fn fetch_token(transport: &dyn HttpTransport, auth: &AuthStrategy) -> ConnectorResult<TokenResponse> {
    let request = token_request(auth).ok_or_else(|| {
        ConnectorError::invalid(format!("{} does not use a token endpoint", auth.auth_type()))
    })?;
    let response = execute(transport, &request).await;
    parse_token_response(&response).ok_or_else(|| {
        tracing::warn!(
            token_url = %request.url(),
            status = response.status_code(),
            "OAuth2 token exchange failed"
        );
        ConnectorError::Transport(format!(
            "token exchange failed: {}",
            response
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", response.status_code()))
        ))
    })
}

/// Request ready to send: OAuth2 strategies are exchanged for a bearer token,
/// any other request is returned unchanged
pub async fn authorize(transport: &dyn HttpTransport, request: &RequestDescriptor) -> ConnectorResult<RequestDescriptor> {
    if !request.auth().requires_token_exchange() {
        return Ok(request.clone());
    }
    let token = fetch_token(transport, request.auth()).await?;
    tracing::debug!(token_type = %token.token_type, expires_in = ?token.expires_in, "Obtained access token");
    Ok(request.with_auth(token.into_bearer()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ClientAuthMethod, OAuth2ClientCredentials, OAuth2Password};
    use crate::StringMap;
    use chrono::TimeZone;

    fn token_response(status: i32, body: &str) -> ResponseDescriptor {
        ResponseDescriptor::success(
            status,
            StringMap::new(),
            Some(body.to_string()),
            Some("application/json".to_string()),
            3,
            "https://auth.test/token",
        )
    }

    #[test]
    fn test_token_request_for_client_credentials() {
        let auth = AuthStrategy::from(
            OAuth2ClientCredentials::new("https://auth.test/token", "cid", "csecret")
                .unwrap()
                .with_scope("read write"),
        );
        let request = token_request(&auth).unwrap();
        assert_eq!(request.url(), "https://auth.test/token");
        assert_eq!(request.method(), crate::HttpMethod::Post);
        assert_eq!(request.content_type(), ContentType::FormUrlencoded);
        assert_eq!(
            request.body(),
            Some("grant_type=client_credentials&client_id=cid&client_secret=csecret&scope=read+write")
        );
        assert_eq!(
            request.full_headers()["Content-Type"],
            "application/x-www-form-urlencoded"
        );
        assert!(request.auth().is_none());
    }

    #[test]
    fn test_token_request_header_auth_method() {
        let auth = AuthStrategy::from(
            OAuth2ClientCredentials::new("https://auth.test/token", "cid", "csecret")
                .unwrap()
                .with_client_auth_method(ClientAuthMethod::Header),
        );
        let request = token_request(&auth).unwrap();
        assert!(request.full_headers()["Authorization"].starts_with("Basic "));
        assert!(!request.body().unwrap().contains("csecret"));
    }

    #[test]
    fn test_token_request_for_password_grant() {
        let auth = AuthStrategy::from(
            OAuth2Password::new("https://auth.test/token", "cid", "alice", "p@ss").unwrap(),
        );
        let body = token_request(&auth).unwrap().body().unwrap().to_string();
        assert!(body.starts_with("grant_type=password"));
        assert!(body.contains("username=alice"));
        assert!(body.contains("password=p%40ss"));
    }

    #[test]
    fn test_token_request_none_for_other_strategies() {
        assert!(token_request(&AuthStrategy::None).is_none());
        assert!(token_request(&AuthStrategy::bearer("t")).is_none());
    }

    #[test]
    fn test_parse_token_response() {
        let token = parse_token_response(&token_response(
            200,
            r#"{"access_token":"abc","expires_in":3600,"scope":"read"}"#,
        ))
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.scope.as_deref(), Some("read"));
        assert_eq!(token.refresh_token, None);
    }

    #[test]
    fn test_parse_token_response_rejects_failures() {
        assert!(parse_token_response(&token_response(401, r#"{"access_token":"abc"}"#)).is_none());
        assert!(parse_token_response(&token_response(200, r#"{"access_token":"  "}"#)).is_none());
        assert!(parse_token_response(&token_response(200, r#"{"error":"invalid_client"}"#)).is_none());
        assert!(parse_token_response(&ResponseDescriptor::error("refused", 1, "u")).is_none());
    }

    #[test]
    fn test_expiry() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = TokenResponse {
            access_token: "t".into(),
            token_type: "Bearer".into(),
            expires_in: Some(3600),
            refresh_token: None,
            scope: None,
        };
        assert_eq!(token.expires_at(issued), Some(issued + Duration::hours(1)));
        assert!(!token.is_expired(issued, issued + Duration::minutes(30)));
        assert!(token.is_expired(issued, issued + Duration::minutes(59) + Duration::seconds(30)));

        let forever = TokenResponse { expires_in: None, ..token.clone() };
        assert!(!forever.is_expired(issued, issued + Duration::days(365)));
        assert_eq!(token.into_bearer(), AuthStrategy::bearer("t"));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let token = TokenResponse {
            access_token: "secret-access".into(),
            token_type: "Bearer".into(),
            expires_in: None,
            refresh_token: Some("secret-refresh".into()),
            scope: None,
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
