//! JSON projections of `AuthStrategy`
//!
//! Parsing never fails: anything that cannot be understood becomes
//! `AuthStrategy::None`, and a secret that cannot be decrypted becomes empty.

use super::*;
use crate::encryption::{master_cipher, open, seal, SecretCipher};
use crate::json::{bool_field, map_to_json, non_blank, str_field, string_map, JsonObject};
use crate::sanitization::sanitize_json_value;
use serde_json::{json, Value as JsonValue};

fn default_cipher() -> Option<&'static dyn SecretCipher> {
    master_cipher().map(|c| c as &dyn SecretCipher)
}

/// Lowercased tag with separators removed, so `api_key`, `apiKey` and
/// `API-KEY` compare equal
fn normalize_tag(tag: &str) -> String {
    tag.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl AuthStrategy {
    /// Plain JSON projection, secrets included as is
    pub fn to_json(&self) -> JsonValue {
        self.to_json_with(None)
    }

    /// JSON projection with secrets sealed by the process master cipher.
    ///
    /// Identical to [`AuthStrategy::to_json`] when no master key is configured.
    pub fn to_json_encrypted(&self) -> JsonValue {
        self.to_json_with(default_cipher())
    }

    /// JSON projection sealing secrets with `cipher` when one is given
    pub fn to_json_with(&self, cipher: Option<&dyn SecretCipher>) -> JsonValue {
        match self {
            AuthStrategy::None => json!({ "authType": NONE }),
            AuthStrategy::Basic(basic) => json!({
                "authType": BASIC,
                "username": basic.username(),
                "password": seal(basic.password(), cipher, "password"),
                "preemptive": basic.preemptive(),
            }),
            AuthStrategy::Bearer(bearer) => json!({
                "authType": BEARER,
                "token": seal(bearer.token(), cipher, "token"),
            }),
            AuthStrategy::ApiKey(key) => json!({
                "authType": API_KEY,
                "keyName": key.key_name(),
                "keyValue": seal(key.key_value(), cipher, "keyValue"),
                "location": key.location().as_str(),
            }),
            AuthStrategy::OAuth2ClientCredentials(cc) => {
                let mut node = json!({
                    "authType": OAUTH2_CLIENT_CREDENTIALS,
                    "tokenUrl": cc.token_url(),
                    "clientId": cc.client_id(),
                    "clientSecret": seal(cc.client_secret(), cipher, "clientSecret"),
                    "clientAuthMethod": cc.client_auth_method().as_str(),
                });
                if let Some(scope) = cc.scope() {
                    node["scope"] = json!(scope);
                }
                if let Some(audience) = cc.audience() {
                    node["audience"] = json!(audience);
                }
                node
            }
            AuthStrategy::OAuth2Password(pw) => {
                let mut node = json!({
                    "authType": OAUTH2_PASSWORD,
                    "tokenUrl": pw.token_url(),
                    "clientId": pw.client_id(),
                    "username": pw.username(),
                    "password": seal(pw.password(), cipher, "password"),
                });
                if let Some(secret) = pw.client_secret() {
                    node["clientSecret"] = json!(seal(secret, cipher, "clientSecret"));
                }
                if let Some(scope) = pw.scope() {
                    node["scope"] = json!(scope);
                }
                node
            }
            AuthStrategy::Custom(custom) => json!({
                "authType": CUSTOM,
                "headers": map_to_json(custom.headers()),
            }),
        }
    }

    /// Parse a stored strategy, opening encrypted secrets with the process
    /// master cipher
    pub fn from_json(node: &JsonValue) -> Self {
        Self::from_json_with(node, default_cipher())
    }

    pub fn from_json_with(node: &JsonValue, cipher: Option<&dyn SecretCipher>) -> Self {
        let Some(obj) = node.as_object() else {
            return AuthStrategy::None;
        };
        let Some(tag) = non_blank(obj, &["authType", "type"]) else {
            return AuthStrategy::None;
        };
        match normalize_tag(tag).as_str() {
            "none" | "noauth" => AuthStrategy::None,
            "basic" | "basicauth" => parse_basic(obj, cipher),
            "bearer" | "bearertoken" | "bearerauth" => parse_bearer(obj, cipher),
            "apikey" | "apikeyauth" => parse_api_key(obj, cipher),
            "oauth2clientcredentials" | "clientcredentials" | "oauth2cc" => {
                parse_client_credentials(obj, cipher)
            }
            "oauth2password" | "password" | "oauth2ropc" => parse_password(obj, cipher),
            "custom" | "customheaders" | "customauth" => {
                AuthStrategy::Custom(CustomAuth::new(string_map(obj, "headers")))
            }
            _ => {
                tracing::warn!(
                    auth_type = %tag,
                    document = %sanitize_json_value(node),
                    "Unknown authType, falling back to no authentication"
                );
                AuthStrategy::None
            }
        }
    }
}

/// Secret string field; undecryptable values become empty
fn secret(obj: &JsonObject, names: &[&str], cipher: Option<&dyn SecretCipher>, field: &'static str) -> String {
    str_field(obj, names)
        .and_then(|value| open(value, cipher, field))
        .unwrap_or_default()
}

fn optional_secret(
    obj: &JsonObject,
    names: &[&str],
    cipher: Option<&dyn SecretCipher>,
    field: &'static str,
) -> Option<String> {
    str_field(obj, names)
        .filter(|value| !value.is_empty())
        .and_then(|value| open(value, cipher, field))
}

fn text(obj: &JsonObject, names: &[&str]) -> String {
    str_field(obj, names).unwrap_or_default().to_string()
}

fn optional_text(obj: &JsonObject, name: &str) -> Option<String> {
    non_blank(obj, &[name]).map(str::to_string)
}

fn parse_basic(obj: &JsonObject, cipher: Option<&dyn SecretCipher>) -> AuthStrategy {
    BasicAuth::new(text(obj, &["username"]), secret(obj, &["password"], cipher, "password"))
        .with_preemptive(bool_field(obj, "preemptive").unwrap_or(true))
        .into()
}

fn parse_bearer(obj: &JsonObject, cipher: Option<&dyn SecretCipher>) -> AuthStrategy {
    BearerAuth::new(secret(obj, &["token"], cipher, "token")).into()
}

fn parse_api_key(obj: &JsonObject, cipher: Option<&dyn SecretCipher>) -> AuthStrategy {
    let location = str_field(obj, &["location", "apiKeyLocation"])
        .map(ApiKeyLocation::parse)
        .unwrap_or_default();
    ApiKeyAuth::new(
        non_blank(obj, &["keyName", "apiKeyName"]).unwrap_or_default(),
        secret(obj, &["keyValue", "apiKeyValue"], cipher, "keyValue"),
        location,
    )
    .into()
}

fn parse_client_credentials(obj: &JsonObject, cipher: Option<&dyn SecretCipher>) -> AuthStrategy {
    AuthStrategy::OAuth2ClientCredentials(OAuth2ClientCredentials {
        token_url: text(obj, &["tokenUrl"]).trim().to_string(),
        client_id: text(obj, &["clientId"]),
        client_secret: secret(obj, &["clientSecret"], cipher, "clientSecret"),
        scope: optional_text(obj, "scope"),
        audience: optional_text(obj, "audience"),
        client_auth_method: str_field(obj, &["clientAuthMethod"])
            .map(ClientAuthMethod::parse)
            .unwrap_or_default(),
    })
}

fn parse_password(obj: &JsonObject, cipher: Option<&dyn SecretCipher>) -> AuthStrategy {
    AuthStrategy::OAuth2Password(OAuth2Password {
        token_url: text(obj, &["tokenUrl"]).trim().to_string(),
        client_id: text(obj, &["clientId"]),
        client_secret: optional_secret(obj, &["clientSecret"], cipher, "clientSecret"),
        username: text(obj, &["username"]),
        password: secret(obj, &["password"], cipher, "password"),
        scope: optional_text(obj, "scope"),
    })
}
