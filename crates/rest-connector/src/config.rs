//! Environment-driven configuration for the secret cipher and the transport

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

pub const MASTER_KEY_ENV: &str = "REST_CONNECTOR_MASTER_KEY";
pub const KEY_VERSION_ENV: &str = "REST_CONNECTOR_KEY_VERSION";
pub const PREVIOUS_KEYS_ENV: &str = "REST_CONNECTOR_PREVIOUS_KEYS";
pub const USER_AGENT_ENV: &str = "REST_CONNECTOR_USER_AGENT";
pub const CONNECT_TIMEOUT_ENV: &str = "REST_CONNECTOR_CONNECT_TIMEOUT_MS";

/// Master key material for field encryption
#[derive(Clone)]
pub struct EncryptionConfig {
    /// Master key (32 bytes)
    pub master_key: [u8; 32],
    /// Version stamped on newly encrypted values
    pub current_key_version: u32,
    /// Retired keys, kept for decrypting values written before a rotation
    pub historical_keys: HashMap<u32, [u8; 32]>,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut versions: Vec<_> = self.historical_keys.keys().collect();
        versions.sort();
        f.debug_struct("EncryptionConfig")
            .field("master_key", &"[REDACTED]")
            .field("current_key_version", &self.current_key_version)
            .field("historical_key_versions", &versions)
            .finish()
    }
}

impl EncryptionConfig {
    pub fn new(master_key: [u8; 32], current_key_version: u32) -> Self {
        Self {
            master_key,
            current_key_version,
            historical_keys: HashMap::new(),
        }
    }

    pub fn with_historical_key(mut self, version: u32, key: [u8; 32]) -> Self {
        self.historical_keys.insert(version, key);
        self
    }

    /// Load the configuration from the environment.
    ///
    /// Returns `Ok(None)` when no master key is set: encryption is then
    /// disabled and secrets pass through unchanged.
    pub fn from_env() -> Result<Option<Self>> {
        let master_key_hex = match std::env::var(MASTER_KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };
        let master_key = parse_key_hex(master_key_hex.trim())
            .with_context(|| format!("{} is invalid", MASTER_KEY_ENV))?;

        let current_key_version = std::env::var(KEY_VERSION_ENV)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);

        let mut config = Self::new(master_key, current_key_version);
        if let Ok(previous) = std::env::var(PREVIOUS_KEYS_ENV) {
            config.historical_keys = parse_previous_keys(&previous)
                .with_context(|| format!("{} is invalid", PREVIOUS_KEYS_ENV))?;
        }
        Ok(Some(config))
    }
}

/// Decode a 64-character hex string into a 32-byte key
pub fn parse_key_hex(value: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(value).map_err(|_| anyhow!("expected a hex string"))?;
    if bytes.len() != 32 {
        return Err(anyhow!("key must be 32 bytes (64 hex characters)"));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Parse `version:hex,version:hex` into a key map
pub fn parse_previous_keys(value: &str) -> Result<HashMap<u32, [u8; 32]>> {
    let mut keys = HashMap::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (version, key_hex) = entry
            .split_once(':')
            .ok_or_else(|| anyhow!("key entry is not in version:hex form"))?;
        let version: u32 = version
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid key version '{}'", version))?;
        keys.insert(version, parse_key_hex(key_hex.trim())?);
    }
    Ok(keys)
}

/// Settings for the reqwest-backed transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub user_agent: String,
    pub connect_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("rest-connector/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_ms: 10_000,
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            user_agent: std::env::var(USER_AGENT_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            connect_timeout_ms: std::env::var(CONNECT_TIMEOUT_ENV)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.connect_timeout_ms),
        }
    }
}
