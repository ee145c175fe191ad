//! Field-level encryption for stored secrets
//!
//! Secrets are sealed with AES-256-GCM under a master key and written as
//! `ENC(v{version}:{nonce}:{ciphertext})`. When no master key is configured
//! the plain value is kept so the system stays usable without one.

use crate::config::EncryptionConfig;
use crate::error::{ConnectorError, ConnectorResult};
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};

const WIRE_PREFIX: &str = "ENC(";
const WIRE_SUFFIX: &str = ")";
const NONCE_LEN: usize = 12;

/// Cipher used to seal and open secret fields
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> ConnectorResult<String>;
    fn decrypt(&self, stored: &str) -> ConnectorResult<String>;
}

/// Encrypted field data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Base64 encoded ciphertext
    pub data: String,
    /// Base64 encoded nonce
    pub nonce: String,
    pub key_version: u32,
}

impl EncryptedField {
    pub fn to_wire(&self) -> String {
        format!(
            "{}v{}:{}:{}{}",
            WIRE_PREFIX, self.key_version, self.nonce, self.data, WIRE_SUFFIX
        )
    }

    pub fn parse_wire(value: &str) -> Option<Self> {
        let inner = value
            .trim()
            .strip_prefix(WIRE_PREFIX)?
            .strip_suffix(WIRE_SUFFIX)?;
        let mut parts = inner.splitn(3, ':');
        let key_version = parts.next()?.strip_prefix('v')?.parse().ok()?;
        let nonce = parts.next()?.to_string();
        let data = parts.next()?.to_string();
        if nonce.is_empty() || data.is_empty() {
            return None;
        }
        Some(Self {
            data,
            nonce,
            key_version,
        })
    }
}

/// True when the value carries the encrypted wire form
pub fn is_encrypted(value: &str) -> bool {
    EncryptedField::parse_wire(value).is_some()
}

/// AES-256-GCM field encryption service
#[derive(Debug, Clone)]
pub struct FieldEncryption {
    config: EncryptionConfig,
}

impl FieldEncryption {
    pub fn new(config: EncryptionConfig) -> Self {
        Self { config }
    }

    /// Build the service from the environment, `None` when no key is set
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        Ok(EncryptionConfig::from_env()?.map(Self::new))
    }

    pub fn key_version(&self) -> u32 {
        self.config.current_key_version
    }

    pub fn encrypt_field(&self, plaintext: &str) -> ConnectorResult<EncryptedField> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let cipher = Aes256Gcm::new_from_slice(&self.config.master_key)
            .map_err(|e| ConnectorError::Encryption(format!("Failed to create cipher: {}", e)))?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ConnectorError::Encryption(format!("Encryption failed: {}", e)))?;
        Ok(EncryptedField {
            data: STANDARD.encode(&ciphertext),
            nonce: STANDARD.encode(nonce_bytes),
            key_version: self.config.current_key_version,
        })
    }

    pub fn decrypt_field(&self, encrypted: &EncryptedField) -> ConnectorResult<String> {
        let nonce_bytes = STANDARD
            .decode(&encrypted.nonce)
            .map_err(|e| ConnectorError::Encryption(format!("Failed to decode nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(ConnectorError::Encryption(format!(
                "Invalid nonce length: {}",
                nonce_bytes.len()
            )));
        }
        let key = if encrypted.key_version == self.config.current_key_version {
            &self.config.master_key
        } else {
            self.config
                .historical_keys
                .get(&encrypted.key_version)
                .ok_or_else(|| {
                    ConnectorError::Encryption(format!(
                        "Key version {} not found",
                        encrypted.key_version
                    ))
                })?
        };
        let ciphertext = STANDARD
            .decode(&encrypted.data)
            .map_err(|e| ConnectorError::Encryption(format!("Failed to decode ciphertext: {}", e)))?;
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| ConnectorError::Encryption(format!("Failed to create cipher: {}", e)))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|e| ConnectorError::Encryption(format!("Decryption failed: {}", e)))?;
        String::from_utf8(plaintext).map_err(|e| {
            ConnectorError::Encryption(format!("Invalid UTF-8 in decrypted data: {}", e))
        })
    }

    pub fn generate_master_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Generate hexadecimal representation of a fresh master key
    pub fn generate_master_key_hex() -> String {
        hex::encode(Self::generate_master_key())
    }
}

impl SecretCipher for FieldEncryption {
    fn encrypt(&self, plaintext: &str) -> ConnectorResult<String> {
        Ok(self.encrypt_field(plaintext)?.to_wire())
    }

    fn decrypt(&self, stored: &str) -> ConnectorResult<String> {
        let field = EncryptedField::parse_wire(stored).ok_or_else(|| {
            ConnectorError::Encryption("Value is not in encrypted form".to_string())
        })?;
        self.decrypt_field(&field)
    }
}

static MASTER_CIPHER: Lazy<Option<FieldEncryption>> = Lazy::new(|| match FieldEncryption::from_env() {
    Ok(Some(cipher)) => {
        tracing::info!(key_version = cipher.key_version(), "Secret encryption enabled");
        Some(cipher)
    }
    Ok(None) => {
        tracing::debug!("No master key configured, secrets are stored in plain form");
        None
    }
    Err(e) => {
        tracing::error!(error = %e, "Ignoring invalid master key configuration");
        None
    }
});

/// Process-wide cipher loaded once from the environment
pub fn master_cipher() -> Option<&'static FieldEncryption> {
    MASTER_CIPHER.as_ref()
}

/// Encrypt a secret for storage.
///
/// Empty values and values already in encrypted form are returned as is.
/// Without a cipher, or when the cipher fails, the plain value is kept.
pub(crate) fn seal(value: &str, cipher: Option<&dyn SecretCipher>, field: &'static str) -> String {
    let Some(cipher) = cipher else {
        return value.to_string();
    };
    if value.is_empty() || is_encrypted(value) {
        return value.to_string();
    }
    match cipher.encrypt(value) {
        Ok(sealed) => sealed,
        Err(e) => {
            tracing::warn!(field, error = %e, "Failed to encrypt secret, keeping plain value");
            value.to_string()
        }
    }
}

/// Recover a stored secret.
///
/// Plain values are returned unchanged. Encrypted values that cannot be
/// opened yield `None`.
pub(crate) fn open(value: &str, cipher: Option<&dyn SecretCipher>, field: &'static str) -> Option<String> {
    if !is_encrypted(value) {
        return Some(value.to_string());
    }
    let Some(cipher) = cipher else {
        tracing::warn!(field, "Encrypted secret found but no master key is configured");
        return None;
    };
    match cipher.decrypt(value) {
        Ok(plain) => Some(plain),
        Err(e) => {
            tracing::warn!(field, error = %e, "Failed to decrypt stored secret");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> FieldEncryption {
        FieldEncryption::new(EncryptionConfig::new(FieldEncryption::generate_master_key(), 1))
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encryption = service();
        let plaintext = "sensitive_access_token_12345";

        let encrypted = encryption.encrypt_field(plaintext).unwrap();
        assert_eq!(encrypted.key_version, 1);
        assert_ne!(encrypted.data, plaintext);

        assert_eq!(encryption.decrypt_field(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let encryption = service();
        let a = encryption.encrypt("same").unwrap();
        let b = encryption.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wire_form() {
        let encryption = service();
        let sealed = encryption.encrypt("s3cret").unwrap();
        assert!(sealed.starts_with("ENC(v1:"));
        assert!(sealed.ends_with(')'));
        assert!(is_encrypted(&sealed));
        assert!(!is_encrypted("s3cret"));
        assert!(!is_encrypted("ENC()"));
        assert!(!is_encrypted("ENC(x1:a:b)"));
        assert_eq!(encryption.decrypt(&sealed).unwrap(), "s3cret");
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = service().encrypt("s3cret").unwrap();
        assert!(service().decrypt(&sealed).is_err());
    }

    #[test]
    fn test_historical_key_decrypts_old_values() {
        let old_key = FieldEncryption::generate_master_key();
        let old = FieldEncryption::new(EncryptionConfig::new(old_key, 1));
        let sealed = old.encrypt("rotated").unwrap();

        let current = FieldEncryption::new(
            EncryptionConfig::new(FieldEncryption::generate_master_key(), 2)
                .with_historical_key(1, old_key),
        );
        assert_eq!(current.decrypt(&sealed).unwrap(), "rotated");
        assert!(current.encrypt("new").unwrap().starts_with("ENC(v2:"));
    }

    #[test]
    fn test_seal_and_open_are_fail_soft() {
        let encryption = service();
        let cipher: &dyn SecretCipher = &encryption;

        assert_eq!(seal("plain", None, "password"), "plain");
        assert_eq!(seal("", Some(cipher), "password"), "");

        let sealed = seal("plain", Some(cipher), "password");
        assert!(is_encrypted(&sealed));
        assert_eq!(seal(&sealed, Some(cipher), "password"), sealed);

        assert_eq!(open(&sealed, Some(cipher), "password").as_deref(), Some("plain"));
        assert_eq!(open("plain", None, "password").as_deref(), Some("plain"));
        assert_eq!(open(&sealed, None, "password"), None);
        assert_eq!(open(&sealed, Some(&service() as &dyn SecretCipher), "password"), None);
    }

    #[test]
    fn test_key_generation() {
        let key_hex = FieldEncryption::generate_master_key_hex();
        assert_eq!(key_hex.len(), 64);
        hex::decode(&key_hex).unwrap();
    }
}
