//! Shared `reqwest` clients keyed by connection-level settings

use crate::config::TransportConfig;
use crate::error::ConnectorResult;
use crate::request::RequestDescriptor;
use reqwest::{redirect, Client};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Settings that can only be applied when a client is built
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    verify_ssl: bool,
    follow_redirects: bool,
    connect_timeout_ms: u64,
}

impl ClientKey {
    fn build_client(&self, user_agent: &str) -> ConnectorResult<Client> {
        let redirects = if self.follow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .redirect(redirects)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()?;
        Ok(client)
    }
}

/// Client cache; clients are reused across requests with the same TLS,
/// redirect and connect-timeout settings
#[derive(Debug, Clone)]
pub struct ClientCache {
    config: TransportConfig,
    cache: Arc<RwLock<HashMap<ClientKey, Arc<Client>>>>,
}

impl ClientCache {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get_client(&self, request: &RequestDescriptor) -> ConnectorResult<Arc<Client>> {
        let key = ClientKey {
            verify_ssl: request.verify_ssl(),
            follow_redirects: request.follow_redirects(),
            connect_timeout_ms: self.config.connect_timeout_ms,
        };

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(client) = cache.get(&key) {
                return Ok(client.clone());
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // another task may have built it while we waited for the write lock
        if let Some(client) = cache.get(&key) {
            return Ok(client.clone());
        }

        if !key.verify_ssl {
            tracing::warn!("Building HTTP client with certificate verification disabled");
        }
        let client = Arc::new(key.build_client(&self.config.user_agent)?);
        cache.insert(key, client.clone());
        Ok(client)
    }

    pub fn stats(&self) -> ClientCacheStats {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        ClientCacheStats {
            cached_clients: cache.len(),
        }
    }

    pub fn clear(&self) {
        self.cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct ClientCacheStats {
    pub cached_clients: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_shared_per_settings() {
        let cache = ClientCache::default();
        let plain = RequestDescriptor::new("https://a.test").unwrap();
        let other_url = RequestDescriptor::new("https://b.test/x").unwrap();
        let insecure = plain.to_builder().verify_ssl(false).build().unwrap();
        let no_redirects = plain.to_builder().follow_redirects(false).build().unwrap();

        let first = cache.get_client(&plain).unwrap();
        let second = cache.get_client(&other_url).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().cached_clients, 1);

        cache.get_client(&insecure).unwrap();
        cache.get_client(&no_redirects).unwrap();
        assert_eq!(cache.stats().cached_clients, 3);

        cache.clear();
        assert_eq!(cache.stats().cached_clients, 0);
    }
}
