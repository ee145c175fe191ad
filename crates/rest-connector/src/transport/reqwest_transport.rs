use super::client_cache::ClientCache;
use super::{HttpTransport, RawResponse};
use crate::config::TransportConfig;
use crate::error::ConnectorResult;
use crate::http::HttpMethod;
use crate::request::RequestDescriptor;
use crate::StringMap;
use async_trait::async_trait;
use reqwest::Method;

/// [`HttpTransport`] backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    clients: ClientCache,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            clients: ClientCache::new(config),
        }
    }

    /// Transport configured from `REST_CONNECTOR_*` variables
    pub fn from_env() -> Self {
        Self::new(TransportConfig::from_env())
    }

    pub fn client_cache(&self) -> &ClientCache {
        &self.clients
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> ConnectorResult<RawResponse> {
        let client = self.clients.get_client(request)?;

        let mut builder = client
            .request(to_reqwest_method(request.method()), request.full_url())
            .timeout(request.timeout());
        for (name, value) in &request.full_headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body().filter(|_| request.has_body()) {
            builder = builder.body(body.to_string());
        }

        // reqwest errors carry the request URL, which may hold a query API key
        let response = builder.send().await.map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();

        let mut headers = StringMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            // repeated headers are folded into one comma-separated value
            headers
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(RawResponse {
            status,
            headers,
            body: if body.is_empty() { None } else { Some(body) },
        })
    }
}
