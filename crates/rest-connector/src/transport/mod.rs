//! Execution of request descriptors
//!
//! The descriptors never perform I/O themselves. An [`HttpTransport`] sends a
//! [`RequestDescriptor`] and [`execute`] turns the outcome, success or
//! failure, into a [`ResponseDescriptor`].

use crate::error::ConnectorResult;
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use crate::StringMap;
use async_trait::async_trait;
use std::time::Instant;

#[cfg(feature = "http")]
mod client_cache;
#[cfg(feature = "http")]
mod reqwest_transport;

#[cfg(feature = "http")]
pub use client_cache::{ClientCache, ClientCacheStats};
#[cfg(feature = "http")]
pub use reqwest_transport::ReqwestTransport;

/// Status, headers and body as received from the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: StringMap,
    pub body: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn content_type(&self) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone())
    }
}

/// Sends one request. An `Err` means no HTTP response was received;
/// 4xx and 5xx responses are `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> ConnectorResult<RawResponse>;
}

/// Send `request` and record the outcome. Never fails: transport errors
/// become a response with status -1 and an error message.
pub async fn execute(transport: &dyn HttpTransport, request: &RequestDescriptor) -> ResponseDescriptor {
    let start_time = Instant::now();
    tracing::debug!(method = %request.method(), url = %request.url(), "Executing request");

    let outcome = transport.send(request).await;
    let elapsed_ms = start_time.elapsed().as_millis() as u64;

    match outcome {
        Ok(raw) => {
            tracing::info!(
                method = %request.method(),
                url = %request.url(),
                status = raw.status,
                elapsed_ms,
                "Request completed"
            );
            let content_type = raw.content_type();
            ResponseDescriptor::success(
                i32::from(raw.status),
                raw.headers,
                raw.body,
                content_type,
                elapsed_ms,
                request.url(),
            )
        }
        Err(e) => {
            tracing::warn!(
                method = %request.method(),
                url = %request.url(),
                error = %e,
                elapsed_ms,
                "Request failed"
            );
            ResponseDescriptor::from_error(&e, elapsed_ms, request.url())
        }
    }
}
