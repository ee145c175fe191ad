//! Declarative model for outbound REST calls.
//!
//! # Overview
//! - [`AuthStrategy`]: closed set of authentication mechanisms, each with its
//!   header/query contribution and plain and encrypted JSON projections.
//! - [`RequestDescriptor`]: immutable, validated description of one call.
//! - [`ResponseDescriptor`]: immutable outcome of one executed call.
//! - [`ApiTemplate`]: persistable bundle of base URL, auth and reusable methods.
//!
//! The core never touches the network. A [`transport::HttpTransport`]
//! executes a descriptor and [`transport::execute`] wraps the outcome.

pub mod auth;
pub mod config;
pub mod encryption;
pub mod error;
pub mod http;
pub mod logging;
pub mod oauth;
pub mod request;
pub mod response;
pub mod sanitization;
pub mod template;
pub mod transport;
pub mod url_builder;

mod json;

/// Insertion-ordered string map used for headers and query parameters
pub type StringMap = indexmap::IndexMap<String, String>;

pub use auth::{
    ApiKeyAuth, ApiKeyLocation, AuthStrategy, BasicAuth, BearerAuth, ClientAuthMethod, CustomAuth,
    OAuth2ClientCredentials, OAuth2Password,
};
pub use encryption::{FieldEncryption, SecretCipher};
pub use error::{ConnectorError, ConnectorResult};
pub use http::{ContentType, HttpMethod};
pub use request::{RequestDescriptor, RequestDescriptorBuilder};
pub use response::ResponseDescriptor;
pub use template::{ApiTemplate, ApiTemplateBuilder, TemplateMethod};
pub use transport::{execute, HttpTransport, RawResponse};

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
