#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ConnectorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ConnectorError::InvalidArgument(msg.into())
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;
