use models::errors::ModelError;
use thiserror::Error;

/// Failure kinds surfaced by the upstream proxy and the admin flows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream responded with {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("session expired")]
    SessionExpired,
    #[error("missing credentials")]
    MissingCredentials,
    #[error("decode error: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ProxyError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ProxyError::Network(_) => 2001,
            ProxyError::Upstream { .. } => 2002,
            ProxyError::Validation(_) => 2003,
            ProxyError::SessionExpired => 2004,
            ProxyError::MissingCredentials => 2005,
            ProxyError::Decode(_) => 2006,
            ProxyError::Cancelled => 2007,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Network(_) => "network_error",
            ProxyError::Upstream { .. } => "upstream_error",
            ProxyError::Validation(_) => "validation_error",
            ProxyError::SessionExpired => "session_expired",
            ProxyError::MissingCredentials => "missing_credentials",
            ProxyError::Decode(_) => "decode_error",
            ProxyError::Cancelled => "cancelled",
        }
    }

    /// HTTP status the same-origin surface answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            ProxyError::Network(_) | ProxyError::Decode(_) => 502,
            ProxyError::Upstream { status, .. } if (400..600).contains(status) => *status,
            ProxyError::Upstream { .. } => 502,
            ProxyError::Validation(_) => 400,
            ProxyError::SessionExpired | ProxyError::MissingCredentials => 401,
            ProxyError::Cancelled => 499,
        }
    }

    /// Errors that must end the session wherever they are seen.
    pub fn forces_logout(&self) -> bool {
        matches!(self, ProxyError::SessionExpired)
    }
}

impl From<ModelError> for ProxyError {
    fn from(e: ModelError) -> Self {
        ProxyError::Validation(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("stored user profile is not valid JSON: {0}")]
    Profile(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
