//! Error types for the dashboard service clients.
//!
//! # Design
//! Each client owns one error enum. Instead of a class hierarchy, every error
//! reports an [`ErrorCategory`] that generic handlers can match on: a failed
//! login and a 401 from the resource backend both land in
//! `ErrorCategory::Unauthorized`.

use std::error::Error as StdError;

use thiserror::Error;

/// Coarse classification shared by [`ApiError`] and [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The call was rejected locally before any network I/O.
    InvalidRequest,
    /// The backend failed or could not be reached.
    Upstream,
    /// Credentials or token were refused.
    Unauthorized,
    /// The backend answered successfully but broke its response contract.
    Contract,
}

/// Errors returned by `ResourceClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The operation name is not in the endpoint registry.
    #[error("unsupported operation `{0}`")]
    UnsupportedOperation(String),

    /// A placeholder in the URL template has no matching parameter.
    #[error("operation `{operation}` requires path parameter `{parameter}`")]
    MissingPathParameter { operation: String, parameter: String },

    /// A path parameter is not a scalar, or is a string that would not form
    /// a single path segment (`""`, `.` or `..`).
    #[error("path parameter `{parameter}` of `{operation}` is not a valid path segment")]
    InvalidPathParameter { operation: String, parameter: String },

    /// The backend returned a status >= 400.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a usable response.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The request parameters could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A JSON response could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::UnsupportedOperation(_)
            | ApiError::MissingPathParameter { .. }
            | ApiError::InvalidPathParameter { .. }
            | ApiError::Serialization(_) => ErrorCategory::InvalidRequest,
            ApiError::Http { status: 401 | 403, .. } => ErrorCategory::Unauthorized,
            ApiError::Http { .. } | ApiError::Transport(_) => ErrorCategory::Upstream,
            ApiError::Deserialization(_) => ErrorCategory::Contract,
        }
    }

    /// HTTP status of the failed response, if the backend sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by `AuthClient`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login provider is unknown or not enabled.
    #[error("{0} login is currently not supported")]
    UnsupportedProvider(String),

    /// The login request failed at the HTTP or transport level.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed {
        status: Option<u16>,
        reason: String,
        #[source]
        source: Option<TransportError>,
    },

    /// The login succeeded but the response had no token.
    #[error("token not found in response")]
    TokenMissing,
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::UnsupportedProvider(_) => ErrorCategory::InvalidRequest,
            AuthError::AuthenticationFailed { .. } => ErrorCategory::Unauthorized,
            AuthError::TokenMissing => ErrorCategory::Contract,
        }
    }
}

/// Failure to complete an HTTP round trip: DNS, refused connection, timeout
/// or an unreadable response body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while populating an `EndpointRegistry`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation `{0}` is already registered")]
    DuplicateOperation(String),

    #[error("invalid URL template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Errors raised while loading or installing `Settings`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("invalid request timeout `{0}`, expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("settings have already been installed")]
    AlreadyInstalled,

    #[error("settings have not been installed")]
    NotInstalled,
}
