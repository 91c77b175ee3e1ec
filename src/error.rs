//! Application error types.
//!
//! These errors are serializable so a presentation layer can show the
//! "last error" of a refresh cycle without re-parsing display strings.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors.
///
/// The first six variants are the classification every GitLab read
/// resolves to; the rest belong to the application around it.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Token missing, invalid, expired or revoked (HTTP 401).
    #[error("Invalid or expired access token")]
    Unauthorized,

    /// Requested resource not found (HTTP 404).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// API rate limit exceeded (HTTP 429).
    #[error("API rate limit exceeded")]
    RateLimited {
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u64>,
    },

    /// Any other unsuccessful HTTP status.
    #[error("Server error ({status_code})")]
    ServerError { status_code: u16 },

    /// Response body could not be decoded.
    #[error("Failed to parse response: {message}")]
    Decoding { message: String },

    /// Request never produced a response.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Credential storage operation failed.
    #[error("Credential storage error: {message}")]
    CredentialStorage { message: String },

    /// Settings could not be read or written.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// A refresh cycle failed as a whole.
    #[error("Refresh failed for {repository}: {source}")]
    Refresh {
        repository: String,
        source: Box<AppError>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a rate limit error.
    pub fn rate_limited(retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Create a server error for an unexpected HTTP status.
    pub fn server_error(status_code: u16) -> Self {
        Self::ServerError { status_code }
    }

    /// Create a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a credential storage error.
    pub fn credential_storage(message: impl Into<String>) -> Self {
        Self::CredentialStorage {
            message: message.into(),
        }
    }

    /// Create a settings error.
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Wrap a repository's list failure as a cycle-level failure.
    pub fn refresh(repository: impl Into<String>, source: AppError) -> Self {
        Self::Refresh {
            repository: repository.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is an authentication failure, looking through `Refresh`.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::Refresh { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Whether a later cycle can reasonably be expected to succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network { .. } => true,
            Self::ServerError { status_code } => *status_code >= 500,
            Self::Refresh { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Server-suggested wait before retrying, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => *retry_after_secs,
            Self::Refresh { source, .. } => source.retry_after_secs(),
            _ => None,
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_decode() {
            Self::decoding(err.to_string())
        } else if let Some(status) = err.status() {
            Self::server_error(status.as_u16())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::decoding(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::settings(err.to_string())
    }
}
