//! Error types for the key rotator.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages.

use std::fmt;

/// The remote collaborator a [`RotatorError::Remote`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    /// The IAM identity service (service accounts and their keys).
    IdentityService,
    /// The object store the credentials documents are written to.
    StorageService,
    /// The public x509 certificate bundle of a service account.
    BundleFetch,
    /// The source of OAuth access tokens for the other services.
    TokenSource,
}

impl fmt::Display for RemoteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteService::IdentityService => "identity service",
            RemoteService::StorageService => "storage service",
            RemoteService::BundleFetch => "certificate bundle",
            RemoteService::TokenSource => "token source",
        };
        f.write_str(name)
    }
}

/// Rotator error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("{service} request failed: {message}")]
    Remote {
        service: RemoteService,
        message: String,
    },

    #[error("key material generation failed: {0}")]
    Crypto(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl RotatorError {
    pub(crate) fn remote(service: RemoteService, message: impl fmt::Display) -> Self {
        RotatorError::Remote {
            service,
            message: message.to_string(),
        }
    }

    /// True when the error is a configuration validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, RotatorError::Validation(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RotatorError>;
