//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error types
pub use dns_warden_provider::{CredentialValidationError, ProviderError};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Malformed desired record, rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential validation errors (structured, field level)
    #[error("{0}")]
    CredentialValidation(#[from] CredentialValidationError),

    /// Provider error (converted from the provider library)
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Ownership/orphan state persistence failed
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider failed earlier in this pass and is skipped until the next one
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No provider configured at all
    #[error("No DNS provider configured")]
    NoProviderConfigured,

    /// Public IP lookup failed
    #[error("Public IP lookup failed: {0}")]
    IpLookup(String),
}

/// Core layer result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether this is expected behavior (bad input, missing resource) for
    /// log level classification.
    ///
    /// Log at `warn` when `true`, at `error` when `false`.
    /// **Update this method when adding variants.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_) | Self::CredentialValidation(_) | Self::Config(_) => true,
            Self::Provider(e) => e.is_expected(),
            Self::Tracker(_)
            | Self::ProviderUnavailable(_)
            | Self::NoProviderConfigured
            | Self::IpLookup(_) => false,
        }
    }
}
