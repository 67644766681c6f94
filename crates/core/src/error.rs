//! Error types for the ACE domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! The engine surfaces [`Error`]; role implementations return [`RoleError`];
//! LLM backends return [`ProviderError`].

use thiserror::Error;

/// The top-level error type for all engine operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller input ---
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Knowledge item not found: {0}")]
    NotFound(String),

    // --- Curator output rejected before apply ---
    #[error("Curation rejected: {0}")]
    Curation(String),

    // --- Role failures, propagated unchanged ---
    #[error("Role error: {0}")]
    Role(#[from] RoleError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by Strategist, Analyst and Curator implementations.
#[derive(Debug, Clone, Error)]
pub enum RoleError {
    /// The execution trace lacks fields the analyst needs.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Strategy generation failed: {0}")]
    Generation(String),

    #[error("Curation failed: {0}")]
    Curation(String),

    /// The backend answered, but not in a shape the role can use.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Role '{role}' timed out after {timeout_secs}s")]
    Timeout { role: String, timeout_secs: u64 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl RoleError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RoleError::Timeout { .. } | RoleError::MalformedResponse(_) => true,
            RoleError::Provider(e) => e.is_retryable(),
            RoleError::Analysis(_) | RoleError::Generation(_) | RoleError::Curation(_) => false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_)
            | ProviderError::Network(_) => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            ProviderError::AuthenticationFailed(_) | ProviderError::NotConfigured(_) => false,
        }
    }
}
