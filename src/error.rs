//! Error types for the story generation pipeline.

use thiserror::Error;

/// Provider-level failure on a single generation attempt.
///
/// Every variant surfaces to callers wrapped in [`StoryError::GenerationFailed`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider client unavailable: {0}")]
    Client(String),
}

impl ProviderFailure {
    /// Map a non-success HTTP status and its body text to a failure.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderFailure::AuthFailed(body),
            429 => ProviderFailure::RateLimited(body),
            _ => ProviderFailure::Status { status, body },
        }
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown story length tier: {0}")]
    UnknownTier(String),

    #[error("Unknown age band: {0}")]
    UnknownAgeBand(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] ProviderFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StoryError {
    /// HTTP status the hosting endpoint should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            StoryError::InvalidRequest(_) => 400,
            StoryError::UnknownTier(_)
            | StoryError::UnknownAgeBand(_)
            | StoryError::ConfigError(_) => 500,
            StoryError::GenerationFailed(_) => 502,
        }
    }
}

impl From<config::ConfigError> for StoryError {
    fn from(err: config::ConfigError) -> Self {
        StoryError::ConfigError(err.to_string())
    }
}
