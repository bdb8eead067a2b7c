//! Error types for the alternative playlist pipeline

use thiserror::Error;

/// Result type alias for pipeline and gateway operations
pub type Result<T> = std::result::Result<T, AltPlaylistError>;

/// Errors that can occur while talking to the gateways or building a playlist
#[derive(Error, Debug)]
pub enum AltPlaylistError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Access token missing, expired or rejected
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found (track, playlist, ...)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limiting on either gateway
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Non-success status returned by a gateway
    #[error("API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Length multiplier outside 1..=5
    #[error("Invalid length multiplier: {0} (must be 1-5)")]
    InvalidMultiplier(u8),

    /// Unknown build mode
    #[error("Invalid build mode: {0} (expected 'alternative' or 'extend')")]
    InvalidMode(String),

    /// Extend mode requested before any playlist was built
    #[error("No previous playlist to extend")]
    NothingToExtend,

    /// The build was cancelled by its caller
    #[error("Build cancelled")]
    Cancelled,
}

impl AltPlaylistError {
    /// Builds an API error from an HTTP status code and a message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// True for a user-initiated cancellation, which callers drop silently
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert!(AltPlaylistError::from_status_code(401, "expired").is_auth_error());
        assert!(AltPlaylistError::from_status_code(403, "scope").is_auth_error());
        assert!(matches!(
            AltPlaylistError::from_status_code(404, "gone"),
            AltPlaylistError::NotFound(_)
        ));
        assert!(AltPlaylistError::from_status_code(429, "").is_rate_limit());
        assert!(matches!(
            AltPlaylistError::from_status_code(502, "bad gateway"),
            AltPlaylistError::ApiError { code: 502, .. }
        ));
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(AltPlaylistError::Cancelled.is_cancelled());
        assert!(!AltPlaylistError::NothingToExtend.is_cancelled());
    }
}
