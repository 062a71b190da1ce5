//! Shared error types for the crate

use crate::core::Platform;
use thiserror::Error;

/// Main error type for chatmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// The export blob does not match the platform's known schema
    #[error("{platform} export format error: {message}")]
    Format { platform: Platform, message: String },

    /// The export could not be matched to any supported platform
    #[error("Unrecognized export format: {0}")]
    UnknownFormat(String),

    /// Structural validation errors on a decoded conversation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a format error with a platform hint
    pub fn format(platform: Platform, message: impl Into<String>) -> Self {
        Self::Format {
            platform,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_carries_platform_hint() {
        let err = Error::format(Platform::Telegram, "missing messages array");
        assert_eq!(
            err.to_string(),
            "Telegram export format error: missing messages array"
        );
    }
}
