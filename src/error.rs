//! Error types for the reposter application.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Feed errors
    #[error("Feed temporarily unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {0}")]
    Api(String),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    // Messaging errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether the error is a temporary feed condition that the next cycle may clear.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::FeedUnavailable(_) | Error::RateLimited(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_ERROR: i32 = 3;
    pub const STORAGE_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::FeedUnavailable("503".into()).is_transient());
        assert!(Error::RateLimited(60).is_transient());
        assert!(!Error::Api("not found".into()).is_transient());
        assert!(!Error::Storage(StoreError::Unavailable("down".into())).is_transient());
    }
}
