//! Error types for Plex playlist export.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for all export operations.
#[derive(Debug, Error)]
pub enum PlexportError {
    /// Configuration file does not exist at the resolved path.
    #[error("Configuration file '{}' not found", .0.display())]
    ConfigNotFound(PathBuf),

    /// A required configuration key is absent.
    #[error("Missing required configuration key: {0}")]
    ConfigKeyMissing(String),

    /// A configuration key is present but has the wrong type.
    #[error("Invalid configuration key {key}: expected {expected}")]
    ConfigInvalid {
        key: String,
        expected: &'static str,
    },

    /// Configuration file is not valid TOML.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Both the account and the direct connection strategies failed.
    #[error("Could not connect to Plex server (account: {account}; direct: {direct})")]
    ConnectionFailed { account: String, direct: String },

    /// Invalid or expired token.
    #[error("Bad credentials: {0}")]
    BadCredentials(String),

    /// No server resource on the account matches the configured address.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Playlist was not found.
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    /// Track carries no media part to download.
    #[error("No media part for track: {0}")]
    MissingMedia(String),

    /// Download request returned a non-success status.
    #[error("Download failed with status {status}: {url}")]
    DownloadFailed {
        status: reqwest::StatusCode,
        url: String,
    },

    /// URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic API error with message.
    #[error("API error: {0}")]
    ApiError(String),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, PlexportError>;
