//! Error types for Showreel Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Stream errors
    #[error("No playback path for source: {source_url}")]
    StreamUnsupported { source_url: String },

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    // Playback errors
    #[error("Invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Player has no interactive controls")]
    NotInteractive,

    #[error("Play request rejected: {0}")]
    PlayRejected(String),

    #[error("Fullscreen request denied: {0}")]
    FullscreenDenied(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if playback can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PlayRejected(_) | Error::FullscreenDenied(_) | Error::NotInteractive
        )
    }

    /// Returns the error code used in log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::StreamUnsupported { .. } => "STREAM_UNSUPPORTED",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::NotInteractive => "NOT_INTERACTIVE",
            Error::PlayRejected(_) => "PLAY_REJECTED",
            Error::FullscreenDenied(_) => "FULLSCREEN_DENIED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
