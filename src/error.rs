//! Custom error types for errshot.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the errshot library.
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes could not be parsed as an image.
    #[error("failed to decode image from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    /// Failed to read an image file from disk.
    #[error("failed to read image from {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode an in-memory image.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Base64 image payload is malformed.
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Shape mismatch between a tensor and the endpoint it is sent to.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// HTTP transport or response decoding failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// WebSocket transport failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The chat peer closed the connection before answering.
    #[error("chat connection closed by peer")]
    ConnectionClosed,

    /// JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration text is not valid TOML for the client configuration.
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be used.
    #[error("failed to load configuration from {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the input was not a decodable image.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Result type alias for errshot operations.
pub type Result<T> = std::result::Result<T, Error>;
