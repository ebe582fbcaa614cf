//! Error types for the relief map engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid bounding rectangle: {0}")]
    InvalidBounds(String),

    #[error("Invalid color ramp: {0}")]
    InvalidRamp(String),

    #[error("Invalid elevation zone '{name}': {reason}")]
    InvalidZone { name: String, reason: String },

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Output surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Renderer has been destroyed")]
    Destroyed,

    #[error("Nothing has been rendered yet")]
    NotRendered,

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
