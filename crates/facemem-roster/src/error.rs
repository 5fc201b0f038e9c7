//! Error types for the roster pipeline.

use thiserror::Error;

/// Result type for roster pipeline operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Errors that can occur while running the roster pipeline.
///
/// Per-band extraction failures are not represented here: they degrade
/// to zero detections for that band and never fail the batch.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to decode source image: {0}")]
    ImageDecode(String),

    #[error("Image operation failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vision error: {0}")]
    Vision(#[from] facemem_vision::VisionError),
}
