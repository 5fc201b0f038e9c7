//! Core trait for the face/text extraction capability.

use async_trait::async_trait;

use facemem_models::ExtractedPerson;

use crate::error::VisionResult;

/// The external recognition capability, consumed one band at a time.
///
/// Implementations receive one band's JPEG bytes and return raw
/// detections in that band's own 0-1000 normalized coordinate space.
/// An empty list is a normal outcome, not an error.
#[async_trait]
pub trait FaceExtractor: Send + Sync {
    /// Detect faces and nearby printed text in one band image.
    async fn extract(&self, image_jpeg: &[u8]) -> VisionResult<Vec<ExtractedPerson>>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}
