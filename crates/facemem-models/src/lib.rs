//! Shared data models for the FaceMem backend.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes in the 0-1000 normalized coordinate space
//! - Raw and validated face detections
//! - Canonical (deduplicated) person records
//! - Gender classification

pub mod bbox;
pub mod detection;
pub mod gender;
pub mod person;

// Re-export common types
pub use bbox::{BoundingBox, BoundingBoxError, NORM_SCALE};
pub use detection::{Detection, ExtractedPerson};
pub use gender::Gender;
pub use person::CanonicalPerson;
