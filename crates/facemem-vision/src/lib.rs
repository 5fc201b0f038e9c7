//! Gemini vision client for roster face/text extraction.
//!
//! This crate owns the boundary to the recognition capability: an async
//! `FaceExtractor` trait consumed by the pipeline, plus the Gemini HTTP
//! implementation of it. The service itself is a black box; all this
//! crate knows is "one band image in, zero or more raw detections out".

pub mod config;
pub mod error;
pub mod extractor;
pub mod gemini;

pub use config::GeminiConfig;
pub use error::{VisionError, VisionResult};
pub use extractor::FaceExtractor;
pub use gemini::GeminiVision;
