//! Roster extraction pipeline.
//!
//! This crate turns one oversized roster image into per-individual face
//! crops plus nearby printed metadata:
//! - Band chunking with overlap, so small faces in tall images survive
//!   the recognition service's input downscaling
//! - Concurrent per-band dispatch to the extraction capability
//! - Band-local to global coordinate remapping
//! - Cross-band duplicate collapse into canonical person records
//! - Padded crop rasterization

pub mod chunk;
pub mod crop;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod remap;

pub use chunk::{plan_bands, slice_bands, Band, BandSpec};
pub use crop::{crop_at_point, crop_face, FaceCrop, MANUAL_CROP_SIZE};
pub use error::{RosterError, RosterResult};
pub use merge::{filter_known_names, merge_detections, MERGE_DISTANCE};
pub use pipeline::{
    extract_roster, extract_roster_image, extract_roster_pages, ExtractedFace, RosterExtraction,
    MAX_PAGES_PER_BATCH,
};
pub use remap::{remap_detection, MappedDetection};
