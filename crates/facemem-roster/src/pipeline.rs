//! End-to-end roster extraction.
//!
//! One-shot batch: decode, slice into bands, dispatch every band to the
//! extraction capability concurrently, then run the sequential
//! validate/remap/merge/crop passes over the collected results. A band
//! whose extraction call fails degrades to zero detections; only an
//! undecodable source image fails the whole operation.

use std::collections::HashSet;

use futures::future::join_all;
use image::DynamicImage;
use tracing::{debug, info, warn};

use facemem_models::CanonicalPerson;
use facemem_vision::FaceExtractor;

use crate::chunk::slice_bands;
use crate::crop::{crop_face, FaceCrop};
use crate::error::{RosterError, RosterResult};
use crate::merge::{filter_known_names, merge_detections};
use crate::remap::{remap_detection, MappedDetection};

/// Maximum number of pages processed in one multi-page batch.
pub const MAX_PAGES_PER_BATCH: usize = 5;

/// One extracted individual: the canonical record plus its face crop.
#[derive(Debug, Clone)]
pub struct ExtractedFace {
    pub person: CanonicalPerson,
    pub crop: FaceCrop,
}

/// Outcome of one extraction batch.
#[derive(Debug, Clone, Default)]
pub struct RosterExtraction {
    pub faces: Vec<ExtractedFace>,
    /// Detections dropped because their name matched a known individual.
    pub skipped_known: usize,
    /// Response elements dropped at the ingestion boundary.
    pub dropped_malformed: usize,
}

/// Extract every individual from one roster image.
///
/// `known_names` are individuals already in the caller's database; any
/// detection carrying one of those names (exactly, case-sensitive) is
/// skipped instead of producing a duplicate record.
pub async fn extract_roster(
    extractor: &dyn FaceExtractor,
    image_bytes: &[u8],
    known_names: &HashSet<String>,
) -> RosterResult<RosterExtraction> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| RosterError::ImageDecode(e.to_string()))?;
    extract_roster_image(extractor, &image, known_names).await
}

/// Extract every individual from an already-decoded roster image.
pub async fn extract_roster_image(
    extractor: &dyn FaceExtractor,
    image: &DynamicImage,
    known_names: &HashSet<String>,
) -> RosterResult<RosterExtraction> {
    let height = image.height();
    let bands = slice_bands(image);
    info!(
        "Processing {}x{} image as {} band(s) via {}",
        image.width(),
        height,
        bands.len(),
        extractor.name()
    );

    // Encode every band up front; an encode failure is as fatal as a
    // decode failure.
    let mut payloads = Vec::with_capacity(bands.len());
    for band in &bands {
        payloads.push(encode_jpeg(&band.image)?);
    }

    // Concurrent dispatch. join_all yields results in input (band)
    // order, so the merge below is deterministic regardless of which
    // call completes first.
    let calls = payloads.iter().map(|jpeg| extractor.extract(jpeg));
    let results = join_all(calls).await;

    let mut detections: Vec<MappedDetection> = Vec::new();
    let mut dropped_malformed = 0usize;
    for (band_index, (band, result)) in bands.iter().zip(results).enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Band {} extraction failed, degrading to empty: {}", band_index, e);
                Vec::new()
            }
        };
        let total = raw.len();
        let valid: Vec<MappedDetection> = raw
            .into_iter()
            .filter_map(|p| p.validate())
            .map(|d| remap_detection(d, band_index, band.spec, height))
            .collect();
        dropped_malformed += total - valid.len();
        debug!("Band {}: {} valid detection(s)", band_index, valid.len());
        detections.extend(valid);
    }

    let (detections, skipped_known) = filter_known_names(detections, known_names);
    let people = merge_detections(detections);

    let faces = people
        .into_iter()
        .map(|person| {
            let crop = crop_face(image, &person.bbox);
            ExtractedFace { person, crop }
        })
        .collect::<Vec<_>>();

    info!(
        "Extracted {} individual(s) ({} known skipped, {} malformed dropped)",
        faces.len(),
        skipped_known,
        dropped_malformed
    );

    Ok(RosterExtraction {
        faces,
        skipped_known,
        dropped_malformed,
    })
}

/// Extract individuals from a multi-page batch (e.g. a rasterized PDF).
///
/// At most `MAX_PAGES_PER_BATCH` pages are processed. Names extracted on
/// earlier pages join the known set, so the same person printed on two
/// pages is only added once.
pub async fn extract_roster_pages(
    extractor: &dyn FaceExtractor,
    pages: &[Vec<u8>],
    known_names: &HashSet<String>,
) -> RosterResult<RosterExtraction> {
    if pages.len() > MAX_PAGES_PER_BATCH {
        warn!(
            "Batch has {} pages; only the first {} will be processed",
            pages.len(),
            MAX_PAGES_PER_BATCH
        );
    }

    let mut known = known_names.clone();
    let mut combined = RosterExtraction::default();

    for (page_index, page) in pages.iter().take(MAX_PAGES_PER_BATCH).enumerate() {
        debug!("Processing page {}", page_index);
        let page_result = extract_roster(extractor, page, &known).await?;

        for face in &page_result.faces {
            if !face.person.name.is_empty() {
                known.insert(face.person.name.clone());
            }
        }
        combined.faces.extend(page_result.faces);
        combined.skipped_known += page_result.skipped_known;
        combined.dropped_malformed += page_result.dropped_malformed;
    }

    Ok(combined)
}

fn encode_jpeg(image: &DynamicImage) -> RosterResult<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .to_rgb8()
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)?;
    Ok(buf)
}
