//! Band chunking for oversized roster images.
//!
//! Tall images are sliced into overlapping horizontal bands so each band
//! stays within the size range where the recognition service still sees
//! small faces at usable detail. The overlap guarantees that a face cut
//! by one band boundary is whole in a neighbor; the duplicate detections
//! that creates are collapsed later by the merge pass.

use image::DynamicImage;

/// Images at or below this height are sent in one piece.
pub const SINGLE_PASS_MAX_HEIGHT: u32 = 2000;

/// Height of each band cut from an oversized image.
pub const BAND_HEIGHT: u32 = 1500;

/// Vertical overlap between consecutive bands.
pub const BAND_OVERLAP: u32 = 500;

/// A remaining tail shorter than this factor of `BAND_HEIGHT` is
/// absorbed into the final band instead of becoming a sliver band.
const TAIL_ABSORB_FACTOR: f64 = 1.2;

/// Placement of one band within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSpec {
    /// Pixels from the top of the source image.
    pub offset: u32,
    /// Band height in pixels.
    pub height: u32,
}

/// One horizontal slice of the source image, independently processable.
#[derive(Debug, Clone)]
pub struct Band {
    pub spec: BandSpec,
    pub image: DynamicImage,
}

/// Plan the band layout for an image of the given height.
///
/// Contract: the union of `[offset, offset + height)` covers the whole
/// image, and consecutive bands overlap by exactly `BAND_OVERLAP` pixels
/// except for the final pair, which may overlap by more when the tail is
/// absorbed.
pub fn plan_bands(height: u32) -> Vec<BandSpec> {
    if height <= SINGLE_PASS_MAX_HEIGHT {
        return vec![BandSpec { offset: 0, height }];
    }

    let mut bands = Vec::new();
    let mut y = 0u32;
    while y < height {
        let remaining = height - y;
        let band_height = if (remaining as f64) < BAND_HEIGHT as f64 * TAIL_ABSORB_FACTOR {
            remaining
        } else {
            BAND_HEIGHT
        };
        bands.push(BandSpec {
            offset: y,
            height: band_height,
        });
        if y + band_height >= height {
            break;
        }
        y += band_height - BAND_OVERLAP;
    }
    bands
}

/// Slice the source image into its planned bands.
///
/// Every band spans the image's full width, so horizontal coordinates
/// never need remapping.
pub fn slice_bands(image: &DynamicImage) -> Vec<Band> {
    let width = image.width();
    plan_bands(image.height())
        .into_iter()
        .map(|spec| Band {
            spec,
            image: image.crop_imm(0, spec.offset, width, spec.height),
        })
        .collect()
}
