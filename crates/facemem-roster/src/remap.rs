//! Band-local to global coordinate remapping.

use facemem_models::{BoundingBox, Detection, NORM_SCALE};

use crate::chunk::BandSpec;

/// A detection rewritten into the full image's 0-1000 space, tagged with
/// the band that produced it so the merge pass can order detections
/// deterministically regardless of call-completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedDetection {
    pub band_index: usize,
    pub detection: Detection,
}

/// Rewrite a band-local detection into the full image's coordinate space.
///
/// Vertical coordinates go band-norm -> band-pixels -> global-pixels ->
/// global-norm; horizontal coordinates pass through unchanged because
/// every band spans the image's full width. All non-box fields are
/// preserved.
pub fn remap_detection(
    detection: Detection,
    band_index: usize,
    band: BandSpec,
    image_height: u32,
) -> MappedDetection {
    let ymin = remap_y(detection.bbox.ymin, band, image_height);
    let mut ymax = remap_y(detection.bbox.ymax, band, image_height);
    // Rounding can collapse a 1-2 unit extent when the band is much
    // shorter than the image; keep the ymin < ymax invariant.
    if ymax <= ymin {
        ymax = ymin + 1;
    }

    let bbox = BoundingBox {
        ymin,
        xmin: detection.bbox.xmin,
        ymax,
        xmax: detection.bbox.xmax,
    };

    MappedDetection {
        band_index,
        detection: Detection { bbox, ..detection },
    }
}

fn remap_y(band_norm_y: i64, band: BandSpec, image_height: u32) -> i64 {
    let band_pixel_y = band_norm_y as f64 / NORM_SCALE as f64 * band.height as f64;
    let global_pixel_y = band_pixel_y + band.offset as f64;
    (global_pixel_y / image_height as f64 * NORM_SCALE as f64).round() as i64
}
