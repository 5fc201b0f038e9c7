//! Padded face crop rasterization.
//!
//! The crop canvas is always allocated at the full padded size, even
//! when the source read-rectangle is clipped at an image edge: a face
//! near an edge yields a crop with a blank margin rather than a smaller
//! crop. The read never touches pixels outside the source image.

use image::{imageops, DynamicImage, RgbImage};

use facemem_models::{BoundingBox, NORM_SCALE};

use crate::error::RosterResult;

/// Padding applied around a detected box before cropping, per axis.
pub const CROP_PADDING_RATIO: f64 = 0.2;

/// Side length of the fixed box used by the manual point crop.
pub const MANUAL_CROP_SIZE: u32 = 200;

/// A rasterized face crop.
#[derive(Debug, Clone)]
pub struct FaceCrop {
    image: RgbImage,
}

impl FaceCrop {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Encode the crop as JPEG bytes.
    pub fn to_jpeg(&self) -> RosterResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)?;
        Ok(buf)
    }
}

/// Crop a canonical person's face from the full-resolution image.
///
/// The normalized box is scaled to pixels, expanded by
/// `CROP_PADDING_RATIO` on each axis, and rasterized onto a canvas of
/// the full padded size.
pub fn crop_face(image: &DynamicImage, bbox: &BoundingBox) -> FaceCrop {
    let width = image.width() as f64;
    let height = image.height() as f64;

    let scale = NORM_SCALE as f64;
    let x = bbox.xmin as f64 / scale * width;
    let y = bbox.ymin as f64 / scale * height;
    let w = (bbox.xmax - bbox.xmin) as f64 / scale * width;
    let h = (bbox.ymax - bbox.ymin) as f64 / scale * height;

    let pad_x = w * CROP_PADDING_RATIO;
    let pad_y = h * CROP_PADDING_RATIO;

    crop_pixel_rect(
        image,
        x - pad_x,
        y - pad_y,
        w + 2.0 * pad_x,
        h + 2.0 * pad_y,
    )
}

/// Manual fallback: crop a fixed square centered on a user-supplied
/// pixel position, bypassing detection entirely.
pub fn crop_at_point(image: &DynamicImage, cx: f64, cy: f64) -> FaceCrop {
    let half = MANUAL_CROP_SIZE as f64 / 2.0;
    crop_pixel_rect(
        image,
        cx - half,
        cy - half,
        MANUAL_CROP_SIZE as f64,
        MANUAL_CROP_SIZE as f64,
    )
}

/// Shared crop primitive over an unclipped pixel rectangle.
///
/// The canvas is the rectangle's full size; only the part of the
/// rectangle that intersects the image is read, placed at the matching
/// canvas offset. Degenerate rectangles clamp to a 1x1 canvas.
fn crop_pixel_rect(image: &DynamicImage, x: f64, y: f64, w: f64, h: f64) -> FaceCrop {
    let canvas_w = (w.round() as i64).max(1) as u32;
    let canvas_h = (h.round() as i64).max(1) as u32;
    let mut canvas = RgbImage::new(canvas_w, canvas_h);

    let ux = x.round() as i64;
    let uy = y.round() as i64;

    let src_x0 = ux.max(0);
    let src_y0 = uy.max(0);
    let src_x1 = (ux + canvas_w as i64).min(image.width() as i64);
    let src_y1 = (uy + canvas_h as i64).min(image.height() as i64);

    if src_x1 > src_x0 && src_y1 > src_y0 {
        let view = image
            .crop_imm(
                src_x0 as u32,
                src_y0 as u32,
                (src_x1 - src_x0) as u32,
                (src_y1 - src_y0) as u32,
            )
            .to_rgb8();
        imageops::replace(&mut canvas, &view, src_x0 - ux, src_y0 - uy);
    }

    FaceCrop { image: canvas }
}
