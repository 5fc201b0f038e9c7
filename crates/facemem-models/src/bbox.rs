//! Bounding boxes in the 0-1000 normalized coordinate space.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of the normalized coordinate space used by the
/// recognition capability.
pub const NORM_SCALE: i64 = 1000;

/// Error building a bounding box from raw coordinates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundingBoxError {
    #[error("box has inverted or empty vertical extent: ymin={ymin}, ymax={ymax}")]
    InvertedVertical { ymin: i64, ymax: i64 },

    #[error("box has inverted or empty horizontal extent: xmin={xmin}, xmax={xmax}")]
    InvertedHorizontal { xmin: i64, xmax: i64 },
}

/// A face bounding box, `[ymin, xmin, ymax, xmax]` in 0-1000 normalized
/// coordinates. Serializes as the bare 4-array, matching the `box_2d`
/// wire format.
///
/// Invariant: `ymin < ymax` and `xmin < xmax`. Boxes violating this are
/// rejected at construction and never enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "[i64; 4]", into = "[i64; 4]")]
pub struct BoundingBox {
    pub ymin: i64,
    pub xmin: i64,
    pub ymax: i64,
    pub xmax: i64,
}

impl BoundingBox {
    /// Build a box from `[ymin, xmin, ymax, xmax]`, validating extents.
    pub fn new(ymin: i64, xmin: i64, ymax: i64, xmax: i64) -> Result<Self, BoundingBoxError> {
        if ymin >= ymax {
            return Err(BoundingBoxError::InvertedVertical { ymin, ymax });
        }
        if xmin >= xmax {
            return Err(BoundingBoxError::InvertedHorizontal { xmin, xmax });
        }
        Ok(Self {
            ymin,
            xmin,
            ymax,
            xmax,
        })
    }

    /// Box centroid `(cy, cx)` in the shared 0-1000 space.
    pub fn centroid(&self) -> (f64, f64) {
        (
            (self.ymin + self.ymax) as f64 / 2.0,
            (self.xmin + self.xmax) as f64 / 2.0,
        )
    }

    /// Euclidean distance between this box's centroid and another's.
    pub fn centroid_distance(&self, other: &BoundingBox) -> f64 {
        let (cy, cx) = self.centroid();
        let (oy, ox) = other.centroid();
        ((cy - oy).powi(2) + (cx - ox).powi(2)).sqrt()
    }
}

impl TryFrom<[i64; 4]> for BoundingBox {
    type Error = BoundingBoxError;

    fn try_from(v: [i64; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [i64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.ymin, b.xmin, b.ymax, b.xmax]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let b = BoundingBox::new(100, 200, 300, 400).unwrap();
        assert_eq!(b.ymin, 100);
        assert_eq!(b.xmax, 400);
    }

    #[test]
    fn test_new_rejects_inverted_vertical() {
        assert_eq!(
            BoundingBox::new(300, 200, 100, 400),
            Err(BoundingBoxError::InvertedVertical {
                ymin: 300,
                ymax: 100
            })
        );
    }

    #[test]
    fn test_new_rejects_zero_extent() {
        assert!(BoundingBox::new(100, 200, 100, 400).is_err());
        assert!(BoundingBox::new(100, 200, 300, 200).is_err());
    }

    #[test]
    fn test_centroid() {
        let b = BoundingBox::new(400, 300, 600, 700).unwrap();
        assert_eq!(b.centroid(), (500.0, 500.0));
    }

    #[test]
    fn test_centroid_distance() {
        let a = BoundingBox::new(490, 490, 510, 510).unwrap();
        let b = BoundingBox::new(500, 495, 520, 515).unwrap();
        // centroids (500,500) and (510,505): sqrt(100 + 25)
        assert!((a.centroid_distance(&b) - 125.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_serde_array_form() {
        let b = BoundingBox::new(10, 20, 30, 40).unwrap();
        assert_eq!(serde_json::to_string(&b).unwrap(), "[10,20,30,40]");
        let back: BoundingBox = serde_json::from_str("[10,20,30,40]").unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_serde_rejects_inverted() {
        let r: Result<BoundingBox, _> = serde_json::from_str("[30,20,10,40]");
        assert!(r.is_err());
    }
}
