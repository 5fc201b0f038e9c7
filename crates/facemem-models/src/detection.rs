//! Raw and validated face detections.
//!
//! `ExtractedPerson` is the lenient wire type for one element of the
//! recognition service's response array. `Detection` is what the rest of
//! the pipeline works with: a validated bounding box plus whatever text
//! was printed near the face. The conversion between the two is the
//! single malformed-response filtering boundary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::gender::Gender;

/// One raw element of the recognition response, exactly as received.
///
/// `box_2d` is the only mandatory field, and even it is modeled as
/// optional here so a malformed element can be inspected and dropped
/// instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedPerson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job_group: Option<String>,
    #[serde(default)]
    pub career: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// `[ymin, xmin, ymax, xmax]` in 0-1000 normalized coordinates.
    #[serde(default)]
    pub box_2d: Option<Vec<f64>>,
}

impl ExtractedPerson {
    /// Lenient parse of a response array: elements that are not objects
    /// or have fields of the wrong shape are dropped, not propagated as
    /// errors. Returns the parsed elements and the dropped count.
    pub fn parse_array(value: serde_json::Value) -> (Vec<ExtractedPerson>, usize) {
        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => return (Vec::new(), 1),
        };

        let total = items.len();
        let parsed: Vec<ExtractedPerson> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        let dropped = total - parsed.len();
        (parsed, dropped)
    }

    /// Validate this element into a `Detection`.
    ///
    /// Returns `None` when `box_2d` is missing, not length 4, contains a
    /// non-finite value, or describes an inverted/empty extent.
    pub fn validate(self) -> Option<Detection> {
        let raw = self.box_2d?;
        let coords: &[f64; 4] = raw.as_slice().try_into().ok()?;
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let bbox = BoundingBox::new(
            coords[0].round() as i64,
            coords[1].round() as i64,
            coords[2].round() as i64,
            coords[3].round() as i64,
        )
        .ok()?;

        Some(Detection {
            name: self.name.unwrap_or_default(),
            job_group: self.job_group.unwrap_or_default(),
            career: self.career.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            gender: self.gender.as_deref().map(Gender::from_wire).unwrap_or_default(),
            bbox,
        })
    }
}

/// A validated face detection.
///
/// The box is band-local until the coordinate mapper rewrites it into
/// the full image's space; the text fields are empty strings when the
/// service found no printed text near the face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    pub name: String,
    pub job_group: String,
    pub career: String,
    pub notes: String,
    pub gender: Gender,
    pub bbox: BoundingBox,
}
