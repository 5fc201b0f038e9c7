//! Canonical person records produced by the deduplicator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bbox::BoundingBox;
use crate::detection::Detection;
use crate::gender::Gender;

/// One resolved individual: the merge target for every detection of the
/// same face across overlapping bands.
///
/// The box and gender permanently keep the values of the first detection
/// that formed the record; later duplicates only back-fill empty text
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalPerson {
    pub id: Uuid,
    pub name: String,
    pub job_group: String,
    pub career: String,
    pub notes: String,
    pub gender: Gender,
    /// Box in the full image's 0-1000 space, from the first forming
    /// detection. Never recomputed on merge.
    pub bbox: BoundingBox,
}

impl CanonicalPerson {
    /// Create a new person from the first detection of an individual.
    pub fn from_detection(detection: Detection) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: detection.name,
            job_group: detection.job_group,
            career: detection.career,
            notes: detection.notes,
            gender: detection.gender,
            bbox: detection.bbox,
        }
    }

    /// Absorb a duplicate detection of this person.
    ///
    /// First-writer-wins: only empty text fields are filled; box and
    /// gender are untouched.
    pub fn absorb(&mut self, duplicate: &Detection) {
        fill_if_empty(&mut self.name, &duplicate.name);
        fill_if_empty(&mut self.job_group, &duplicate.job_group);
        fill_if_empty(&mut self.career, &duplicate.career);
        fill_if_empty(&mut self.notes, &duplicate.notes);
    }
}

fn fill_if_empty(target: &mut String, incoming: &str) {
    if target.is_empty() && !incoming.is_empty() {
        *target = incoming.to_string();
    }
}
