//! Duplicate collapse for detections from overlapping bands.
//!
//! Two filters run here, in order:
//! 1. An identity filter: detections whose extracted name exactly
//!    matches an already-known individual are dropped outright.
//! 2. A geometric merge: detections whose box centroids sit within
//!    `MERGE_DISTANCE` of an existing canonical record are folded into
//!    it, back-filling empty text fields only.
//!
//! The merge is a single sequential pass over an accumulator list, run
//! after all concurrent band results are collected, so its outcome never
//! depends on network timing.

use std::collections::HashSet;

use tracing::debug;

use facemem_models::CanonicalPerson;

use crate::remap::MappedDetection;

/// Maximum centroid distance (in the shared 0-1000 space) at which two
/// detections are considered the same individual. Roughly 2% of the
/// image height.
pub const MERGE_DISTANCE: f64 = 20.0;

/// Drop detections whose non-empty name exactly matches a known
/// individual (case-sensitive). Returns survivors and the dropped count.
///
/// This is an identity-level filter, independent of geometry: it stops a
/// person who is already in the caller's database from being re-added,
/// no matter where on the page they appear.
pub fn filter_known_names(
    detections: Vec<MappedDetection>,
    known_names: &HashSet<String>,
) -> (Vec<MappedDetection>, usize) {
    let total = detections.len();
    let kept: Vec<MappedDetection> = detections
        .into_iter()
        .filter(|d| d.detection.name.is_empty() || !known_names.contains(&d.detection.name))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// Collapse duplicate detections into canonical person records.
///
/// Detections are processed in originating-band order (stable sort, so
/// same-band detections keep the service's ordering). The first
/// detection of an individual creates the record and permanently fixes
/// its box and gender; later duplicates only fill empty text fields.
pub fn merge_detections(mut detections: Vec<MappedDetection>) -> Vec<CanonicalPerson> {
    detections.sort_by_key(|d| d.band_index);

    let mut people: Vec<CanonicalPerson> = Vec::new();
    for mapped in detections {
        let duplicate_of = people
            .iter_mut()
            .find(|p| p.bbox.centroid_distance(&mapped.detection.bbox) < MERGE_DISTANCE);
        match duplicate_of {
            Some(person) => {
                debug!(
                    "Merging duplicate detection from band {} into person {}",
                    mapped.band_index, person.id
                );
                person.absorb(&mapped.detection);
            }
            None => people.push(CanonicalPerson::from_detection(mapped.detection)),
        }
    }
    people
}

#[cfg(test)]
mod tests {
    use super::*;
    use facemem_models::{BoundingBox, Detection, Gender};

    fn mapped(band_index: usize, name: &str, notes: &str, bbox: BoundingBox) -> MappedDetection {
        MappedDetection {
            band_index,
            detection: Detection {
                name: name.to_string(),
                job_group: String::new(),
                career: String::new(),
                notes: notes.to_string(),
                gender: Gender::Unknown,
                bbox,
            },
        }
    }

    // Box with centroid (cy, cx) and a 20x20 extent.
    fn box_at(cy: i64, cx: i64) -> BoundingBox {
        BoundingBox::new(cy - 10, cx - 10, cy + 10, cx + 10).unwrap()
    }

    #[test]
    fn test_close_centroids_merge() {
        // Centroids (500,500) and (510,505): distance ~11.2 < 20.
        let people = merge_detections(vec![
            mapped(0, "Kim", "", box_at(500, 500)),
            mapped(1, "", "Eng", box_at(510, 505)),
        ]);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Kim");
        assert_eq!(people[0].notes, "Eng");
    }

    #[test]
    fn test_distant_centroids_stay_separate() {
        // Centroids (500,500) and (540,500): distance 40 >= 20.
        let people = merge_detections(vec![
            mapped(0, "Kim", "", box_at(500, 500)),
            mapped(1, "Lee", "", box_at(540, 500)),
        ]);
        assert_eq!(people.len(), 2);
    }

    #[test]
    fn test_merge_never_overwrites_fields() {
        let people = merge_detections(vec![
            mapped(0, "Kim", "", box_at(500, 500)),
            mapped(1, "Lee", "Eng", box_at(505, 500)),
        ]);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Kim");
        assert_eq!(people[0].notes, "Eng");
    }

    #[test]
    fn test_merge_keeps_first_box() {
        let first = box_at(500, 500);
        let people = merge_detections(vec![
            mapped(0, "Kim", "", first),
            mapped(1, "", "", box_at(510, 505)),
        ]);
        assert_eq!(people[0].bbox, first);
    }

    #[test]
    fn test_merge_order_is_band_order_not_input_order() {
        // Band 1's detection arrives first (completion order), but band
        // 0's must form the canonical record.
        let people = merge_detections(vec![
            mapped(1, "Lee", "", box_at(505, 500)),
            mapped(0, "Kim", "", box_at(500, 500)),
        ]);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name, "Kim");
    }

    #[test]
    fn test_chained_duplicates_all_merge_into_first() {
        // Each neighbor is within 20 of the record's fixed centroid.
        let people = merge_detections(vec![
            mapped(0, "Kim", "", box_at(500, 500)),
            mapped(1, "", "a", box_at(512, 500)),
            mapped(2, "", "b", box_at(515, 505)),
        ]);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].notes, "a");
    }

    #[test]
    fn test_filter_known_names_drops_matches() {
        let known: HashSet<String> = ["Kim".to_string()].into_iter().collect();
        let (kept, dropped) = filter_known_names(
            vec![
                mapped(0, "Kim", "", box_at(100, 100)),
                mapped(0, "Lee", "", box_at(300, 100)),
            ],
            &known,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(kept[0].detection.name, "Lee");
    }

    #[test]
    fn test_filter_known_names_is_case_sensitive() {
        let known: HashSet<String> = ["kim".to_string()].into_iter().collect();
        let (kept, dropped) =
            filter_known_names(vec![mapped(0, "Kim", "", box_at(100, 100))], &known);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_filter_known_names_keeps_unnamed() {
        let known: HashSet<String> = ["".to_string()].into_iter().collect();
        let (kept, dropped) =
            filter_known_names(vec![mapped(0, "", "", box_at(100, 100))], &known);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_detections(Vec::new()).is_empty());
    }
}
