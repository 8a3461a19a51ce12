//! Per-face landmark data as delivered by the detector.
//!
//! A detection carries the raw landmark array (fixed anatomical index per
//! entry) and a set of named annotation groups, each a list of points taken
//! from that array. Detectors that only return raw landmarks can have their
//! groups filled in from [`ANNOTATION_INDICES`] with [`annotate`].

use crate::{constants::NUM_LANDMARKS, Error, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One detected facial point: pixel-space `x`, `y` and relative depth `z`
pub type Landmark = Point3<f32>;

/// Annotation group names
pub mod groups {
    pub const SILHOUETTE: &str = "silhouette";
    pub const LIPS_UPPER_OUTER: &str = "lipsUpperOuter";
    pub const LIPS_LOWER_OUTER: &str = "lipsLowerOuter";
    pub const LIPS_UPPER_INNER: &str = "lipsUpperInner";
    pub const LIPS_LOWER_INNER: &str = "lipsLowerInner";
    pub const RIGHT_EYE_UPPER: &str = "rightEyeUpper0";
    pub const RIGHT_EYE_LOWER: &str = "rightEyeLower0";
    pub const LEFT_EYE_UPPER: &str = "leftEyeUpper0";
    pub const LEFT_EYE_LOWER: &str = "leftEyeLower0";
    pub const MIDWAY_BETWEEN_EYES: &str = "midwayBetweenEyes";
    pub const NOSE_TIP: &str = "noseTip";
    pub const NOSE_BOTTOM: &str = "noseBottom";
    pub const NOSE_RIGHT_CORNER: &str = "noseRightCorner";
    pub const NOSE_LEFT_CORNER: &str = "noseLeftCorner";
    pub const RIGHT_CHEEK: &str = "rightCheek";
    pub const LEFT_CHEEK: &str = "leftCheek";
}

/// Landmark indices making up each annotation group
pub const ANNOTATION_INDICES: &[(&str, &[usize])] = &[
    (
        groups::SILHOUETTE,
        &[
            10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377,
            152, 148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
        ],
    ),
    (groups::LIPS_UPPER_OUTER, &[61, 185, 40, 39, 37, 0, 267, 269, 270, 409, 291]),
    (groups::LIPS_LOWER_OUTER, &[146, 91, 181, 84, 17, 314, 405, 321, 375, 291]),
    (groups::LIPS_UPPER_INNER, &[78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308]),
    (groups::LIPS_LOWER_INNER, &[78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308]),
    (groups::RIGHT_EYE_UPPER, &[246, 161, 160, 159, 158, 157, 173]),
    (groups::RIGHT_EYE_LOWER, &[33, 7, 163, 144, 145, 153, 154, 155, 133]),
    (groups::LEFT_EYE_UPPER, &[466, 388, 387, 386, 385, 384, 398]),
    (groups::LEFT_EYE_LOWER, &[263, 249, 390, 373, 374, 380, 381, 382, 362]),
    (groups::MIDWAY_BETWEEN_EYES, &[168]),
    (groups::NOSE_TIP, &[1]),
    (groups::NOSE_BOTTOM, &[2]),
    (groups::NOSE_RIGHT_CORNER, &[98]),
    (groups::NOSE_LEFT_CORNER, &[327]),
    (groups::RIGHT_CHEEK, &[205]),
    (groups::LEFT_CHEEK, &[425]),
];

/// Named annotation groups for one face
pub type Annotations = BTreeMap<String, Vec<Landmark>>;

/// One face returned by the detector for a frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Raw landmark array, indexed by anatomical point
    pub landmarks: Vec<Landmark>,

    /// Named anatomical groups
    #[serde(default)]
    pub annotations: Annotations,
}

impl FaceDetection {
    /// Build a detection from raw landmarks, deriving its annotation groups
    ///
    /// # Errors
    ///
    /// Returns an error if the array does not hold exactly 468 landmarks
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Result<Self> {
        let annotations = annotate(&landmarks)?;
        Ok(Self { landmarks, annotations })
    }

    /// Fill in annotation groups from the raw landmarks when the detector sent none
    ///
    /// # Errors
    ///
    /// Returns an error if the groups are missing and the landmark array is malformed
    pub fn ensure_annotations(&mut self) -> Result<()> {
        if self.annotations.is_empty() {
            self.annotations = annotate(&self.landmarks)?;
        }
        Ok(())
    }

    /// Look up a single point of an annotation group
    #[must_use]
    pub fn annotation_point(&self, group: &str, index: usize) -> Option<Landmark> {
        self.annotations.get(group)?.get(index).copied()
    }

    /// First point of an annotation group
    #[must_use]
    pub fn annotation_first(&self, group: &str) -> Option<Landmark> {
        self.annotations.get(group)?.first().copied()
    }

    /// Last point of an annotation group
    #[must_use]
    pub fn annotation_last(&self, group: &str) -> Option<Landmark> {
        self.annotations.get(group)?.last().copied()
    }
}

/// Derive every annotation group from a raw landmark array
///
/// # Errors
///
/// Returns an error if the array does not hold exactly 468 landmarks
pub fn annotate(landmarks: &[Landmark]) -> Result<Annotations> {
    if landmarks.len() != NUM_LANDMARKS {
        return Err(Error::InvalidInput(format!(
            "Expected {} landmarks, got {}",
            NUM_LANDMARKS,
            landmarks.len()
        )));
    }

    Ok(ANNOTATION_INDICES
        .iter()
        .map(|&(name, indices)| {
            let points = indices.iter().map(|&i| landmarks[i]).collect();
            (name.to_string(), points)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed_landmarks() -> Vec<Landmark> {
        (0..NUM_LANDMARKS).map(|i| Point3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_annotation_indices_in_range() {
        for (name, indices) in ANNOTATION_INDICES {
            assert!(!indices.is_empty(), "{name} is empty");
            assert!(indices.iter().all(|&i| i < NUM_LANDMARKS), "{name} out of range");
        }
    }

    #[test]
    fn test_annotate_picks_indexed_points() {
        let detection = FaceDetection::from_landmarks(indexed_landmarks()).unwrap();

        assert_eq!(detection.annotation_first(groups::MIDWAY_BETWEEN_EYES).unwrap().x, 168.0);
        assert_eq!(detection.annotation_first(groups::LEFT_CHEEK).unwrap().x, 425.0);
        assert_eq!(detection.annotation_first(groups::LIPS_UPPER_OUTER).unwrap().x, 61.0);
        assert_eq!(detection.annotation_last(groups::LIPS_UPPER_OUTER).unwrap().x, 291.0);
        assert_eq!(detection.annotation_point(groups::LIPS_LOWER_OUTER, 4).unwrap().x, 17.0);
        assert!(detection.annotation_point("noSuchGroup", 0).is_none());
    }

    #[test]
    fn test_annotate_rejects_wrong_length() {
        assert!(annotate(&[Point3::origin(); 10]).is_err());
        assert!(FaceDetection::from_landmarks(Vec::new()).is_err());
    }

    #[test]
    fn test_ensure_annotations_keeps_supplied_groups() {
        let mut detection = FaceDetection {
            landmarks: indexed_landmarks(),
            annotations: Annotations::new(),
        };
        detection.ensure_annotations().unwrap();
        assert_eq!(detection.annotations.len(), ANNOTATION_INDICES.len());

        let mut supplied = FaceDetection::default();
        supplied
            .annotations
            .insert(groups::LEFT_CHEEK.to_string(), vec![Point3::new(1.0, 2.0, 3.0)]);
        supplied.ensure_annotations().unwrap();
        assert_eq!(supplied.annotations.len(), 1);
    }
}
