//! Smile index and its response curve.
//!
//! The index combines how wide the mouth is relative to the cheeks with how
//! sharply the lower lip drops away from the mouth line. Both are read from
//! the current frame only.

use crate::{
    constants::{DEFAULT_SMILE_GAIN, DEFAULT_SMILE_NORMALIZER, GEOMETRY_EPSILON},
    landmarks::{groups, FaceDetection, Landmark},
    Error, Result,
};
use nalgebra::Vector3;

/// Index into `lipsLowerOuter` of the lower lip centre
const LOWER_LIP_CENTRE: usize = 4;

/// Mouth and cheek points the smile index is computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmileAnchors {
    pub mouth_left: Landmark,
    pub mouth_right: Landmark,
    pub lower_lip: Landmark,
    pub left_cheek: Landmark,
    pub right_cheek: Landmark,
}

impl SmileAnchors {
    /// Pull the anchors out of a detection's annotation groups
    #[must_use]
    pub fn from_detection(detection: &FaceDetection) -> Option<Self> {
        Some(Self {
            mouth_left: detection.annotation_first(groups::LIPS_UPPER_OUTER)?,
            mouth_right: detection.annotation_last(groups::LIPS_UPPER_OUTER)?,
            lower_lip: detection.annotation_point(groups::LIPS_LOWER_OUTER, LOWER_LIP_CENTRE)?,
            left_cheek: detection.annotation_first(groups::LEFT_CHEEK)?,
            right_cheek: detection.annotation_first(groups::RIGHT_CHEEK)?,
        })
    }
}

fn screen_plane(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, 0.0)
}

/// Mouth-to-cheek span ratio plus the on-screen angle (radians) between the
/// corner-to-corner and corner-to-lower-lip vectors
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if the cheeks coincide or either
/// mouth vector vanishes on screen
pub fn smile_index(anchors: &SmileAnchors) -> Result<f32> {
    let cheek_span = (anchors.left_cheek - anchors.right_cheek).norm();
    if cheek_span < GEOMETRY_EPSILON {
        return Err(Error::DegenerateGeometry("cheek span has near-zero length".to_string()));
    }
    let mouth_span = (anchors.mouth_right - anchors.mouth_left).norm();

    let corner_to_corner = screen_plane(anchors.mouth_right - anchors.mouth_left);
    let corner_to_lip = screen_plane(anchors.lower_lip - anchors.mouth_left);
    if corner_to_corner.norm() < GEOMETRY_EPSILON || corner_to_lip.norm() < GEOMETRY_EPSILON {
        return Err(Error::DegenerateGeometry("mouth vectors have near-zero length".to_string()));
    }

    Ok(mouth_span / cheek_span + corner_to_corner.angle(&corner_to_lip))
}

/// Fourth-power response curve turning a smile index into a particle launch factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmileCurve {
    /// Index at and below which the factor is zero
    pub neutral: f32,
    pub gain: f32,
    pub normalizer: f32,
}

impl Default for SmileCurve {
    fn default() -> Self {
        Self {
            neutral: 1.0,
            gain: DEFAULT_SMILE_GAIN,
            normalizer: DEFAULT_SMILE_NORMALIZER,
        }
    }
}

impl SmileCurve {
    /// `((index - neutral).max(0) * gain)^4 / normalizer`; non-finite input yields zero
    #[must_use]
    pub fn factor(&self, smile_index: f32) -> f32 {
        if !smile_index.is_finite() {
            return 0.0;
        }
        ((smile_index - self.neutral).max(0.0) * self.gain).powi(4) / self.normalizer
    }
}
