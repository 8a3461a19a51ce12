//! Orthonormal face frame from cheek and between-eyes anchors.
//!
//! The frame orients auxiliary effects only; mesh vertices stay in direct
//! landmark coordinates.

use crate::{
    constants::GEOMETRY_EPSILON,
    landmarks::{groups, FaceDetection, Landmark},
    mapper::video_to_scene,
    Error, Result,
};
use nalgebra::{Matrix3, Unit, Vector3};

/// Anchor points the basis is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisAnchors {
    pub left_cheek: Landmark,
    pub right_cheek: Landmark,
    pub between_eyes: Landmark,
}

impl BasisAnchors {
    /// Pull the anchors out of a detection's annotation groups
    #[must_use]
    pub fn from_detection(detection: &FaceDetection) -> Option<Self> {
        Some(Self {
            left_cheek: detection.annotation_first(groups::LEFT_CHEEK)?,
            right_cheek: detection.annotation_first(groups::RIGHT_CHEEK)?,
            between_eyes: detection.annotation_first(groups::MIDWAY_BETWEEN_EYES)?,
        })
    }

    /// The same anchors in centred, y-up scene coordinates; detector depth is kept
    #[must_use]
    pub fn to_scene(&self, video_width: u32, video_height: u32) -> Self {
        let map = |p: &Landmark| video_to_scene(p, video_width, video_height, p.z);
        Self {
            left_cheek: map(&self.left_cheek),
            right_cheek: map(&self.right_cheek),
            between_eyes: map(&self.between_eyes),
        }
    }
}

/// Mutually orthogonal unit vectors describing a face's orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisFrame {
    pub side: Unit<Vector3<f32>>,
    pub up: Unit<Vector3<f32>>,
    pub forward: Unit<Vector3<f32>>,
}

impl BasisFrame {
    /// Columns `(side, up, forward)` as a 3x3 matrix
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_columns(&[
            self.side.into_inner(),
            self.up.into_inner(),
            self.forward.into_inner(),
        ])
    }

    /// Rotation for effects anchored to the face, from a frame estimated in
    /// scene space.
    ///
    /// Columns are `(side, -up, forward)`: local `+y` runs from chin to
    /// forehead and local `+z` leaves the face towards the camera. In scene
    /// space `up` points at the chin, so it is flipped to keep the matrix a
    /// proper rotation.
    #[must_use]
    pub fn emitter_orientation(&self) -> Matrix3<f32> {
        Matrix3::from_columns(&[
            self.side.into_inner(),
            -self.up.into_inner(),
            self.forward.into_inner(),
        ])
    }
}

fn normalize(v: Vector3<f32>, what: &str) -> Result<Unit<Vector3<f32>>> {
    Unit::try_new(v, GEOMETRY_EPSILON)
        .ok_or_else(|| Error::DegenerateGeometry(format!("{what} has near-zero length")))
}

/// Estimate the face frame:
///
/// 1. `side = normalize(left_cheek - right_cheek)`
/// 2. `forward = normalize(side x (between_eyes - left_cheek))`
/// 3. `up = normalize(side x forward)`
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if the cheeks coincide or the
/// between-eyes point lies on the cheek axis
pub fn estimate_basis(anchors: &BasisAnchors) -> Result<BasisFrame> {
    let cheek_axis = anchors.left_cheek - anchors.right_cheek;
    let side = normalize(cheek_axis, "cheek axis")?;

    let to_eyes = anchors.between_eyes - anchors.left_cheek;
    let forward = normalize(side.cross(&to_eyes), "forward axis")?;

    let up = normalize(side.cross(&forward.into_inner()), "up axis")?;

    Ok(BasisFrame { side, up, forward })
}
