//! Helper functions and utilities for tests

#![allow(dead_code)]

use facemesh_overlay::{
    constants::NUM_LANDMARKS,
    landmarks::{FaceDetection, Landmark},
    uv::default_uv,
};
use nalgebra::Point3;

/// Landmark indices the synthetic faces pin to known positions
pub const LEFT_CHEEK: usize = 425;
pub const RIGHT_CHEEK: usize = 205;
pub const BETWEEN_EYES: usize = 168;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;
pub const LOWER_LIP: usize = 17;

/// Face geometry knobs for synthetic detections
#[derive(Debug, Clone, Copy)]
pub struct FaceShape {
    pub centre: (f32, f32),
    pub size: f32,
    pub mouth_half_width: f32,
    pub lip_drop: f32,
}

impl Default for FaceShape {
    fn default() -> Self {
        Self {
            centre: (250.0, 250.0),
            size: 200.0,
            mouth_half_width: 30.0,
            lip_drop: 10.0,
        }
    }
}

impl FaceShape {
    /// A broad grin on the same face
    pub fn grinning(self) -> Self {
        Self {
            mouth_half_width: 55.0,
            lip_drop: 40.0,
            ..self
        }
    }
}

/// 468 landmarks at `z = 0` spread over a face-sized box, with anchors pinned
pub fn synthetic_landmarks(shape: FaceShape) -> Vec<Landmark> {
    let (cx, cy) = shape.centre;
    let mut landmarks: Vec<Landmark> = default_uv()
        .coords()
        .iter()
        .map(|uv| Point3::new(cx + (uv.x - 0.5) * shape.size, cy + (0.5 - uv.y) * shape.size, 0.0))
        .collect();

    landmarks[LEFT_CHEEK] = Point3::new(cx + 60.0, cy + 20.0, 0.0);
    landmarks[RIGHT_CHEEK] = Point3::new(cx - 60.0, cy + 20.0, 0.0);
    landmarks[BETWEEN_EYES] = Point3::new(cx, cy - 40.0, 0.0);
    landmarks[MOUTH_LEFT] = Point3::new(cx - shape.mouth_half_width, cy + 50.0, 0.0);
    landmarks[MOUTH_RIGHT] = Point3::new(cx + shape.mouth_half_width, cy + 50.0, 0.0);
    landmarks[LOWER_LIP] = Point3::new(cx, cy + 50.0 + shape.lip_drop, 0.0);

    assert_eq!(landmarks.len(), NUM_LANDMARKS);
    landmarks
}

/// A complete detection with annotation groups derived from the landmarks
pub fn synthetic_face(shape: FaceShape) -> FaceDetection {
    FaceDetection::from_landmarks(synthetic_landmarks(shape)).expect("synthetic landmarks are complete")
}

/// A detection with raw landmarks only, as some detectors deliver them
pub fn bare_face(shape: FaceShape) -> FaceDetection {
    FaceDetection {
        landmarks: synthetic_landmarks(shape),
        annotations: Default::default(),
    }
}

/// Assert every component of a point is finite
pub fn assert_finite(point: &Point3<f32>) {
    assert!(
        point.coords.iter().all(|c| c.is_finite()),
        "non-finite point {point:?}"
    );
}
