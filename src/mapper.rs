//! Video pixel space to scene space mapping of landmarks onto mesh vertices.
//!
//! The scene camera looks at a video-plane quad of `width x height` centred at
//! the origin, so a landmark at pixel `(x, y)` lands at
//! `(x - width / 2, height / 2 - y)`. Detector depth is not used for placement:
//! every vertex gets the same small forward offset so the mesh sits just in
//! front of the video plane.

use crate::{
    constants::DEFAULT_DEPTH_OFFSET,
    landmarks::Landmark,
    mesh_pool::{MeshSlot, Vertex},
    Error, Result,
};
use std::ops::Range;

/// Map a pixel-space point into the centred, y-up scene space
#[must_use]
#[allow(clippy::cast_precision_loss)] // Video dimensions are far below 2^24
pub fn video_to_scene(point: &Landmark, video_width: u32, video_height: u32, depth: f32) -> Vertex {
    Vertex::new(
        point.x - video_width as f32 / 2.0,
        -point.y + video_height as f32 / 2.0,
        depth,
    )
}

/// Writes landmark arrays into mesh slot vertex buffers
#[derive(Debug, Clone, Copy)]
pub struct LandmarkMapper {
    depth_offset: f32,
}

impl Default for LandmarkMapper {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_OFFSET)
    }
}

impl LandmarkMapper {
    /// Create a mapper placing every vertex at `depth_offset`
    #[must_use]
    pub fn new(depth_offset: f32) -> Self {
        Self { depth_offset }
    }

    /// Forward offset given to every vertex
    #[must_use]
    pub fn depth_offset(&self) -> f32 {
        self.depth_offset
    }

    /// Overwrite a slot's vertices in place from one face's landmarks.
    ///
    /// Returns the range of vertex indices that changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark count differs from the slot's vertex count
    pub fn apply_landmarks(
        &self,
        slot: &mut MeshSlot,
        landmarks: &[Landmark],
        video_width: u32,
        video_height: u32,
    ) -> Result<Range<usize>> {
        let vertices = slot.vertices_mut();
        if landmarks.len() != vertices.len() {
            return Err(Error::InvalidInput(format!(
                "Expected {} landmarks, got {}",
                vertices.len(),
                landmarks.len()
            )));
        }

        for (vertex, landmark) in vertices.iter_mut().zip(landmarks) {
            *vertex = video_to_scene(landmark, video_width, video_height, self.depth_offset);
        }

        Ok(0..vertices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::NUM_LANDMARKS, mesh_pool::MeshSlotPool, topology::build_triangles};
    use nalgebra::Point3;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn pool() -> MeshSlotPool {
        MeshSlotPool::new(1, Arc::new(build_triangles().clone())).unwrap()
    }

    #[test]
    fn test_video_to_scene() {
        let v = video_to_scene(&Point3::new(0.0, 0.0, 42.0), 640, 480, 1.0);
        assert_eq!(v, Vertex::new(-320.0, 240.0, 1.0));

        let centre = video_to_scene(&Point3::new(320.0, 240.0, 0.0), 640, 480, 1.0);
        assert_eq!(centre, Vertex::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_apply_rejects_wrong_count() {
        let mut pool = pool();
        let slot = pool.slot_mut(0).unwrap();
        let mapper = LandmarkMapper::default();
        assert!(mapper.apply_landmarks(slot, &[Point3::origin(); 3], 100, 100).is_err());
        // Buffer untouched
        assert!(slot.vertices().iter().all(|v| *v == Vertex::origin()));
    }

    #[test]
    fn test_apply_ignores_detector_depth() {
        let mut pool = pool();
        let slot = pool.slot_mut(0).unwrap();
        let landmarks = vec![Point3::new(10.0, 20.0, -55.0); NUM_LANDMARKS];
        let dirty = LandmarkMapper::new(2.5)
            .apply_landmarks(slot, &landmarks, 100, 100)
            .unwrap();

        assert_eq!(dirty, 0..NUM_LANDMARKS);
        assert!(slot.vertices().iter().all(|v| v.z == 2.5));
    }

    proptest! {
        #[test]
        fn prop_vertices_follow_landmarks(
            coords in prop::collection::vec((0.0f32..2000.0, 0.0f32..2000.0, -100.0f32..100.0), NUM_LANDMARKS),
            width in 1u32..4000,
            height in 1u32..4000,
        ) {
            let mut pool = pool();
            let slot = pool.slot_mut(0).unwrap();
            let landmarks: Vec<Landmark> = coords.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect();
            LandmarkMapper::default().apply_landmarks(slot, &landmarks, width, height).unwrap();

            prop_assert_eq!(slot.vertices().len(), NUM_LANDMARKS);
            for (v, l) in slot.vertices().iter().zip(&landmarks) {
                prop_assert_eq!(v.x, l.x - width as f32 / 2.0);
                prop_assert_eq!(v.y, -l.y + height as f32 / 2.0);
                prop_assert_eq!(v.z, DEFAULT_DEPTH_OFFSET);
            }
        }
    }
}
