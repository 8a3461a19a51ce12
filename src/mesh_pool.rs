//! Fixed-capacity pool of face meshes.
//!
//! Slots are handed out by detection order only: slot `i` shows whichever
//! face the detector listed `i`-th this frame, which need not be the same
//! person as last frame.

use crate::{topology::TopologyTable, Error, Result};
use nalgebra::Point3;
use std::sync::Arc;

/// Vertex position in scene space
pub type Vertex = Point3<f32>;

/// One pooled mesh instance
#[derive(Debug, Clone)]
pub struct MeshSlot {
    vertices: Vec<Vertex>,
    topology: Arc<TopologyTable>,
    visible: bool,
}

impl MeshSlot {
    fn new(topology: Arc<TopologyTable>) -> Self {
        Self {
            vertices: vec![Vertex::origin(); topology.vertex_count()],
            topology,
            visible: false,
        }
    }

    /// Current vertex positions
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex buffer for in-place overwriting; its length never changes
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Triangle list shared with every other slot
    #[must_use]
    pub fn topology(&self) -> &Arc<TopologyTable> {
        &self.topology
    }

    /// Whether the slot is drawn this frame
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hide an activated slot whose face could not be mapped this frame
    pub(crate) fn hide(&mut self) {
        self.visible = false;
    }
}

/// Outcome of an activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// Slots now visible
    pub active: usize,
    /// Requested faces that did not fit in the pool
    pub dropped: usize,
}

/// Pool of `max_faces` mesh slots, all built up front
#[derive(Debug, Clone)]
pub struct MeshSlotPool {
    slots: Vec<MeshSlot>,
    active: usize,
    overflow: usize,
}

impl MeshSlotPool {
    /// Build `max_faces` slots sharing one topology, all invisible with zeroed vertices
    ///
    /// # Errors
    ///
    /// Returns an error if `max_faces` is zero
    pub fn new(max_faces: usize, topology: Arc<TopologyTable>) -> Result<Self> {
        if max_faces == 0 {
            return Err(Error::InvalidInput("max_faces must be at least 1".to_string()));
        }
        log::info!(
            "Creating mesh pool with {} slots of {} vertices / {} triangles",
            max_faces,
            topology.vertex_count(),
            topology.len()
        );

        Ok(Self {
            slots: (0..max_faces).map(|_| MeshSlot::new(Arc::clone(&topology))).collect(),
            active: 0,
            overflow: 0,
        })
    }

    /// Number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots made visible by the last activation
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Faces dropped for lack of slots by the last activation
    #[must_use]
    pub fn overflow(&self) -> usize {
        self.overflow
    }

    /// Show slots `[0, n)` and hide the rest; `n` is clamped to the capacity
    pub fn set_active_count(&mut self, n: usize) -> Activation {
        let active = n.min(self.slots.len());
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.visible = i < active;
        }
        self.active = active;
        self.overflow = n - active;

        if self.overflow > 0 {
            log::debug!("{} detections exceed pool capacity {}", n, self.slots.len());
        }

        Activation {
            active,
            dropped: self.overflow,
        }
    }

    /// Slot `i`, if within capacity
    #[must_use]
    pub fn slot(&self, i: usize) -> Option<&MeshSlot> {
        self.slots.get(i)
    }

    /// Mutable slot `i`, if within capacity
    pub fn slot_mut(&mut self, i: usize) -> Option<&mut MeshSlot> {
        self.slots.get_mut(i)
    }

    /// All slots in order
    #[must_use]
    pub fn slots(&self) -> &[MeshSlot] {
        &self.slots
    }

    /// Visible slots with their indices
    pub fn visible(&self) -> impl Iterator<Item = (usize, &MeshSlot)> {
        self.slots.iter().enumerate().filter(|(_, slot)| slot.visible)
    }
}
