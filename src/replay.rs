//! Headless collaborators: recorded detections, a synthetic video stream and
//! a renderer that only logs what it is given.

use crate::{
    app::{FaceDetector, Renderer, SceneSnapshot, VideoSource},
    config::FacingMode,
    landmarks::FaceDetection,
    Error, Result,
};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Detections recorded per tick
pub type Recording = Vec<Vec<FaceDetection>>;

/// Plays back a recording, one entry per `estimate_faces` call
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: Recording,
    position: usize,
    looping: bool,
    failures: Vec<usize>,
}

impl ReplayDetector {
    /// Replay the given frames once, then report no faces
    #[must_use]
    pub fn new(frames: Recording) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Load a YAML recording: a list of ticks, each a list of faces
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading recorded detections from: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML recording
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not describe a recording
    pub fn from_yaml(content: &str) -> Result<Self> {
        let frames: Recording = serde_yaml::from_str(content)?;
        log::info!("Recording holds {} ticks", frames.len());
        Ok(Self::new(frames))
    }

    /// Start over once the recording is exhausted
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Make the call with the given zero-based index fail
    #[must_use]
    pub fn fail_at(mut self, call: usize) -> Self {
        self.failures.push(call);
        self
    }

    /// Number of recorded ticks
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the recording is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Calls answered so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

impl FaceDetector for ReplayDetector {
    fn estimate_faces(&mut self, _frame: &RgbaImage) -> Result<Vec<FaceDetection>> {
        let call = self.position;
        self.position += 1;

        if self.failures.contains(&call) {
            return Err(Error::Detector(format!("recorded failure at call {call}")));
        }

        let index = if self.looping && !self.frames.is_empty() {
            call % self.frames.len()
        } else {
            call
        };
        Ok(self.frames.get(index).cloned().unwrap_or_default())
    }
}

/// Video source producing solid frames of a fixed size
#[derive(Debug, Clone)]
pub struct SyntheticVideo {
    width: u32,
    height: u32,
    facing: FacingMode,
    fill: Rgba<u8>,
    switches: usize,
}

impl SyntheticVideo {
    /// A `width x height` stream from the given camera
    #[must_use]
    pub fn new(width: u32, height: u32, facing: FacingMode) -> Self {
        Self {
            width,
            height,
            facing,
            fill: Rgba([0, 0, 0, 255]),
            switches: 0,
        }
    }

    /// Colour of every pixel
    #[must_use]
    pub fn with_fill(mut self, fill: Rgba<u8>) -> Self {
        self.fill = fill;
        self
    }

    /// Completed facing switches
    #[must_use]
    pub fn switches(&self) -> usize {
        self.switches
    }
}

impl VideoSource for SyntheticVideo {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn current_frame(&mut self) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(self.width, self.height, self.fill))
    }

    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn switch_facing(&mut self, facing: FacingMode) -> Result<()> {
        self.facing = facing;
        self.switches += 1;
        Ok(())
    }
}

/// What a [`LoggingRenderer`] saw on one call
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub visible_slots: Vec<usize>,
    pub dirty_slots: Vec<usize>,
    pub uv_revision: u64,
    pub textured: bool,
}

/// Renderer that logs and keeps a summary of recent frames
#[derive(Debug, Clone, Default)]
pub struct LoggingRenderer {
    records: Vec<RenderRecord>,
    history: Option<usize>,
    frames: u64,
}

impl LoggingRenderer {
    /// Create a renderer keeping every record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `history` records, dropping the oldest
    #[must_use]
    pub fn with_history(history: usize) -> Self {
        Self {
            history: Some(history),
            ..Self::default()
        }
    }

    /// Retained records, oldest first
    #[must_use]
    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }

    /// Frames rendered in total
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LoggingRenderer {
    fn render(&mut self, scene: &SceneSnapshot<'_>) -> Result<()> {
        let visible_slots: Vec<usize> = scene
            .meshes
            .iter()
            .filter(|m| m.slot.is_visible())
            .map(|m| m.index)
            .collect();
        let dirty_slots = scene
            .meshes
            .iter()
            .filter(|m| m.dirty.is_some())
            .map(|m| m.index)
            .collect();

        log::debug!(
            "Render: slots {:?} visible, uv revision {}, emitter at {:?}",
            visible_slots,
            scene.uv_revision,
            scene.particles.origin()
        );

        self.frames += 1;
        if self.history == Some(0) {
            return Ok(());
        }
        if self.history.is_some_and(|limit| self.records.len() >= limit) {
            self.records.remove(0);
        }
        self.records.push(RenderRecord {
            visible_slots,
            dirty_slots,
            uv_revision: scene.uv_revision,
            textured: scene.texture.is_some(),
        });
        Ok(())
    }
}
