//! Frame pump driving the overlay once per animation tick.
//!
//! [`FramePump`] is the session context: it owns the mesh pool, the UV store,
//! the particle system and the three external collaborators (detector, video
//! source, renderer). Every buffer is mutated only through `&mut self`, so a
//! tick can never overlap another tick or a capture.

use crate::{
    basis::{estimate_basis, BasisAnchors},
    config::{CameraConfig, Config, FacingMode},
    landmarks::{groups, FaceDetection},
    mapper::{video_to_scene, LandmarkMapper},
    mesh_pool::{MeshSlot, MeshSlotPool},
    particles::{EmitterUpdate, ParticleSystem},
    smile::{smile_index, SmileAnchors, SmileCurve},
    topology::{build_triangles, TopologyTable},
    uv::{UvStore, UvTable},
    Error, Result,
};
use image::RgbaImage;
use log::{debug, info, warn};
use nalgebra::{Matrix4, Perspective3, Point3};
use std::ops::Range;
use std::sync::Arc;

/// Landmark detector boundary
pub trait FaceDetector {
    /// Detect every face in a frame; an empty list means no faces
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails for this frame
    fn estimate_faces(&mut self, frame: &RgbaImage) -> Result<Vec<FaceDetection>>;
}

/// Video stream boundary
pub trait VideoSource {
    /// Current frame width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Pixels of the current frame
    ///
    /// # Errors
    ///
    /// Returns an error if no frame is available
    fn current_frame(&mut self) -> Result<RgbaImage>;

    /// Camera currently streaming
    fn facing(&self) -> FacingMode;

    /// Stop the current stream and start one with the given facing. Returns
    /// only once the new stream's dimensions are known.
    ///
    /// # Errors
    ///
    /// Returns an error if the new stream could not be acquired
    fn switch_facing(&mut self, facing: FacingMode) -> Result<()>;

    /// Lock the display orientation where the platform supports it
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the lock
    fn lock_orientation(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Scene renderer boundary
pub trait Renderer {
    /// Draw one tick's scene; called after every buffer mutation for the tick
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be drawn
    fn render(&mut self, scene: &SceneSnapshot<'_>) -> Result<()>;
}

/// Perspective camera looking down -z at the video plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
}

impl Camera {
    /// Camera for a `width x height` video stream
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_video(config: &CameraConfig, width: u32, height: u32) -> Self {
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        Self {
            fov_degrees: config.fov_degrees,
            aspect,
            near: config.near,
            far: config.far,
            position: Point3::new(0.0, 0.0, config.distance),
        }
    }

    /// Projection matrix
    #[must_use]
    pub fn projection(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect, self.fov_degrees.to_radians(), self.near, self.far).to_homogeneous()
    }

    /// World-to-camera matrix
    #[must_use]
    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&-self.position.coords)
    }
}

/// Background quad showing the live video, centred at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoPlane {
    pub width: f32,
    pub height: f32,
}

/// One mesh slot as handed to the renderer
#[derive(Debug, Clone)]
pub struct MeshView<'a> {
    pub index: usize,
    pub slot: &'a MeshSlot,
    /// Vertex range rewritten this tick, if any
    pub dirty: Option<Range<usize>>,
}

/// Everything the renderer needs for one tick
#[derive(Debug, Clone)]
pub struct SceneSnapshot<'a> {
    /// Every slot in pool order, visible or not
    pub meshes: Vec<MeshView<'a>>,
    pub uv: Arc<UvTable>,
    /// Changes whenever `uv` is replaced by a capture
    pub uv_revision: u64,
    /// Captured still applied to every slot; `None` until the first capture
    pub texture: Option<&'a RgbaImage>,
    pub camera: Camera,
    pub video_plane: VideoPlane,
    pub particles: &'a ParticleSystem,
}

/// Counters accumulated over the pump's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub ticks: u64,
    pub detector_failures: u64,
    /// Detections dropped because the pool was full
    pub faces_dropped: u64,
    /// Faces whose landmark array could not be mapped
    pub malformed_faces: u64,
    /// Anchor faces whose basis frame could not be estimated
    pub basis_failures: u64,
    pub render_failures: u64,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub detections: usize,
    pub visible: usize,
    pub dropped: usize,
    pub smile_factor: f32,
    pub relaunched: usize,
}

/// Session context and per-tick driver
pub struct FramePump<D, V, R> {
    detector: D,
    video: V,
    renderer: R,
    pool: MeshSlotPool,
    mapper: LandmarkMapper,
    uv: UvStore,
    particles: ParticleSystem,
    smile: SmileCurve,
    camera: CameraConfig,
    switch_on_capture: bool,
    texture: Option<RgbaImage>,
    stats: PumpStats,
}

impl<D: FaceDetector, V: VideoSource, R: Renderer> FramePump<D, V, R> {
    /// Build every pooled buffer up front and try to lock the display orientation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a mesh asset cannot be loaded
    pub fn new(config: &Config, detector: D, mut video: V, renderer: R) -> Result<Self> {
        info!("Initializing frame pump");
        config.validate()?;

        let topology = match &config.mesh.topology_file {
            Some(path) => TopologyTable::from_file(path)?,
            None => {
                info!("Using built-in ring-lattice topology; set mesh.topology_file for the detector's tesselation");
                build_triangles().clone()
            }
        };
        let uv = match &config.mesh.uv_file {
            Some(path) => UvStore::new(UvTable::from_file(path)?),
            None => UvStore::default(),
        };
        if topology.vertex_count() != uv.current().coords().len() {
            return Err(Error::TopologyError(format!(
                "Topology covers {} vertices but the UV table has {}",
                topology.vertex_count(),
                uv.current().coords().len()
            )));
        }

        if let Err(e) = video.lock_orientation() {
            warn!("Orientation lock unavailable: {}", e);
        }
        let (width, height) = video.dimensions();
        info!("Video stream {}x{} ({:?} camera)", width, height, video.facing());

        Ok(Self {
            detector,
            video,
            renderer,
            pool: MeshSlotPool::new(config.mesh.max_faces, Arc::new(topology))?,
            mapper: LandmarkMapper::new(config.mesh.depth_offset),
            uv,
            particles: ParticleSystem::new(&config.particles)?,
            smile: config.smile.curve(),
            camera: config.camera.clone(),
            switch_on_capture: config.capture.switch_camera,
            texture: None,
            stats: PumpStats::default(),
        })
    }

    /// Run one animation tick: detect, update slots and particles, render.
    ///
    /// Never fails; detector and per-face failures are logged and counted.
    pub fn tick(&mut self) -> TickReport {
        self.stats.ticks += 1;
        let (width, height) = self.video.dimensions();

        let mut detections = match self.detect() {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Detector failed, treating tick as empty: {}", e);
                self.stats.detector_failures += 1;
                Vec::new()
            }
        };

        let activation = self.pool.set_active_count(detections.len());
        self.stats.faces_dropped += activation.dropped as u64;

        let mut dirty: Vec<Option<Range<usize>>> = vec![None; self.pool.capacity()];
        for (i, detection) in detections.iter().take(activation.active).enumerate() {
            let Some(slot) = self.pool.slot_mut(i) else { continue };
            match self.mapper.apply_landmarks(slot, &detection.landmarks, width, height) {
                Ok(range) => dirty[i] = Some(range),
                Err(e) => {
                    warn!("Hiding slot {}: {}", i, e);
                    slot.hide();
                    self.stats.malformed_faces += 1;
                }
            }
        }

        let update = match detections.first_mut() {
            Some(anchor) => self.emitter_update(anchor, width, height),
            None => EmitterUpdate {
                origin: None,
                orientation: None,
                smile_factor: 0.0,
            },
        };
        let relaunched = self.particles.update(&update);

        let visible = self.pool.visible().count();
        debug!(
            "Tick {}: {} detections, {} visible, {} dropped, smile factor {:.3}",
            self.stats.ticks,
            detections.len(),
            visible,
            activation.dropped,
            update.smile_factor
        );

        self.render(width, height, dirty);

        TickReport {
            detections: detections.len(),
            visible,
            dropped: activation.dropped,
            smile_factor: update.smile_factor,
            relaunched,
        }
    }

    /// Capture trigger: snapshot the current frame as the texture of every
    /// slot, recalibrate UVs from the first face in it and, when configured,
    /// switch camera facing.
    ///
    /// Returns the new UV revision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapture`] if the frame has no face or unusable
    /// dimensions; the previous UV table stays active
    pub fn capture(&mut self) -> Result<u64> {
        info!("Capture triggered");
        let (width, height) = self.video.dimensions();
        let still = self.video.current_frame()?;
        let detections = self.detector.estimate_faces(&still)?;
        self.texture = Some(still);

        let revision = self
            .uv
            .calibrate(detections.first().map(|d| d.landmarks.as_slice()), width, height)
            .map_err(|e| {
                warn!("UV calibration failed: {}", e);
                e
            })?;
        info!("UV table recalibrated (revision {})", revision);

        if self.switch_on_capture {
            let facing = self.video.facing().toggled();
            self.video.switch_facing(facing)?;
            info!("Switched to {:?} camera", facing);
        }

        Ok(revision)
    }

    fn detect(&mut self) -> Result<Vec<FaceDetection>> {
        let frame = self.video.current_frame()?;
        self.detector.estimate_faces(&frame)
    }

    fn emitter_update(&mut self, anchor: &mut FaceDetection, width: u32, height: u32) -> EmitterUpdate {
        if let Err(e) = anchor.ensure_annotations() {
            warn!("Anchor face has no annotations: {}", e);
        }

        // Estimated in scene space so the emitter's +z leaves the face towards the camera
        let orientation = match BasisAnchors::from_detection(anchor)
            .ok_or_else(|| Error::DegenerateGeometry("missing basis anchors".to_string()))
            .and_then(|anchors| estimate_basis(&anchors.to_scene(width, height)))
        {
            Ok(frame) => Some(frame.emitter_orientation()),
            Err(e) => {
                warn!("Keeping previous particle orientation: {}", e);
                self.stats.basis_failures += 1;
                None
            }
        };

        let origin = anchor
            .annotation_first(groups::MIDWAY_BETWEEN_EYES)
            .map(|p| video_to_scene(&p, width, height, self.mapper.depth_offset()));

        let smile_factor = match SmileAnchors::from_detection(anchor).map(|anchors| smile_index(&anchors)) {
            Some(Ok(index)) => self.smile.factor(index),
            Some(Err(e)) => {
                debug!("No smile index this tick: {}", e);
                0.0
            }
            None => 0.0,
        };

        EmitterUpdate {
            origin,
            orientation,
            smile_factor,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn render(&mut self, width: u32, height: u32, mut dirty: Vec<Option<Range<usize>>>) {
        let scene = SceneSnapshot {
            meshes: self
                .pool
                .slots()
                .iter()
                .enumerate()
                .map(|(index, slot)| MeshView {
                    index,
                    slot,
                    dirty: dirty.get_mut(index).and_then(Option::take),
                })
                .collect(),
            uv: self.uv.current(),
            uv_revision: self.uv.revision(),
            texture: self.texture.as_ref(),
            camera: Camera::for_video(&self.camera, width, height),
            video_plane: VideoPlane {
                width: width as f32,
                height: height as f32,
            },
            particles: &self.particles,
        };

        if let Err(e) = self.renderer.render(&scene) {
            warn!("Renderer failed: {}", e);
            self.stats.render_failures += 1;
        }
    }

    /// Counters since start-up
    #[must_use]
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Mesh slot pool
    #[must_use]
    pub fn pool(&self) -> &MeshSlotPool {
        &self.pool
    }

    /// Active UV table store
    #[must_use]
    pub fn uv(&self) -> &UvStore {
        &self.uv
    }

    /// Particle system
    #[must_use]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Mutable particle system
    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    /// Captured texture, if any
    #[must_use]
    pub fn texture(&self) -> Option<&RgbaImage> {
        self.texture.as_ref()
    }

    /// The detector
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// The video source
    #[must_use]
    pub fn video(&self) -> &V {
        &self.video
    }

    /// The video source
    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    /// The renderer
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
