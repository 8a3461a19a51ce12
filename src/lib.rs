//! Face mesh overlay library for landmark-driven video effects.
//!
//! This library turns per-frame facial landmarks from an external detector
//! into renderer-ready scene data:
//! - A triangulated, UV-mapped mesh per detected face, drawn from a fixed pool
//! - UV recalibration from a captured still frame
//! - An orthonormal basis frame per face for orienting effects
//! - A particle fountain whose launch strength follows a smile index
//!
//! The pipeline consists of:
//! 1. Detection of landmarks and annotation groups (external)
//! 2. Mapping landmarks from video pixels onto pooled mesh vertices
//! 3. Basis and smile estimation on the first face
//! 4. Particle integration in the face's frame
//! 5. Handing the scene snapshot to the renderer (external)
//!
//! # Examples
//!
//! ## Headless Frame Pump
//!
//! ```no_run
//! use facemesh_overlay::{
//!     app::FramePump,
//!     config::Config,
//!     replay::{LoggingRenderer, ReplayDetector, SyntheticVideo},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let detector = ReplayDetector::from_file("recording.yaml")?;
//! let video = SyntheticVideo::new(640, 480, config.camera.facing);
//! let mut pump = FramePump::new(&config, detector, video, LoggingRenderer::new())?;
//!
//! for _ in 0..100 {
//!     let report = pump.tick();
//!     println!("{} faces, smile factor {:.2}", report.visible, report.smile_factor);
//! }
//!
//! // Use the current frame as the texture and recalibrate UVs from it
//! pump.capture()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mapping Landmarks Directly
//!
//! ```no_run
//! use facemesh_overlay::{
//!     landmarks::FaceDetection,
//!     mapper::LandmarkMapper,
//!     mesh_pool::MeshSlotPool,
//!     topology::build_triangles,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let landmarks = vec![nalgebra::Point3::origin(); 468];
//! let mut pool = MeshSlotPool::new(3, Arc::new(build_triangles().clone()))?;
//! let face = FaceDetection::from_landmarks(landmarks)?;
//!
//! pool.set_active_count(1);
//! if let Some(slot) = pool.slot_mut(0) {
//!     let dirty = LandmarkMapper::default().apply_landmarks(slot, &face.landmarks, 640, 480)?;
//!     println!("Updated vertices {:?}", dirty);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Smile-Driven Particles
//!
//! ```no_run
//! use facemesh_overlay::{
//!     config::ParticleConfig,
//!     particles::ParticleSystem,
//!     smile::{smile_index, SmileAnchors, SmileCurve},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let face = facemesh_overlay::landmarks::FaceDetection::default();
//! let mut particles = ParticleSystem::new(&ParticleConfig::default())?;
//! let curve = SmileCurve::default();
//!
//! if let Some(anchors) = SmileAnchors::from_detection(&face) {
//!     let factor = curve.factor(smile_index(&anchors)?);
//!     particles.integrate(factor);
//! }
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

/// Landmarks, detections and annotation groups
pub mod landmarks;

/// Static triangle list over the landmarks
pub mod topology;

/// Texture coordinates and still-frame calibration
pub mod uv;

/// Fixed pool of face meshes
pub mod mesh_pool;

/// Landmark to vertex mapping
pub mod mapper;

/// Face basis frame estimation
pub mod basis;

/// Smile index and response curve
pub mod smile;

/// Smile-reactive particle fountain
pub mod particles;

/// Frame pump and external collaborator traits
pub mod app;

/// Headless detector, video source and renderer
pub mod replay;

pub use error::{Error, Result};
