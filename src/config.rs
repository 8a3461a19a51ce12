//! Configuration management for the face mesh overlay

use crate::{
    constants::{
        DEFAULT_CAMERA_DISTANCE, DEFAULT_CAMERA_FAR, DEFAULT_CAMERA_FOV_DEGREES, DEFAULT_CAMERA_NEAR,
        DEFAULT_DEPTH_OFFSET, DEFAULT_GRAVITY, DEFAULT_LIFT, DEFAULT_MAX_FACES, DEFAULT_MIN_SMILE_FACTOR,
        DEFAULT_PARTICLE_COUNT, DEFAULT_PARTICLE_FLOOR, DEFAULT_SMILE_GAIN, DEFAULT_SMILE_NORMALIZER,
        DEFAULT_SPAWN_DEPTH, DEFAULT_SPAWN_LATERAL, DEFAULT_VIDEO_SIZE,
    },
    smile::SmileCurve,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mesh pool and tesselation assets
    pub mesh: MeshConfig,

    /// Particle fountain parameters
    pub particles: ParticleConfig,

    /// Smile response curve constants
    pub smile: SmileConfig,

    /// Scene camera and video stream
    pub camera: CameraConfig,

    /// Capture trigger behaviour
    pub capture: CaptureConfig,
}

/// Mesh pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Number of pooled mesh slots
    pub max_faces: usize,

    /// Forward bias of every vertex in front of the video plane
    pub depth_offset: f32,

    /// Optional triangle list replacing the built-in tesselation
    pub topology_file: Option<PathBuf>,

    /// Optional UV table replacing the built-in layout
    pub uv_file: Option<PathBuf>,
}

/// Particle system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Pool size
    pub count: usize,

    /// Downward acceleration per tick
    pub gravity: f32,

    /// Relaunch particles below this local height
    pub floor: f32,

    /// Scale applied to every velocity range
    pub speed: f32,

    /// Half-width of the lateral velocity range
    pub spawn_lateral: f32,

    /// Depth velocity range
    pub spawn_depth: (f32, f32),

    /// Vertical relaunch velocity range
    pub lift: (f32, f32),

    /// Floor on the smile factor used for the vertical relaunch component
    pub min_smile_factor: f32,

    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

/// Smile response curve configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileConfig {
    /// Index at and below which no particles are thrown
    pub neutral: f32,

    /// Multiplier applied before the fourth power
    pub gain: f32,

    /// Divisor applied after the fourth power
    pub normalizer: f32,
}

/// Which camera the video source should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    #[default]
    User,
    /// Rear camera
    Environment,
}

impl FacingMode {
    /// The other camera
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::User => Self::Environment,
            Self::Environment => Self::User,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,

    /// Near clipping plane
    pub near: f32,

    /// Far clipping plane
    pub far: f32,

    /// Distance of the camera from the video plane
    pub distance: f32,

    /// Initial facing mode
    pub facing: FacingMode,

    /// Requested video width and height in pixels
    pub video_size: u32,
}

/// Capture configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Switch camera facing after a successful capture
    pub switch_camera: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_faces: DEFAULT_MAX_FACES,
            depth_offset: DEFAULT_DEPTH_OFFSET,
            topology_file: None,
            uv_file: None,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_PARTICLE_COUNT,
            gravity: DEFAULT_GRAVITY,
            floor: DEFAULT_PARTICLE_FLOOR,
            speed: 1.0,
            spawn_lateral: DEFAULT_SPAWN_LATERAL,
            spawn_depth: DEFAULT_SPAWN_DEPTH,
            lift: DEFAULT_LIFT,
            min_smile_factor: DEFAULT_MIN_SMILE_FACTOR,
            seed: None,
        }
    }
}

impl Default for SmileConfig {
    fn default() -> Self {
        Self {
            neutral: 1.0,
            gain: DEFAULT_SMILE_GAIN,
            normalizer: DEFAULT_SMILE_NORMALIZER,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_CAMERA_FOV_DEGREES,
            near: DEFAULT_CAMERA_NEAR,
            far: DEFAULT_CAMERA_FAR,
            distance: DEFAULT_CAMERA_DISTANCE,
            facing: FacingMode::User,
            video_size: DEFAULT_VIDEO_SIZE,
        }
    }
}

impl SmileConfig {
    /// Response curve built from these constants
    #[must_use]
    pub fn curve(&self) -> SmileCurve {
        SmileCurve {
            neutral: self.neutral,
            gain: self.gain,
            normalizer: self.normalizer,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        // Mesh
        if self.mesh.max_faces == 0 {
            return Err(Error::ConfigError("max_faces must be greater than 0".to_string()));
        }
        if !self.mesh.depth_offset.is_finite() {
            return Err(Error::ConfigError("depth_offset must be finite".to_string()));
        }
        for path in [&self.mesh.topology_file, &self.mesh.uv_file].into_iter().flatten() {
            if !path.exists() {
                return Err(Error::ConfigError(format!("Mesh asset not found: {}", path.display())));
            }
        }

        // Particles
        let p = &self.particles;
        if p.count == 0 {
            return Err(Error::ConfigError("Particle count must be greater than 0".to_string()));
        }
        if p.gravity <= 0.0 {
            return Err(Error::ConfigError("Gravity must be positive".to_string()));
        }
        if p.floor >= 0.0 {
            return Err(Error::ConfigError("Particle floor must be below the emitter".to_string()));
        }
        if p.speed <= 0.0 || p.spawn_lateral < 0.0 {
            return Err(Error::ConfigError("Particle speeds must be positive".to_string()));
        }
        if p.spawn_depth.0 > p.spawn_depth.1 || p.lift.0 > p.lift.1 {
            return Err(Error::ConfigError("Particle velocity ranges must be ordered".to_string()));
        }
        if p.lift.0 <= 0.0 || p.min_smile_factor <= 0.0 {
            return Err(Error::ConfigError(
                "lift and min_smile_factor must be positive so relaunches go upwards".to_string(),
            ));
        }

        // Smile curve
        if self.smile.normalizer <= 0.0 {
            return Err(Error::ConfigError("Smile normalizer must be positive".to_string()));
        }

        // Camera
        let c = &self.camera;
        if c.fov_degrees <= 0.0 || c.fov_degrees >= 180.0 {
            return Err(Error::ConfigError("Field of view must be between 0 and 180 degrees".to_string()));
        }
        if c.near <= 0.0 || c.far <= c.near {
            return Err(Error::ConfigError("Camera planes must satisfy 0 < near < far".to_string()));
        }
        if c.video_size == 0 {
            return Err(Error::ConfigError("Video size must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Mesh Overlay Configuration

# Mesh pool
mesh:
  max_faces: 3
  depth_offset: 1.0
  # topology_file: "assets/triangles.txt"
  # uv_file: "assets/uv_coords.txt"

# Particle fountain
particles:
  count: 500
  gravity: 0.3
  floor: -300.0
  speed: 1.0
  spawn_lateral: 5.0
  spawn_depth: [5.0, 15.0]
  lift: [8.0, 16.0]
  min_smile_factor: 0.05
  # seed: 42

# Smile response curve
smile:
  neutral: 1.0
  gain: 1.618
  normalizer: 8.314

# Scene camera and video
camera:
  fov_degrees: 65.0
  near: 0.1
  far: 1000.0
  distance: 500.0
  facing: user
  video_size: 500

# Capture trigger
capture:
  switch_camera: false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_matches_defaults() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.mesh.max_faces, DEFAULT_MAX_FACES);
        assert_eq!(config.particles, ParticleConfig::default());
        assert_eq!(config.camera.facing, FacingMode::User);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("particles:\n  count: 10\n  seed: 3\n").unwrap();
        assert_eq!(config.particles.count, 10);
        assert_eq!(config.particles.seed, Some(3));
        assert_eq!(config.particles.gravity, DEFAULT_GRAVITY);
        assert_eq!(config.mesh.max_faces, DEFAULT_MAX_FACES);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = Config::default();
        config.mesh.max_faces = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.particles.lift = (5.0, 1.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.particles.floor = 10.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.far = 0.05;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mesh.uv_file = Some(PathBuf::from("/nonexistent/uv.txt"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("facemesh_config_{}.yaml", std::process::id()));
        let mut config = Config::default();
        config.camera.facing = FacingMode::Environment;
        config.capture.switch_camera = true;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.camera.facing, FacingMode::Environment);
        assert!(loaded.capture.switch_camera);
    }

    #[test]
    fn test_facing_toggle() {
        assert_eq!(FacingMode::User.toggled(), FacingMode::Environment);
        assert_eq!(FacingMode::Environment.toggled(), FacingMode::User);
    }
}
