//! Constants used throughout the library

/// Number of landmarks produced per detected face
pub const NUM_LANDMARKS: usize = 468;

/// Default number of pooled mesh slots
pub const DEFAULT_MAX_FACES: usize = 3;

/// Forward bias placing the mesh just in front of the video plane
pub const DEFAULT_DEPTH_OFFSET: f32 = 1.0;

/// Video frame size requested on desktop cameras
pub const DEFAULT_VIDEO_SIZE: u32 = 500;

/// Default particle pool size
pub const DEFAULT_PARTICLE_COUNT: usize = 500;

/// Downward acceleration applied per tick
pub const DEFAULT_GRAVITY: f32 = 0.3;

/// Particles falling below this height are relaunched
pub const DEFAULT_PARTICLE_FLOOR: f32 = -300.0;

/// Half-width of the initial lateral velocity range (vx, vy)
pub const DEFAULT_SPAWN_LATERAL: f32 = 5.0;

/// Initial depth velocity range (vz)
pub const DEFAULT_SPAWN_DEPTH: (f32, f32) = (5.0, 15.0);

/// Vertical relaunch velocity range, scaled by the smile factor
pub const DEFAULT_LIFT: (f32, f32) = (8.0, 16.0);

/// Lower bound on the smile factor used when relaunching particles
pub const DEFAULT_MIN_SMILE_FACTOR: f32 = 0.05;

/// Smile response curve gain
pub const DEFAULT_SMILE_GAIN: f32 = 1.618;

/// Smile response curve normalizer
pub const DEFAULT_SMILE_NORMALIZER: f32 = 8.314;

/// Perspective camera parameters
pub const DEFAULT_CAMERA_FOV_DEGREES: f32 = 65.0;
pub const DEFAULT_CAMERA_NEAR: f32 = 0.1;
pub const DEFAULT_CAMERA_FAR: f32 = 1000.0;
pub const DEFAULT_CAMERA_DISTANCE: f32 = 500.0;

/// Vectors shorter than this are treated as collapsed
pub const GEOMETRY_EPSILON: f32 = 1e-6;
