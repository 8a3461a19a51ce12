//! Error types for the face mesh overlay library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// UV calibration was attempted on an unusable capture
    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    /// Anchor landmarks collapsed so no basis frame can be derived
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Triangle or UV table violates the mesh invariants
    #[error("Topology error: {0}")]
    TopologyError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The external landmark detector failed for a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// Video stream acquisition or reconfiguration failed
    #[error("Video source error: {0}")]
    VideoSource(String),

    /// The external renderer rejected a frame
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Image processing operation failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
