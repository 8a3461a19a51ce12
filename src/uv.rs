//! Per-landmark texture coordinates and still-frame calibration.
//!
//! Tables are stored in texture space (`v` grows upwards). The active table is
//! held behind an `Arc` in [`UvStore`] and only ever swapped as a whole, so a
//! renderer holding the previous snapshot never sees a half-written table.

use crate::{
    constants::NUM_LANDMARKS,
    landmarks::Landmark,
    topology::{ring_offsets, RING_SIZES},
    Error, Result,
};
use nalgebra::Point2;
use std::f32::consts::TAU;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Texture coordinate in `[0, 1] x [0, 1]`
pub type Uv = Point2<f32>;

/// Horizontal and vertical radius of the outermost ring in the default layout
const DEFAULT_LAYOUT_RADII: (f32, f32) = (0.45, 0.48);

/// Mapping from landmark index to texture coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct UvTable {
    coords: Vec<Uv>,
}

impl UvTable {
    /// Build a table from texture-space coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not hold one coordinate per landmark
    /// or a coordinate lies outside the unit square
    pub fn new(coords: Vec<Uv>) -> Result<Self> {
        if coords.len() != NUM_LANDMARKS {
            return Err(Error::TopologyError(format!(
                "Expected {} UV coordinates, got {}",
                NUM_LANDMARKS,
                coords.len()
            )));
        }
        if let Some(i) = coords
            .iter()
            .position(|uv| !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y))
        {
            return Err(Error::TopologyError(format!(
                "UV coordinate {i} outside the unit square: {:?}",
                coords[i]
            )));
        }
        Ok(Self { coords })
    }

    /// Load a UV table from a text file of `u v` pairs in image convention
    /// (`v` grows downwards), as face mesh models publish them
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the table is invalid
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading UV table from: {}", path.as_ref().display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let values = content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f32>()
                    .map_err(|_| Error::TopologyError(format!("Invalid UV value: {token}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if values.len() % 2 != 0 {
            return Err(Error::TopologyError(format!(
                "Expected UV pairs, got {} values",
                values.len()
            )));
        }

        Self::new(
            values
                .chunks_exact(2)
                .map(|pair| Uv::new(pair[0], 1.0 - pair[1]))
                .collect(),
        )
    }

    /// Coordinate for a landmark index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Uv> {
        self.coords.get(index).copied()
    }

    /// All coordinates in landmark order
    #[must_use]
    pub fn coords(&self) -> &[Uv] {
        &self.coords
    }

    /// Coordinates flattened into a renderer buffer
    #[must_use]
    pub fn to_buffer(&self) -> Vec<f32> {
        self.coords.iter().flat_map(|uv| [uv.x, uv.y]).collect()
    }
}

/// The built-in UV table, matching the ring layout of the built-in triangles
#[must_use]
pub fn default_uv() -> &'static UvTable {
    static TABLE: OnceLock<UvTable> = OnceLock::new();
    TABLE.get_or_init(|| UvTable {
        coords: ring_layout(),
    })
}

#[allow(clippy::cast_precision_loss)] // Ring sizes are small
fn ring_layout() -> Vec<Uv> {
    let mut coords = vec![Uv::new(0.5, 0.5); NUM_LANDMARKS];
    let rings = RING_SIZES.len() as f32;

    for (r, (&offset, &size)) in ring_offsets().iter().zip(&RING_SIZES).enumerate() {
        let t = (r + 1) as f32 / rings;
        for k in 0..size {
            let angle = TAU * k as f32 / size as f32;
            coords[offset + k] = Uv::new(
                0.5 + DEFAULT_LAYOUT_RADII.0 * t * angle.cos(),
                0.5 + DEFAULT_LAYOUT_RADII.1 * t * angle.sin(),
            );
        }
    }

    coords
}

/// Derive a UV table from the landmarks of one captured still frame.
///
/// Landmark `i` maps to `(x / width, 1 - y / height)`, clamped to the unit
/// square for points the detector placed outside the frame.
///
/// # Errors
///
/// Returns [`Error::InvalidCapture`] if either dimension is zero, the capture
/// holds no landmarks, or a landmark is not finite
#[allow(clippy::cast_precision_loss)] // Video dimensions are far below 2^24
pub fn calibrate_uv(captured: &[Landmark], video_width: u32, video_height: u32) -> Result<UvTable> {
    if video_width == 0 || video_height == 0 {
        return Err(Error::InvalidCapture(format!(
            "Video dimensions must be non-zero, got {video_width}x{video_height}"
        )));
    }
    if captured.len() != NUM_LANDMARKS {
        return Err(Error::InvalidCapture(format!(
            "Expected {} captured landmarks, got {}",
            NUM_LANDMARKS,
            captured.len()
        )));
    }
    if captured.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(Error::InvalidCapture("Captured landmarks are not finite".to_string()));
    }

    let (w, h) = (video_width as f32, video_height as f32);
    let coords = captured
        .iter()
        .map(|p| Uv::new((p.x / w).clamp(0.0, 1.0), (1.0 - p.y / h).clamp(0.0, 1.0)))
        .collect();

    Ok(UvTable { coords })
}

/// Holder of the UV table shared by all mesh slots
#[derive(Debug, Clone)]
pub struct UvStore {
    current: Arc<UvTable>,
    revision: u64,
}

impl Default for UvStore {
    fn default() -> Self {
        Self::new(default_uv().clone())
    }
}

impl UvStore {
    /// Create a store holding the given table
    #[must_use]
    pub fn new(table: UvTable) -> Self {
        Self {
            current: Arc::new(table),
            revision: 0,
        }
    }

    /// The active table
    #[must_use]
    pub fn current(&self) -> Arc<UvTable> {
        Arc::clone(&self.current)
    }

    /// Bumped every time the table is replaced
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap in a new table, returning the new revision
    pub fn replace(&mut self, table: UvTable) -> u64 {
        self.current = Arc::new(table);
        self.revision += 1;
        self.revision
    }

    /// Calibrate from a capture and swap the result in.
    ///
    /// On failure the active table and revision are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapture`] if there is no capture or it is unusable
    pub fn calibrate(
        &mut self,
        captured: Option<&[Landmark]>,
        video_width: u32,
        video_height: u32,
    ) -> Result<u64> {
        let captured =
            captured.ok_or_else(|| Error::InvalidCapture("Capture produced no detections".to_string()))?;
        let table = calibrate_uv(captured, video_width, video_height)?;
        Ok(self.replace(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn grid_capture(width: f32, height: f32) -> Vec<Landmark> {
        (0..NUM_LANDMARKS)
            .map(|i| {
                let t = i as f32 / NUM_LANDMARKS as f32;
                Point3::new(t * width, (1.0 - t) * height, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_default_uv_in_unit_square() {
        let table = default_uv();
        assert_eq!(table.coords().len(), NUM_LANDMARKS);
        assert!(UvTable::new(table.coords().to_vec()).is_ok());
        assert_eq!(table.get(0).unwrap(), Uv::new(0.5, 0.5));
    }

    #[test]
    fn test_calibrate_formula() {
        let capture = grid_capture(640.0, 480.0);
        let table = calibrate_uv(&capture, 640, 480).unwrap();
        for (p, uv) in capture.iter().zip(table.coords()) {
            assert!((uv.x - p.x / 640.0).abs() < 1e-6);
            assert!((uv.y - (1.0 - p.y / 480.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_calibrate_is_idempotent() {
        let capture = grid_capture(500.0, 500.0);
        let first = calibrate_uv(&capture, 500, 500).unwrap();
        let second = calibrate_uv(&capture, 500, 500).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_calibrate_clamps_out_of_frame() {
        let mut capture = grid_capture(100.0, 100.0);
        capture[0] = Point3::new(-20.0, 150.0, 0.0);
        let table = calibrate_uv(&capture, 100, 100).unwrap();
        assert_eq!(table.get(0).unwrap(), Uv::new(0.0, 0.0));
    }

    #[test]
    fn test_calibrate_rejects_bad_capture() {
        let capture = grid_capture(100.0, 100.0);
        assert!(matches!(calibrate_uv(&capture, 0, 100), Err(Error::InvalidCapture(_))));
        assert!(matches!(calibrate_uv(&capture, 100, 0), Err(Error::InvalidCapture(_))));
        assert!(matches!(calibrate_uv(&[], 100, 100), Err(Error::InvalidCapture(_))));

        let mut nan = capture;
        nan[5].x = f32::NAN;
        assert!(matches!(calibrate_uv(&nan, 100, 100), Err(Error::InvalidCapture(_))));
    }

    #[test]
    fn test_store_keeps_table_on_failure() {
        let mut store = UvStore::default();
        let before = store.current();

        assert!(store.calibrate(None, 100, 100).is_err());
        let capture = grid_capture(100.0, 100.0);
        assert!(store.calibrate(Some(&capture), 0, 100).is_err());

        assert_eq!(*store.current(), *before);
        assert_eq!(store.revision(), 0);

        assert_eq!(store.calibrate(Some(&capture), 100, 100).unwrap(), 1);
        assert_ne!(*store.current(), *before);
    }

    #[test]
    fn test_replacement_leaves_old_snapshot_intact() {
        let mut store = UvStore::default();
        let snapshot = store.current();
        let capture = grid_capture(100.0, 100.0);
        store.calibrate(Some(&capture), 100, 100).unwrap();
        assert_eq!(*snapshot, *default_uv());
    }

    #[test]
    fn test_parse_flips_v() {
        let content = (0..NUM_LANDMARKS).map(|_| "0.25 0.75").collect::<Vec<_>>().join("\n");
        let table = UvTable::parse(&content).unwrap();
        assert_eq!(table.get(10).unwrap(), Uv::new(0.25, 0.25));

        assert!(UvTable::parse("0.1 0.2 0.3").is_err());
        assert!(UvTable::parse("0.1 0.2").is_err());
        assert!(UvTable::parse("a b").is_err());
    }

    #[test]
    fn test_to_buffer_interleaves() {
        let buffer = default_uv().to_buffer();
        assert_eq!(buffer.len(), NUM_LANDMARKS * 2);
        assert_eq!(buffer[0], 0.5);
        assert_eq!(buffer[1], 0.5);
    }
}
