//! Static mesh connectivity over landmark indices.
//!
//! The built-in table is a canonical ring lattice: landmark 0 sits at the
//! centre of the face and the remaining 467 landmarks are laid out on
//! concentric rings, each ring stitched to the next. Deployments that ship the
//! detector's own tesselation load it with [`TopologyTable::from_file`]; both
//! go through the same validation.

use crate::{constants::NUM_LANDMARKS, Error, Result};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Ordered triple of landmark indices
pub type Triangle = [usize; 3];

/// Vertex count of each concentric ring around the centre landmark
pub const RING_SIZES: [usize; 12] = [6, 12, 18, 24, 30, 36, 42, 48, 54, 60, 66, 71];

/// Index of the first landmark on each ring
#[must_use]
pub fn ring_offsets() -> [usize; RING_SIZES.len()] {
    let mut offsets = [0; RING_SIZES.len()];
    let mut next = 1;
    for (offset, size) in offsets.iter_mut().zip(RING_SIZES) {
        *offset = next;
        next += size;
    }
    offsets
}

/// Triangle list shared by every mesh slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyTable {
    triangles: Vec<Triangle>,
    vertex_count: usize,
}

impl TopologyTable {
    /// Build a table, checking every triangle against the vertex count
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A triangle references an index outside `[0, vertex_count)`
    /// - A triangle repeats an index
    /// - Some vertex is not referenced by any triangle
    pub fn new(triangles: Vec<Triangle>, vertex_count: usize) -> Result<Self> {
        let mut covered = vec![false; vertex_count];

        for (n, triangle) in triangles.iter().enumerate() {
            let [a, b, c] = *triangle;
            if let Some(&bad) = triangle.iter().find(|&&i| i >= vertex_count) {
                return Err(Error::TopologyError(format!(
                    "Triangle {n} references index {bad}, vertex count is {vertex_count}"
                )));
            }
            if a == b || b == c || a == c {
                return Err(Error::TopologyError(format!(
                    "Triangle {n} repeats an index: {triangle:?}"
                )));
            }
            for &i in triangle {
                covered[i] = true;
            }
        }

        if let Some(orphan) = covered.iter().position(|&c| !c) {
            return Err(Error::TopologyError(format!(
                "Vertex {orphan} is not covered by any triangle"
            )));
        }

        Ok(Self {
            triangles,
            vertex_count,
        })
    }

    /// Load a triangle list of 468-landmark indices from a text file
    ///
    /// Indices may be separated by whitespace or commas; every three indices
    /// form one triangle.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, holds a non-integer token,
    /// has a count that is not a multiple of three, or fails validation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading triangle table from: {}", path.as_ref().display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let indices = content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<usize>()
                    .map_err(|_| Error::TopologyError(format!("Invalid triangle index: {token}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(Error::TopologyError(format!(
                "Expected a non-empty multiple of 3 indices, got {}",
                indices.len()
            )));
        }

        let triangles = indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
        Self::new(triangles, NUM_LANDMARKS)
    }

    /// Triangles in table order
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of vertices the table spans
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of triangles
    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the table holds no triangles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle indices flattened into a renderer index buffer
    #[must_use]
    pub fn index_buffer(&self) -> Vec<u32> {
        self.triangles
            .iter()
            .flatten()
            .map(|&i| u32::try_from(i).unwrap_or(u32::MAX))
            .collect()
    }
}

/// The built-in triangle table
#[must_use]
pub fn build_triangles() -> &'static TopologyTable {
    static TABLE: OnceLock<TopologyTable> = OnceLock::new();
    TABLE.get_or_init(|| TopologyTable {
        triangles: ring_lattice(),
        vertex_count: NUM_LANDMARKS,
    })
}

/// Fan the centre to the first ring, then zip each ring to the next
fn ring_lattice() -> Vec<Triangle> {
    let offsets = ring_offsets();
    let mut triangles = Vec::new();

    let first = RING_SIZES[0];
    for k in 0..first {
        triangles.push([0, offsets[0] + k, offsets[0] + (k + 1) % first]);
    }

    for r in 0..RING_SIZES.len() - 1 {
        zip_rings(
            offsets[r],
            RING_SIZES[r],
            offsets[r + 1],
            RING_SIZES[r + 1],
            &mut triangles,
        );
    }

    triangles
}

/// Stitch an inner ring to an outer ring, walking both by angle.
///
/// Vertex `i` of a ring with `n` vertices sits at angle `i / n` of a turn.
/// Produces `inner_len + outer_len` triangles, all counter-clockwise.
fn zip_rings(
    inner: usize,
    inner_len: usize,
    outer: usize,
    outer_len: usize,
    triangles: &mut Vec<Triangle>,
) {
    let a = |i: usize| inner + i % inner_len;
    let b = |j: usize| outer + j % outer_len;
    let (mut i, mut j) = (0, 0);

    while i < inner_len || j < outer_len {
        // (i + 1) / inner_len <= (j + 1) / outer_len, in integers
        let advance_inner = j == outer_len || (i < inner_len && (i + 1) * outer_len <= (j + 1) * inner_len);
        if advance_inner {
            triangles.push([a(i), b(j), a(i + 1)]);
            i += 1;
        } else {
            triangles.push([a(i), b(j), b(j + 1)]);
            j += 1;
        }
    }
}
