#![warn(missing_docs)]

//! Triangle surface meshes for muscle measurement.
//!
//! A [`TriangleMesh`] holds the flat vertex and index buffers decoded from a
//! segmentation export. It is validated once at construction and immutable
//! afterwards, so every face index can be trusted by the measurement code.
//!
//! # Example
//!
//! ```ignore
//! use myo_mesh::{MeshLoader, StlLoader};
//!
//! let mesh = StlLoader.load("FRE01/MRI/r_vasmed.stl".as_ref())?;
//! println!("{} triangles", mesh.num_triangles());
//! ```

pub mod error;
pub mod io;
pub mod primitives;

pub use error::{MeshError, MeshResult};
pub use io::{load_stl, write_stl, MeshLoader, StlLoader};

use myo_math::Point3;

/// Position key used to weld coincident vertices: coordinates quantized to
/// a tolerance grid.
pub type VertexKey = (i64, i64, i64);

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from flat buffers, checking that every face references
    /// an existing vertex and every coordinate is finite.
    pub fn from_buffers(vertices: Vec<f32>, indices: Vec<u32>) -> MeshResult<Self> {
        if vertices.len() % 3 != 0 {
            return Err(MeshError::MalformedBuffer {
                details: format!("{} coordinates is not a multiple of 3", vertices.len()),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::MalformedBuffer {
                details: format!("{} indices is not a multiple of 3", indices.len()),
            });
        }

        if let Some(pos) = vertices.iter().position(|c| !c.is_finite()) {
            return Err(MeshError::NonFiniteCoordinate { vertex: pos / 3 });
        }

        let vertex_count = vertices.len() / 3;
        if let Some(pos) = indices.iter().position(|&i| i as usize >= vertex_count) {
            return Err(MeshError::InvalidIndex {
                face: pos / 3,
                index: indices[pos],
                vertex_count,
            });
        }

        Ok(Self { vertices, indices })
    }

    /// Flat vertex buffer.
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Flat index buffer.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True when the mesh has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Position of vertex `i`, widened to `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_vertices()`.
    pub fn vertex(&self, i: usize) -> Point3 {
        Point3::new(
            self.vertices[i * 3] as f64,
            self.vertices[i * 3 + 1] as f64,
            self.vertices[i * 3 + 2] as f64,
        )
    }

    /// Iterate over all vertex positions in index order.
    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        (0..self.num_vertices()).map(|i| self.vertex(i))
    }

    /// Vertex indices of triangle `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= self.num_triangles()`.
    pub fn triangle_indices(&self, t: usize) -> [usize; 3] {
        [
            self.indices[t * 3] as usize,
            self.indices[t * 3 + 1] as usize,
            self.indices[t * 3 + 2] as usize,
        ]
    }

    /// Corner positions of triangle `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= self.num_triangles()`.
    pub fn triangle(&self, t: usize) -> [Point3; 3] {
        self.triangle_indices(t).map(|i| self.vertex(i))
    }

    /// Iterate over all triangles as corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.num_triangles()).map(|t| self.triangle(t))
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut points = self.points();
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Welding key of vertex `i` on a grid of spacing `tolerance`.
    ///
    /// Vertices with bit-identical coordinates always share a key, so meshes
    /// that repeat positions per face still expose their connectivity.
    pub fn vertex_key(&self, i: usize, tolerance: f64) -> VertexKey {
        let scale = 1.0 / tolerance;
        let p = self.vertex(i);
        (
            (p.x * scale).round() as i64,
            (p.y * scale).round() as i64,
            (p.z * scale).round() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_buffers(
            vec![
                0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 5.0, 10.0, 0.0, 5.0, 5.0, 10.0,
            ],
            vec![0, 1, 3, 1, 2, 3, 2, 0, 3, 0, 2, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_and_access() {
        let mesh = tetrahedron();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 4);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertex(3), Point3::new(5.0, 5.0, 10.0));
        assert_eq!(mesh.triangle_indices(1), [1, 2, 3]);
        assert_eq!(mesh.triangles().count(), 4);
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let err = TriangleMesh::from_buffers(vec![0.0; 9], vec![0, 1, 3]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidIndex {
                face: 0,
                index: 3,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_buffers() {
        assert!(matches!(
            TriangleMesh::from_buffers(vec![0.0; 8], vec![]),
            Err(MeshError::MalformedBuffer { .. })
        ));
        assert!(matches!(
            TriangleMesh::from_buffers(vec![0.0; 9], vec![0, 1]),
            Err(MeshError::MalformedBuffer { .. })
        ));
        assert!(matches!(
            TriangleMesh::from_buffers(vec![0.0, 0.0, 0.0, 1.0, f32::NAN, 0.0], vec![]),
            Err(MeshError::NonFiniteCoordinate { vertex: 1 })
        ));
    }

    #[test]
    fn test_bounds() {
        let mesh = tetrahedron();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(10.0, 10.0, 10.0));
        assert!(TriangleMesh::new().bounds().is_none());
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = tetrahedron();
        mesh.merge(&tetrahedron());
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_triangles(), 8);
        assert_eq!(mesh.triangle_indices(4), [4, 5, 7]);
    }

    #[test]
    fn test_vertex_key_welds_duplicates() {
        let mesh = TriangleMesh::from_buffers(
            vec![1.5, 2.0, 3.0, 1.5, 2.0, 3.0, 1.5, 2.0, 3.1],
            vec![],
        )
        .unwrap();
        assert_eq!(mesh.vertex_key(0, 1e-6), mesh.vertex_key(1, 1e-6));
        assert_ne!(mesh.vertex_key(0, 1e-6), mesh.vertex_key(2, 1e-6));
    }
}
