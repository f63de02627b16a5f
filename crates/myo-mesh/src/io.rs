//! Mesh file I/O.
//!
//! Loading goes through the [`MeshLoader`] capability so the batch runner can
//! be driven by any decoder; [`StlLoader`] is the default, backed by
//! `stl_io` (binary and ASCII STL).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use myo_math::Vec3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::TriangleMesh;

/// Something that can turn a file into a [`TriangleMesh`].
pub trait MeshLoader {
    /// Load the mesh stored at `path`.
    fn load(&self, path: &Path) -> MeshResult<TriangleMesh>;
}

/// STL decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlLoader;

impl MeshLoader for StlLoader {
    fn load(&self, path: &Path) -> MeshResult<TriangleMesh> {
        load_stl(path)
    }
}

/// Load mesh from STL file (binary or ASCII).
pub fn load_stl(path: &Path) -> MeshResult<TriangleMesh> {
    let file = File::open(path).map_err(|e| MeshError::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    // stl_io merges identical positions into an indexed vertex list
    let stl = stl_io::read_stl(&mut reader).map_err(|e| MeshError::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    debug!(
        path = %path.display(),
        vertices = stl.vertices.len(),
        triangles = stl.faces.len(),
        "decoded STL"
    );

    if stl.faces.is_empty() {
        return Err(MeshError::EmptyMesh {
            details: format!("{} contains no triangles", path.display()),
        });
    }

    let vertices: Vec<f32> = stl.vertices.iter().flat_map(|v| v.0).collect();
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        for &i in &face.vertices {
            let index = u32::try_from(i).map_err(|_| MeshError::MalformedBuffer {
                details: format!("vertex index {i} does not fit in 32 bits"),
            })?;
            indices.push(index);
        }
    }

    TriangleMesh::from_buffers(vertices, indices)
}

/// Save mesh to STL file (binary format).
pub fn write_stl(mesh: &TriangleMesh, path: &Path) -> MeshResult<()> {
    let file = File::create(path).map_err(|e| MeshError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|[v0, v1, v2]| {
            let n = (v1 - v0).cross(&(v2 - v0));
            let n = n.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [v0, v1, v2]
                    .map(|v| stl_io::Vertex::new([v.x as f32, v.y as f32, v.z as f32])),
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    writer.flush().map_err(|e| MeshError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), triangles = mesh.num_triangles(), "wrote STL");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use tempfile::tempdir;

    #[test]
    fn test_binary_stl_keeps_shared_vertices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("box.stl");
        let mesh = primitives::box_mesh([0.0, 0.0, 0.0], [10.0, 20.0, 30.0]);
        write_stl(&mesh, &path).unwrap();

        let loaded = StlLoader.load(&path).unwrap();
        assert_eq!(loaded.num_triangles(), 12);
        // 36 corners written, 8 positions after merging
        assert_eq!(loaded.num_vertices(), 8);
        assert_eq!(loaded.bounds(), mesh.bounds());
    }

    #[test]
    fn test_ascii_stl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tri.stl");
        std::fs::write(
            &path,
            "solid t\n\
             facet normal 0 0 1\n\
             outer loop\n\
             vertex 0 0 0\n\
             vertex 1 0 0\n\
             vertex 0 1 0\n\
             endloop\n\
             endfacet\n\
             endsolid t\n",
        )
        .unwrap();

        let loaded = load_stl(&path).unwrap();
        assert_eq!(loaded.num_triangles(), 1);
        assert_eq!(loaded.num_vertices(), 3);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_stl(Path::new("/definitely/not/here.stl")).unwrap_err();
        assert!(matches!(err, MeshError::IoRead { .. }));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.stl");
        std::fs::write(&path, b"this is not a mesh").unwrap();
        assert!(load_stl(&path).is_err());
    }
}
