//! Error types for mesh construction and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or constructing a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    IoRead {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The mesh file could not be written.
    #[error("failed to write {path}: {source}")]
    IoWrite {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file contents are not a valid mesh.
    #[error("failed to parse {path}: {details}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser message.
        details: String,
    },

    /// The file parsed but holds no triangles.
    #[error("mesh is empty: {details}")]
    EmptyMesh {
        /// What was missing.
        details: String,
    },

    /// Vertex or index buffer has an impossible length.
    #[error("malformed buffer: {details}")]
    MalformedBuffer {
        /// What was wrong.
        details: String,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but mesh has {vertex_count} vertices")]
    InvalidIndex {
        /// Face number.
        face: usize,
        /// Offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Vertex number.
        vertex: usize,
    },
}

/// Result type for mesh operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;
