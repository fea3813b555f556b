//! Setup-time errors.
//!
//! Stepping never fails; only malformed meshes and out-of-range configuration
//! are rejected, before any simulation state exists.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClothError {
    /// Mesh source has no vertices.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// Normal array length differs from the vertex array length.
    #[error("mesh has {vertices} vertices but {normals} normals")]
    MismatchedNormals { vertices: usize, normals: usize },

    /// Lock marker array length differs from the vertex array length.
    #[error("mesh has {vertices} vertices but {markers} lock markers")]
    MismatchedMarkers { vertices: usize, markers: usize },

    /// Triangle index buffer is malformed.
    #[error("invalid triangles: {0}")]
    InvalidTriangles(String),

    /// A vertex position is NaN or infinite.
    #[error("vertex {index} has a non-finite position")]
    NonFiniteVertex { index: usize },

    /// A configuration value is outside its domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ClothResult<T> = Result<T, ClothError>;
