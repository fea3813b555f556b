//! Mesh data exchanged with the renderer.
//!
//! [`ClothMesh`] is what the simulation is built from; [`MeshFrame`] is what
//! it hands back after every step, one entry per source vertex, in the cloth
//! object's local space.

use glam::Vec3;

use crate::error::{ClothError, ClothResult};

/// Source mesh, in the cloth object's local space.
#[derive(Clone, Debug, Default)]
pub struct ClothMesh {
    pub vertices: Vec<Vec3>,
    /// Flat triangle list, three vertex indices per triangle.
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    /// Optional per-vertex paint channel; values at or above the configured
    /// threshold pin the vertex to the anchor.
    pub lock_markers: Option<Vec<f32>>,
}

impl ClothMesh {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<u32>, normals: Vec<Vec3>) -> Self {
        Self {
            vertices,
            triangles,
            normals,
            lock_markers: None,
        }
    }

    pub fn with_lock_markers(mut self, markers: Vec<f32>) -> Self {
        self.lock_markers = Some(markers);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn validate(&self) -> ClothResult<()> {
        let vertices = self.vertices.len();
        if vertices == 0 {
            return Err(ClothError::EmptyMesh);
        }
        if self.normals.len() != vertices {
            return Err(ClothError::MismatchedNormals {
                vertices,
                normals: self.normals.len(),
            });
        }
        if let Some(markers) = &self.lock_markers {
            if markers.len() != vertices {
                return Err(ClothError::MismatchedMarkers {
                    vertices,
                    markers: markers.len(),
                });
            }
        }
        if self.triangles.len() % 3 != 0 {
            return Err(ClothError::InvalidTriangles(format!(
                "index count {} is not a multiple of 3",
                self.triangles.len()
            )));
        }
        if let Some(&bad) = self.triangles.iter().find(|&&i| i as usize >= vertices) {
            return Err(ClothError::InvalidTriangles(format!(
                "index {bad} out of range for {vertices} vertices"
            )));
        }
        if let Some(index) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(ClothError::NonFiniteVertex { index });
        }
        Ok(())
    }

    /// Flat grid of `cols x rows` vertices in the local XZ plane, two
    /// triangles per quad.
    pub fn grid(cols: usize, rows: usize, spacing: f32) -> Self {
        let cols = cols.max(2);
        let rows = rows.max(2);
        let mut vertices = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                vertices.push(Vec3::new(c as f32 * spacing, 0.0, r as f32 * spacing));
            }
        }

        let mut triangles = Vec::with_capacity((cols - 1) * (rows - 1) * 6);
        for r in 0..rows - 1 {
            for c in 0..cols - 1 {
                let i = (r * cols + c) as u32;
                let right = i + 1;
                let down = i + cols as u32;
                let diag = down + 1;
                triangles.extend_from_slice(&[i, down, right, right, down, diag]);
            }
        }

        let normals = vec![Vec3::Y; vertices.len()];
        Self::new(vertices, triangles, normals)
    }
}

/// Receives updated vertex data after each step.
pub trait MeshSink {
    fn update_mesh(&mut self, positions: &[Vec3], normals: &[Vec3]);
}

/// Per-vertex positions and normals, in the cloth object's local space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshFrame {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl MeshFrame {
    pub fn with_vertex_count(count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; count],
            normals: vec![Vec3::ZERO; count],
        }
    }
}

impl MeshSink for MeshFrame {
    fn update_mesh(&mut self, positions: &[Vec3], normals: &[Vec3]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        self.normals.clear();
        self.normals.extend_from_slice(normals);
    }
}
