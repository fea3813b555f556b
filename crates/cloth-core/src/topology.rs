//! Cloth topology built once from the source mesh.
//!
//! Vertices that share a position (UV or normal seams) are welded into one
//! particle. Every triangle corner registers the other two corners as
//! neighbours, so each undirected edge is stored once from each endpoint.

use fnv::FnvHashMap;
use glam::{Affine3A, Vec3};

use crate::constraints::distance::DistanceConstraint;

#[derive(Clone, Debug)]
pub struct Topology {
    /// Vertex index -> particle index.
    vertex_to_particle: Vec<u32>,
    /// Particle index -> welded vertex indices (CSR).
    vertex_start: Vec<u32>,
    particle_vertices: Vec<u32>,
    /// Triangle list re-indexed into particle space.
    triangles: Vec<u32>,
    /// Constraints grouped by owning particle, registration order kept (CSR).
    constraint_start: Vec<u32>,
    constraints: Vec<DistanceConstraint>,
    /// World-space particle positions the rest lengths were measured from.
    rest_positions: Vec<Vec3>,
    degenerate_triangles: usize,
}

impl Topology {
    /// Weld `vertices` (mesh local space) and derive the constraint graph.
    /// Rest lengths are measured in world space, after `transform`.
    ///
    /// Triangle indices must already be validated against `vertices`.
    pub fn build(vertices: &[Vec3], triangles: &[u32], transform: Affine3A) -> Self {
        // 1. Weld coincident vertices, particles in first-seen order
        let mut by_position: FnvHashMap<[u32; 3], u32> = FnvHashMap::default();
        let mut vertex_to_particle = Vec::with_capacity(vertices.len());
        let mut first_vertex = Vec::new();
        for (v, &pos) in vertices.iter().enumerate() {
            let next = first_vertex.len() as u32;
            let particle = *by_position.entry(position_key(pos)).or_insert_with(|| {
                first_vertex.push(v as u32);
                next
            });
            vertex_to_particle.push(particle);
        }
        let particle_count = first_vertex.len();

        let mut vertex_count = vec![0u32; particle_count];
        for &p in &vertex_to_particle {
            vertex_count[p as usize] += 1;
        }
        let vertex_start = prefix_sum(&vertex_count);
        let mut fill = vertex_start.clone();
        let mut particle_vertices = vec![0u32; vertices.len()];
        for (v, &p) in vertex_to_particle.iter().enumerate() {
            particle_vertices[fill[p as usize] as usize] = v as u32;
            fill[p as usize] += 1;
        }

        // 2. Re-index triangles
        let triangles: Vec<u32> = triangles
            .iter()
            .map(|&v| vertex_to_particle[v as usize])
            .collect();

        // 3. Rest configuration
        let rest_positions: Vec<Vec3> = first_vertex
            .iter()
            .map(|&v| transform.transform_point3(vertices[v as usize]))
            .collect();

        // 4. Neighbours: each corner registers the other two corners
        let mut neighbours: Vec<Vec<u32>> = vec![Vec::new(); particle_count];
        let mut degenerate_triangles = 0;
        for tri in triangles.chunks_exact(3) {
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                degenerate_triangles += 1;
            }
            for k in 0..3 {
                let owner = tri[k];
                for other in [tri[(k + 1) % 3], tri[(k + 2) % 3]] {
                    if other != owner {
                        neighbours[owner as usize].push(other);
                    }
                }
            }
        }

        let counts: Vec<u32> = neighbours.iter().map(|n| n.len() as u32).collect();
        let constraint_start = prefix_sum(&counts);
        let constraints = neighbours
            .iter()
            .enumerate()
            .flat_map(|(i, list)| {
                let rest_positions = &rest_positions;
                list.iter().map(move |&j| {
                    let rest = (rest_positions[i] - rest_positions[j as usize]).length();
                    DistanceConstraint::new(i as u32, j, rest)
                })
            })
            .collect();

        Self {
            vertex_to_particle,
            vertex_start,
            particle_vertices,
            triangles,
            constraint_start,
            constraints,
            rest_positions,
            degenerate_triangles,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.rest_positions.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_to_particle.len()
    }

    pub fn vertex_to_particle(&self) -> &[u32] {
        &self.vertex_to_particle
    }

    /// Vertices welded into `particle`; never empty.
    pub fn particle_vertices(&self, particle: usize) -> &[u32] {
        let start = self.vertex_start[particle] as usize;
        let end = self.vertex_start[particle + 1] as usize;
        &self.particle_vertices[start..end]
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// All constraints, grouped by owning particle.
    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    /// Constraints owned by `particle`, in registration order. `c.i` is
    /// always `particle`.
    pub fn constraints_of(&self, particle: usize) -> &[DistanceConstraint] {
        let start = self.constraint_start[particle] as usize;
        let end = self.constraint_start[particle + 1] as usize;
        &self.constraints[start..end]
    }

    pub fn neighbours(&self, particle: usize) -> impl Iterator<Item = u32> + '_ {
        self.constraints_of(particle).iter().map(|c| c.j)
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    /// Triangles that repeat a particle after welding.
    pub fn degenerate_triangles(&self) -> usize {
        self.degenerate_triangles
    }
}

/// Exact-position hash key; `-0.0` and `0.0` weld together.
#[inline]
fn position_key(p: Vec3) -> [u32; 3] {
    let p = p + Vec3::ZERO;
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

/// Exclusive prefix sum with a trailing total: `out.len() == counts.len() + 1`.
fn prefix_sum(counts: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0u32;
    out.push(0);
    for &c in counts {
        acc += c;
        out.push(acc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_zero_welds() {
        assert_eq!(
            position_key(Vec3::new(-0.0, 1.0, 0.0)),
            position_key(Vec3::new(0.0, 1.0, -0.0))
        );
    }

    #[test]
    fn test_prefix_sum() {
        assert_eq!(prefix_sum(&[2, 0, 3]), vec![0, 2, 2, 5]);
        assert_eq!(prefix_sum(&[]), vec![0]);
    }
}
