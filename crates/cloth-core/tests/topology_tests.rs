use cloth_core::mesh::ClothMesh;
use cloth_core::topology::Topology;
use glam::{Affine3A, Vec3};

/// Two triangles sharing an edge, with the shared edge split along a seam:
/// vertices 3 and 4 duplicate 1 and 2.
fn seamed_quad() -> (Vec<Vec3>, Vec<u32>) {
    let vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
    ];
    let triangles = vec![0, 2, 1, 3, 4, 5];
    (vertices, triangles)
}

#[test]
fn test_welds_coincident_vertices() {
    let (vertices, triangles) = seamed_quad();
    let topo = Topology::build(&vertices, &triangles, Affine3A::IDENTITY);

    assert_eq!(topo.vertex_count(), 6);
    assert_eq!(topo.particle_count(), 4);
    assert_eq!(topo.vertex_to_particle(), &[0, 1, 2, 1, 2, 3]);
    assert_eq!(topo.particle_vertices(1), &[1, 3]);
    assert_eq!(topo.particle_vertices(3), &[5]);
    assert_eq!(topo.triangles(), &[0, 2, 1, 1, 2, 3]);
}

#[test]
fn test_two_constraints_per_edge_incidence() {
    let (vertices, triangles) = seamed_quad();
    let topo = Topology::build(&vertices, &triangles, Affine3A::IDENTITY);

    // 2 triangles * 3 corners * 2 neighbours.
    assert_eq!(topo.constraints().len(), 12);

    // The shared edge 1-2 is registered once by each triangle from each end.
    let shared = topo
        .constraints()
        .iter()
        .filter(|c| (c.i, c.j) == (1, 2) || (c.i, c.j) == (2, 1))
        .count();
    assert_eq!(shared, 4);

    for p in 0..topo.particle_count() {
        for c in topo.constraints_of(p) {
            assert_eq!(c.i as usize, p, "constraint grouped under wrong owner");
            assert_ne!(c.i, c.j, "self-constraint");
        }
    }
}

#[test]
fn test_neighbour_registration_order() {
    let (vertices, triangles) = seamed_quad();
    let topo = Topology::build(&vertices, &triangles, Affine3A::IDENTITY);

    // Corner order within each triangle: next corner, then the one after.
    let n0: Vec<u32> = topo.neighbours(0).collect();
    assert_eq!(n0, vec![2, 1]);
    let n1: Vec<u32> = topo.neighbours(1).collect();
    assert_eq!(n1, vec![0, 2, 2, 3]);
}

#[test]
fn test_rest_lengths_measured_in_world_space() {
    let (vertices, triangles) = seamed_quad();
    let transform = Affine3A::from_scale(Vec3::splat(2.0));
    let topo = Topology::build(&vertices, &triangles, transform);

    for c in topo.constraints() {
        let a = vertices[topo.particle_vertices(c.i as usize)[0] as usize];
        let b = vertices[topo.particle_vertices(c.j as usize)[0] as usize];
        let expected = (a - b).length() * 2.0;
        assert!(
            (c.rest_length - expected).abs() < 1e-6,
            "rest {} expected {expected}",
            c.rest_length
        );
    }
    assert_eq!(topo.rest_positions()[3], Vec3::new(2.0, 0.0, 2.0));
}

#[test]
fn test_degenerate_triangle_after_welding() {
    // Vertex 2 duplicates vertex 1, so the triangle collapses to an edge.
    let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::X];
    let topo = Topology::build(&vertices, &[0, 1, 2], Affine3A::IDENTITY);

    assert_eq!(topo.particle_count(), 2);
    assert_eq!(topo.degenerate_triangles(), 1);
    assert!(topo.constraints().iter().all(|c| c.i != c.j));
    // Corners 1 and 2 each reach particle 0 once, corner 0 reaches 1 twice.
    assert_eq!(topo.constraints().len(), 4);
}

#[test]
fn test_grid_interior_vertex_degree() {
    let mesh = ClothMesh::grid(4, 4, 0.5);
    let topo = Topology::build(&mesh.vertices, &mesh.triangles, Affine3A::IDENTITY);

    assert_eq!(topo.particle_count(), 16);
    assert_eq!(topo.degenerate_triangles(), 0);
    // Interior vertices sit in six triangles.
    assert_eq!(topo.constraints_of(5).len(), 12);
    assert_eq!(topo.constraints().len(), 9 * 2 * 6);
}

#[test]
fn test_mesh_without_triangles_has_no_constraints() {
    let vertices = vec![Vec3::ZERO, Vec3::ONE];
    let topo = Topology::build(&vertices, &[], Affine3A::IDENTITY);
    assert_eq!(topo.particle_count(), 2);
    assert!(topo.constraints().is_empty());
    assert!(topo.constraints_of(1).is_empty());
}
