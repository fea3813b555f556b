use glam::{Affine3A, Vec3};
use tracing::{debug, info, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::collider::ColliderSample;
use crate::config::ClothConfig;
use crate::constraints::contact::{resolve_body_collision, resolve_ground, CollisionParams};
use crate::constraints::distance::solve_distance_constraints;
use crate::error::{ClothError, ClothResult};
use crate::grid::ColliderIndex;
use crate::mesh::{ClothMesh, MeshFrame, MeshSink};
use crate::particle::ParticleSet;
use crate::topology::Topology;

/// Lifecycle of a [`ClothSolver`]. Construction is the only way in, so
/// there is no uninitialized state to observe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolverState {
    /// Built, not stepped yet (or reset).
    Initialized,
    Stepping,
}

/// Summary of one step.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StepReport {
    /// Collider samples indexed this step.
    pub samples: usize,
    /// Particles displaced by the body at least once.
    pub collided: usize,
}

/// Verlet cloth simulated against an animated point-cloud collider.
///
/// Each step integrates, runs `config.iterations` relaxation passes (distance
/// constraints, then ground and body collisions, per particle), and writes
/// the result back into the mesh frame.
pub struct ClothSolver {
    particles: ParticleSet,
    topology: Topology,
    config: ClothConfig,
    /// World from cloth-local.
    transform: Affine3A,
    inverse_transform: Affine3A,
    /// World from anchor space, for locked particles.
    anchor: Affine3A,
    frame: MeshFrame,
    state: SolverState,
    /// Simulation time until which integration discards velocity.
    velocity_reset_until: Option<f32>,
    /// Per-particle collided flag, reused across steps.
    collided: Vec<bool>,
}

impl ClothSolver {
    /// Build the particle arena and constraint graph from `mesh`.
    ///
    /// `transform` maps mesh-local positions to world space; `anchor` is the
    /// initial pose locked vertices follow.
    pub fn new(
        mesh: &ClothMesh,
        config: ClothConfig,
        transform: Affine3A,
        anchor: Affine3A,
    ) -> ClothResult<Self> {
        config.validate()?;
        mesh.validate()?;
        check_invertible("cloth transform", &transform)?;
        check_invertible("anchor transform", &anchor)?;

        let inverse_transform = transform.inverse();
        let topology = Topology::build(&mesh.vertices, &mesh.triangles, transform);

        // Normals map through the inverse transpose, exact under shear and
        // non-uniform scale.
        let normal_to_world = transform.matrix3.inverse().transpose();
        let rest_normals: Vec<Vec3> = (0..topology.particle_count())
            .map(|p| {
                let v = topology.particle_vertices(p)[0] as usize;
                normal_to_world.mul_vec3(mesh.normals[v]).normalize_or_zero()
            })
            .collect();
        let mut particles =
            ParticleSet::at_rest(topology.rest_positions(), &rest_normals, &inverse_transform);

        if let Some(markers) = &mesh.lock_markers {
            for (v, &marker) in markers.iter().enumerate() {
                let p = topology.vertex_to_particle()[v] as usize;
                if marker >= config.lock_threshold && !particles.locked[p] {
                    particles.pin(p, &anchor);
                }
            }
        }

        if topology.degenerate_triangles() > 0 {
            warn!(
                degenerate = topology.degenerate_triangles(),
                "mesh has triangles that collapse after welding"
            );
        }
        info!(
            vertices = topology.vertex_count(),
            particles = topology.particle_count(),
            constraints = topology.constraints().len(),
            locked = particles.locked_count(),
            "cloth solver created"
        );

        let count = particles.count;
        let mut solver = Self {
            particles,
            topology,
            config,
            transform,
            inverse_transform,
            anchor,
            frame: MeshFrame::with_vertex_count(mesh.vertex_count()),
            state: SolverState::Initialized,
            velocity_reset_until: None,
            collided: vec![false; count],
        };
        solver.update_mesh();
        Ok(solver)
    }

    /// Advance one frame against this frame's collider samples.
    ///
    /// `dt` is the frame delta in seconds, `now` the caller's monotonic
    /// simulation clock used by the velocity reset latch.
    pub fn step(&mut self, dt: f32, now: f32, samples: &[ColliderSample]) -> StepReport {
        let index = ColliderIndex::from_samples(samples, self.config.bucket_size);
        let collided = self.calculate_physics(dt, now, &index);
        self.update_mesh();

        trace!(samples = samples.len(), collided, "cloth step");
        StepReport {
            samples: samples.len(),
            collided,
        }
    }

    /// Integrate and relax against a prebuilt collider index. Returns the
    /// number of particles the body displaced.
    pub fn calculate_physics(&mut self, dt: f32, now: f32, index: &ColliderIndex) -> usize {
        self.state = SolverState::Stepping;

        let h = self.config.timestep.resolve(dt);
        let h = if h.is_finite() && h > 0.0 { h } else { 0.0 };

        let discard_velocity = match self.velocity_reset_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.velocity_reset_until = None;
                false
            }
            None => false,
        };

        self.integrate(h, discard_velocity);
        self.relax(index)
    }

    fn integrate(&mut self, h: f32, discard_velocity: bool) {
        let acceleration = self.config.gravity * (h * h);
        let damping = self.config.damping;
        let p = &mut self.particles;

        for i in 0..p.count {
            if p.locked[i] {
                let pinned = p.anchored_position(i, &self.anchor);
                p.position[i] = pinned;
                p.previous[i] = pinned;
                continue;
            }

            let driving = self.transform.transform_point3(p.local[i]);
            if discard_velocity {
                p.previous[i] = driving;
            }
            let velocity = driving - p.previous[i];
            p.position[i] = driving + velocity * damping + acceleration;
            p.previous[i] = driving;
        }
    }

    fn relax(&mut self, index: &ColliderIndex) -> usize {
        let params = CollisionParams::from(&self.config);
        let tolerance = self.config.tolerance;
        let ground_level = self.config.ground_level;
        let ground_epsilon = self.config.ground_epsilon;
        let iterations = self.config.iterations;
        let count = self.particles.count;

        self.collided.iter_mut().for_each(|c| *c = false);

        for s in 0..iterations {
            let last = s + 1 == iterations;
            for i in 0..count {
                let p = &mut self.particles;

                solve_distance_constraints(
                    self.topology.constraints_of(i),
                    &mut p.position,
                    &p.locked,
                    tolerance,
                );

                if !p.locked[i] {
                    resolve_ground(&mut p.position[i], ground_level, ground_epsilon);
                    if resolve_body_collision(&mut p.position[i], p.previous[i], index, &params) {
                        self.collided[i] = true;
                    }
                }

                if last {
                    self.recompute_normal(i);
                }
            }
        }

        self.collided.iter().filter(|&&c| c).count()
    }

    /// Normal from the edges to the first two registered neighbours. Keeps
    /// the old normal when there are fewer than two or they are collinear.
    fn recompute_normal(&mut self, i: usize) {
        let constraints = self.topology.constraints_of(i);
        if constraints.len() < 2 {
            return;
        }
        let pos = &self.particles.position;
        let t1 = pos[i];
        let t2 = pos[constraints[0].j as usize];
        let t3 = pos[constraints[1].j as usize];
        if let Some(n) = (-(t2 - t1).cross(t1 - t3)).try_normalize() {
            self.particles.normal[i] = n;
        }
    }

    /// Write particle positions and normals back to every welded vertex,
    /// in cloth-local space.
    pub fn update_mesh(&mut self) {
        let inverse = self.inverse_transform;
        let normal_to_local = self.transform.matrix3.transpose();
        let p = &mut self.particles;

        for i in 0..p.count {
            p.local[i] = inverse.transform_point3(p.position[i]);
        }

        let local = &p.local;
        let normal = &p.normal;
        let vertex_to_particle = self.topology.vertex_to_particle();
        let write = |(v, (out_pos, out_normal)): (usize, (&mut Vec3, &mut Vec3))| {
            let i = vertex_to_particle[v] as usize;
            *out_pos = local[i];
            *out_normal = normal_to_local.mul_vec3(normal[i]).normalize_or_zero();
        };

        #[cfg(feature = "parallel")]
        self.frame
            .positions
            .par_iter_mut()
            .zip(self.frame.normals.par_iter_mut())
            .enumerate()
            .for_each(write);

        #[cfg(not(feature = "parallel"))]
        self.frame
            .positions
            .iter_mut()
            .zip(self.frame.normals.iter_mut())
            .enumerate()
            .for_each(write);
    }

    /// Return every particle to its rest position and rewrite the mesh.
    /// Topology is untouched.
    pub fn reset(&mut self) {
        self.particles.reset();
        self.velocity_reset_until = None;
        self.state = SolverState::Initialized;
        self.update_mesh();
        debug!(particles = self.particles.count, "cloth reset to rest");
    }

    /// Treat the driving position as stationary until `now +
    /// velocity_reset_hold`, e.g. after an animation cut or a teleport of
    /// the cloth object. Supersedes any pending request.
    pub fn request_velocity_reset(&mut self, now: f32) {
        let until = now + self.config.velocity_reset_hold;
        self.velocity_reset_until = Some(until);
        debug!(until, "velocity reset armed");
    }

    pub fn velocity_reset_pending(&self) -> bool {
        self.velocity_reset_until.is_some()
    }

    /// Push the current mesh frame into an external sink.
    pub fn write_mesh<S: MeshSink + ?Sized>(&self, sink: &mut S) {
        sink.update_mesh(&self.frame.positions, &self.frame.normals);
    }

    pub fn mesh_frame(&self) -> &MeshFrame {
        &self.frame
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &ClothConfig {
        &self.config
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn transform(&self) -> Affine3A {
        self.transform
    }

    pub fn anchor(&self) -> Affine3A {
        self.anchor
    }

    /// Move the cloth object. Particles are carried along on the next step.
    pub fn set_transform(&mut self, transform: Affine3A) -> ClothResult<()> {
        check_invertible("cloth transform", &transform)?;
        self.transform = transform;
        self.inverse_transform = transform.inverse();
        Ok(())
    }

    pub fn set_anchor(&mut self, anchor: Affine3A) -> ClothResult<()> {
        check_invertible("anchor transform", &anchor)?;
        self.anchor = anchor;
        Ok(())
    }

    pub fn set_config(&mut self, config: ClothConfig) -> ClothResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_damping(&mut self, damping: f32) {
        if damping.is_finite() {
            self.config.damping = damping.clamp(0.0, 1.0);
        }
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        if tolerance.is_finite() {
            self.config.tolerance = tolerance.clamp(0.0, 1.0);
        }
    }
}

fn check_invertible(name: &str, t: &Affine3A) -> ClothResult<()> {
    let det = t.matrix3.determinant();
    if det.is_finite() && det != 0.0 && t.translation.is_finite() {
        Ok(())
    } else {
        Err(ClothError::InvalidConfig(format!("{name} is not invertible")))
    }
}
