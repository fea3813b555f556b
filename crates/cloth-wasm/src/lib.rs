use cloth_core::{
    ClothConfig, ClothMesh, ClothSolver, ColliderSample, ColliderSampler, CollisionModel,
};
use glam::{Affine3A, Mat4, Vec3};
use wasm_bindgen::prelude::*;

/// GPU-compatible vertex: 24 bytes, matches the render pipeline's
/// position + normal vertex layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    position: [f32; 3], // 12 bytes
    normal: [f32; 3],   // 12 bytes
}

#[wasm_bindgen]
pub struct ClothWorld {
    solver: ClothSolver,
    sampler: ColliderSampler,
    samples: Vec<ColliderSample>,
    gpu_buffer: Vec<GpuVertex>,
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn vec3s(flat: &[f32]) -> Result<&[Vec3], JsValue> {
    bytemuck::try_cast_slice(flat)
        .map_err(|_| JsValue::from_str("expected a flat array of xyz triples"))
}

fn affine(cols: &[f32]) -> Result<Affine3A, JsValue> {
    let cols: &[f32; 16] = cols
        .try_into()
        .map_err(|_| JsValue::from_str("expected a 16-element column-major matrix"))?;
    Ok(Affine3A::from_mat4(Mat4::from_cols_array(cols)))
}

#[wasm_bindgen]
impl ClothWorld {
    /// `vertices` and `normals` are flat xyz arrays in the cloth object's
    /// local space; `lock_markers` has one value per vertex when present.
    #[wasm_bindgen(constructor)]
    pub fn new(
        vertices: &[f32],
        triangles: Vec<u32>,
        normals: &[f32],
        lock_markers: Option<Vec<f32>>,
    ) -> Result<ClothWorld, JsValue> {
        let mut mesh = ClothMesh::new(vec3s(vertices)?.to_vec(), triangles, vec3s(normals)?.to_vec());
        mesh.lock_markers = lock_markers;

        let config = ClothConfig::default();
        let sampler = ColliderSampler::new(config.collision_radius);
        let solver = ClothSolver::new(&mesh, config, Affine3A::IDENTITY, Affine3A::IDENTITY)
            .map_err(js_error)?;

        web_sys::console::log_1(
            &format!(
                "WASM ClothWorld created: {} vertices, {} particles",
                solver.topology().vertex_count(),
                solver.topology().particle_count()
            )
            .into(),
        );

        let gpu_buffer = vec![
            GpuVertex {
                position: [0.0; 3],
                normal: [0.0; 3],
            };
            mesh.vertex_count()
        ];
        let mut world = ClothWorld {
            solver,
            sampler,
            samples: Vec::new(),
            gpu_buffer,
        };
        world.write_gpu_output();
        Ok(world)
    }

    /// Advance one frame against the last body surface set. Returns the
    /// time spent in milliseconds.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f32, now: f32) -> f32 {
        let start = js_sys::Date::now();
        self.solver.step(dt, now, &self.samples);
        self.write_gpu_output();
        let elapsed = js_sys::Date::now() - start;
        elapsed as f32
    }

    /// Advance one frame against prebuilt samples: 9 floats each
    /// (position, previous, normal), world space.
    #[wasm_bindgen]
    pub fn step_with_samples(&mut self, dt: f32, now: f32, samples: &[f32]) -> Result<u32, JsValue> {
        let samples: &[ColliderSample] = bytemuck::try_cast_slice(samples)
            .map_err(|_| JsValue::from_str("expected 9 floats per collider sample"))?;
        let report = self.solver.step(dt, now, samples);
        self.write_gpu_output();
        Ok(report.collided as u32)
    }

    /// This frame's body surface, world space. Consecutive calls with the
    /// same vertex count sweep each sample from its previous position.
    #[wasm_bindgen]
    pub fn set_body_surface(&mut self, positions: &[f32], normals: &[f32]) -> Result<(), JsValue> {
        let positions = vec3s(positions)?;
        let normals = vec3s(normals)?;
        self.samples = self.sampler.sample(positions, normals);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn clear_body(&mut self) {
        self.samples.clear();
        self.sampler.reset_previous();
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_ptr(&self) -> *const f32 {
        self.gpu_buffer.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_byte_length(&self) -> usize {
        self.gpu_buffer.len() * std::mem::size_of::<GpuVertex>()
    }

    #[wasm_bindgen]
    pub fn vertex_count(&self) -> usize {
        self.gpu_buffer.len()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.solver.topology().particle_count()
    }

    /// Cloth object pose as a column-major 4x4 matrix.
    #[wasm_bindgen]
    pub fn set_transform(&mut self, matrix: &[f32]) -> Result<(), JsValue> {
        self.solver.set_transform(affine(matrix)?).map_err(js_error)
    }

    /// Pose locked vertices follow, as a column-major 4x4 matrix.
    #[wasm_bindgen]
    pub fn set_anchor(&mut self, matrix: &[f32]) -> Result<(), JsValue> {
        self.solver.set_anchor(affine(matrix)?).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn set_damping(&mut self, damping: f32) {
        self.solver.set_damping(damping);
    }

    #[wasm_bindgen]
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.solver.set_tolerance(tolerance);
    }

    /// 0 = point-to-point, 1 = point-to-segment, anything else =
    /// segment-to-segment.
    #[wasm_bindgen]
    pub fn set_collision_config(
        &mut self,
        model: u32,
        radius: f32,
        bucket_size: f32,
        iterations: u32,
    ) -> Result<(), JsValue> {
        let config = ClothConfig {
            collision_model: match model {
                0 => CollisionModel::PointToPoint,
                1 => CollisionModel::PointToSegment,
                _ => CollisionModel::SegmentToSegment,
            },
            collision_radius: radius,
            bucket_size,
            iterations,
            ..self.solver.config().clone()
        };
        self.solver.set_config(config).map_err(js_error)?;
        self.sampler.set_radius(radius);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_ground(&mut self, level: f32, epsilon: f32) -> Result<(), JsValue> {
        let config = ClothConfig {
            ground_level: level,
            ground_epsilon: epsilon,
            ..self.solver.config().clone()
        };
        self.solver.set_config(config).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        let config = ClothConfig {
            gravity: Vec3::new(x, y, z),
            ..self.solver.config().clone()
        };
        self.solver.set_config(config).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.solver.reset();
        self.sampler.reset_previous();
        self.write_gpu_output();
    }

    /// Discard velocity for the configured hold time, e.g. after a teleport.
    #[wasm_bindgen]
    pub fn request_velocity_reset(&mut self, now: f32) {
        self.solver.request_velocity_reset(now);
        self.sampler.reset_previous();
    }
}

impl ClothWorld {
    fn write_gpu_output(&mut self) {
        let frame = self.solver.mesh_frame();
        for (out, (p, n)) in self
            .gpu_buffer
            .iter_mut()
            .zip(frame.positions.iter().zip(&frame.normals))
        {
            *out = GpuVertex {
                position: p.to_array(),
                normal: n.to_array(),
            };
        }
    }
}
