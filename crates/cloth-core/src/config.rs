use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ClothError, ClothResult};
use crate::grid::MIN_BUCKET_SIZE;

/// Geometric test used to push cloth particles out of the collider.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionModel {
    /// Static particle against a static sample sphere.
    PointToPoint,
    /// Particle motion segment against a static sample sphere.
    PointToSegment,
    /// Particle motion segment against the sample's motion segment.
    #[default]
    SegmentToSegment,
}

/// Integration timestep policy.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timestep {
    /// Always integrate with this step, ignoring the frame delta.
    Fixed(f32),
    /// Integrate with the frame delta passed to `step`.
    #[default]
    Variable,
}

impl Timestep {
    #[inline]
    pub fn resolve(self, frame_dt: f32) -> f32 {
        match self {
            Timestep::Fixed(h) => h,
            Timestep::Variable => frame_dt,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Fraction of last step's velocity kept by Verlet integration, in [0, 1].
    pub damping: f32,
    /// Constraint deviation ignored by relaxation, in [0, 1]. Lower is stiffer.
    pub tolerance: f32,
    pub gravity: Vec3,
    pub ground_level: f32,
    /// Particles closer than this to the ground are snapped onto it.
    pub ground_epsilon: f32,
    /// Relaxation iterations per step.
    pub iterations: u32,
    /// Edge length of a collider index cell. Keep >= 2 * collision_radius.
    pub bucket_size: f32,
    pub collision_radius: f32,
    /// Slack added to the collision radius when testing contact.
    pub collision_epsilon: f32,
    /// Displacements shorter than this are ignored.
    pub displacement_threshold: f32,
    pub collision_model: CollisionModel,
    pub timestep: Timestep,
    /// Vertices whose lock marker is at or above this are pinned to the anchor.
    pub lock_threshold: f32,
    /// Seconds a velocity reset request stays armed.
    pub velocity_reset_hold: f32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            damping: 0.99,
            tolerance: 0.1,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            ground_level: 0.0,
            ground_epsilon: 0.01,
            iterations: 50,
            bucket_size: 1.0,
            collision_radius: 0.1,
            collision_epsilon: 0.01,
            displacement_threshold: 0.001,
            collision_model: CollisionModel::SegmentToSegment,
            timestep: Timestep::Variable,
            lock_threshold: 0.5,
            velocity_reset_hold: 0.1,
        }
    }
}

impl ClothConfig {
    pub fn validate(&self) -> ClothResult<()> {
        let finite = [
            ("damping", self.damping),
            ("tolerance", self.tolerance),
            ("gravity.x", self.gravity.x),
            ("gravity.y", self.gravity.y),
            ("gravity.z", self.gravity.z),
            ("ground_level", self.ground_level),
            ("ground_epsilon", self.ground_epsilon),
            ("bucket_size", self.bucket_size),
            ("collision_radius", self.collision_radius),
            ("collision_epsilon", self.collision_epsilon),
            ("displacement_threshold", self.displacement_threshold),
            ("lock_threshold", self.lock_threshold),
            ("velocity_reset_hold", self.velocity_reset_hold),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite, got {value}")));
        }

        if !(0.0..=1.0).contains(&self.damping) {
            return Err(invalid(format!("damping must be in [0, 1], got {}", self.damping)));
        }
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(invalid(format!(
                "tolerance must be in [0, 1], got {}",
                self.tolerance
            )));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations must be at least 1".to_owned()));
        }
        if self.bucket_size < MIN_BUCKET_SIZE {
            return Err(invalid(format!(
                "bucket_size must be at least {MIN_BUCKET_SIZE}, got {}",
                self.bucket_size
            )));
        }
        if self.collision_radius < 0.0 {
            return Err(invalid(format!(
                "collision_radius must be non-negative, got {}",
                self.collision_radius
            )));
        }
        if self.ground_epsilon < 0.0 || self.collision_epsilon < 0.0 {
            return Err(invalid("epsilons must be non-negative".to_owned()));
        }
        if self.displacement_threshold < 0.0 {
            return Err(invalid("displacement_threshold must be non-negative".to_owned()));
        }
        if self.velocity_reset_hold < 0.0 {
            return Err(invalid("velocity_reset_hold must be non-negative".to_owned()));
        }
        if let Timestep::Fixed(h) = self.timestep {
            if !(h.is_finite() && h > 0.0) {
                return Err(invalid(format!("fixed timestep must be positive, got {h}")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ClothError {
    ClothError::InvalidConfig(msg)
}
