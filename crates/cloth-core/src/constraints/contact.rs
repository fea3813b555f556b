use glam::Vec3;

use crate::collider::ColliderSample;
use crate::config::{ClothConfig, CollisionModel};
use crate::grid::ColliderIndex;
use crate::segment::{segment_distance, Segment};

/// Collision tunables, snapshotted from [`ClothConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionParams {
    pub model: CollisionModel,
    pub radius: f32,
    /// Slack added to `radius` in the contact test.
    pub epsilon: f32,
    /// Displacements no longer than this are ignored.
    pub threshold: f32,
}

impl From<&ClothConfig> for CollisionParams {
    fn from(config: &ClothConfig) -> Self {
        Self {
            model: config.collision_model,
            radius: config.collision_radius,
            epsilon: config.collision_epsilon,
            threshold: config.displacement_threshold,
        }
    }
}

/// Clamp a particle onto the ground plane when it is below
/// `ground_level + epsilon`.
#[inline]
pub fn resolve_ground(position: &mut Vec3, ground_level: f32, epsilon: f32) -> bool {
    if position.y < ground_level + epsilon {
        position.y = ground_level;
        true
    } else {
        false
    }
}

/// Displacement that pushes a particle moving `previous -> current` out of
/// one sample sphere, or `Vec3::ZERO` when they do not touch.
pub fn sample_displacement(
    current: Vec3,
    previous: Vec3,
    sample: &ColliderSample,
    params: &CollisionParams,
) -> Vec3 {
    let normal = sample.normal;
    let radius = params.radius;

    // Far enough outside along the sample's normal: cheap reject.
    if (current - sample.position).dot(normal) >= radius {
        return Vec3::ZERO;
    }

    let reach = radius + params.epsilon;
    match params.model {
        CollisionModel::PointToPoint => {
            let d = current - sample.position;
            if d.length() < reach {
                normal * (radius - d.dot(normal))
            } else {
                Vec3::ZERO
            }
        }
        CollisionModel::PointToSegment => {
            let (_, closest) = Segment::new(previous, current).closest_point(sample.position);
            let d = closest - sample.position;
            if d.length() < reach {
                normal * (radius - d.dot(normal))
            } else {
                Vec3::ZERO
            }
        }
        CollisionModel::SegmentToSegment => {
            let hit = segment_distance(sample.previous, sample.position, previous, current);
            // Closest approach, carried to where the sample is now.
            let diff = hit.closest[1] - hit.closest[0];
            if diff.length() < reach {
                let surface = sample.position + diff + normal * (radius - diff.dot(normal));
                surface - current
            } else {
                Vec3::ZERO
            }
        }
    }
}

/// Running mean of the per-sample displacements that count.
#[derive(Clone, Copy, Debug, Default)]
struct MeanDisplacement {
    sum: Vec3,
    count: u32,
}

impl MeanDisplacement {
    #[inline]
    fn add(&mut self, disp: Vec3, threshold: f32) {
        if disp.length() > threshold {
            self.sum += disp;
            self.count += 1;
        }
    }

    #[inline]
    fn mean(&self) -> Vec3 {
        if self.count > 0 {
            self.sum / self.count as f32
        } else {
            Vec3::ZERO
        }
    }
}

/// Combined displacement against a set of candidate samples: the mean of
/// every individual displacement longer than `params.threshold`.
pub fn body_displacement<'a, I>(
    current: Vec3,
    previous: Vec3,
    samples: I,
    params: &CollisionParams,
) -> Vec3
where
    I: IntoIterator<Item = &'a ColliderSample>,
{
    let mut acc = MeanDisplacement::default();
    for sample in samples {
        acc.add(sample_displacement(current, previous, sample, params), params.threshold);
    }
    acc.mean()
}

/// Push one particle out of the collider using the samples the index
/// returns around it. Returns whether the particle was displaced.
pub fn resolve_body_collision(
    position: &mut Vec3,
    previous: Vec3,
    index: &ColliderIndex,
    params: &CollisionParams,
) -> bool {
    if index.is_empty() {
        return false;
    }

    let current = *position;
    let mut acc = MeanDisplacement::default();
    index.query_neighbors(current, |sample| {
        acc.add(sample_displacement(current, previous, sample, params), params.threshold);
    });

    let disp = acc.mean();
    *position += disp;
    disp.length() > params.threshold
}
