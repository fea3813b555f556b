use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One point on the colliding body's surface for the current frame.
///
/// 36 bytes, `#[repr(C)]` so flat `f32` buffers can be cast directly.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColliderSample {
    /// Sphere centre this frame.
    pub position: Vec3,
    /// Sphere centre last frame (start of the sweep).
    pub previous: Vec3,
    /// Outward unit surface normal.
    pub normal: Vec3,
}

impl ColliderSample {
    pub fn new(position: Vec3, previous: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            previous,
            normal,
        }
    }

    /// Sample that did not move since last frame.
    pub fn stationary(position: Vec3, normal: Vec3) -> Self {
        Self::new(position, position, normal)
    }
}

/// Builds per-frame collider samples from an animated body's surface.
///
/// Each surface vertex becomes a sphere of `radius` sunk along its normal so
/// the sphere touches the surface at the vertex. Slot `i` remembers the centre
/// it emitted last frame, which becomes the sample's `previous` this frame.
pub struct ColliderSampler {
    radius: f32,
    previous: Vec<Vec3>,
    /// When set, the next frame treats every slot as stationary.
    discard_previous: bool,
}

impl ColliderSampler {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            previous: Vec::new(),
            discard_previous: true,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Forget last frame's centres, e.g. after an animation cut, so the next
    /// frame produces no sweep.
    pub fn reset_previous(&mut self) {
        self.discard_previous = true;
    }

    /// Turn this frame's world-space surface positions and normals into
    /// samples. Extra entries in the longer of the two slices are ignored.
    pub fn sample(&mut self, positions: &[Vec3], normals: &[Vec3]) -> Vec<ColliderSample> {
        let count = positions.len().min(normals.len());
        let fresh = self.discard_previous || self.previous.len() != count;
        let radius = self.radius;
        let previous = &self.previous;

        let build = |i: usize| {
            let normal = normals[i].normalize_or_zero();
            let centre = positions[i] - normal * radius;
            let prev = if fresh { centre } else { previous[i] };
            ColliderSample::new(centre, prev, normal)
        };

        #[cfg(feature = "parallel")]
        let samples: Vec<ColliderSample> = (0..count).into_par_iter().map(build).collect();

        #[cfg(not(feature = "parallel"))]
        let samples: Vec<ColliderSample> = (0..count).map(build).collect();

        self.previous.clear();
        self.previous.extend(samples.iter().map(|s| s.position));
        self.discard_previous = false;
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_stationary() {
        let mut sampler = ColliderSampler::new(0.1);
        let samples = sampler.sample(&[Vec3::new(0.0, 1.0, 0.0)], &[Vec3::Y]);
        assert_eq!(samples.len(), 1);
        assert!((samples[0].position - Vec3::new(0.0, 0.9, 0.0)).length() < 1e-6);
        assert_eq!(samples[0].position, samples[0].previous);
    }

    #[test]
    fn test_previous_tracks_slot() {
        let mut sampler = ColliderSampler::new(0.0);
        sampler.sample(&[Vec3::ZERO, Vec3::X], &[Vec3::Y, Vec3::Y]);
        let samples = sampler.sample(&[Vec3::Z, Vec3::X * 2.0], &[Vec3::Y, Vec3::Y]);
        assert_eq!(samples[0].previous, Vec3::ZERO);
        assert_eq!(samples[1].previous, Vec3::X);
    }

    #[test]
    fn test_reset_previous_discards_sweep() {
        let mut sampler = ColliderSampler::new(0.0);
        sampler.sample(&[Vec3::ZERO], &[Vec3::Y]);
        sampler.reset_previous();
        let samples = sampler.sample(&[Vec3::X], &[Vec3::Y]);
        assert_eq!(samples[0].previous, Vec3::X);
    }

    #[test]
    fn test_normals_are_normalized() {
        let mut sampler = ColliderSampler::new(1.0);
        let samples = sampler.sample(&[Vec3::ZERO], &[Vec3::new(0.0, 3.0, 0.0)]);
        assert!((samples[0].normal.length() - 1.0).abs() < 1e-6);
        assert!((samples[0].position.y + 1.0).abs() < 1e-6);
    }
}
