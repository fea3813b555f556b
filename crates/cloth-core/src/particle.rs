use glam::{Affine3A, Vec3};

/// SoA cloth particle storage. All positions are world space except `local`.
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec3>,
    /// Position at the start of the current step (Verlet velocity source and
    /// start of the collision sweep).
    pub previous: Vec<Vec3>,
    /// Position at initialization; `reset` returns here.
    pub rest_position: Vec<Vec3>,
    /// Render normal, recomputed on the last relaxation iteration.
    pub normal: Vec<Vec3>,
    pub rest_normal: Vec<Vec3>,
    /// Last written-back position in the cloth object's local space. Mapped
    /// through the object transform it gives the integration input.
    pub local: Vec<Vec3>,
    /// Pinned to the anchor transform; never integrated or corrected.
    pub locked: Vec<bool>,
    /// Locked particle position in anchor space.
    pub anchor_offset: Vec<Vec3>,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            previous: vec![Vec3::ZERO; count],
            rest_position: vec![Vec3::ZERO; count],
            normal: vec![Vec3::Y; count],
            rest_normal: vec![Vec3::Y; count],
            local: vec![Vec3::ZERO; count],
            locked: vec![false; count],
            anchor_offset: vec![Vec3::ZERO; count],
        }
    }

    /// Particles at rest at `rest` (world space).
    pub fn at_rest(rest: &[Vec3], normals: &[Vec3], world_to_local: &Affine3A) -> Self {
        let mut set = Self::new(rest.len());
        set.position.copy_from_slice(rest);
        set.previous.copy_from_slice(rest);
        set.rest_position.copy_from_slice(rest);
        set.normal.copy_from_slice(normals);
        set.rest_normal.copy_from_slice(normals);
        for (local, &p) in set.local.iter_mut().zip(rest) {
            *local = world_to_local.transform_point3(p);
        }
        set
    }

    /// Pin particle `i` to `anchor` at its current position.
    pub fn pin(&mut self, i: usize, anchor: &Affine3A) {
        self.locked[i] = true;
        self.anchor_offset[i] = anchor.inverse().transform_point3(self.position[i]);
    }

    /// Where locked particle `i` sits for the given anchor pose.
    #[inline]
    pub fn anchored_position(&self, i: usize, anchor: &Affine3A) -> Vec3 {
        anchor.transform_point3(self.anchor_offset[i])
    }

    pub fn locked_count(&self) -> usize {
        self.locked.iter().filter(|&&l| l).count()
    }

    /// Return every particle to rest with zero velocity.
    pub fn reset(&mut self) {
        self.position.copy_from_slice(&self.rest_position);
        self.previous.copy_from_slice(&self.rest_position);
        self.normal.copy_from_slice(&self.rest_normal);
    }
}
