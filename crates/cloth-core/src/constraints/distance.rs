use glam::Vec3;

/// Rest-length relation from particle `i` to particle `j`.
///
/// Each mesh edge yields two of these, one owned by each endpoint; both are
/// relaxed, so an edge is corrected twice per iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceConstraint {
    /// Owning particle.
    pub i: u32,
    /// Neighbour particle.
    pub j: u32,
    /// Distance at initialization; never changes.
    pub rest_length: f32,
}

impl DistanceConstraint {
    pub fn new(i: u32, j: u32, rest_length: f32) -> Self {
        Self { i, j, rest_length }
    }

    /// Current length minus rest length.
    #[inline]
    pub fn deviation(&self, positions: &[Vec3]) -> f32 {
        (positions[self.i as usize] - positions[self.j as usize]).length() - self.rest_length
    }
}

/// Jakobsen relaxation of one constraint.
///
/// When the length deviates from rest by more than `tolerance`, each
/// endpoint moves half the error along the connecting axis. A locked
/// endpoint stays put and the other takes the whole correction. Coincident
/// endpoints have no axis and are skipped.
///
/// Returns whether anything moved.
#[inline]
pub fn satisfy_distance_constraint(
    c: &DistanceConstraint,
    positions: &mut [Vec3],
    locked: &[bool],
    tolerance: f32,
) -> bool {
    let i = c.i as usize;
    let j = c.j as usize;
    let (lock_i, lock_j) = (locked[i], locked[j]);
    if lock_i && lock_j {
        return false;
    }

    let diff = positions[i] - positions[j];
    let dist = diff.length();
    if dist <= 0.0 {
        return false;
    }

    let error = c.rest_length - dist;
    if error.abs() <= tolerance {
        return false;
    }

    let axis = diff / dist;
    match (lock_i, lock_j) {
        (false, false) => {
            let correction = axis * (error * 0.5);
            positions[i] += correction;
            positions[j] -= correction;
        }
        (true, false) => positions[j] -= axis * error,
        (false, true) => positions[i] += axis * error,
        (true, true) => return false,
    }
    true
}

/// Relax every constraint once, in order.
pub fn solve_distance_constraints(
    constraints: &[DistanceConstraint],
    positions: &mut [Vec3],
    locked: &[bool],
    tolerance: f32,
) -> usize {
    constraints
        .iter()
        .filter(|c| satisfy_distance_constraint(c, positions, locked, tolerance))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance_is_untouched() {
        let mut positions = vec![Vec3::ZERO, Vec3::new(1.05, 0.0, 0.0)];
        let c = DistanceConstraint::new(0, 1, 1.0);
        assert!(!satisfy_distance_constraint(&c, &mut positions, &[false, false], 0.1));
        assert_eq!(positions[1].x, 1.05);
    }

    #[test]
    fn test_coincident_endpoints_skipped() {
        let mut positions = vec![Vec3::ONE, Vec3::ONE];
        let c = DistanceConstraint::new(0, 1, 1.0);
        assert!(!satisfy_distance_constraint(&c, &mut positions, &[false, false], 0.0));
        assert!(positions.iter().all(|p| p.is_finite()));
    }
}
