use fnv::FnvHashMap;
use glam::{IVec3, Vec3};

use crate::collider::ColliderSample;

/// Query stencil as unit steps toward the query point's nearest octant:
/// own cell, three faces, three edges, one corner.
const STENCIL: [IVec3; 8] = [
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 1, 0),
    IVec3::new(0, 1, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(1, 1, 1),
];

/// Smallest cell edge the index accepts; smaller sizes are raised to this.
pub const MIN_BUCKET_SIZE: f32 = 1e-6;

/// Uniform-grid broad phase over one frame's collider samples.
///
/// Samples are bucketed by `floor(position / bucket_size)` using counting
/// sort: count samples per cell -> prefix sum -> scatter. Rebuilt from scratch
/// every frame; a deforming collider invalidates every bucket.
pub struct ColliderIndex {
    bucket_size: f32,
    /// Cell key -> (start, count) into `sorted`.
    cells: FnvHashMap<IVec3, (u32, u32)>,
    /// Samples grouped by cell, input order preserved within a cell.
    sorted: Vec<ColliderSample>,
    /// Cell key per input sample (used during build).
    sample_keys: Vec<IVec3>,
}

impl ColliderIndex {
    /// Empty index. `bucket_size` should be at least twice the collision
    /// radius for the 8-cell query to cover every contact.
    pub fn new(bucket_size: f32) -> Self {
        Self {
            bucket_size: bucket_size.max(MIN_BUCKET_SIZE),
            cells: FnvHashMap::default(),
            sorted: Vec::new(),
            sample_keys: Vec::new(),
        }
    }

    /// Fresh index over `samples`.
    pub fn from_samples(samples: &[ColliderSample], bucket_size: f32) -> Self {
        let mut index = Self::new(bucket_size);
        index.build(samples);
        index
    }

    /// Discard all buckets and re-bucket `samples`.
    pub fn build(&mut self, samples: &[ColliderSample]) {
        self.cells.clear();
        self.sorted.clear();
        self.sample_keys.clear();

        // 1. Key per sample, count per cell
        for sample in samples {
            let key = self.cell_key(sample.position);
            self.sample_keys.push(key);
            self.cells.entry(key).or_insert((0, 0)).1 += 1;
        }

        // 2. Prefix sum -> cell start; count reset for scatter offsets
        let mut start = 0u32;
        for (cell_start, cell_count) in self.cells.values_mut() {
            *cell_start = start;
            start += *cell_count;
            *cell_count = 0;
        }

        // 3. Scatter
        self.sorted.resize(samples.len(), ColliderSample::stationary(Vec3::ZERO, Vec3::ZERO));
        for (sample, key) in samples.iter().zip(&self.sample_keys) {
            if let Some((cell_start, cell_count)) = self.cells.get_mut(key) {
                self.sorted[(*cell_start + *cell_count) as usize] = *sample;
                *cell_count += 1;
            }
        }
    }

    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    /// Number of samples indexed.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cell_key(&self, pos: Vec3) -> IVec3 {
        (pos / self.bucket_size).floor().as_ivec3()
    }

    /// Samples in one bucket; empty for a key with no samples.
    pub fn bucket(&self, key: IVec3) -> &[ColliderSample] {
        match self.cells.get(&key) {
            Some(&(start, count)) => &self.sorted[start as usize..(start + count) as usize],
            None => &[],
        }
    }

    /// All non-empty buckets, in no particular order.
    pub fn buckets(&self) -> impl Iterator<Item = (IVec3, &[ColliderSample])> + '_ {
        self.cells.iter().map(move |(&key, &(start, count))| {
            (key, &self.sorted[start as usize..(start + count) as usize])
        })
    }

    /// The 8 cells inspected for `pos`: its own cell plus the 7 cells toward
    /// the octant of the cell that `pos` lies in.
    pub fn stencil(&self, pos: Vec3) -> [IVec3; 8] {
        let key = self.cell_key(pos);
        let half = self.bucket_size * 0.5;
        let offset = pos - key.as_vec3() * self.bucket_size;
        let toward = |o: f32| if o > half { 1 } else { -1 };
        let dir = IVec3::new(toward(offset.x), toward(offset.y), toward(offset.z));
        // Keys saturate far from the origin; stepping past them wraps to the
        // other end of the key range.
        STENCIL.map(|s| key.wrapping_add(s * dir))
    }

    /// Calls `callback` for every sample in the 8-cell stencil around `pos`.
    /// No de-duplication and no distance filtering; the caller does both.
    pub fn query_neighbors<F: FnMut(&ColliderSample)>(&self, pos: Vec3, mut callback: F) {
        for key in self.stencil(pos) {
            for sample in self.bucket(key) {
                callback(sample);
            }
        }
    }

    /// Collects the stencil samples around `pos`.
    pub fn query(&self, pos: Vec3) -> Vec<ColliderSample> {
        let mut found = Vec::new();
        self.query_neighbors(pos, |s| found.push(*s));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stencil_picks_nearest_octant() {
        let index = ColliderIndex::new(1.0);
        let low = index.stencil(Vec3::new(0.2, 0.2, 0.2));
        assert_eq!(low[0], IVec3::ZERO);
        assert_eq!(low[7], IVec3::new(-1, -1, -1));

        let high = index.stencil(Vec3::new(0.8, 0.2, 0.9));
        assert_eq!(high[1], IVec3::new(1, 0, 0));
        assert_eq!(high[2], IVec3::new(0, -1, 0));
        assert_eq!(high[3], IVec3::new(0, 0, 1));
        assert_eq!(high[7], IVec3::new(1, -1, 1));
    }

    #[test]
    fn test_stencil_cells_are_distinct() {
        let index = ColliderIndex::new(0.5);
        let cells = index.stencil(Vec3::new(-3.1, 7.4, 0.01));
        for i in 0..8 {
            for j in (i + 1)..8 {
                assert_ne!(cells[i], cells[j]);
            }
        }
    }

    #[test]
    fn test_negative_keys_floor() {
        let index = ColliderIndex::new(1.0);
        assert_eq!(index.cell_key(Vec3::new(-0.1, -1.0, -1.5)), IVec3::new(-1, -1, -2));
    }
}
