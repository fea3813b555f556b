use glam::Vec3;

/// A finite line segment `start + s * (end - start)`, `s` in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn point_at(&self, s: f32) -> Vec3 {
        (1.0 - s) * self.start + s * self.end
    }

    /// Parameter and position of the point on this segment closest to `p`.
    /// A zero-length segment returns its start.
    pub fn closest_point(&self, p: Vec3) -> (f32, Vec3) {
        let dir = self.end - self.start;
        let len_sq = dir.length_squared();
        if len_sq <= 0.0 {
            return (0.0, self.start);
        }
        let s = ((p - self.start).dot(dir) / len_sq).clamp(0.0, 1.0);
        (s, self.point_at(s))
    }

    pub fn distance_to(&self, other: &Segment) -> SegmentDistance {
        segment_distance(self.start, self.end, other.start, other.end)
    }
}

/// Closest approach between segments P (`P0..P1`) and Q (`Q0..Q1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentDistance {
    /// `[s, t]`, the parameters of the closest points on P and Q.
    pub parameter: [f32; 2],
    /// `[point on P, point on Q]`.
    pub closest: [Vec3; 2],
    pub distance: f32,
    pub squared_distance: f32,
}

/// Where the root of `F(s, t) = 0` for fixed `t` lies along `s`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RootSide {
    Below,
    Interior,
    Above,
}

/// Boundary edge of the unit parameter square.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Edge {
    S0,
    S1,
    T0,
    T1,
}

/// Quadratic form of `|P(s) - Q(t)|^2` with the partial-derivative samples
/// at the corners of the parameter square.
struct Quadratic {
    b: f32,
    c: f32,
    e: f32,
    /// `dR/ds / 2` at (0,0), (1,0), (0,1), (1,1).
    f00: f32,
    f10: f32,
    f01: f32,
    f11: f32,
    /// `dR/dt / 2` at (0,0), (1,0), (0,1), (1,1).
    g00: f32,
    g10: f32,
    g01: f32,
    g11: f32,
}

/// Exact minimum distance between two segments.
///
/// Minimises `R(s,t) = A s^2 - 2 B s t + C t^2 + 2 D s - 2 E t + F` over the
/// unit square. Parallel and zero-length segments are handled without
/// dividing by zero; when segments overlap in parallel one representative
/// pair is chosen deterministically.
///
/// Reference: D. Eberly, "Robust Computation of Distance Between Line
/// Segments", Geometric Tools.
pub fn segment_distance(p0: Vec3, p1: Vec3, q0: Vec3, q1: Vec3) -> SegmentDistance {
    let p_dir = p1 - p0;
    let q_dir = q1 - q0;
    let p0_q0 = p0 - q0;

    let a = p_dir.dot(p_dir);
    let b = p_dir.dot(q_dir);
    let c = q_dir.dot(q_dir);
    let d = p_dir.dot(p0_q0);
    let e = q_dir.dot(p0_q0);

    let f00 = d;
    let f10 = f00 + a;
    let f01 = f00 - b;
    let f11 = f10 - b;

    let g00 = -e;
    let g10 = g00 - b;
    let g01 = g00 + c;
    let g11 = g10 + c;

    let q = Quadratic {
        b,
        c,
        e,
        f00,
        f10,
        f01,
        f11,
        g00,
        g10,
        g01,
        g11,
    };

    let parameter = if a > 0.0 && c > 0.0 {
        // Roots of dR/ds along the edges t = 0 and t = 1.
        let s_value = [
            clamped_root(a, q.f00, q.f10),
            clamped_root(a, q.f01, q.f11),
        ];
        let side = s_value.map(|s| {
            if s <= 0.0 {
                RootSide::Below
            } else if s >= 1.0 {
                RootSide::Above
            } else {
                RootSide::Interior
            }
        });

        match side {
            [RootSide::Below, RootSide::Below] => [0.0, clamped_root(c, q.g00, q.g01)],
            [RootSide::Above, RootSide::Above] => [1.0, clamped_root(c, q.g10, q.g11)],
            _ => {
                let (edge, end) = edge_intersection(&q, s_value, side);
                minimum_on_segment(&q, edge, end)
            }
        }
    } else if a > 0.0 {
        // Q degenerates to a point.
        [clamped_root(a, f00, f10), 0.0]
    } else if c > 0.0 {
        // P degenerates to a point.
        [0.0, clamped_root(c, g00, g01)]
    } else {
        [0.0, 0.0]
    };

    let closest = [
        (1.0 - parameter[0]) * p0 + parameter[0] * p1,
        (1.0 - parameter[1]) * q0 + parameter[1] * q1,
    ];
    let diff = closest[0] - closest[1];
    let squared_distance = diff.dot(diff);

    SegmentDistance {
        parameter,
        closest,
        distance: squared_distance.sqrt(),
        squared_distance,
    }
}

/// Root of the linear function `h(z) = h0 + slope * z` clamped to [0, 1],
/// given `h(0) = h0` and `h(1) = h1`. `slope` must be positive.
#[inline]
fn clamped_root(slope: f32, h0: f32, h1: f32) -> f32 {
    if h0 < 0.0 {
        if h1 > 0.0 {
            let r = -h0 / slope;
            // Rounding can push the root just past 1 when slope is tiny.
            if r > 1.0 {
                0.5
            } else {
                r
            }
        } else {
            1.0
        }
    } else {
        0.0
    }
}

/// `t` where the line `dR/ds = 0` meets the edge `s = 0` or `s = 1`,
/// given the corresponding `dR/ds` sample. Falls back to the middle when the
/// crossing is off the square (or undefined for parallel segments).
#[inline]
fn edge_t(f: f32, b: f32) -> f32 {
    let t = f / b;
    if (0.0..=1.0).contains(&t) {
        t
    } else {
        0.5
    }
}

/// Endpoints where the line `dR/ds = 0` enters and leaves the unit square.
fn edge_intersection(
    q: &Quadratic,
    s_value: [f32; 2],
    side: [RootSide; 2],
) -> ([Edge; 2], [[f32; 2]; 2]) {
    let s0_point = || (Edge::S0, [0.0, edge_t(q.f00, q.b)]);
    let s1_point = || (Edge::S1, [1.0, edge_t(q.f10, q.b)]);
    let t0_point = (Edge::T0, [s_value[0], 0.0]);
    let t1_point = (Edge::T1, [s_value[1], 1.0]);

    let (first, second) = match side[0] {
        RootSide::Below => {
            let second = if side[1] == RootSide::Interior {
                t1_point
            } else {
                s1_point()
            };
            (s0_point(), second)
        }
        RootSide::Interior => {
            let second = match side[1] {
                RootSide::Below => s0_point(),
                RootSide::Interior => t1_point,
                RootSide::Above => s1_point(),
            };
            (t0_point, second)
        }
        RootSide::Above => {
            let second = if side[1] == RootSide::Interior {
                t1_point
            } else {
                s0_point()
            };
            (s1_point(), second)
        }
    };

    ([first.0, second.0], [first.1, second.1])
}

/// Minimises R along the segment between the two edge points by looking at
/// the sign of `dR/dt` restricted to that segment.
fn minimum_on_segment(q: &Quadratic, edge: [Edge; 2], end: [[f32; 2]; 2]) -> [f32; 2] {
    let delta = end[1][1] - end[0][1];
    let h0 = delta * (-q.b * end[0][0] + q.c * end[0][1] - q.e);
    if h0 >= 0.0 {
        return endpoint_parameters(q, edge[0], end[0]);
    }

    let h1 = delta * (-q.b * end[1][0] + q.c * end[1][1] - q.e);
    if h1 <= 0.0 {
        return endpoint_parameters(q, edge[1], end[1]);
    }

    let z = (h0 / (h0 - h1)).clamp(0.0, 1.0);
    let omz = 1.0 - z;
    [
        omz * end[0][0] + z * end[1][0],
        omz * end[0][1] + z * end[1][1],
    ]
}

/// On an `s` edge the minimum along `t` is re-solved; on a `t` edge the
/// intersection point is already the minimum.
#[inline]
fn endpoint_parameters(q: &Quadratic, edge: Edge, end: [f32; 2]) -> [f32; 2] {
    match edge {
        Edge::S0 => [0.0, clamped_root(q.c, q.g00, q.g01)],
        Edge::S1 => [1.0, clamped_root(q.c, q.g10, q.g11)],
        Edge::T0 | Edge::T1 => end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_root_regions() {
        assert_eq!(clamped_root(1.0, 0.5, 1.5), 0.0);
        assert_eq!(clamped_root(1.0, -2.0, -1.0), 1.0);
        assert!((clamped_root(2.0, -0.5, 1.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_edge_t_falls_back_to_middle() {
        assert_eq!(edge_t(3.0, 1.0), 0.5);
        assert_eq!(edge_t(1.0, 0.0), 0.5);
        assert_eq!(edge_t(0.0, 0.0), 0.5);
        assert!((edge_t(0.25, 1.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_closest_point_on_degenerate_segment() {
        let seg = Segment::new(Vec3::ONE, Vec3::ONE);
        let (s, p) = seg.closest_point(Vec3::ZERO);
        assert_eq!(s, 0.0);
        assert_eq!(p, Vec3::ONE);
    }
}
