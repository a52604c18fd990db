//! Robust segment predicates.
//!
//! Simplicity checks and chord splitting decide on exact touching and
//! crossing, which plain floating-point cross products get wrong for
//! nearly collinear input. Orientation is therefore evaluated with
//! Shewchuk's adaptive precision arithmetic from the `robust` crate, and
//! every higher-level predicate here is built on top of it.
//!
//! ## Example
//!
//! ```rust
//! use u_coverage_core::robust::{segments_intersect, orient2d, Orientation};
//!
//! assert_eq!(orient2d((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)), Orientation::CounterClockwise);
//! assert!(segments_intersect((0.0, 0.0), (1.0, 1.0), (0.0, 1.0), (1.0, 0.0)));
//! ```

use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Left turn.
    CounterClockwise,
    /// Right turn.
    Clockwise,
    /// The three points are collinear.
    Collinear,
}

impl Orientation {
    /// Returns true if the points are collinear.
    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }
}

/// Orientation of `pc` relative to the directed line `pa -> pb`.
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    let det = robust_orient2d(
        Coord { x: pa.0, y: pa.1 },
        Coord { x: pb.0, y: pb.1 },
        Coord { x: pc.0, y: pc.1 },
    );

    if det > 0.0 {
        Orientation::CounterClockwise
    } else if det < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

#[inline]
fn within_box(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Returns true if the closed segments `a-b` and `c-d` share at least one point.
pub fn segments_intersect(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);

    if o1 != o2 && o3 != o4 && !o1.is_collinear() && !o2.is_collinear()
        && !o3.is_collinear() && !o4.is_collinear()
    {
        return true;
    }

    (o1.is_collinear() && within_box(c, a, b))
        || (o2.is_collinear() && within_box(d, a, b))
        || (o3.is_collinear() && within_box(a, c, d))
        || (o4.is_collinear() && within_box(b, c, d))
}

/// Returns true if the segments are collinear and overlap in more than a point.
pub fn segments_overlap(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    if !orient2d(a, b, c).is_collinear() || !orient2d(a, b, d).is_collinear() {
        return false;
    }

    // Project onto the dominant axis of a-b and compare the open intervals.
    let (s0, s1, t0, t1) = if (b.0 - a.0).abs() >= (b.1 - a.1).abs() {
        (a.0, b.0, c.0, d.0)
    } else {
        (a.1, b.1, c.1, d.1)
    };
    let (s0, s1) = (s0.min(s1), s0.max(s1));
    let (t0, t1) = (t0.min(t1), t0.max(t1));
    s0.max(t0) < s1.min(t1)
}

/// Signed area of a ring (positive when counter-clockwise).
///
/// The ring may be open or closed; a closing vertex contributes nothing.
pub fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    // Kahan summation of the shoelace terms
    let mut sum = 0.0;
    let mut c = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let term = ring[i].0 * ring[j].1 - ring[j].0 * ring[i].1;
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }

    sum / 2.0
}
