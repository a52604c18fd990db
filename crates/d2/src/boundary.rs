//! Boundary measurements: length, arc-length interpolation and closest
//! points.

use geo::{Closest, ClosestPoint, Point, Polygon};

use crate::polygon::{ring_points, rings};

/// Closest point of a ring to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingHit {
    /// The closest point.
    pub point: (f64, f64),
    /// Index of the start vertex of the edge holding the point.
    pub edge: usize,
    /// Parameter along that edge in `[0, 1]`.
    pub t: f64,
    /// Distance from the query point.
    pub distance: f64,
}

/// Closest point on segment `a-b`, with its parameter.
pub fn closest_on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> ((f64, f64), f64) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq < 1e-24 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    ((a.0 + t * dx, a.1 + t * dy), t)
}

/// Distance from `p` to segment `a-b`.
pub fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (q, _) = closest_on_segment(p, a, b);
    (q.0 - p.0).hypot(q.1 - p.1)
}

/// Closest point on a closed ring given as an open vertex list.
pub fn closest_on_ring(ring: &[(f64, f64)], p: (f64, f64)) -> Option<RingHit> {
    let n = ring.len();
    let mut best: Option<RingHit> = None;

    for i in 0..n {
        let (point, t) = closest_on_segment(p, ring[i], ring[(i + 1) % n]);
        let distance = (point.0 - p.0).hypot(point.1 - p.1);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(RingHit {
                point,
                edge: i,
                t,
                distance,
            });
        }
    }

    best
}

/// Perimeter of a closed ring.
pub fn ring_length(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            (b.0 - a.0).hypot(b.1 - a.1)
        })
        .sum()
}

/// Length of the exterior ring.
pub fn boundary_length(polygon: &Polygon<f64>) -> f64 {
    ring_length(&ring_points(polygon.exterior()))
}

/// Point at `arc_length` along the exterior, starting at its first vertex.
pub fn interpolate_along_boundary(polygon: &Polygon<f64>, arc_length: f64) -> (f64, f64) {
    let ring = ring_points(polygon.exterior());
    let Some(&start) = ring.first() else {
        return (f64::NAN, f64::NAN);
    };

    let total = ring_length(&ring);
    let mut remaining = arc_length.clamp(0.0, total);
    let n = ring.len();

    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let len = (b.0 - a.0).hypot(b.1 - a.1);
        if remaining <= len {
            if len == 0.0 {
                return a;
            }
            let t = remaining / len;
            return (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
        }
        remaining -= len;
    }

    start
}

/// Closest point on any ring of the polygon (boundary, not interior).
pub fn nearest_boundary_point(polygon: &Polygon<f64>, site: (f64, f64)) -> (f64, f64) {
    rings(polygon)
        .iter()
        .filter_map(|ring| closest_on_ring(ring, site))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
        .map_or(site, |hit| hit.point)
}

/// Distance from the site to the polygon; zero inside or on the boundary.
pub fn distance_to(polygon: &Polygon<f64>, site: (f64, f64)) -> f64 {
    let query = Point::new(site.0, site.1);
    match polygon.closest_point(&query) {
        Closest::Intersection(_) => 0.0,
        Closest::SinglePoint(p) => (p.x() - site.0).hypot(p.y() - site.1),
        Closest::Indeterminate => {
            let q = nearest_boundary_point(polygon, site);
            (q.0 - site.0).hypot(q.1 - site.1)
        }
    }
}
