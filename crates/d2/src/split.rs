//! Splitting a polygon along a straight chord.
//!
//! A chord qualifies when both endpoints lie on the exterior ring, its
//! interior lies strictly inside the polygon, and it meets no ring
//! anywhere except at its two endpoints. Such a chord always separates the
//! polygon into exactly two pieces: the exterior is cut at the endpoints
//! into two arcs, each arc is closed by the chord, and every hole follows
//! the piece that surrounds it.

use geo::{Contains, Point, Polygon};
use u_coverage_core::robust::{segments_intersect, segments_overlap};

use crate::boundary::{closest_on_ring, segment_distance};
use crate::polygon::{dedup_ring, polygon_from_coords, ring_points, rings};
use crate::validation::is_valid_simple;

/// Position of a chord endpoint on the exterior ring.
#[derive(Debug, Clone, Copy)]
struct RingPosition {
    edge: usize,
    t: f64,
    point: (f64, f64),
}

impl RingPosition {
    fn key(&self) -> (usize, f64) {
        (self.edge, self.t)
    }
}

/// Locates `p` on the ring, snapping to a vertex when within `tolerance`.
fn locate(ring: &[(f64, f64)], p: (f64, f64), tolerance: f64) -> Option<RingPosition> {
    let hit = closest_on_ring(ring, p)?;
    if hit.distance > tolerance {
        return None;
    }

    let n = ring.len();
    let start = ring[hit.edge];
    let end = ring[(hit.edge + 1) % n];
    let position = if (hit.point.0 - start.0).hypot(hit.point.1 - start.1) <= tolerance {
        RingPosition {
            edge: hit.edge,
            t: 0.0,
            point: start,
        }
    } else if (hit.point.0 - end.0).hypot(hit.point.1 - end.1) <= tolerance {
        RingPosition {
            edge: (hit.edge + 1) % n,
            t: 0.0,
            point: end,
        }
    } else {
        RingPosition {
            edge: hit.edge,
            t: hit.t,
            point: hit.point,
        }
    };
    Some(position)
}

/// Boundary arc from `start` to `end` following the ring direction.
fn arc(ring: &[(f64, f64)], start: RingPosition, end: RingPosition) -> Vec<(f64, f64)> {
    let n = ring.len();
    let mut points = vec![start.point];

    let same_edge_forward = start.edge == end.edge && start.t < end.t;
    if !same_edge_forward {
        let mut idx = (start.edge + 1) % n;
        loop {
            if idx == end.edge {
                if end.t > 0.0 {
                    points.push(ring[idx]);
                }
                break;
            }
            points.push(ring[idx]);
            idx = (idx + 1) % n;
        }
    }

    points.push(end.point);
    points
}

/// Splits `polygon` along the chord `from -> to`.
///
/// Returns `None` unless the chord cleanly bisects the polygon into two
/// valid simple polygons.
pub fn split_along_chord(
    polygon: &Polygon<f64>,
    from: (f64, f64),
    to: (f64, f64),
    tolerance: f64,
) -> Option<(Polygon<f64>, Polygon<f64>)> {
    let exterior = ring_points(polygon.exterior());
    if exterior.len() < 3 {
        return None;
    }

    let a = locate(&exterior, from, tolerance)?;
    let b = locate(&exterior, to, tolerance)?;
    if (a.point.0 - b.point.0).hypot(a.point.1 - b.point.1) <= tolerance {
        return None;
    }
    if a.key() == b.key() {
        return None;
    }

    let mid = Point::new((a.point.0 + b.point.0) / 2.0, (a.point.1 + b.point.1) / 2.0);
    if !polygon.contains(&mid) {
        return None;
    }
    if !chord_is_clear(polygon, a.point, b.point, tolerance) {
        return None;
    }

    let mut first_ring = arc(&exterior, a, b);
    let mut second_ring = arc(&exterior, b, a);
    dedup_ring(&mut first_ring, tolerance);
    dedup_ring(&mut second_ring, tolerance);
    if first_ring.len() < 3 || second_ring.len() < 3 {
        return None;
    }

    let first_shell = polygon_from_coords(&first_ring, &[]);
    let mut first_holes = Vec::new();
    let mut second_holes = Vec::new();
    for hole in polygon.interiors() {
        let hole = ring_points(hole);
        let Some(&anchor) = hole.first() else {
            continue;
        };
        if first_shell.contains(&Point::new(anchor.0, anchor.1)) {
            first_holes.push(hole);
        } else {
            second_holes.push(hole);
        }
    }

    let first = polygon_from_coords(&first_ring, &first_holes);
    let second = polygon_from_coords(&second_ring, &second_holes);

    if is_valid_simple(&first, tolerance) && is_valid_simple(&second, tolerance) {
        Some((first, second))
    } else {
        log::debug!("chord split produced an invalid piece");
        None
    }
}

/// The chord may only meet the rings at its own endpoints.
fn chord_is_clear(polygon: &Polygon<f64>, a: (f64, f64), b: (f64, f64), tolerance: f64) -> bool {
    for ring in rings(polygon) {
        let n = ring.len();
        for i in 0..n {
            let (c, d) = (ring[i], ring[(i + 1) % n]);
            if segments_overlap(a, b, c, d) {
                return false;
            }
            if !segments_intersect(a, b, c, d) {
                continue;
            }
            let at_endpoint =
                segment_distance(a, c, d) <= tolerance || segment_distance(b, c, d) <= tolerance;
            if !at_endpoint {
                return false;
            }
        }
    }
    true
}
