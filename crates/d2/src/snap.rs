//! Vertex snapping onto a reference polygon.
//!
//! Cells produced by separate boolean operations rarely share edges
//! bit-for-bit. Snapping moves every vertex that lies within a tolerance
//! of the reference onto it: onto a reference vertex if one is close
//! enough, otherwise onto the nearest reference edge.

use geo::Polygon;

use crate::boundary::closest_on_ring;
use crate::polygon::{dedup_ring, drop_slivers, polygon_from_coords, rings};

/// Vertices already this close to the reference (relative to the
/// tolerance) are left alone, which keeps snapping idempotent.
const SETTLED_RATIO: f64 = 1e-6;

/// Snaps the vertices of `polygon` onto `reference`.
pub fn snap_to_reference(
    polygon: &Polygon<f64>,
    reference: &Polygon<f64>,
    tolerance: f64,
) -> Polygon<f64> {
    if tolerance <= 0.0 {
        return polygon.clone();
    }

    let reference_rings = rings(reference);
    let reference_vertices: Vec<(f64, f64)> =
        reference_rings.iter().flatten().copied().collect();

    let mut snapped: Vec<Vec<(f64, f64)>> = rings(polygon)
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|p| snap_point(p, &reference_vertices, &reference_rings, tolerance))
                .collect()
        })
        .collect();

    // Snapping may collapse neighbors onto the same reference vertex or
    // fold an edge back onto its predecessor.
    for ring in &mut snapped {
        dedup_ring(ring, 0.0);
        drop_slivers(ring, tolerance);
    }

    let Some((exterior, holes)) = snapped.split_first() else {
        return polygon.clone();
    };
    polygon_from_coords(exterior, holes)
}

fn snap_point(
    p: (f64, f64),
    vertices: &[(f64, f64)],
    rings: &[Vec<(f64, f64)>],
    tolerance: f64,
) -> (f64, f64) {
    let nearest_vertex = vertices
        .iter()
        .map(|&v| (v, (v.0 - p.0).hypot(v.1 - p.1)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((v, d)) = nearest_vertex {
        if d <= tolerance {
            return v;
        }
    }

    let nearest_edge = rings
        .iter()
        .filter_map(|ring| closest_on_ring(ring, p))
        .min_by(|a, b| a.distance.total_cmp(&b.distance));

    match nearest_edge {
        Some(hit) if hit.distance <= tolerance && hit.distance > tolerance * SETTLED_RATIO => {
            hit.point
        }
        _ => p,
    }
}
