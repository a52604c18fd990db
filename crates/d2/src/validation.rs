//! Simple-polygon validation.
//!
//! A cell is admitted only if every ring has at least three distinct finite
//! vertices and non-zero area, no edge is degenerate or doubles back on its
//! predecessor, no two non-adjacent edges (of any rings) meet, and every
//! hole lies strictly inside the exterior and outside the other holes.

use geo::{Contains, Point, Polygon};
use u_coverage_core::robust::{orient2d, segments_intersect, signed_area};
use u_coverage_core::{Error, Result};

use crate::polygon::{polygon_from_coords, rings, triangle_height};

/// Checks the polygon and reports the first defect found.
pub fn validate(polygon: &Polygon<f64>, tolerance: f64) -> Result<()> {
    let rings = rings(polygon);

    for (r, ring) in rings.iter().enumerate() {
        validate_ring(ring, tolerance).map_err(|reason| {
            Error::InvalidGeometry(format!("ring {}: {}", r, reason))
        })?;
    }

    check_crossings(&rings)?;
    check_holes(&rings)
}

/// Returns true if the polygon passes [`validate`].
pub fn is_valid_simple(polygon: &Polygon<f64>, tolerance: f64) -> bool {
    validate(polygon, tolerance).is_ok()
}

fn validate_ring(ring: &[(f64, f64)], tolerance: f64) -> std::result::Result<(), String> {
    let n = ring.len();
    if n < 3 {
        return Err(format!("{} vertices, need at least 3", n));
    }
    if ring.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return Err("non-finite coordinate".into());
    }
    if signed_area(ring).abs() <= tolerance {
        return Err("zero area".into());
    }

    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let v = ring[i];
        let next = ring[(i + 1) % n];

        if (next.0 - v.0).hypot(next.1 - v.1) <= tolerance {
            return Err(format!("zero-length edge at vertex {}", i));
        }

        // Edges that reverse direction within the tolerance form a spike.
        let turn_back = (v.0 - prev.0) * (next.0 - v.0) + (v.1 - prev.1) * (next.1 - v.1) < 0.0;
        let flat =
            orient2d(prev, v, next).is_collinear() || triangle_height(prev, v, next) <= tolerance;
        if turn_back && flat {
            return Err(format!("spike at vertex {}", i));
        }
    }

    Ok(())
}

/// Rejects any contact between edges that are not consecutive in one ring.
fn check_crossings(rings: &[Vec<(f64, f64)>]) -> Result<()> {
    let edges: Vec<(usize, usize, (f64, f64), (f64, f64))> = rings
        .iter()
        .enumerate()
        .flat_map(|(r, ring)| {
            let n = ring.len();
            (0..n).map(move |i| (r, i, ring[i], ring[(i + 1) % n]))
        })
        .collect();

    for (k, &(r1, i1, a, b)) in edges.iter().enumerate() {
        for &(r2, i2, c, d) in &edges[k + 1..] {
            if r1 == r2 {
                let n = rings[r1].len();
                let adjacent = i2 == i1 + 1 || (i1 == 0 && i2 == n - 1);
                if adjacent {
                    continue;
                }
            }
            if segments_intersect(a, b, c, d) {
                return Err(Error::InvalidGeometry(format!(
                    "edges {}:{} and {}:{} intersect",
                    r1, i1, r2, i2
                )));
            }
        }
    }

    Ok(())
}

fn check_holes(rings: &[Vec<(f64, f64)>]) -> Result<()> {
    let Some((exterior, holes)) = rings.split_first() else {
        return Ok(());
    };
    let shell = polygon_from_coords(exterior, &[]);
    let hole_polygons: Vec<Polygon<f64>> =
        holes.iter().map(|h| polygon_from_coords(h, &[])).collect();

    // Rings do not touch, so one vertex decides containment.
    for (h, hole) in holes.iter().enumerate() {
        let anchor = Point::new(hole[0].0, hole[0].1);
        if !shell.contains(&anchor) {
            return Err(Error::InvalidGeometry(format!(
                "hole {} is outside the exterior",
                h
            )));
        }
        for (other, polygon) in hole_polygons.iter().enumerate() {
            if other != h && polygon.contains(&anchor) {
                return Err(Error::InvalidGeometry(format!(
                    "hole {} is nested in hole {}",
                    h, other
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::rectangle;

    const TOL: f64 = 1e-9;

    fn coords(points: &[(f64, f64)]) -> Polygon<f64> {
        polygon_from_coords(points, &[])
    }

    #[test]
    fn test_valid_shapes() {
        assert!(is_valid_simple(&rectangle(0.0, 0.0, 1.0, 1.0), TOL));
        assert!(is_valid_simple(
            &coords(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (1.0, 1.0), (0.0, 2.0)]),
            TOL
        ));
        // Collinear vertex on a straight edge is fine.
        assert!(is_valid_simple(
            &coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]),
            TOL
        ));
    }

    #[test]
    fn test_spike_rejected() {
        let spike = coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, -1.0), (1.0, 1.0), (0.0, 1.0)]);
        let err = validate(&spike, TOL).unwrap_err();
        assert!(err.to_string().contains("spike"));
    }

    #[test]
    fn test_near_collinear_spike_rejected() {
        // The antenna tip (3, 0) folds back 1e-10 above its own edge.
        let antenna = coords(&[(0.0, 0.0), (3.0, 0.0), (1.0, 1e-10), (1.0, 1.0), (0.0, 1.0)]);
        let err = validate(&antenna, TOL).unwrap_err();
        assert!(err.to_string().contains("spike at vertex 1"));

        // A sharp but real turn stays valid.
        let sharp = coords(&[(0.0, 0.0), (3.0, 0.0), (1.0, 0.01), (1.0, 1.0), (0.0, 1.0)]);
        assert!(is_valid_simple(&sharp, TOL));
    }

    #[test]
    fn test_bowtie_rejected() {
        let bowtie = coords(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]);
        assert!(!is_valid_simple(&bowtie, TOL));
    }

    #[test]
    fn test_degenerate_rings_rejected() {
        assert!(!is_valid_simple(&coords(&[(0.0, 0.0), (1.0, 0.0)]), TOL));
        assert!(!is_valid_simple(
            &coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            TOL
        ));
        assert!(!is_valid_simple(
            &coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            TOL
        ));
        assert!(!is_valid_simple(
            &coords(&[(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]),
            TOL
        ));
    }

    #[test]
    fn test_pinched_ring_rejected() {
        // Two squares sharing only the vertex (1, 1).
        let pinched = coords(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ]);
        assert!(!is_valid_simple(&pinched, TOL));
    }

    #[test]
    fn test_holes() {
        let exterior = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let inside = vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)];
        assert!(is_valid_simple(
            &polygon_from_coords(&exterior, &[inside.clone()]),
            TOL
        ));

        let outside = vec![(5.0, 5.0), (5.0, 6.0), (6.0, 6.0), (6.0, 5.0)];
        assert!(!is_valid_simple(&polygon_from_coords(&exterior, &[outside]), TOL));

        let touching = vec![(0.0, 1.0), (1.0, 2.0), (1.0, 1.0)];
        assert!(!is_valid_simple(&polygon_from_coords(&exterior, &[touching]), TOL));

        let nested = vec![(1.2, 1.2), (1.2, 1.8), (1.8, 1.8), (1.8, 1.2)];
        assert!(!is_valid_simple(
            &polygon_from_coords(&exterior, &[inside, nested]),
            TOL
        ));
    }
}
