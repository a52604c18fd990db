//! Polygon construction and ring conversion helpers.

use geo::{Coord, LineString, Polygon};

/// Builds a polygon from an exterior ring and optional hole rings.
///
/// Rings may be given open or closed; `geo` closes them.
pub fn polygon_from_coords(exterior: &[(f64, f64)], holes: &[Vec<(f64, f64)>]) -> Polygon<f64> {
    Polygon::new(
        line_string(exterior),
        holes.iter().map(|hole| line_string(hole)).collect(),
    )
}

/// Axis-aligned rectangle, counter-clockwise from `(x0, y0)`.
pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon_from_coords(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], &[])
}

fn line_string(points: &[(f64, f64)]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>(),
    )
}

/// Vertices of a ring without the closing duplicate.
pub fn ring_points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = ring.coords().map(|c| (c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Every ring of the polygon (exterior first), as open point lists.
pub fn rings(polygon: &Polygon<f64>) -> Vec<Vec<(f64, f64)>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_points)
        .collect()
}

/// Drops consecutive vertices closer than `tolerance`, including across
/// the closing edge.
pub fn dedup_ring(points: &mut Vec<(f64, f64)>, tolerance: f64) {
    points.dedup_by(|b, a| (a.0 - b.0).hypot(a.1 - b.1) <= tolerance);
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first.0 - last.0).hypot(first.1 - last.1) <= tolerance {
            points.pop();
        } else {
            break;
        }
    }
}

/// Height of the triangle `a-v-b` over its longest side.
pub fn triangle_height(a: (f64, f64), v: (f64, f64), b: (f64, f64)) -> f64 {
    let cross = (v.0 - a.0) * (b.1 - v.1) - (v.1 - a.1) * (b.0 - v.0);
    let longest = (v.0 - a.0)
        .hypot(v.1 - a.1)
        .max((b.0 - v.0).hypot(b.1 - v.1))
        .max((b.0 - a.0).hypot(b.1 - a.1));
    if longest == 0.0 {
        0.0
    } else {
        cross.abs() / longest
    }
}

/// Drops vertices whose triangle with their two neighbors is no higher
/// than `tolerance`, until no such vertex is left or the ring is a
/// triangle. Removes zero-width antennas and straight-through vertices.
pub fn drop_slivers(points: &mut Vec<(f64, f64)>, tolerance: f64) {
    let mut i = 0;
    let mut settled = 0;

    while points.len() > 3 && settled < points.len() {
        let n = points.len();
        let at = i % n;
        let height = triangle_height(points[(at + n - 1) % n], points[at], points[(at + 1) % n]);
        if height <= tolerance {
            points.remove(at);
            // The predecessor has a new neighbor.
            i = at.saturating_sub(1);
            settled = 0;
        } else {
            i = at + 1;
            settled += 1;
        }
    }
}

/// Contours in the layout `i_overlay` consumes.
pub(crate) fn to_contours(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    rings(polygon)
        .into_iter()
        .map(|ring| ring.into_iter().map(|(x, y)| [x, y]).collect())
        .collect()
}

/// Polygon from an `i_overlay` shape (outer contour first, then holes).
pub(crate) fn from_shape(shape: Vec<Vec<[f64; 2]>>) -> Option<Polygon<f64>> {
    let mut contours = shape
        .into_iter()
        .filter(|contour| contour.len() >= 3)
        .map(|contour| contour.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>());

    let exterior = contours.next()?;
    let holes: Vec<Vec<(f64, f64)>> = contours.collect();
    Some(polygon_from_coords(&exterior, &holes))
}
