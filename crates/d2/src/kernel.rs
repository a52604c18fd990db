//! `geo`-backed implementation of the geometry collaborator.

use geo::{Area, Buffer, MultiPolygon, Polygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use u_coverage_core::{GeometryKernel, Site};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::boundary;
use crate::polygon::{
    dedup_ring, drop_slivers, from_shape, polygon_from_coords, rings, to_contours,
};
use crate::snap::snap_to_reference;
use crate::split::split_along_chord;
use crate::validation;

/// Default tolerance for point-on-boundary and degeneracy tests.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default tolerance for snapping near-coincident vertices.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 1e-6;

/// Geometry kernel for `geo::Polygon<f64>`.
///
/// Unions go through `i_overlay`, erosion through `geo`'s buffer, and
/// simplicity checks through exact orientation predicates.
///
/// ```rust
/// use u_coverage_core::GeometryKernel;
/// use u_coverage_d2::{rectangle, GeoKernel};
///
/// let kernel = GeoKernel::new();
/// let merged = kernel.merge(&rectangle(0.0, 0.0, 1.0, 1.0), &rectangle(1.0, 0.0, 2.0, 1.0));
/// assert!(merged.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoKernel {
    tolerance: f64,
    snap_tolerance: f64,
}

impl Default for GeoKernel {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
        }
    }
}

impl GeoKernel {
    /// Creates a kernel with default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the degeneracy tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Sets the snapping tolerance (0 disables snapping).
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance.max(0.0);
        self
    }

    /// Degeneracy tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Removes zero-width antennas and straight-through vertices left by
    /// overlay rounding. `None` if the exterior collapses.
    fn clean(&self, polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
        let tolerance = self.tolerance.max(self.snap_tolerance);
        let mut cleaned = rings(polygon).into_iter().map(|mut ring| {
            dedup_ring(&mut ring, self.tolerance);
            drop_slivers(&mut ring, tolerance);
            ring
        });

        let exterior = cleaned.next().filter(|ring| ring.len() >= 3)?;
        let holes: Vec<Vec<(f64, f64)>> = cleaned.filter(|ring| ring.len() >= 3).collect();
        Some(polygon_from_coords(&exterior, &holes))
    }

    /// Checks a polygon and describes the first defect.
    pub fn validate(&self, polygon: &Polygon<f64>) -> u_coverage_core::Result<()> {
        validation::validate(polygon, self.tolerance)
    }
}

impl GeometryKernel for GeoKernel {
    type Polygon = Polygon<f64>;

    fn is_valid_simple(&self, polygon: &Polygon<f64>) -> bool {
        validation::is_valid_simple(polygon, self.tolerance)
    }

    fn union(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> Option<Polygon<f64>> {
        let subject = to_contours(a);
        let clip = to_contours(b);

        let mut shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);
        if shapes.len() != 1 {
            return None;
        }
        let merged = from_shape(shapes.pop()?)?;
        self.clean(&merged)
    }

    fn split_along_line(
        &self,
        polygon: &Polygon<f64>,
        from: Site,
        to: Site,
    ) -> Option<(Polygon<f64>, Polygon<f64>)> {
        split_along_chord(polygon, from, to, self.tolerance)
    }

    fn erode(&self, region: &[Polygon<f64>], distance: f64) -> Vec<Polygon<f64>> {
        if region.is_empty() {
            return Vec::new();
        }

        let multi = MultiPolygon::new(region.to_vec());
        multi
            .buffer(-distance)
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() > self.tolerance)
            .collect()
    }

    fn hole_count(&self, polygon: &Polygon<f64>) -> usize {
        polygon.interiors().len()
    }

    fn area(&self, polygon: &Polygon<f64>) -> f64 {
        polygon.unsigned_area()
    }

    fn distance_to(&self, polygon: &Polygon<f64>, site: Site) -> f64 {
        boundary::distance_to(polygon, site)
    }

    fn boundary_length(&self, polygon: &Polygon<f64>) -> f64 {
        boundary::boundary_length(polygon)
    }

    fn interpolate_along_boundary(&self, polygon: &Polygon<f64>, arc_length: f64) -> Site {
        boundary::interpolate_along_boundary(polygon, arc_length)
    }

    fn nearest_boundary_point(&self, polygon: &Polygon<f64>, site: Site) -> Site {
        boundary::nearest_boundary_point(polygon, site)
    }

    fn snap_nearby(
        &self,
        polygon: &Polygon<f64>,
        reference: &Polygon<f64>,
        tolerance: f64,
    ) -> Polygon<f64> {
        snap_to_reference(polygon, reference, tolerance)
    }

    fn snap_tolerance(&self) -> f64 {
        self.snap_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{polygon_from_coords, rectangle, rings};
    use approx::assert_relative_eq;

    #[test]
    fn test_builder() {
        let kernel = GeoKernel::new()
            .with_tolerance(1e-7)
            .with_snap_tolerance(-1.0);
        assert_eq!(kernel.tolerance(), 1e-7);
        assert_eq!(kernel.snap_tolerance(), 0.0);
        assert_eq!(GeoKernel::default().snap_tolerance(), DEFAULT_SNAP_TOLERANCE);
    }

    #[test]
    fn test_union_touching() {
        let kernel = GeoKernel::new();
        let merged = kernel
            .union(&rectangle(0.0, 0.0, 1.0, 1.0), &rectangle(1.0, 0.0, 2.0, 1.0))
            .unwrap();
        assert_relative_eq!(merged.unsigned_area(), 2.0, epsilon = 1e-9);
        assert!(kernel.is_valid_simple(&merged));
        // The ends of the shared edge become straight-through vertices and are dropped.
        assert_eq!(rings(&merged)[0].len(), 4);
    }

    #[test]
    fn test_union_disjoint_is_none() {
        let kernel = GeoKernel::new();
        assert!(kernel
            .union(&rectangle(0.0, 0.0, 1.0, 1.0), &rectangle(2.0, 0.0, 3.0, 1.0))
            .is_none());
    }

    #[test]
    fn test_merge_snaps_small_gap() {
        let kernel = GeoKernel::new();
        let a = rectangle(0.0, 0.0, 1.0, 1.0);
        let b = rectangle(1.0 + 1e-8, 0.0, 2.0, 1.0);
        let merged = kernel.merge(&a, &b).unwrap();
        assert_relative_eq!(merged.unsigned_area(), 2.0, epsilon = 1e-9);

        let far = rectangle(1.1, 0.0, 2.0, 1.0);
        assert!(kernel.merge(&a, &far).is_none());
    }

    #[test]
    fn test_corner_contact_does_not_merge() {
        let kernel = GeoKernel::new();
        let a = rectangle(0.0, 0.0, 1.0, 1.0);
        let b = rectangle(1.0, 1.0, 2.0, 2.0);
        assert!(kernel.merge(&a, &b).is_none());
    }

    #[test]
    fn test_erode_square() {
        let kernel = GeoKernel::new();
        let eroded = kernel.erode(&[rectangle(0.0, 0.0, 1.0, 1.0)], 0.25);
        assert_eq!(eroded.len(), 1);
        assert_relative_eq!(eroded[0].unsigned_area(), 0.25, epsilon = 1e-6);

        assert!(kernel.erode(&[rectangle(0.0, 0.0, 1.0, 1.0)], 0.6).is_empty());
        assert!(kernel.erode(&[], 0.1).is_empty());
    }

    #[test]
    fn test_erode_dumbbell_splits() {
        // Two squares joined by a thin corridor.
        let dumbbell = polygon_from_coords(
            &[
                (0.0, 0.0),
                (2.0, 0.0),
                (2.0, 0.9),
                (3.0, 0.9),
                (3.0, 0.0),
                (5.0, 0.0),
                (5.0, 2.0),
                (3.0, 2.0),
                (3.0, 1.1),
                (2.0, 1.1),
                (2.0, 2.0),
                (0.0, 2.0),
            ],
            &[],
        );
        let kernel = GeoKernel::new();
        assert!(kernel.is_valid_simple(&dumbbell));
        assert_eq!(kernel.erode(&[dumbbell], 0.2).len(), 2);
    }

    #[test]
    fn test_measurements() {
        let kernel = GeoKernel::new();
        let rect = rectangle(0.0, 0.0, 2.0, 1.0);
        assert_relative_eq!(kernel.area(&rect), 2.0);
        assert_relative_eq!(kernel.boundary_length(&rect), 6.0);
        assert_eq!(kernel.hole_count(&rect), 0);
        assert_relative_eq!(kernel.distance_to(&rect, (2.0, 3.0)), 2.0);
        assert_eq!(kernel.nearest_boundary_point(&rect, (1.0, 0.2)), (1.0, 0.0));
    }
}
