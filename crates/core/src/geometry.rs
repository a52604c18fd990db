//! Geometry collaborator interface.
//!
//! The reoptimization algorithms never touch coordinates directly. Every
//! boolean operation, split, erosion and boundary query goes through a
//! [`GeometryKernel`], so the same decomposition logic runs on top of the
//! `geo`-based kernel in `u-coverage-d2` or on a lightweight test double.

/// Identifier of a cell within a decomposition.
///
/// Ids come from a monotonically increasing counter and are never reused.
pub type CellId = u64;

/// A robot starting position.
pub type Site = (f64, f64);

/// Euclidean distance between two sites.
#[inline]
pub fn site_distance(a: Site, b: Site) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Returns true if both coordinates of the site are finite.
#[inline]
pub fn is_finite_site(site: Site) -> bool {
    site.0.is_finite() && site.1.is_finite()
}

/// Polygon primitives consumed by the decomposition, the metrics and the
/// cut search.
///
/// Implementations must be deterministic: identical inputs give
/// bit-identical outputs. Operations that cannot produce a meaningful
/// answer return `None` (or an empty region) instead of panicking.
pub trait GeometryKernel: Send + Sync {
    /// Polygon type (exterior ring plus optional holes).
    type Polygon: Clone + std::fmt::Debug + Send + Sync;

    /// Returns true if the polygon is valid and simple: no self-intersections,
    /// no zero-length or spike edges, holes strictly inside the exterior.
    fn is_valid_simple(&self, polygon: &Self::Polygon) -> bool;

    /// Boolean union. Returns `None` unless the result is exactly one polygon.
    fn union(&self, a: &Self::Polygon, b: &Self::Polygon) -> Option<Self::Polygon>;

    /// Splits the polygon along the segment `from -> to`.
    ///
    /// Returns `None` unless the segment cleanly bisects the polygon into
    /// exactly two valid simple polygons.
    fn split_along_line(
        &self,
        polygon: &Self::Polygon,
        from: Site,
        to: Site,
    ) -> Option<(Self::Polygon, Self::Polygon)>;

    /// Inward buffer of a (possibly disconnected) region by `distance`.
    ///
    /// Returns an empty vector once the region has collapsed.
    fn erode(&self, region: &[Self::Polygon], distance: f64) -> Vec<Self::Polygon>;

    /// Number of interior rings.
    fn hole_count(&self, polygon: &Self::Polygon) -> usize;

    /// Unsigned area.
    fn area(&self, polygon: &Self::Polygon) -> f64;

    /// Distance from the site to the polygon (zero when inside).
    fn distance_to(&self, polygon: &Self::Polygon, site: Site) -> f64;

    /// Length of the exterior ring.
    fn boundary_length(&self, polygon: &Self::Polygon) -> f64;

    /// Point at the given arc length along the exterior ring, starting at its
    /// first vertex. Arc lengths are clamped to `[0, boundary_length]`.
    fn interpolate_along_boundary(&self, polygon: &Self::Polygon, arc_length: f64) -> Site;

    /// Closest point on any ring of the polygon.
    fn nearest_boundary_point(&self, polygon: &Self::Polygon, site: Site) -> Site;

    /// Moves vertices of `polygon` that lie within `tolerance` of `reference`
    /// onto it. Applying it twice gives the same polygon as applying it once.
    fn snap_nearby(
        &self,
        polygon: &Self::Polygon,
        reference: &Self::Polygon,
        tolerance: f64,
    ) -> Self::Polygon;

    /// Tolerance used by [`GeometryKernel::merge`] to treat near-touching
    /// cells as touching.
    fn snap_tolerance(&self) -> f64 {
        0.0
    }

    /// Merges two cells into one valid simple polygon, if possible.
    ///
    /// `b` is snapped onto `a` first so that near-coincident shared edges
    /// are treated as exactly shared. This is the operational definition of
    /// adjacency used by the decomposition and by the cut search.
    fn merge(&self, a: &Self::Polygon, b: &Self::Polygon) -> Option<Self::Polygon> {
        let tolerance = self.snap_tolerance();
        let merged = if tolerance > 0.0 {
            let snapped = self.snap_nearby(b, a, tolerance);
            self.union(a, &snapped)?
        } else {
            self.union(a, b)?
        };

        if self.is_valid_simple(&merged) {
            Some(merged)
        } else {
            None
        }
    }

    /// Samples `count` points uniformly by arc length along the exterior,
    /// including both ends of the ring (the first and last sample coincide
    /// when `count > 1`).
    fn sample_boundary(&self, polygon: &Self::Polygon, count: usize) -> Vec<Site> {
        match count {
            0 => Vec::new(),
            1 => vec![self.interpolate_along_boundary(polygon, 0.0)],
            _ => {
                let length = self.boundary_length(polygon);
                let step = length / (count - 1) as f64;
                (0..count)
                    .map(|i| self.interpolate_along_boundary(polygon, step * i as f64))
                    .collect()
            }
        }
    }
}
