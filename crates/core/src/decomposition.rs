//! Authoritative state of a coverage decomposition.
//!
//! A [`Decomposition`] owns every active cell (polygon, site and cached
//! cost), the symmetric adjacency relation between cells, and an index of
//! cell ids sorted by cost. Cells are immutable once admitted: re-cutting
//! a region means removing the old cells and adding new ones.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::geometry::{is_finite_site, CellId, GeometryKernel, Site};
use crate::metric::CostMetric;

#[derive(Debug, Clone)]
struct Cell<P> {
    polygon: P,
    site: Site,
    cost: f64,
}

/// Read-only view of one cell.
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a, P> {
    /// Cell id.
    pub id: CellId,
    /// Cell polygon.
    pub polygon: &'a P,
    /// Robot site.
    pub site: Site,
    /// Cached cost.
    pub cost: f64,
}

/// Polygonal decomposition with cached costs and adjacency.
///
/// # Example
///
/// ```rust,ignore
/// let kernel = GeoKernel::new();
/// let metric = ChiMetric::new(kernel.clone(), 0.1)?;
/// let mut decomposition = Decomposition::new(kernel, metric);
///
/// let a = decomposition.add(rectangle(0.0, 0.0, 1.0, 1.0), (0.0, 0.0))?;
/// let b = decomposition.add(rectangle(1.0, 0.0, 2.0, 1.0), (1.0, 0.0))?;
/// assert!(decomposition.neighbors_of(a).contains(&b));
/// ```
#[derive(Debug, Clone)]
pub struct Decomposition<K: GeometryKernel, M> {
    kernel: K,
    metric: M,
    cells: BTreeMap<CellId, Cell<K::Polygon>>,
    adjacency: BTreeMap<CellId, BTreeSet<CellId>>,
    /// Active ids sorted non-decreasing by cost; equal costs keep insertion order.
    order: Vec<(CellId, f64)>,
    next_id: CellId,
}

impl<K, M> Decomposition<K, M>
where
    K: GeometryKernel,
    M: CostMetric<K::Polygon>,
{
    /// Creates an empty decomposition.
    pub fn new(kernel: K, metric: M) -> Self {
        Self {
            kernel,
            metric,
            cells: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    /// Creates a decomposition from `(polygon, site)` pairs, added in order.
    pub fn from_cells<I>(kernel: K, metric: M, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K::Polygon, Site)>,
    {
        let mut decomposition = Self::new(kernel, metric);
        for (polygon, site) in cells {
            decomposition.add(polygon, site)?;
        }
        Ok(decomposition)
    }

    /// Geometry kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Cost metric.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Admits a new cell and returns its id.
    ///
    /// The polygon must be valid and simple and the site finite; otherwise
    /// [`Error::InvalidGeometry`] is returned and nothing changes. The cost
    /// is computed once here, adjacency is tested against every active cell.
    pub fn add(&mut self, polygon: K::Polygon, site: Site) -> Result<CellId> {
        let cost = self.admit(&polygon, site)?;
        Ok(self.insert_unchecked(polygon, site, cost))
    }

    /// Validates a candidate cell and computes its cost.
    fn admit(&self, polygon: &K::Polygon, site: Site) -> Result<f64> {
        if !is_finite_site(site) {
            return Err(Error::InvalidGeometry(format!(
                "site ({}, {}) is not finite",
                site.0, site.1
            )));
        }
        if !self.kernel.is_valid_simple(polygon) {
            return Err(Error::InvalidGeometry(
                "polygon is not a valid simple polygon".into(),
            ));
        }

        let cost = self.metric.compute(polygon, site);
        if !cost.is_finite() || cost < 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "{} metric produced cost {}",
                self.metric.name(),
                cost
            )));
        }
        Ok(cost)
    }

    fn insert_unchecked(&mut self, polygon: K::Polygon, site: Site, cost: f64) -> CellId {
        let id = self.next_id;
        self.next_id += 1;

        let neighbors: BTreeSet<CellId> = self
            .cells
            .iter()
            .filter(|(_, other)| self.kernel.merge(&other.polygon, &polygon).is_some())
            .map(|(&other_id, _)| other_id)
            .collect();

        for &other in &neighbors {
            self.adjacency.entry(other).or_default().insert(id);
        }
        self.adjacency.insert(id, neighbors);

        let position = self.order.partition_point(|&(_, c)| c <= cost);
        self.order.insert(position, (id, cost));

        self.cells.insert(id, Cell { polygon, site, cost });

        log::debug!(
            "added cell {} (cost {:.3}, {} neighbors)",
            id,
            cost,
            self.adjacency.get(&id).map_or(0, BTreeSet::len)
        );
        debug_assert!(self.validate_invariants().is_ok());
        id
    }

    /// Removes a cell. Returns false (and changes nothing) if it is not active.
    pub fn remove(&mut self, id: CellId) -> bool {
        if self.cells.remove(&id).is_none() {
            return false;
        }

        if let Some(neighbors) = self.adjacency.remove(&id) {
            for other in neighbors {
                if let Some(back) = self.adjacency.get_mut(&other) {
                    back.remove(&id);
                }
            }
        }
        self.order.retain(|&(other, _)| other != id);

        log::debug!("removed cell {}", id);
        debug_assert!(self.validate_invariants().is_ok());
        true
    }

    /// Replaces two active cells by two new ones.
    ///
    /// All inputs are validated before anything is removed, so a failure
    /// leaves the decomposition untouched. Returns the ids of the new cells
    /// in argument order.
    pub fn replace_pair(
        &mut self,
        old: (CellId, CellId),
        first: (K::Polygon, Site),
        second: (K::Polygon, Site),
    ) -> Result<(CellId, CellId)> {
        for id in [old.0, old.1] {
            if !self.contains(id) {
                return Err(Error::CellNotFound(id));
            }
        }
        let first_cost = self.admit(&first.0, first.1)?;
        let second_cost = self.admit(&second.0, second.1)?;

        self.remove(old.0);
        self.remove(old.1);
        let a = self.insert_unchecked(first.0, first.1, first_cost);
        let b = self.insert_unchecked(second.0, second.1, second_cost);
        Ok((a, b))
    }

    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if there are no active cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if the id is active.
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    /// Cached cost of a cell.
    pub fn cost_of(&self, id: CellId) -> Option<f64> {
        self.cells.get(&id).map(|c| c.cost)
    }

    /// Polygon of a cell.
    pub fn polygon_of(&self, id: CellId) -> Option<&K::Polygon> {
        self.cells.get(&id).map(|c| &c.polygon)
    }

    /// Site of a cell.
    pub fn site_of(&self, id: CellId) -> Option<Site> {
        self.cells.get(&id).map(|c| c.site)
    }

    /// Neighbors of a cell, in id order. Empty for inactive ids.
    pub fn neighbors_of(&self, id: CellId) -> Vec<CellId> {
        self.adjacency
            .get(&id)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns true if the two cells are adjacent.
    pub fn are_adjacent(&self, a: CellId, b: CellId) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Highest-cost cell (latest inserted among equals).
    pub fn worst_id(&self) -> Option<CellId> {
        self.order.last().map(|&(id, _)| id)
    }

    /// Lowest-cost cell.
    pub fn best_id(&self) -> Option<CellId> {
        self.order.first().map(|&(id, _)| id)
    }

    /// Highest cost, or `None` when empty.
    pub fn max_cost(&self) -> Option<f64> {
        self.order.last().map(|&(_, cost)| cost)
    }

    /// Sum of all cell costs.
    pub fn total_cost(&self) -> f64 {
        self.order.iter().map(|&(_, cost)| cost).sum()
    }

    /// Active ids in cost-ascending order.
    pub fn ordered_ids(&self) -> Vec<CellId> {
        self.order.iter().map(|&(id, _)| id).collect()
    }

    /// `(id, cost)` pairs worst first.
    pub fn costs_descending(&self) -> Vec<(CellId, f64)> {
        self.order.iter().rev().copied().collect()
    }

    /// Iterates all cells in id order.
    pub fn iter(&self) -> impl Iterator<Item = CellView<'_, K::Polygon>> + '_ {
        self.cells.iter().map(|(&id, cell)| CellView {
            id,
            polygon: &cell.polygon,
            site: cell.site,
            cost: cell.cost,
        })
    }

    /// Number of adjacency edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Re-derives the structural invariants from scratch.
    pub fn validate_invariants(&self) -> Result<()> {
        let violation = |msg: String| Err(Error::InvariantViolation(msg));

        if self.adjacency.len() != self.cells.len() {
            return violation(format!(
                "{} adjacency entries for {} cells",
                self.adjacency.len(),
                self.cells.len()
            ));
        }

        for (&id, neighbors) in &self.adjacency {
            if !self.cells.contains_key(&id) {
                return violation(format!("adjacency entry for inactive cell {}", id));
            }
            if id >= self.next_id {
                return violation(format!("cell {} was never issued", id));
            }
            for &other in neighbors {
                if other == id {
                    return violation(format!("cell {} is adjacent to itself", id));
                }
                if !self.are_adjacent(other, id) {
                    return violation(format!("adjacency {} -> {} is not symmetric", id, other));
                }
            }
        }

        if self.order.len() != self.cells.len() {
            return violation(format!(
                "cost index holds {} entries for {} cells",
                self.order.len(),
                self.cells.len()
            ));
        }
        let mut seen = BTreeSet::new();
        for &(id, cost) in &self.order {
            if !seen.insert(id) {
                return violation(format!("cell {} indexed twice", id));
            }
            match self.cells.get(&id) {
                Some(cell) if cell.cost.to_bits() == cost.to_bits() => {}
                Some(_) => return violation(format!("stale cost for cell {}", id)),
                None => return violation(format!("inactive cell {} in cost index", id)),
            }
        }
        if self.order.windows(2).any(|w| w[0].1 > w[1].1) {
            return violation("cost index is not sorted".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{ChiMetric, TransitAreaMetric};
    use crate::testing::{Rect, RectKernel};
    use approx::assert_relative_eq;

    fn chi_decomposition() -> Decomposition<RectKernel, ChiMetric<RectKernel>> {
        let metric = ChiMetric::new(RectKernel, 0.1).unwrap();
        Decomposition::new(RectKernel, metric)
    }

    fn area_decomposition() -> Decomposition<RectKernel, TransitAreaMetric<RectKernel>> {
        let metric = TransitAreaMetric::new(RectKernel, 1.0).unwrap();
        Decomposition::new(RectKernel, metric)
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        let b = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(d.len(), 2);
        assert_relative_eq!(d.cost_of(a).unwrap(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_touching_cells_adjacent_gapped_not() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        let b = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();
        let c = d.add(Rect::new(2.5, 0.0, 3.5, 1.0), (3.0, 0.0)).unwrap();

        assert!(d.are_adjacent(a, b));
        assert!(d.are_adjacent(b, a));
        assert!(!d.are_adjacent(b, c));
        assert!(d.neighbors_of(c).is_empty());
        assert_eq!(d.edge_count(), 1);
        d.validate_invariants().unwrap();
    }

    #[test]
    fn test_invalid_cell_rejected_without_mutation() {
        let mut d = chi_decomposition();
        d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();

        let degenerate = d.add(Rect::new(1.0, 0.0, 1.0, 1.0), (0.0, 0.0));
        assert!(matches!(degenerate, Err(Error::InvalidGeometry(_))));
        let bad_site = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (f64::NAN, 0.0));
        assert!(matches!(bad_site, Err(Error::InvalidGeometry(_))));

        assert_eq!(d.len(), 1);
        assert_eq!(d.ordered_ids(), vec![0]);
        // Rejected adds do not consume ids.
        let next = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();
        assert_eq!(next, 1);
    }

    #[test]
    fn test_cost_order_and_stable_ties() {
        let mut d = area_decomposition();
        // Costs equal to the areas with a unit radius and sites inside.
        let big = d.add(Rect::new(0.0, 0.0, 3.0, 1.0), (0.5, 0.5)).unwrap();
        let small = d.add(Rect::new(5.0, 0.0, 6.0, 1.0), (5.5, 0.5)).unwrap();
        let mid = d.add(Rect::new(8.0, 0.0, 10.0, 1.0), (8.5, 0.5)).unwrap();
        let small_twin = d.add(Rect::new(12.0, 0.0, 13.0, 1.0), (12.5, 0.5)).unwrap();

        assert_eq!(d.ordered_ids(), vec![small, small_twin, mid, big]);
        assert_eq!(d.best_id(), Some(small));
        assert_eq!(d.worst_id(), Some(big));
        assert_relative_eq!(d.max_cost().unwrap(), 3.0);
        assert_relative_eq!(d.total_cost(), 7.0);

        let descending: Vec<_> = d.costs_descending().into_iter().map(|(id, _)| id).collect();
        assert_eq!(descending, vec![big, mid, small_twin, small]);
    }

    #[test]
    fn test_remove_cleans_up() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        let b = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();
        let c = d.add(Rect::new(0.0, 1.0, 1.0, 2.0), (0.0, 1.0)).unwrap();

        assert!(d.remove(a));
        assert!(!d.contains(a));
        assert!(d.neighbors_of(b).is_empty());
        assert!(d.neighbors_of(c).is_empty());
        assert!(!d.ordered_ids().contains(&a));
        assert_eq!(d.cost_of(a), None);
        d.validate_invariants().unwrap();

        // Removing twice, or an id never issued, is a no-op.
        assert!(!d.remove(a));
        assert!(!d.remove(99));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        d.remove(a);
        let b = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_replace_pair() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        let b = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();

        let (x, y) = d
            .replace_pair(
                (a, b),
                (Rect::new(0.0, 0.0, 2.0, 0.5), (0.0, 0.0)),
                (Rect::new(0.0, 0.5, 2.0, 1.0), (1.0, 0.0)),
            )
            .unwrap();

        assert_eq!(d.len(), 2);
        assert!(!d.contains(a) && !d.contains(b));
        assert!(d.are_adjacent(x, y));
        assert_eq!(d.site_of(y), Some((1.0, 0.0)));
        d.validate_invariants().unwrap();
    }

    #[test]
    fn test_replace_pair_failure_leaves_state() {
        let mut d = chi_decomposition();
        let a = d.add(Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
        let b = d.add(Rect::new(1.0, 0.0, 2.0, 1.0), (1.0, 0.0)).unwrap();

        let bad = d.replace_pair(
            (a, b),
            (Rect::new(0.0, 0.0, 2.0, 0.5), (0.0, 0.0)),
            (Rect::new(0.0, 0.5, 0.0, 1.0), (1.0, 0.0)),
        );
        assert!(matches!(bad, Err(Error::InvalidGeometry(_))));

        let missing = d.replace_pair(
            (a, 42),
            (Rect::new(0.0, 0.0, 2.0, 0.5), (0.0, 0.0)),
            (Rect::new(0.0, 0.5, 2.0, 1.0), (1.0, 0.0)),
        );
        assert_eq!(missing.err(), Some(Error::CellNotFound(42)));

        assert!(d.contains(a) && d.contains(b));
        assert!(d.are_adjacent(a, b));
    }

    #[test]
    fn test_iter_views_in_id_order() {
        let d = Decomposition::from_cells(
            RectKernel,
            ChiMetric::new(RectKernel, 0.1).unwrap(),
            vec![
                (Rect::new(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)),
                (Rect::new(1.0, 0.0, 2.0, 1.0), (2.0, 0.0)),
            ],
        )
        .unwrap();

        let views: Vec<_> = d.iter().collect();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, 0);
        assert_eq!(views[1].site, (2.0, 0.0));
        assert_eq!(*views[1].polygon, Rect::new(1.0, 0.0, 2.0, 1.0));
        assert_eq!(d.cost_of(1), Some(views[1].cost));
    }

    #[test]
    fn test_empty_reads() {
        let d = chi_decomposition();
        assert!(d.is_empty());
        assert_eq!(d.worst_id(), None);
        assert_eq!(d.best_id(), None);
        assert_eq!(d.max_cost(), None);
        assert!(d.neighbors_of(0).is_empty());
        d.validate_invariants().unwrap();
    }
}
