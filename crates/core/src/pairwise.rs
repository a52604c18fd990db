//! Pairwise cut search between two adjacent cells.
//!
//! The two cells are merged, the merged boundary is sampled uniformly by
//! arc length, and every ordered pair of samples is tried as a straight
//! cut. A cut is scored by the worse of the two resulting costs under the
//! better of the two possible site assignments. The best cut is returned
//! only if it strictly lowers the worse cost of the original pair.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::decomposition::Decomposition;
use crate::error::{Error, Result};
use crate::geometry::{CellId, GeometryKernel, Site};
use crate::metric::CostMetric;

/// Which site each piece of a cut receives, with the resulting costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteAssignment {
    /// Site of the first piece.
    pub first_site: Site,
    /// Cost of the first piece with its site.
    pub first_cost: f64,
    /// Site of the second piece.
    pub second_site: Site,
    /// Cost of the second piece with its site.
    pub second_cost: f64,
}

impl SiteAssignment {
    /// The worse of the two costs.
    pub fn max_cost(&self) -> f64 {
        self.first_cost.max(self.second_cost)
    }
}

/// Assigns the two sites to the two pieces.
///
/// The first piece keeps `site_a` unless swapping gives a strictly lower
/// worst cost.
pub fn assign_sites<P, M: CostMetric<P> + ?Sized>(
    metric: &M,
    first: &P,
    second: &P,
    site_a: Site,
    site_b: Site,
) -> SiteAssignment {
    let first_a = metric.compute(first, site_a);
    let second_b = metric.compute(second, site_b);
    let second_a = metric.compute(second, site_a);
    let first_b = metric.compute(first, site_b);

    if first_a.max(second_b) <= second_a.max(first_b) {
        SiteAssignment {
            first_site: site_a,
            first_cost: first_a,
            second_site: site_b,
            second_cost: second_b,
        }
    } else {
        SiteAssignment {
            first_site: site_b,
            first_cost: first_b,
            second_site: site_a,
            second_cost: second_a,
        }
    }
}

/// An improving cut of two adjacent cells.
#[derive(Debug, Clone)]
pub struct PairwiseCut<P> {
    /// First piece of the merged region.
    pub first: P,
    /// Second piece of the merged region.
    pub second: P,
    /// Sites and costs of the pieces.
    pub assignment: SiteAssignment,
    /// The cut segment on the merged boundary.
    pub cut: (Site, Site),
    /// Worse cost of the original pair.
    pub baseline_cost: f64,
    /// Worse cost of the new pair.
    pub best_cost: f64,
}

/// Searches straight cuts of the union of two cells.
///
/// Candidate evaluation runs on rayon unless [`PairwiseCutSearch::sequential`]
/// is requested. The winner is the candidate with the lowest score and,
/// among equal scores, the lowest enumeration index, so parallel and
/// sequential searches return the same cut.
pub struct PairwiseCutSearch<'a, K, M> {
    kernel: &'a K,
    metric: &'a M,
    parallel: bool,
    pool: Option<&'a ThreadPool>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, K, M> PairwiseCutSearch<'a, K, M>
where
    K: GeometryKernel,
    M: CostMetric<K::Polygon>,
{
    /// Creates a parallel search on the global rayon pool.
    pub fn new(kernel: &'a K, metric: &'a M) -> Self {
        Self {
            kernel,
            metric,
            parallel: true,
            pool: None,
            cancel: None,
        }
    }

    /// Creates a search using the kernel and metric of a decomposition.
    pub fn for_decomposition(decomposition: &'a Decomposition<K, M>) -> Self {
        Self::new(decomposition.kernel(), decomposition.metric())
    }

    /// Evaluates candidates on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Evaluates candidates on a dedicated pool.
    pub fn with_pool(mut self, pool: &'a ThreadPool) -> Self {
        self.parallel = true;
        self.pool = Some(pool);
        self
    }

    /// Aborts the search once the flag is raised.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Site assignment for two pieces under this search's metric.
    pub fn assign_sites(
        &self,
        first: &K::Polygon,
        second: &K::Polygon,
        site_a: Site,
        site_b: Site,
    ) -> SiteAssignment {
        assign_sites(self.metric, first, second, site_a, site_b)
    }

    /// Runs the search between two active cells of a decomposition.
    pub fn between(
        &self,
        decomposition: &Decomposition<K, M>,
        a: CellId,
        b: CellId,
        sample_count: usize,
    ) -> Result<Option<PairwiseCut<K::Polygon>>> {
        let polygon_a = decomposition.polygon_of(a).ok_or(Error::CellNotFound(a))?;
        let polygon_b = decomposition.polygon_of(b).ok_or(Error::CellNotFound(b))?;
        let site_a = decomposition.site_of(a).ok_or(Error::CellNotFound(a))?;
        let site_b = decomposition.site_of(b).ok_or(Error::CellNotFound(b))?;

        Ok(self.optimal_cut(polygon_a, site_a, polygon_b, site_b, sample_count))
    }

    /// Finds the best straight cut of `a ∪ b`.
    ///
    /// Returns `None` if the cells do not merge into one valid polygon, if
    /// no candidate strictly beats the current worse cost, or if the search
    /// was cancelled.
    pub fn optimal_cut(
        &self,
        a: &K::Polygon,
        site_a: Site,
        b: &K::Polygon,
        site_b: Site,
        sample_count: usize,
    ) -> Option<PairwiseCut<K::Polygon>> {
        let Some(union) = self.kernel.merge(a, b) else {
            log::debug!("cells do not merge into a single polygon");
            return None;
        };

        let samples = self.kernel.sample_boundary(&union, sample_count);
        let baseline = self
            .metric
            .compute(a, site_a)
            .max(self.metric.compute(b, site_b));

        let (score, index) = self.best_candidate(&union, &samples, site_a, site_b)?;
        if self.is_cancelled() {
            return None;
        }
        if score.total_cmp(&baseline) != CmpOrdering::Less {
            log::debug!(
                "no improving cut: best {:.4} vs baseline {:.4}",
                score,
                baseline
            );
            return None;
        }

        let n = samples.len();
        let cut = (samples[index / n], samples[index % n]);
        let (first, second) = self.kernel.split_along_line(&union, cut.0, cut.1)?;
        let first = self.snap_piece(first, &union);
        let second = self.snap_piece(second, &union);

        let assignment = self.assign_sites(&first, &second, site_a, site_b);
        let best_cost = assignment.max_cost();
        if best_cost.total_cmp(&baseline) != CmpOrdering::Less {
            log::warn!(
                "cut lost its improvement after snapping ({:.4} vs {:.4})",
                best_cost,
                baseline
            );
            return None;
        }

        log::debug!(
            "cut ({:.3}, {:.3}) -> ({:.3}, {:.3}) lowers {:.4} to {:.4}",
            cut.0 .0,
            cut.0 .1,
            cut.1 .0,
            cut.1 .1,
            baseline,
            best_cost
        );

        Some(PairwiseCut {
            first,
            second,
            assignment,
            cut,
            baseline_cost: baseline,
            best_cost,
        })
    }

    /// Snaps a piece onto the merged boundary, keeping the raw piece if
    /// snapping would invalidate it.
    fn snap_piece(&self, piece: K::Polygon, union: &K::Polygon) -> K::Polygon {
        let tolerance = self.kernel.snap_tolerance();
        if tolerance <= 0.0 {
            return piece;
        }
        let snapped = self.kernel.snap_nearby(&piece, union, tolerance);
        if self.kernel.is_valid_simple(&snapped) {
            snapped
        } else {
            piece
        }
    }

    /// Lowest `(score, index)` over all ordered sample pairs.
    fn best_candidate(
        &self,
        union: &K::Polygon,
        samples: &[Site],
        site_a: Site,
        site_b: Site,
    ) -> Option<(f64, usize)> {
        let n = samples.len();
        let total = n * n;

        let evaluate = |index: usize| -> Option<(f64, usize)> {
            if self.is_cancelled() {
                return None;
            }
            let from = samples[index / n];
            let to = samples[index % n];
            self.score(union, from, to, site_a, site_b)
                .map(|score| (score, index))
        };

        if !self.parallel {
            return (0..total).filter_map(&evaluate).reduce(pick_better);
        }

        let run = || {
            (0..total)
                .into_par_iter()
                .filter_map(&evaluate)
                .reduce_with(pick_better)
        };
        match self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn score(
        &self,
        union: &K::Polygon,
        from: Site,
        to: Site,
        site_a: Site,
        site_b: Site,
    ) -> Option<f64> {
        if from == to {
            return None;
        }
        let (first, second) = self.kernel.split_along_line(union, from, to)?;
        Some(self.assign_sites(&first, &second, site_a, site_b).max_cost())
    }
}

fn pick_better(current: (f64, usize), other: (f64, usize)) -> (f64, usize) {
    match other.0.total_cmp(&current.0) {
        CmpOrdering::Less => other,
        CmpOrdering::Equal if other.1 < current.1 => other,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::ChiMetric;
    use crate::testing::{Rect, RectKernel};
    use approx::assert_relative_eq;

    fn metric() -> ChiMetric<RectKernel> {
        ChiMetric::new(RectKernel, 0.1).unwrap()
    }

    fn left() -> Rect {
        Rect::new(0.0, 0.0, 1.0, 1.0)
    }

    fn right() -> Rect {
        Rect::new(1.0, 0.0, 2.0, 1.0)
    }

    #[test]
    fn test_finds_horizontal_cut() {
        let metric = metric();
        let search = PairwiseCutSearch::new(&RectKernel, &metric).sequential();

        let cut = search
            .optimal_cut(&left(), (0.0, 0.0), &right(), (1.0, 0.0), 13)
            .expect("improving cut");

        assert_relative_eq!(cut.baseline_cost, 60.0, epsilon = 1e-9);
        assert_relative_eq!(cut.best_cost, 31.0, epsilon = 1e-9);
        assert_eq!(cut.cut, ((2.0, 0.5), (0.0, 0.5)));
        assert_eq!(cut.first, Rect::new(0.0, 0.0, 2.0, 0.5));
        assert_eq!(cut.second, Rect::new(0.0, 0.5, 2.0, 1.0));
        assert_eq!(cut.assignment.first_site, (0.0, 0.0));
        assert_eq!(cut.assignment.second_site, (1.0, 0.0));
        assert_relative_eq!(cut.assignment.first_cost, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_strict_improvement_returns_none() {
        let metric = metric();
        let search = PairwiseCutSearch::new(&RectKernel, &metric).sequential();
        // Seven samples only allow the existing vertical cut at x = 1.
        assert!(search
            .optimal_cut(&left(), (0.0, 0.0), &right(), (1.0, 0.0), 7)
            .is_none());
    }

    #[test]
    fn test_non_adjacent_cells_return_none() {
        let metric = metric();
        let search = PairwiseCutSearch::new(&RectKernel, &metric);
        let far = Rect::new(3.0, 0.0, 4.0, 1.0);
        assert!(search
            .optimal_cut(&left(), (0.0, 0.0), &far, (3.0, 0.0), 13)
            .is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let metric = metric();
        let sequential = PairwiseCutSearch::new(&RectKernel, &metric).sequential();
        let parallel = PairwiseCutSearch::new(&RectKernel, &metric);

        let a = Rect::new(0.0, 0.0, 2.0, 1.0);
        let b = Rect::new(2.0, 0.0, 3.0, 1.0);
        let s = sequential.optimal_cut(&a, (0.0, 0.0), &b, (3.0, 1.0), 25);
        let p = parallel.optimal_cut(&a, (0.0, 0.0), &b, (3.0, 1.0), 25);

        match (s, p) {
            (Some(s), Some(p)) => {
                assert_eq!(s.cut, p.cut);
                assert_eq!(s.best_cost.to_bits(), p.best_cost.to_bits());
                assert_eq!(s.first, p.first);
            }
            (None, None) => {}
            _ => panic!("parallel and sequential searches disagree"),
        }
    }

    #[test]
    fn test_dedicated_pool() {
        let metric = metric();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let search = PairwiseCutSearch::new(&RectKernel, &metric).with_pool(&pool);
        let cut = search
            .optimal_cut(&left(), (0.0, 0.0), &right(), (1.0, 0.0), 13)
            .unwrap();
        assert_eq!(cut.cut, ((2.0, 0.5), (0.0, 0.5)));
    }

    #[test]
    fn test_cancelled_search_returns_none() {
        let metric = metric();
        let flag = AtomicBool::new(true);
        let search = PairwiseCutSearch::new(&RectKernel, &metric).with_cancel_flag(&flag);
        assert!(search
            .optimal_cut(&left(), (0.0, 0.0), &right(), (1.0, 0.0), 13)
            .is_none());
    }

    #[test]
    fn test_assign_sites_swaps_when_better() {
        let metric = metric();
        let keep = assign_sites(&metric, &left(), &right(), (0.0, 0.0), (2.0, 0.0));
        assert_eq!(keep.first_site, (0.0, 0.0));
        assert_eq!(keep.second_site, (2.0, 0.0));

        let swap = assign_sites(&metric, &left(), &right(), (2.0, 0.0), (0.0, 0.0));
        assert_eq!(swap.first_site, (0.0, 0.0));
        assert_eq!(swap.second_site, (2.0, 0.0));
        assert_relative_eq!(swap.max_cost(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_between_unknown_cell() {
        let metric = metric();
        let mut d = Decomposition::new(RectKernel, metric);
        let a = d.add(left(), (0.0, 0.0)).unwrap();

        let search = PairwiseCutSearch::for_decomposition(&d);
        assert_eq!(
            search.between(&d, a, 9, 13).err(),
            Some(Error::CellNotFound(9))
        );
    }

    #[test]
    fn test_pick_better_prefers_lower_index_on_ties() {
        assert_eq!(pick_better((1.0, 5), (1.0, 3)), (1.0, 3));
        assert_eq!(pick_better((1.0, 3), (1.0, 5)), (1.0, 3));
        assert_eq!(pick_better((2.0, 0), (1.0, 9)), (1.0, 9));
    }
}
