//! Global min-max reoptimization.
//!
//! Each round starts at the most expensive cell and tries to re-cut it
//! against a strictly cheaper neighbor. When none of its neighbors yields
//! an improving cut, the search descends depth-first into those neighbors
//! and tries again from there: lowering a neighbor's cost may be what the
//! next round needs to improve the worst cell.
//!
//! Every applied cut involves a cell and a strictly cheaper neighbor and
//! strictly lowers the worse of the two costs, so the maximum cost of the
//! decomposition never increases.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::decomposition::Decomposition;
use crate::error::{Error, Result};
use crate::geometry::{CellId, GeometryKernel};
use crate::metric::CostMetric;
use crate::pairwise::PairwiseCutSearch;
use crate::result::{ReoptResult, RoundOutcome};
use crate::solver::{ProgressCallback, ProgressInfo, ReoptConfig};

/// One level of the depth-first descent.
struct Frame {
    cell: CellId,
    depth: usize,
    /// Strictly cheaper neighbors, cheapest first.
    candidates: Vec<CellId>,
    next: usize,
}

impl Frame {
    fn new<K, M>(decomposition: &Decomposition<K, M>, cell: CellId, depth: usize) -> Self
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        let cost = decomposition.cost_of(cell).unwrap_or(f64::NEG_INFINITY);
        let mut candidates: Vec<(f64, CellId)> = decomposition
            .neighbors_of(cell)
            .into_iter()
            .filter_map(|n| decomposition.cost_of(n).map(|c| (c, n)))
            .filter(|&(c, _)| c < cost)
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Self {
            cell,
            depth,
            candidates: candidates.into_iter().map(|(_, id)| id).collect(),
            next: 0,
        }
    }

    fn next_candidate(&mut self) -> Option<CellId> {
        let candidate = self.candidates.get(self.next).copied();
        self.next += 1;
        candidate
    }
}

/// Iterated worst-cell improvement driver.
///
/// # Example
///
/// ```rust,ignore
/// let reoptimizer = GlobalReoptimizer::new(ReoptConfig::default().with_sample_count(50))?;
/// let result = reoptimizer.run(&mut decomposition)?;
/// println!("max cost {:?} -> {:?}", result.initial_max_cost(), result.final_max_cost());
/// ```
pub struct GlobalReoptimizer {
    config: ReoptConfig,
    cancelled: Arc<AtomicBool>,
}

impl GlobalReoptimizer {
    /// Creates a reoptimizer, validating the configuration.
    pub fn new(config: ReoptConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ReoptConfig {
        &self.config
    }

    /// Requests cancellation. Checked between rounds and between candidates.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns a handle that can cancel the run from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Runs up to `num_iterations` rounds.
    pub fn run<K, M>(&self, decomposition: &mut Decomposition<K, M>) -> Result<ReoptResult>
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        self.run_inner(decomposition, None)
    }

    /// Runs with a callback invoked after every round.
    pub fn run_with_progress<K, M>(
        &self,
        decomposition: &mut Decomposition<K, M>,
        callback: ProgressCallback,
    ) -> Result<ReoptResult>
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        self.run_inner(decomposition, Some(callback))
    }

    /// Runs exactly one round.
    pub fn step<K, M>(&self, decomposition: &mut Decomposition<K, M>) -> Result<RoundOutcome>
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        let pool = self.build_pool()?;
        self.round(decomposition, pool.as_ref())
    }

    fn build_pool(&self) -> Result<Option<ThreadPool>> {
        if self.config.threads <= 1 {
            return Ok(None);
        }
        ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("cannot build thread pool: {}", e)))
    }

    fn run_inner<K, M>(
        &self,
        decomposition: &mut Decomposition<K, M>,
        callback: Option<ProgressCallback>,
    ) -> Result<ReoptResult>
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        let start = Instant::now();
        let pool = self.build_pool()?;
        let total = self.config.num_iterations;

        let mut result = ReoptResult::new().with_metric(decomposition.metric().name());
        result.initial_costs = decomposition.costs_descending();

        log::info!(
            "reoptimizing {} cells for up to {} rounds (max cost {:?})",
            decomposition.len(),
            total,
            decomposition.max_cost()
        );

        for round in 0..total {
            if self.is_cancelled() {
                result.cancelled = true;
                break;
            }
            if self.config.time_limit_ms > 0
                && start.elapsed().as_millis() as u64 >= self.config.time_limit_ms
            {
                result.time_limit_reached = true;
                break;
            }

            let outcome = self.round(decomposition, pool.as_ref())?;
            let max_cost = decomposition.max_cost().unwrap_or(0.0);

            match outcome {
                RoundOutcome::Improved {
                    removed,
                    added,
                    depth,
                } => {
                    log::info!(
                        "round {}: replaced {:?} with {:?} at depth {}, max cost {:.4}",
                        round + 1,
                        removed,
                        added,
                        depth,
                        max_cost
                    );
                }
                RoundOutcome::NoImprovement => {
                    log::info!("round {}: no improvement found", round + 1);
                }
                RoundOutcome::Empty | RoundOutcome::Cancelled => {}
            }

            if outcome == RoundOutcome::Cancelled {
                result.cancelled = true;
                break;
            }
            result.outcomes.push(outcome);
            result.max_cost_history.push(max_cost);

            if let Some(ref cb) = callback {
                let info = ProgressInfo::new()
                    .with_round(round + 1, total)
                    .with_max_cost(max_cost)
                    .with_cells(decomposition.len(), result.cuts_applied())
                    .with_elapsed(start.elapsed().as_millis() as u64)
                    .with_phase("round");
                cb(info);
            }

            if outcome == RoundOutcome::Empty
                || (outcome == RoundOutcome::NoImprovement && self.config.stop_when_stuck)
            {
                break;
            }
        }

        result.final_costs = decomposition.costs_descending();
        result.computation_time_ms = start.elapsed().as_millis() as u64;

        if let Some(ref cb) = callback {
            let info = ProgressInfo::new()
                .with_round(result.rounds() as u32, total)
                .with_max_cost(decomposition.max_cost().unwrap_or(0.0))
                .with_cells(decomposition.len(), result.cuts_applied())
                .with_elapsed(result.computation_time_ms)
                .with_phase("done")
                .finished();
            cb(info);
        }

        Ok(result)
    }

    /// One round: descend from the worst cell until a cut is applied.
    fn round<K, M>(
        &self,
        decomposition: &mut Decomposition<K, M>,
        pool: Option<&ThreadPool>,
    ) -> Result<RoundOutcome>
    where
        K: GeometryKernel,
        M: CostMetric<K::Polygon>,
    {
        let Some(worst) = decomposition.worst_id() else {
            return Ok(RoundOutcome::Empty);
        };

        let mut search =
            PairwiseCutSearch::for_decomposition(decomposition).with_cancel_flag(&self.cancelled);
        search = match (self.config.threads, pool) {
            (1, _) => search.sequential(),
            (_, Some(pool)) => search.with_pool(pool),
            _ => search,
        };

        let mut visited = BTreeSet::from([worst]);
        let mut stack = vec![Frame::new(decomposition, worst, 0)];

        while let Some(frame) = stack.last_mut() {
            if self.is_cancelled() {
                return Ok(RoundOutcome::Cancelled);
            }

            let Some(candidate) = frame.next_candidate() else {
                stack.pop();
                continue;
            };
            let (cell, depth) = (frame.cell, frame.depth);

            log::debug!("trying cell {} against neighbor {} (depth {})", cell, candidate, depth);

            match search.between(decomposition, cell, candidate, self.config.sample_count)? {
                Some(cut) => {
                    let a = cut.assignment;
                    let added = decomposition.replace_pair(
                        (cell, candidate),
                        (cut.first, a.first_site),
                        (cut.second, a.second_site),
                    )?;
                    return Ok(RoundOutcome::Improved {
                        removed: (cell, candidate),
                        added,
                        depth,
                    });
                }
                None => {
                    let may_descend = self.config.max_depth.map_or(true, |max| depth < max);
                    if may_descend && visited.insert(candidate) {
                        stack.push(Frame::new(decomposition, candidate, depth + 1));
                    }
                }
            }
        }

        Ok(RoundOutcome::NoImprovement)
    }
}
