//! Reoptimization result representation.

use crate::geometry::CellId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What happened in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundOutcome {
    /// A cut was applied.
    Improved {
        /// The two cells that were replaced.
        removed: (CellId, CellId),
        /// The two cells that replaced them.
        added: (CellId, CellId),
        /// Descent depth at which the cut was found (0 = the worst cell itself).
        depth: usize,
    },
    /// No improving cut was found anywhere along the descent.
    NoImprovement,
    /// The decomposition has no cells.
    Empty,
    /// The run was cancelled during the round.
    Cancelled,
}

impl RoundOutcome {
    /// Returns true if the round applied a cut.
    pub fn is_improved(&self) -> bool {
        matches!(self, RoundOutcome::Improved { .. })
    }
}

/// Result of a reoptimization run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReoptResult {
    /// Outcome of every round that ran, in order.
    pub outcomes: Vec<RoundOutcome>,

    /// Maximum cell cost after each round.
    pub max_cost_history: Vec<f64>,

    /// `(id, cost)` before the run, worst first.
    pub initial_costs: Vec<(CellId, f64)>,

    /// `(id, cost)` after the run, worst first.
    pub final_costs: Vec<(CellId, f64)>,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Name of the cost metric.
    pub metric: Option<String>,

    /// Whether the run was cancelled early.
    pub cancelled: bool,

    /// Whether the time limit stopped the run.
    pub time_limit_reached: bool,
}

impl ReoptResult {
    /// Creates a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rounds that ran.
    pub fn rounds(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of cuts applied.
    pub fn cuts_applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_improved()).count()
    }

    /// Maximum cost before the run.
    pub fn initial_max_cost(&self) -> Option<f64> {
        self.initial_costs.first().map(|&(_, cost)| cost)
    }

    /// Maximum cost after the run.
    pub fn final_max_cost(&self) -> Option<f64> {
        self.final_costs.first().map(|&(_, cost)| cost)
    }

    /// Reduction of the maximum cost (0 when nothing changed).
    pub fn improvement(&self) -> f64 {
        match (self.initial_max_cost(), self.final_max_cost()) {
            (Some(before), Some(after)) => before - after,
            _ => 0.0,
        }
    }

    /// Returns true if the run was neither cancelled nor timed out.
    pub fn completed_normally(&self) -> bool {
        !self.cancelled && !self.time_limit_reached
    }

    /// Sets the metric name.
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }
}

/// Summary statistics for a reoptimization result.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReoptSummary {
    /// Rounds run.
    pub rounds: usize,
    /// Cuts applied.
    pub cuts_applied: usize,
    /// Number of cells.
    pub cells: usize,
    /// Maximum cost before.
    pub initial_max_cost: f64,
    /// Maximum cost after.
    pub final_max_cost: f64,
    /// Relative reduction of the maximum cost, in percent.
    pub improvement_percent: f64,
    /// Computation time in milliseconds.
    pub time_ms: u64,
    /// Metric used.
    pub metric: String,
}

impl From<&ReoptResult> for ReoptSummary {
    fn from(result: &ReoptResult) -> Self {
        let initial = result.initial_max_cost().unwrap_or(0.0);
        let final_cost = result.final_max_cost().unwrap_or(0.0);
        let improvement_percent = if initial > 0.0 {
            (initial - final_cost) / initial * 100.0
        } else {
            0.0
        };

        Self {
            rounds: result.rounds(),
            cuts_applied: result.cuts_applied(),
            cells: result.final_costs.len(),
            initial_max_cost: initial,
            final_max_cost: final_cost,
            improvement_percent,
            time_ms: result.computation_time_ms,
            metric: result
                .metric
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}
