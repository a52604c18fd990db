//! Reoptimizer configuration and progress reporting.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`GlobalReoptimizer`](crate::reoptimizer::GlobalReoptimizer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReoptConfig {
    /// Maximum number of improvement rounds.
    pub num_iterations: u32,

    /// Boundary samples per pairwise search (candidates grow quadratically).
    pub sample_count: usize,

    /// Worker threads for candidate evaluation
    /// (0 = rayon global pool, 1 = sequential, n = dedicated pool).
    pub threads: usize,

    /// Maximum computation time in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,

    /// Maximum descent depth below the worst cell (None = unbounded).
    pub max_depth: Option<usize>,

    /// Stop at the first round that finds no improvement.
    pub stop_when_stuck: bool,
}

impl Default for ReoptConfig {
    fn default() -> Self {
        Self {
            num_iterations: 10,
            sample_count: 100,
            threads: 0,
            time_limit_ms: 0,
            max_depth: None,
            stop_when_stuck: false,
        }
    }
}

impl ReoptConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of rounds.
    pub fn with_iterations(mut self, rounds: u32) -> Self {
        self.num_iterations = rounds;
        self
    }

    /// Sets the number of boundary samples.
    pub fn with_sample_count(mut self, samples: usize) -> Self {
        self.sample_count = samples;
        self
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Bounds the descent depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Stops the run at the first failed round.
    pub fn with_stop_when_stuck(mut self, stop: bool) -> Self {
        self.stop_when_stuck = stop;
        self
    }

    /// Checks that the configuration can drive a search.
    pub fn validate(&self) -> Result<()> {
        if self.sample_count < 2 {
            return Err(Error::InvalidConfig(format!(
                "sample_count must be at least 2, got {}",
                self.sample_count
            )));
        }
        Ok(())
    }
}

/// Progress callback invoked after every round.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Progress information during a reoptimization run.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    /// Rounds completed so far.
    pub round: u32,
    /// Configured number of rounds.
    pub total_rounds: u32,
    /// Current maximum cell cost.
    pub max_cost: f64,
    /// Number of active cells.
    pub cell_count: usize,
    /// Cuts applied so far.
    pub cuts_applied: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Current phase description.
    pub phase: String,
    /// Whether the run is still going.
    pub running: bool,
}

impl ProgressInfo {
    /// Creates a new progress info with default values.
    pub fn new() -> Self {
        Self {
            running: true,
            ..Default::default()
        }
    }

    /// Sets the round info.
    pub fn with_round(mut self, current: u32, total: u32) -> Self {
        self.round = current;
        self.total_rounds = total;
        self
    }

    /// Sets the current maximum cost.
    pub fn with_max_cost(mut self, cost: f64) -> Self {
        self.max_cost = cost;
        self
    }

    /// Sets the cell and cut counters.
    pub fn with_cells(mut self, cells: usize, cuts: usize) -> Self {
        self.cell_count = cells;
        self.cuts_applied = cuts;
        self
    }

    /// Sets the elapsed time.
    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Sets the phase description.
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    /// Marks the run as finished.
    pub fn finished(mut self) -> Self {
        self.running = false;
        self
    }

    /// Fraction of rounds completed (0.0 to 1.0).
    pub fn progress_percent(&self) -> f64 {
        if self.total_rounds > 0 {
            self.round as f64 / self.total_rounds as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReoptConfig::default();
        assert_eq!(config.num_iterations, 10);
        assert_eq!(config.sample_count, 100);
        assert_eq!(config.threads, 0);
        assert_eq!(config.max_depth, None);
        assert!(!config.stop_when_stuck);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ReoptConfig::new()
            .with_iterations(3)
            .with_sample_count(24)
            .with_threads(1)
            .with_time_limit(500)
            .with_max_depth(2)
            .with_stop_when_stuck(true);

        assert_eq!(config.num_iterations, 3);
        assert_eq!(config.sample_count, 24);
        assert_eq!(config.threads, 1);
        assert_eq!(config.time_limit_ms, 500);
        assert_eq!(config.max_depth, Some(2));
        assert!(config.stop_when_stuck);
    }

    #[test]
    fn test_validate_rejects_too_few_samples() {
        let config = ReoptConfig::new().with_sample_count(1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_progress_info() {
        let info = ProgressInfo::new()
            .with_round(5, 10)
            .with_max_cost(42.0)
            .with_cells(4, 2)
            .with_phase("round");
        assert!(info.running);
        assert!((info.progress_percent() - 0.5).abs() < 1e-12);
        assert_eq!(info.cell_count, 4);
        assert!(!info.finished().running);
        assert_eq!(ProgressInfo::new().progress_percent(), 0.0);
    }
}
