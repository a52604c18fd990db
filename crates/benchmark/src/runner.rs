//! Scenario runner.

use crate::result::{CellRecord, RunReport};
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use u_coverage_core::{GlobalReoptimizer, ProgressInfo, ReoptConfig, Result};
use u_coverage_d2::{GeoKernel, DEFAULT_SNAP_TOLERANCE};

/// Configuration for scenario runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Reoptimizer settings.
    pub reopt: ReoptConfig,
    /// Snapping tolerance of the geometry kernel.
    pub snap_tolerance: f64,
    /// Whether to print a line per round.
    pub show_progress: bool,
    /// Whether to attach the final cells to the report.
    pub include_cells: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            reopt: ReoptConfig::default(),
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            show_progress: true,
            include_cells: true,
        }
    }
}

impl RunnerConfig {
    /// Creates a new runner configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reoptimizer settings.
    pub fn with_reopt(mut self, reopt: ReoptConfig) -> Self {
        self.reopt = reopt;
        self
    }

    /// Sets the kernel snapping tolerance.
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance;
        self
    }

    /// Enables or disables per-round output.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Enables or disables the final cell dump.
    pub fn with_cells(mut self, include: bool) -> Self {
        self.include_cells = include;
        self
    }

    /// Quick preset: few rounds, coarse sampling.
    pub fn quick() -> Self {
        Self::default().with_reopt(
            ReoptConfig::new()
                .with_iterations(5)
                .with_sample_count(25)
                .with_time_limit(10_000),
        )
    }
}

/// Runs scenarios through the global reoptimizer.
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Creates a new runner.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Builds the scenario's decomposition and reoptimizes it.
    pub fn run(&self, scenario: &Scenario) -> Result<RunReport> {
        let kernel = GeoKernel::new().with_snap_tolerance(self.config.snap_tolerance);
        let mut decomposition = scenario.build(kernel)?;
        let initial_edges = decomposition.edge_count();

        log::info!(
            "scenario {}: {} cells, {} adjacencies, radius {}",
            scenario.name,
            decomposition.len(),
            initial_edges,
            scenario.radius
        );

        let reoptimizer = GlobalReoptimizer::new(self.config.reopt.clone())?;
        let result = if self.config.show_progress {
            println!("\nRunning scenario: {}", scenario.name);
            if !scenario.description.is_empty() {
                println!("  {}", scenario.description);
            }
            reoptimizer.run_with_progress(&mut decomposition, Box::new(print_progress))?
        } else {
            reoptimizer.run(&mut decomposition)?
        };

        let mut report = RunReport::new(scenario.name.clone(), initial_edges, &result);
        if self.config.include_cells {
            report = report.with_cells(CellRecord::snapshot(&decomposition));
        }
        Ok(report)
    }

    /// Runs several scenarios; a failing scenario is logged and skipped.
    pub fn run_all(&self, scenarios: &[Scenario]) -> Vec<RunReport> {
        scenarios
            .iter()
            .filter_map(|scenario| match self.run(scenario) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::warn!("scenario {} failed: {}", scenario.name, e);
                    None
                }
            })
            .collect()
    }
}

fn print_progress(info: ProgressInfo) {
    if info.running {
        println!(
            "    round {}/{}: max cost {:.4}, cuts {}, {}ms",
            info.round, info.total_rounds, info.max_cost, info.cuts_applied, info.elapsed_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::builtin;

    fn quiet() -> RunnerConfig {
        RunnerConfig::new().with_progress(false).with_reopt(
            ReoptConfig::new()
                .with_iterations(2)
                .with_sample_count(13)
                .with_threads(1),
        )
    }

    #[test]
    fn test_runs_two_squares() {
        let runner = ScenarioRunner::new(quiet());
        let report = runner.run(&builtin("two-squares").unwrap()).unwrap();

        assert_eq!(report.scenario, "two-squares");
        assert_eq!(report.initial_edges, 1);
        assert_eq!(report.rounds.len(), 2);
        assert!(report.summary.final_max_cost <= report.summary.initial_max_cost);
        assert_eq!(report.cells.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_run_all_skips_failures() {
        let runner = ScenarioRunner::new(quiet().with_cells(false));
        let scenarios = vec![
            builtin("two-squares").unwrap(),
            Scenario::new("bad-radius", -1.0),
        ];
        let reports = runner.run_all(&scenarios);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].cells.is_none());
    }

    #[test]
    fn test_invalid_reopt_config_is_an_error() {
        let config = quiet().with_reopt(ReoptConfig::new().with_sample_count(1));
        let runner = ScenarioRunner::new(config);
        assert!(runner.run(&builtin("two-squares").unwrap()).is_err());
    }

    #[test]
    fn test_config_json_defaults() {
        let config: RunnerConfig = serde_json::from_str(r#"{ "show_progress": false }"#).unwrap();
        assert!(!config.show_progress);
        assert_eq!(config.reopt, ReoptConfig::default());
        assert_eq!(config.snap_tolerance, DEFAULT_SNAP_TOLERANCE);
    }
}
