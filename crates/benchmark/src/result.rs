//! Run reports and recording.

use geo::Area;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use u_coverage_core::{CellId, ReoptResult, ReoptSummary, RoundOutcome};
use u_coverage_d2::polygon::rings;
use u_coverage_d2::Decomposition2D;

/// One round of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, starting at 1.
    pub round: usize,
    /// What the round did.
    pub outcome: RoundOutcome,
    /// Maximum cell cost after the round.
    pub max_cost: f64,
}

/// Final state of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: CellId,
    pub site: [f64; 2],
    pub cost: f64,
    pub area: f64,
    /// Exterior ring (open).
    pub exterior: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[f64; 2]>>,
}

impl CellRecord {
    /// Snapshot of every cell, worst first.
    pub fn snapshot(decomposition: &Decomposition2D) -> Vec<Self> {
        let mut cells: Vec<Self> = decomposition
            .iter()
            .map(|cell| {
                let mut contours = rings(cell.polygon)
                    .into_iter()
                    .map(|ring| ring.into_iter().map(|(x, y)| [x, y]).collect::<Vec<_>>());
                Self {
                    id: cell.id,
                    site: [cell.site.0, cell.site.1],
                    cost: cell.cost,
                    area: cell.polygon.unsigned_area(),
                    exterior: contours.next().unwrap_or_default(),
                    holes: contours.collect(),
                }
            })
            .collect();
        cells.sort_by(|a, b| b.cost.total_cmp(&a.cost).then(a.id.cmp(&b.id)));
        cells
    }
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Adjacency edges before the run.
    pub initial_edges: usize,
    /// Headline numbers.
    pub summary: ReoptSummary,
    /// Per-round record.
    pub rounds: Vec<RoundRecord>,
    /// False if the run was cancelled or timed out.
    pub completed: bool,
    /// Cells after the run, worst first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<CellRecord>>,
}

impl RunReport {
    /// Builds a report from a reoptimization result.
    pub fn new(scenario: impl Into<String>, initial_edges: usize, result: &ReoptResult) -> Self {
        let rounds = result
            .outcomes
            .iter()
            .zip(&result.max_cost_history)
            .enumerate()
            .map(|(i, (&outcome, &max_cost))| RoundRecord {
                round: i + 1,
                outcome,
                max_cost,
            })
            .collect();

        Self {
            scenario: scenario.into(),
            initial_edges,
            summary: ReoptSummary::from(result),
            rounds,
            completed: result.completed_normally(),
            cells: None,
        }
    }

    /// Attaches the final cells.
    pub fn with_cells(mut self, cells: Vec<CellRecord>) -> Self {
        self.cells = Some(cells);
        self
    }

    /// Saves the report to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Saves the per-round record to a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "scenario,round,outcome,max_cost")?;
        for record in &self.rounds {
            writeln!(
                file,
                "{},{},{},{:.6}",
                self.scenario,
                record.round,
                outcome_label(&record.outcome),
                record.max_cost
            )?;
        }
        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        let s = &self.summary;
        println!("\n{:=<72}", "");
        println!("SCENARIO {} ({} cells, {} edges)", self.scenario, s.cells, self.initial_edges);
        println!("{:=<72}", "");
        println!("{:>6} {:<28} {:>14}", "Round", "Outcome", "Max cost");
        println!("{:-<72}", "");
        for record in &self.rounds {
            println!(
                "{:>6} {:<28} {:>14.4}",
                record.round,
                outcome_label(&record.outcome),
                record.max_cost
            );
        }
        println!("{:-<72}", "");
        println!(
            "metric={} cuts={} max cost {:.4} -> {:.4} ({:.1}%) time={}ms{}",
            s.metric,
            s.cuts_applied,
            s.initial_max_cost,
            s.final_max_cost,
            s.improvement_percent,
            s.time_ms,
            if self.completed { "" } else { " (stopped early)" }
        );
        println!("{:=<72}\n", "");
    }
}

/// Short human-readable label for a round outcome.
pub fn outcome_label(outcome: &RoundOutcome) -> String {
    match outcome {
        RoundOutcome::Improved {
            removed,
            added,
            depth,
        } => format!(
            "cut {}+{} -> {}+{} @{}",
            removed.0, removed.1, added.0, added.1, depth
        ),
        RoundOutcome::NoImprovement => "no improvement".to_string(),
        RoundOutcome::Empty => "empty".to_string(),
        RoundOutcome::Cancelled => "cancelled".to_string(),
    }
}
