//! Scenario definitions.
//!
//! A scenario is a complete reoptimization input: the cells of a coverage
//! decomposition, one robot site per cell, and the metric parameters.
//! Scenarios are stored as JSON; a few small ones are built in.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use u_coverage_core::Penalties;
use u_coverage_d2::{polygon_from_coords, ChiMetric, Decomposition2D, GeoKernel};

fn default_radius() -> f64 {
    0.1
}

/// One cell of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    /// Exterior ring, open or closed.
    pub exterior: Vec<[f64; 2]>,
    /// Hole rings.
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
    /// Robot site.
    pub site: [f64; 2],
}

impl CellSpec {
    /// Creates a cell without holes.
    pub fn new(exterior: Vec<[f64; 2]>, site: [f64; 2]) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
            site,
        }
    }

    /// Axis-aligned rectangular cell.
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64, site: [f64; 2]) -> Self {
        Self::new(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]], site)
    }

    /// Adds a hole ring.
    pub fn with_hole(mut self, hole: Vec<[f64; 2]>) -> Self {
        self.holes.push(hole);
        self
    }

    fn polygon(&self) -> geo::Polygon<f64> {
        let to_tuples = |ring: &[[f64; 2]]| ring.iter().map(|p| (p[0], p[1])).collect::<Vec<_>>();
        let holes: Vec<Vec<(f64, f64)>> = self.holes.iter().map(|h| to_tuples(h)).collect();
        polygon_from_coords(&to_tuples(&self.exterior), &holes)
    }
}

/// A reoptimization input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name.
    pub name: String,
    /// What the scenario exercises.
    #[serde(default)]
    pub description: String,
    /// Coverage radius.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Metric penalties (defaults when absent).
    #[serde(default)]
    pub penalties: Option<Penalties>,
    /// Cells of the decomposition.
    pub cells: Vec<CellSpec>,
}

impl Scenario {
    /// Creates an empty scenario.
    pub fn new(name: impl Into<String>, radius: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            radius,
            penalties: None,
            cells: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the metric penalties.
    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = Some(penalties);
        self
    }

    /// Appends a cell.
    pub fn with_cell(mut self, cell: CellSpec) -> Self {
        self.cells.push(cell);
        self
    }

    /// Loads a scenario from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves the scenario as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Builds the chi metric described by the scenario.
    pub fn metric(&self, kernel: GeoKernel) -> u_coverage_core::Result<ChiMetric<GeoKernel>> {
        let metric = ChiMetric::new(kernel, self.radius)?;
        match self.penalties {
            Some(penalties) => metric.with_penalties(penalties),
            None => Ok(metric),
        }
    }

    /// Builds the decomposition; fails on the first invalid cell.
    pub fn build(&self, kernel: GeoKernel) -> u_coverage_core::Result<Decomposition2D> {
        let metric = self.metric(kernel)?;
        Decomposition2D::from_cells(
            kernel,
            metric,
            self.cells
                .iter()
                .map(|cell| (cell.polygon(), (cell.site[0], cell.site[1]))),
        )
    }
}

/// Scenarios shipped with the runner.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![two_squares(), strips(), triangles(), field()]
}

/// Looks up a built-in scenario by name.
pub fn builtin(name: &str) -> Option<Scenario> {
    builtin_scenarios().into_iter().find(|s| s.name == name)
}

fn two_squares() -> Scenario {
    Scenario::new("two-squares", 0.1)
        .with_description("Two unit squares, the right robot parked past the far edge")
        .with_cell(CellSpec::rectangle(0.0, 0.0, 1.0, 1.0, [0.0, 0.0]))
        .with_cell(CellSpec::rectangle(1.0, 0.0, 2.0, 1.0, [2.5, 0.0]))
}

fn strips() -> Scenario {
    Scenario::new("strips", 0.1)
        .with_description("10x1 corridor in four strips, robots at the corridor corners")
        .with_cell(CellSpec::rectangle(0.0, 0.0, 2.5, 1.0, [10.0, 0.0]))
        .with_cell(CellSpec::rectangle(2.5, 0.0, 5.0, 1.0, [10.0, 1.0]))
        .with_cell(CellSpec::rectangle(5.0, 0.0, 7.5, 1.0, [0.0, 1.0]))
        .with_cell(CellSpec::rectangle(7.5, 0.0, 10.0, 1.0, [0.0, 0.0]))
}

fn triangles() -> Scenario {
    Scenario::new("triangles", 0.1)
        .with_description("10x1 corridor in four slivers meeting at the centre")
        .with_cell(CellSpec::new(
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 0.5]],
            [0.0, 0.0],
        ))
        .with_cell(CellSpec::new(
            vec![[0.0, 0.0], [10.0, 0.5], [10.0, 1.0], [5.0, 0.5]],
            [10.0, 0.0],
        ))
        .with_cell(CellSpec::new(
            vec![[5.0, 0.5], [10.0, 1.0], [0.0, 1.0]],
            [10.0, 1.0],
        ))
        .with_cell(CellSpec::new(
            vec![[0.0, 0.0], [5.0, 0.5], [0.0, 1.0]],
            [0.0, 1.0],
        ))
}

fn field() -> Scenario {
    Scenario::new("field", 0.5)
        .with_description("10x10 field in four cells, all robots leaving from one depot")
        .with_cell(CellSpec::rectangle(0.0, 0.0, 6.0, 4.0, [0.0, 0.0]))
        .with_cell(CellSpec::rectangle(6.0, 0.0, 10.0, 7.0, [1.0, 0.0]))
        .with_cell(CellSpec::rectangle(0.0, 4.0, 3.0, 10.0, [0.0, 1.0]))
        .with_cell(CellSpec::new(
            vec![
                [3.0, 4.0],
                [6.0, 4.0],
                [6.0, 7.0],
                [10.0, 7.0],
                [10.0, 10.0],
                [3.0, 10.0],
            ],
            [1.0, 1.0],
        ))
}
