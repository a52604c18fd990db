//! Scenario runner for U-Coverage
//!
//! This crate provides:
//! - JSON scenario definitions and a few built-in decompositions
//! - Seeded synthetic grid decompositions
//! - A runner that reoptimizes scenarios and records per-round reports

mod result;
mod runner;
mod scenario;
mod synthetic;

pub use result::{outcome_label, CellRecord, RoundRecord, RunReport};
pub use runner::{RunnerConfig, ScenarioRunner};
pub use scenario::{builtin, builtin_scenarios, CellSpec, Scenario};
pub use synthetic::{GridSpec, SiteLayout, SyntheticGenerator};
