//! # U-Coverage Core
//!
//! Min-max reoptimization of multi-robot coverage decompositions.
//!
//! A coverage area is split into polygonal cells, one per robot, each with
//! a starting site. This crate repeatedly re-cuts the most expensive cell
//! against a cheaper neighbor so that the worst coverage cost over all
//! robots goes down.
//!
//! ## Core Components
//!
//! - **Geometry collaborator**: [`GeometryKernel`], implemented for `geo`
//!   polygons in `u-coverage-d2`
//! - **Cost metrics**: [`CostMetric`], [`ChiMetric`], [`TransitAreaMetric`]
//! - **State**: [`Decomposition`] - cells, cached costs, adjacency, cost order
//! - **Pairwise search**: [`PairwiseCutSearch`] - best straight cut of two cells
//! - **Driver**: [`GlobalReoptimizer`] - worst-first rounds with depth-first descent
//!
//! ## Configuration
//!
//! ```rust
//! use u_coverage_core::ReoptConfig;
//!
//! let config = ReoptConfig::new()
//!     .with_iterations(20)
//!     .with_sample_count(60)
//!     .with_threads(4)
//!     .with_time_limit(10_000);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod decomposition;
pub mod error;
pub mod geometry;
pub mod metric;
pub mod pairwise;
pub mod reoptimizer;
pub mod result;
pub mod robust;
pub mod solver;

#[cfg(test)]
mod testing;

// Re-exports
pub use decomposition::{CellView, Decomposition};
pub use error::{Error, Result};
pub use geometry::{is_finite_site, site_distance, CellId, GeometryKernel, Site};
pub use metric::{contour_count, ChiMetric, CostMetric, Penalties, TransitAreaMetric};
pub use pairwise::{assign_sites, PairwiseCut, PairwiseCutSearch, SiteAssignment};
pub use reoptimizer::GlobalReoptimizer;
pub use result::{ReoptResult, ReoptSummary, RoundOutcome};
pub use solver::{ProgressCallback, ProgressInfo, ReoptConfig};
