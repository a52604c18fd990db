//! # U-Coverage 2D
//!
//! Planar geometry kernel for coverage reoptimization, built on `geo`
//! polygons.
//!
//! ## Features
//!
//! - [`GeoKernel`]: the [`GeometryKernel`] used by the decomposition, the
//!   chi metric and the cut search
//! - Boolean union through `i_overlay`, erosion through `geo`'s buffer
//! - Exact simplicity checks (no crossings, spikes or touching rings)
//! - Straight chord splitting with hole assignment
//! - Idempotent vertex snapping for near-coincident shared edges
//!
//! ## Quick Start
//!
//! ```rust
//! use u_coverage_d2::{rectangle, ChiMetric, Decomposition2D, GeoKernel, GlobalReoptimizer, ReoptConfig};
//!
//! let kernel = GeoKernel::new();
//! let metric = ChiMetric::new(kernel, 0.1).unwrap();
//! let mut decomposition = Decomposition2D::new(kernel, metric);
//!
//! decomposition.add(rectangle(0.0, 0.0, 1.0, 1.0), (0.0, 0.0)).unwrap();
//! decomposition.add(rectangle(1.0, 0.0, 2.0, 1.0), (2.5, 0.0)).unwrap();
//! assert_eq!(decomposition.edge_count(), 1);
//!
//! let reoptimizer = GlobalReoptimizer::new(ReoptConfig::new().with_iterations(3)).unwrap();
//! let result = reoptimizer.run(&mut decomposition).unwrap();
//! assert!(result.final_max_cost() <= result.initial_max_cost());
//! ```

pub mod boundary;
pub mod kernel;
pub mod polygon;
pub mod snap;
pub mod split;
pub mod validation;

// Re-exports
pub use kernel::{GeoKernel, DEFAULT_SNAP_TOLERANCE, DEFAULT_TOLERANCE};
pub use polygon::{polygon_from_coords, rectangle};
pub use u_coverage_core::{
    CellId, ChiMetric, CostMetric, Decomposition, Error, GeometryKernel, GlobalReoptimizer,
    PairwiseCutSearch, ReoptConfig, ReoptResult, ReoptSummary, Result, RoundOutcome, Site,
    TransitAreaMetric,
};

/// Decomposition of `geo` polygons scored by the chi metric.
pub type Decomposition2D = Decomposition<GeoKernel, ChiMetric<GeoKernel>>;
