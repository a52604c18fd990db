//! Error types for coverage reoptimization.

use crate::geometry::CellId;
use thiserror::Error;

/// Errors raised by the decomposition, the metrics and the reoptimizer.
///
/// Degenerate unions and unsplittable candidate cuts are not errors: the
/// pairwise search treats them as "no candidate" and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A polygon or site failed validation and was not admitted.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The coverage radius must be positive and finite.
    #[error("invalid coverage radius {0}: must be positive and finite")]
    InvalidRadius(f64),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cell id is not active in the decomposition.
    #[error("cell {0} is not active in the decomposition")]
    CellNotFound(CellId),

    /// A structural invariant of the decomposition does not hold.
    #[error("decomposition invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type alias for u-coverage operations.
pub type Result<T> = std::result::Result<T, Error>;
