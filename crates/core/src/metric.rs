//! Coverage cost metrics.
//!
//! A metric estimates how expensive it is for a robot starting at a given
//! site to cover a cell. The reoptimizer only compares metric values, so
//! any [`CostMetric`] can drive it; [`ChiMetric`] is the one used in
//! practice.

use crate::error::{Error, Result};
use crate::geometry::{GeometryKernel, Site};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weight of the transit distance term.
pub const DISTANCE_WEIGHT: f64 = 2.0;

/// Degrees charged per coverage contour.
pub const DEGREES_PER_CONTOUR: f64 = 360.0;

/// Default linear penalty.
pub const DEFAULT_LINEAR_PENALTY: f64 = 1.0;

/// Default angular penalty (one unit per full turn, scaled by ten).
pub const DEFAULT_ANGULAR_PENALTY: f64 = 10.0 / 360.0;

/// Strategy trait for cell cost functions.
pub trait CostMetric<P>: Send + Sync {
    /// Cost of covering `polygon` from `site`. Always finite and non-negative
    /// for valid input.
    fn compute(&self, polygon: &P, site: Site) -> f64;

    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;
}

/// Penalty weights shared by the metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Penalties {
    /// Cost per unit of travelled length.
    pub linear: f64,
    /// Cost per degree of turning.
    pub angular: f64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            linear: DEFAULT_LINEAR_PENALTY,
            angular: DEFAULT_ANGULAR_PENALTY,
        }
    }
}

fn check_radius(radius: f64) -> Result<f64> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(Error::InvalidRadius(radius))
    }
}

fn check_penalty(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidConfig(format!(
            "{} penalty must be finite and non-negative, got {}",
            name, value
        )))
    }
}

/// Chi metric: transit to the cell, area sweep and contour turning.
///
/// ```text
/// chi = linear * (2 * dist(cell, site) + area(cell) / radius)
///     + angular * 360 * contours(cell, radius)
/// ```
///
/// `contours` peels the cell inward, first by half a radius and then by a
/// full radius per step, adding one contour per remaining region and one
/// per hole of each region until nothing is left.
#[derive(Debug, Clone)]
pub struct ChiMetric<K> {
    kernel: K,
    radius: f64,
    penalties: Penalties,
}

impl<K: GeometryKernel> ChiMetric<K> {
    /// Creates a metric with the default penalties.
    ///
    /// Fails with [`Error::InvalidRadius`] unless `radius` is positive and finite.
    pub fn new(kernel: K, radius: f64) -> Result<Self> {
        Ok(Self {
            kernel,
            radius: check_radius(radius)?,
            penalties: Penalties::default(),
        })
    }

    /// Sets the linear penalty.
    pub fn with_linear_penalty(mut self, penalty: f64) -> Result<Self> {
        self.penalties.linear = check_penalty("linear", penalty)?;
        Ok(self)
    }

    /// Sets the angular penalty.
    pub fn with_angular_penalty(mut self, penalty: f64) -> Result<Self> {
        self.penalties.angular = check_penalty("angular", penalty)?;
        Ok(self)
    }

    /// Sets both penalties at once.
    pub fn with_penalties(self, penalties: Penalties) -> Result<Self> {
        self.with_linear_penalty(penalties.linear)?
            .with_angular_penalty(penalties.angular)
    }

    /// Coverage radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Current penalty weights.
    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    /// The kernel used for erosion and measurements.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Number of inward coverage contours of the polygon.
    pub fn contour_count(&self, polygon: &K::Polygon) -> usize {
        contour_count(&self.kernel, polygon, self.radius)
    }

    /// Transit and sweep part of the cost.
    fn linear_term(&self, polygon: &K::Polygon, site: Site) -> f64 {
        let dist = self.kernel.distance_to(polygon, site);
        let area = self.kernel.area(polygon);
        self.penalties.linear * (DISTANCE_WEIGHT * dist + area / self.radius)
    }
}

impl<K: GeometryKernel> CostMetric<K::Polygon> for ChiMetric<K> {
    fn compute(&self, polygon: &K::Polygon, site: Site) -> f64 {
        let contours = self.contour_count(polygon) as f64;
        self.linear_term(polygon, site)
            + self.penalties.angular * DEGREES_PER_CONTOUR * contours
    }

    fn name(&self) -> &str {
        "chi"
    }
}

/// Counts coverage contours by repeated erosion.
///
/// The loop is capped at `boundary_length / radius + 2` steps; every step
/// must shrink the region by a full radius, so a kernel that keeps
/// returning non-empty regions beyond that point is stuck and counting
/// stops with a warning.
pub fn contour_count<K: GeometryKernel>(kernel: &K, polygon: &K::Polygon, radius: f64) -> usize {
    let perimeter = kernel.boundary_length(polygon);
    let cap = if perimeter.is_finite() {
        (perimeter / radius).ceil() as usize + 2
    } else {
        2
    };

    let mut region = kernel.erode(std::slice::from_ref(polygon), radius / 2.0);
    let mut count = 0;
    let mut steps = 0;

    while !region.is_empty() {
        if steps >= cap {
            log::warn!(
                "contour erosion did not collapse after {} steps (radius {}), stopping at {} contours",
                steps,
                radius,
                count
            );
            break;
        }
        count += region
            .iter()
            .map(|p| 1 + kernel.hole_count(p))
            .sum::<usize>();
        region = kernel.erode(&region, radius);
        steps += 1;
    }

    count
}

/// Chi without the contour term.
///
/// Orders cells by transit and sweep effort only. Much cheaper to evaluate
/// than [`ChiMetric`] since it needs no erosion.
#[derive(Debug, Clone)]
pub struct TransitAreaMetric<K> {
    kernel: K,
    radius: f64,
    linear_penalty: f64,
}

impl<K: GeometryKernel> TransitAreaMetric<K> {
    /// Creates the metric with a unit linear penalty.
    pub fn new(kernel: K, radius: f64) -> Result<Self> {
        Ok(Self {
            kernel,
            radius: check_radius(radius)?,
            linear_penalty: DEFAULT_LINEAR_PENALTY,
        })
    }

    /// Sets the linear penalty.
    pub fn with_linear_penalty(mut self, penalty: f64) -> Result<Self> {
        self.linear_penalty = check_penalty("linear", penalty)?;
        Ok(self)
    }
}

impl<K: GeometryKernel> CostMetric<K::Polygon> for TransitAreaMetric<K> {
    fn compute(&self, polygon: &K::Polygon, site: Site) -> f64 {
        let dist = self.kernel.distance_to(polygon, site);
        let area = self.kernel.area(polygon);
        self.linear_penalty * (DISTANCE_WEIGHT * dist + area / self.radius)
    }

    fn name(&self) -> &str {
        "transit-area"
    }
}
