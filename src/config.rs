/// Configuration for [`SpaceSolver`](crate::solver::SpaceSolver).
///
/// # Builder Pattern
/// ```
/// use spacesolve::config::SolverConfig;
///
/// let config = SolverConfig::new()
///     .with_normal_tolerance(1e-4)
///     .with_distance_tolerance(0.01);
/// assert_eq!(config.distance_tolerance, 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Largest allowed `|n1 × n2|` (sine of the angle) between the normals of
    /// two constrained faces. Faces may face the same or opposite ways.
    /// Default: `1e-6`.
    pub normal_tolerance: f64,
    /// Largest allowed disagreement between required translations, and the
    /// largest residual tolerated on a constraint between two bodies that
    /// are already placed. Default: `1e-6`.
    pub distance_tolerance: f64,
}

impl SolverConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            normal_tolerance: 1e-6,
            distance_tolerance: 1e-6,
        }
    }

    /// Set the normal compatibility tolerance.
    #[must_use]
    pub fn with_normal_tolerance(mut self, tolerance: f64) -> Self {
        self.normal_tolerance = sanitize(tolerance);
        self
    }

    /// Set the distance agreement tolerance.
    #[must_use]
    pub fn with_distance_tolerance(mut self, tolerance: f64) -> Self {
        self.distance_tolerance = sanitize(tolerance);
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize(tolerance: f64) -> f64 {
    if tolerance.is_nan() {
        0.0
    } else {
        tolerance.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_tolerances_clamp_to_zero() {
        let config = SolverConfig::new()
            .with_normal_tolerance(-1.0)
            .with_distance_tolerance(f64::NAN);
        assert!(config.normal_tolerance.abs() < f64::EPSILON);
        assert!(config.distance_tolerance.abs() < f64::EPSILON);
    }
}
