// src/utils/config.rs
use crate::utils::{
    DEFAULT_BARNES_HUT_CONFIG,
    errors::SpTreeError
};

/// Tunables for tree construction and force evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarnesHutConfig {
    /// Approximation threshold: 0 is exact, larger values summarise more aggressively.
    pub theta: f64,
    /// Padding added to every root half-width.
    pub boundary_epsilon: f64,
    /// Floor for squared distances in the edge-force kernel.
    pub min_distance_sq: f64,
}


impl Default for BarnesHutConfig {
    fn default() -> Self {
        DEFAULT_BARNES_HUT_CONFIG
    }
}

impl BarnesHutConfig {
    pub fn new(
        theta: Option<f64>,
        boundary_epsilon: Option<f64>,
        min_distance_sq: Option<f64>,
    ) -> Self {
        let default = DEFAULT_BARNES_HUT_CONFIG;
        Self {
            theta: theta.unwrap_or(default.theta),
            boundary_epsilon: boundary_epsilon.unwrap_or(default.boundary_epsilon),
            min_distance_sq: min_distance_sq.unwrap_or(default.min_distance_sq),
        }
    }

    /// Returns a copy with a different theta, keeping the other settings.
    pub fn with_theta(self, theta: f64) -> Self {
        Self { theta, ..self }
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTheta` for a negative or NaN theta, and `InvalidArgument`
    /// for a negative or non-finite epsilon.
    pub fn validate(&self) -> Result<(), SpTreeError> {
        validate_theta(self.theta)?;
        if !self.boundary_epsilon.is_finite() || self.boundary_epsilon < 0.0 {
            return Err(SpTreeError::InvalidArgument(format!(
                "boundary_epsilon must be finite and non-negative, got {}",
                self.boundary_epsilon
            )));
        }
        if !self.min_distance_sq.is_finite() || self.min_distance_sq < 0.0 {
            return Err(SpTreeError::InvalidArgument(format!(
                "min_distance_sq must be finite and non-negative, got {}",
                self.min_distance_sq
            )));
        }
        Ok(())
    }
}

/// Theta may be any non-negative value, including infinity.
pub fn validate_theta(theta: f64) -> Result<(), SpTreeError> {
    if theta.is_nan() || theta < 0.0 {
        return Err(SpTreeError::InvalidTheta(theta));
    }
    Ok(())
}
