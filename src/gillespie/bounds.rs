//! Optional clamp on sampled waiting times.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Bounds applied to each sampled waiting time.
///
/// Only for pacing an animated caller. With both bounds absent (the default)
/// the simulation is the exact stochastic simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitBounds {
    /// Lower bound, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl WaitBounds {
    /// No clamping.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { min: None, max: None }
    }

    /// Builds validated bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Result<Self, ValidationError> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Returns true when no clamp is applied.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Validate bounds.
    ///
    /// Each bound must be finite and non-negative, and `min <= max` when both
    /// are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, bound) in [("min", self.min), ("max", self.max)] {
            if let Some(value) = bound {
                if !value.is_finite() || value < 0.0 {
                    return Err(ValidationError::InvalidWaitBounds {
                        reason: format!("{name} must be finite and >= 0, got {value}"),
                    });
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ValidationError::InvalidWaitBounds {
                    reason: format!("min ({min}) must not exceed max ({max})"),
                });
            }
        }
        Ok(())
    }

    /// Clamps `wait` into the bounds.
    #[must_use]
    pub fn clamp(&self, wait: f64) -> f64 {
        let mut wait = wait;
        if let Some(min) = self.min {
            wait = wait.max(min);
        }
        if let Some(max) = self.max {
            wait = wait.min(max);
        }
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_default_is_unbounded() {
        let bounds = WaitBounds::default();
        assert!(bounds.is_unbounded());
        bounds.validate().unwrap();
        assert_eq!(bounds.clamp(1e9), 1e9);
        assert_eq!(bounds.clamp(0.0), 0.0);
    }

    #[test]
    fn bounds_clamp_both_sides() {
        let bounds = WaitBounds::new(Some(0.1), Some(2.0)).unwrap();
        assert_eq!(bounds.clamp(0.01), 0.1);
        assert_eq!(bounds.clamp(5.0), 2.0);
        assert_eq!(bounds.clamp(1.5), 1.5);
    }

    #[test]
    fn bounds_one_sided() {
        let lower = WaitBounds::new(Some(1.0), None).unwrap();
        assert_eq!(lower.clamp(0.5), 1.0);
        assert_eq!(lower.clamp(100.0), 100.0);

        let upper = WaitBounds::new(None, Some(1.0)).unwrap();
        assert_eq!(upper.clamp(0.5), 0.5);
        assert_eq!(upper.clamp(100.0), 1.0);
    }

    #[test]
    fn bounds_reject_invalid() {
        assert!(WaitBounds::new(Some(2.0), Some(1.0)).is_err());
        assert!(WaitBounds::new(Some(-1.0), None).is_err());
        assert!(WaitBounds::new(None, Some(f64::NAN)).is_err());
        assert!(WaitBounds::new(None, Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn bounds_deserialize_with_missing_fields() {
        let bounds: WaitBounds = serde_json::from_str(r#"{"max": 3.0}"#).unwrap();
        assert_eq!(bounds.min, None);
        assert_eq!(bounds.max, Some(3.0));
    }
}
