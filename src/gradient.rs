//! Gradient-factor handling.
//!
//! A validated GF pair plus the depth interpolation between GF-low at the
//! first stop and GF-high at the surface.

use crate::error::PlanError;

/// Validated gradient-factor pair, stored as ratios in (0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientFactors {
    low: f64,
    high: f64,
}

impl GradientFactors {
    /// Validate percent inputs: both in 1..=99 and low ≤ high.
    pub fn from_percent(low: u8, high: u8) -> Result<GradientFactors, PlanError> {
        if !(1..=99).contains(&low) || !(1..=99).contains(&high) {
            return Err(PlanError::InvalidGradientFactors {
                reason: format!("values must be in the 1-99 range, got {low}/{high}"),
            });
        }
        if low > high {
            return Err(PlanError::InvalidGradientFactors {
                reason: format!("GF low {low} must not exceed GF high {high}"),
            });
        }
        Ok(GradientFactors {
            low: f64::from(low) / 100.0,
            high: f64::from(high) / 100.0,
        })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Spread between high and low in percentage points.
    pub fn spread_percent(&self) -> f64 {
        (self.high - self.low) * 100.0
    }

    /// Effective GF at `depth_m`, linearly interpolated between `low` at
    /// the first stop and `high` at the surface. The anchor is rounded up
    /// to the next 3 m stop level; without a first stop the surface value
    /// applies everywhere.
    pub fn at_depth(&self, depth_m: f64, first_stop_depth_m: f64) -> f64 {
        let anchor = round_up_to_stop(first_stop_depth_m);
        if anchor <= 0.0 {
            return self.high;
        }
        let frac = (1.0 - depth_m / anchor).clamp(0.0, 1.0);
        self.low + (self.high - self.low) * frac
    }
}

/// Round a depth up to the next 3 m stop level.
pub fn round_up_to_stop(depth_m: f64) -> f64 {
    (depth_m / 3.0).ceil() * 3.0
}
