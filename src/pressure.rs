//! Pressure and depth conversions.
//!
//! Physical constants travel in an explicit [`Environment`] value rather
//! than module-level globals, so a simulation can run against a different
//! surface pressure (altitude dives) and tests can pin their own values.

/// Default surface atmospheric pressure (bar) at sea level.
pub const DEFAULT_SURFACE_PRESSURE: f64 = 1.01325;

/// Pressure increase per metre of seawater (bar/m).
/// 1 atm / 10 msw = 1.01325 / 10.0
pub const BAR_PER_METER: f64 = 0.101325;

/// Water vapour pressure in the lungs (bar), at 37°C.
pub const P_WATER_VAPOR: f64 = 0.0627;

/// Physical constants for one planning run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Ambient pressure at the surface (bar).
    pub surface_pressure: f64,
    /// Pressure increase per metre of water depth (bar/m).
    pub bar_per_meter: f64,
    /// Alveolar water vapour pressure (bar).
    pub water_vapour_pressure: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            surface_pressure: DEFAULT_SURFACE_PRESSURE,
            bar_per_meter: BAR_PER_METER,
            water_vapour_pressure: P_WATER_VAPOR,
        }
    }
}

impl Environment {
    /// Sea-level constants with a custom surface pressure.
    pub fn with_surface_pressure(surface_pressure: f64) -> Self {
        Environment {
            surface_pressure,
            ..Environment::default()
        }
    }

    /// Ambient pressure (bar) at a depth in metres.
    pub fn ambient_pressure(&self, depth_m: f64) -> f64 {
        self.surface_pressure + depth_m * self.bar_per_meter
    }

    /// Depth (m) at which ambient pressure equals `pressure`, clamped at 0.
    pub fn depth_at_pressure(&self, pressure: f64) -> f64 {
        ((pressure - self.surface_pressure) / self.bar_per_meter).max(0.0)
    }

    /// Inspired partial pressure (bar) of one gas fraction at depth,
    /// with alveolar water vapour deducted.
    pub fn inspired_pressure(&self, depth_m: f64, fraction: f64) -> f64 {
        ((self.ambient_pressure(depth_m) - self.water_vapour_pressure) * fraction).max(0.0)
    }
}
