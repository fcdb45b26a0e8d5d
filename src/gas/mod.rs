//! Breathing-gas mixes.
//!
//! A [`GasMix`] is an immutable value created by input normalization; the
//! constructors enforce the fraction-sum invariant so everything downstream
//! can rely on `fo2 + fhe + fn2 == 1`.

mod parser;

use crate::error::PlanError;
use crate::pressure::Environment;

/// Tolerance for the fraction-sum invariant.
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// A breathing-gas mixture, as fractions summing to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasMix {
    /// Fraction of O2 (0.0–1.0).
    pub fo2: f64,
    /// Fraction of He (0.0–1.0).
    pub fhe: f64,
    /// Fraction of N2 (0.0–1.0).
    pub fn2: f64,
}

impl GasMix {
    /// Atmospheric air (21/79).
    pub const AIR: GasMix = GasMix {
        fo2: 0.21,
        fhe: 0.0,
        fn2: 0.79,
    };

    /// Pure oxygen.
    pub const OXYGEN: GasMix = GasMix {
        fo2: 1.0,
        fhe: 0.0,
        fn2: 0.0,
    };

    /// Build a mix from O2 and He fractions; N2 is the remainder.
    pub fn new(fo2: f64, fhe: f64) -> Result<GasMix, PlanError> {
        for (name, value) in [("fo2", fo2), ("fhe", fhe)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PlanError::InvalidGasMix {
                    reason: format!("{name} must be a fraction in [0, 1], got {value}"),
                });
            }
        }
        if fo2 + fhe > 1.0 + FRACTION_TOLERANCE {
            return Err(PlanError::InvalidGasMix {
                reason: format!(
                    "fo2 + fhe = {} exceeds 1 (negative nitrogen fraction)",
                    fo2 + fhe
                ),
            });
        }
        Ok(GasMix {
            fo2,
            fhe,
            fn2: (1.0 - fo2 - fhe).max(0.0),
        })
    }

    /// Build a mix from an explicit fraction triple, validating the sum.
    pub fn from_fractions(fo2: f64, fhe: f64, fn2: f64) -> Result<GasMix, PlanError> {
        let mix = GasMix { fo2, fhe, fn2 };
        mix.validate()?;
        Ok(mix)
    }

    /// Parse standard gas notation ("air", "oxygen", "EAN32", "21/35").
    pub fn from_label(label: &str) -> Result<GasMix, PlanError> {
        parser::parse_label(label)
    }

    /// Re-check the invariants. Mixes arriving over FFI bypass the
    /// constructors, so planning entry points call this first.
    pub fn validate(&self) -> Result<(), PlanError> {
        for (name, value) in [("fo2", self.fo2), ("fhe", self.fhe), ("fn2", self.fn2)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PlanError::InvalidGasMix {
                    reason: format!("{name} must be a fraction in [0, 1], got {value}"),
                });
            }
        }
        let sum = self.fo2 + self.fhe + self.fn2;
        if (sum - 1.0).abs() > FRACTION_TOLERANCE {
            return Err(PlanError::InvalidGasMix {
                reason: format!("fractions must sum to 1, got {sum}"),
            });
        }
        Ok(())
    }

    /// Partial pressure of oxygen (bar) at depth.
    pub fn po2(&self, depth_m: f64, env: &Environment) -> f64 {
        env.ambient_pressure(depth_m) * self.fo2
    }

    /// Maximum operating depth (m) for a PO2 limit. Infinite for
    /// oxygen-free mixes.
    pub fn max_operating_depth(&self, max_po2: f64, env: &Environment) -> f64 {
        if self.fo2 <= 0.0 {
            return f64::INFINITY;
        }
        env.depth_at_pressure(max_po2 / self.fo2)
    }

    /// Conventional label: "air", "oxygen", "EAN50", "TX18/45".
    pub fn label(&self) -> String {
        let o2 = (self.fo2 * 100.0).round() as u32;
        let he = (self.fhe * 100.0).round() as u32;
        if he == 0 {
            if o2 == 21 {
                "air".to_string()
            } else if o2 == 100 {
                "oxygen".to_string()
            } else {
                format!("EAN{o2}")
            }
        } else {
            format!("TX{o2}/{he}")
        }
    }
}

/// Parse standard gas-mix notation into a normalized mix.
pub fn gas_from_label(label: String) -> Result<GasMix, PlanError> {
    GasMix::from_label(&label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_nitrogen_remainder() {
        let ean32 = GasMix::new(0.32, 0.0).unwrap();
        assert!((ean32.fn2 - 0.68).abs() < FRACTION_TOLERANCE);
        ean32.validate().unwrap();

        let trimix = GasMix::new(0.18, 0.45).unwrap();
        assert!((trimix.fn2 - 0.37).abs() < FRACTION_TOLERANCE);
        trimix.validate().unwrap();
    }

    #[test]
    fn test_sum_invariant_holds_for_all_constructors() {
        for mix in [
            GasMix::AIR,
            GasMix::OXYGEN,
            GasMix::new(0.50, 0.0).unwrap(),
            GasMix::new(0.10, 0.70).unwrap(),
            GasMix::from_fractions(0.21, 0.35, 0.44).unwrap(),
        ] {
            let sum = mix.fo2 + mix.fhe + mix.fn2;
            assert!(
                (sum - 1.0).abs() < FRACTION_TOLERANCE,
                "fractions of {} must sum to 1, got {sum}",
                mix.label()
            );
        }
    }

    #[test]
    fn test_invalid_mixes_rejected() {
        assert!(GasMix::new(1.5, 0.0).is_err());
        assert!(GasMix::new(-0.1, 0.0).is_err());
        assert!(GasMix::new(0.6, 0.5).is_err(), "fo2 + fhe > 1");
        assert!(GasMix::new(f64::NAN, 0.0).is_err());
        assert!(GasMix::from_fractions(0.21, 0.0, 0.50).is_err(), "sum != 1");

        // FFI-shaped value bypassing the constructor.
        let bogus = GasMix {
            fo2: 0.8,
            fhe: 0.8,
            fn2: -0.6,
        };
        assert!(bogus.validate().is_err());
    }

    #[test]
    fn test_po2_and_mod() {
        let env = Environment::default();
        // Air at 40 m: 5.06625 bar * 0.21.
        let po2 = GasMix::AIR.po2(40.0, &env);
        assert!((po2 - 5.06625 * 0.21).abs() < 1e-9);

        // EAN50 MOD at 1.6 bar is a little over 21 m.
        let ean50 = GasMix::new(0.50, 0.0).unwrap();
        let mod_m = ean50.max_operating_depth(1.6, &env);
        assert!((21.0..22.5).contains(&mod_m), "EAN50 MOD was {mod_m}");

        // Heliox-style oxygen-free mix never hits an O2 limit.
        let inert = GasMix::from_fractions(0.0, 1.0, 0.0).unwrap();
        assert!(inert.max_operating_depth(1.6, &env).is_infinite());
    }

    #[test]
    fn test_labels() {
        assert_eq!(GasMix::AIR.label(), "air");
        assert_eq!(GasMix::OXYGEN.label(), "oxygen");
        assert_eq!(GasMix::new(0.50, 0.0).unwrap().label(), "EAN50");
        assert_eq!(GasMix::new(0.18, 0.45).unwrap().label(), "TX18/45");
    }
}
