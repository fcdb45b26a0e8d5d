//! ZH-L16C tissue simulation.
//!
//! Tracks inert-gas partial pressures in the 16 Bühlmann compartments,
//! advances them with the Schreiner equation, and computes the
//! decompression ceiling using Erik Baker's corrected gradient-factor
//! formula.

use std::f64::consts::LN_2;

use crate::gas::GasMix;
use crate::pressure::Environment;
use crate::zhl16c::{A_HE, A_N2, B_HE, B_N2, HE_HALF_TIMES, N2_HALF_TIMES, NUM_COMPARTMENTS};

/// Fraction of N2 assumed in surface air for the initial saturation.
const SURFACE_AIR_FN2: f64 = 0.79;

/// Guard against dividing by an unloaded compartment.
const EPSILON_PRESSURE: f64 = 1e-10;

/// State of the 16 tissue compartments.
#[derive(Debug, Clone)]
pub struct TissueState {
    /// N2 partial pressure in each compartment (bar).
    p_n2: [f64; NUM_COMPARTMENTS],
    /// He partial pressure in each compartment (bar).
    p_he: [f64; NUM_COMPARTMENTS],
}

impl TissueState {
    /// Initialise tissues at surface equilibrium (breathing air).
    pub fn surface_equilibrium(env: &Environment) -> Self {
        let p_n2_surface = env.inspired_pressure(0.0, SURFACE_AIR_FN2);
        TissueState {
            p_n2: [p_n2_surface; NUM_COMPARTMENTS],
            p_he: [0.0; NUM_COMPARTMENTS],
        }
    }

    /// Advance all compartments by `minutes` at a constant depth.
    ///
    /// Exponential approach to the inspired pressure, exact for any
    /// positive interval. Accuracy during depth changes comes from the
    /// caller stepping in small increments, not from this method.
    pub fn advance(&mut self, depth_m: f64, gas: &GasMix, minutes: f64, env: &Environment) {
        if minutes <= 0.0 {
            return;
        }
        let p_insp_n2 = env.inspired_pressure(depth_m, gas.fn2);
        let p_insp_he = env.inspired_pressure(depth_m, gas.fhe);
        for i in 0..NUM_COMPARTMENTS {
            let k_n2 = LN_2 / N2_HALF_TIMES[i];
            self.p_n2[i] = p_insp_n2 + (self.p_n2[i] - p_insp_n2) * (-k_n2 * minutes).exp();

            let k_he = LN_2 / HE_HALF_TIMES[i];
            self.p_he[i] = p_insp_he + (self.p_he[i] - p_insp_he) * (-k_he * minutes).exp();
        }
    }

    /// Minimum tolerable ambient pressure (bar) for one compartment under
    /// a gradient factor, Baker's corrected formula:
    /// `(p_total - gf*a) / (gf/b + 1 - gf)`.
    fn compartment_min_pressure(&self, i: usize, gf: f64) -> f64 {
        let p_total = self.p_n2[i] + self.p_he[i];

        // Blend a/b proportionally to each inert gas's contribution.
        let (a, b) = if p_total > EPSILON_PRESSURE {
            (
                (A_N2[i] * self.p_n2[i] + A_HE[i] * self.p_he[i]) / p_total,
                (B_N2[i] * self.p_n2[i] + B_HE[i] * self.p_he[i]) / p_total,
            )
        } else {
            (A_N2[i], B_N2[i])
        };

        (p_total - gf * a) / (gf / b + (1.0 - gf))
    }

    /// Decompression ceiling (m, ≥ 0) across all compartments.
    ///
    /// `gf` must be in (0, 1]; the planner's validated gradient factors
    /// guarantee this.
    pub fn ceiling(&self, gf: f64, env: &Environment) -> f64 {
        self.ceiling_with_leading(gf, env).0
    }

    /// Ceiling plus the index of the controlling compartment, in a single
    /// pass over all compartments.
    pub fn ceiling_with_leading(&self, gf: f64, env: &Environment) -> (f64, usize) {
        let mut worst = 0.0_f64;
        let mut leading = 0_usize;
        for i in 0..NUM_COMPARTMENTS {
            let depth = env.depth_at_pressure(self.compartment_min_pressure(i, gf));
            if depth > worst {
                worst = depth;
                leading = i;
            }
        }
        (worst, leading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_equilibrium_has_no_ceiling() {
        let env = Environment::default();
        let tissues = TissueState::surface_equilibrium(&env);
        for gf in [0.3, 0.85, 1.0] {
            assert_eq!(
                tissues.ceiling(gf, &env),
                0.0,
                "saturated-at-surface tissues must have no ceiling at gf {gf}"
            );
        }
    }

    #[test]
    fn test_advance_approaches_inspired_pressure() {
        let env = Environment::default();
        let mut tissues = TissueState::surface_equilibrium(&env);

        // Twelve hours at 30 m on air: every compartment near equilibrium.
        tissues.advance(30.0, &GasMix::AIR, 720.0, &env);
        let p_insp = env.inspired_pressure(30.0, GasMix::AIR.fn2);
        for i in 0..NUM_COMPARTMENTS {
            assert!(
                (tissues.p_n2[i] - p_insp).abs() < p_insp * 0.40,
                "compartment {i} should approach {p_insp}, got {}",
                tissues.p_n2[i]
            );
            assert_eq!(tissues.p_he[i], 0.0, "air carries no helium");
        }
        // The fastest compartment is essentially saturated.
        assert!((tissues.p_n2[0] - p_insp).abs() < 1e-6);
    }

    #[test]
    fn test_advance_is_splittable() {
        // One 10-minute call must equal twenty 0.5-minute calls.
        let env = Environment::default();
        let gas = GasMix::new(0.18, 0.45).unwrap();

        let mut whole = TissueState::surface_equilibrium(&env);
        whole.advance(45.0, &gas, 10.0, &env);

        let mut split = TissueState::surface_equilibrium(&env);
        for _ in 0..20 {
            split.advance(45.0, &gas, 0.5, &env);
        }

        for i in 0..NUM_COMPARTMENTS {
            assert!(
                (whole.p_n2[i] - split.p_n2[i]).abs() < 1e-9,
                "N2 mismatch in compartment {i}"
            );
            assert!(
                (whole.p_he[i] - split.p_he[i]).abs() < 1e-9,
                "He mismatch in compartment {i}"
            );
        }
    }

    #[test]
    fn test_zero_or_negative_interval_is_a_no_op() {
        let env = Environment::default();
        let mut tissues = TissueState::surface_equilibrium(&env);
        let before = tissues.clone();
        tissues.advance(40.0, &GasMix::AIR, 0.0, &env);
        tissues.advance(40.0, &GasMix::AIR, -5.0, &env);
        assert_eq!(before.p_n2, tissues.p_n2);
        assert_eq!(before.p_he, tissues.p_he);
    }

    #[test]
    fn test_loaded_tissues_have_a_ceiling() {
        let env = Environment::default();
        let mut tissues = TissueState::surface_equilibrium(&env);
        tissues.advance(40.0, &GasMix::AIR, 30.0, &env);

        let ceiling = tissues.ceiling(0.85, &env);
        assert!(
            ceiling > 3.0,
            "40 m / 30 min on air must demand stops, ceiling was {ceiling}"
        );

        // A stricter gradient factor pushes the ceiling deeper.
        let strict = tissues.ceiling(0.30, &env);
        assert!(
            strict > ceiling,
            "gf 0.30 ceiling {strict} must exceed gf 0.85 ceiling {ceiling}"
        );
    }

    #[test]
    fn test_helium_loads_drive_the_ceiling_too() {
        let env = Environment::default();
        let gas = GasMix::new(0.18, 0.45).unwrap();
        let mut tissues = TissueState::surface_equilibrium(&env);
        tissues.advance(60.0, &gas, 25.0, &env);

        let (ceiling, leading) = tissues.ceiling_with_leading(0.85, &env);
        assert!(ceiling > 6.0, "trimix at 60 m loads fast, got {ceiling}");
        assert!(leading < NUM_COMPARTMENTS);
        assert!(tissues.p_he[leading] > 0.5, "controlling tissue carries He");
    }

    #[test]
    fn test_offgassing_lowers_the_ceiling() {
        let env = Environment::default();
        let mut tissues = TissueState::surface_equilibrium(&env);
        tissues.advance(40.0, &GasMix::AIR, 25.0, &env);
        let before = tissues.ceiling(0.85, &env);

        // Ten minutes at 6 m breathing EAN50.
        let ean50 = GasMix::new(0.50, 0.0).unwrap();
        tissues.advance(6.0, &ean50, 10.0, &env);
        let after = tissues.ceiling(0.85, &env);

        assert!(
            after < before,
            "off-gassing at a stop must lower the ceiling: {before} -> {after}"
        );
    }
}
