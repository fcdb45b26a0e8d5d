//! Open-circuit gas-consumption estimates.
//!
//! Volume breathed from a cylinder scales with ambient pressure:
//! `liters = p_amb(depth) * minutes * sac`, where `sac` is the diver's
//! surface air consumption in L/min. Intervals are grouped per gas label
//! so multi-gas plans report each cylinder separately.

use crate::pressure::Environment;

/// One breathed interval attributed to a labelled gas.
#[derive(Debug, Clone, PartialEq)]
pub struct BreathedInterval {
    /// Label of the gas breathed ("air", "EAN50", …).
    pub gas_name: String,
    /// Depth held for the interval (m).
    pub depth_m: f64,
    /// Interval duration (minutes).
    pub minutes: f64,
}

/// Estimated open-circuit volume drawn from one gas.
#[derive(Debug, Clone, PartialEq)]
pub struct GasUse {
    /// Label of the gas ("air", "EAN50", …).
    pub gas_name: String,
    /// Surface-equivalent volume (liters).
    pub liters: f64,
}

/// Sum surface-equivalent volume per gas, in first-breathed order.
pub fn estimate(intervals: &[BreathedInterval], sac_l_min: f64, env: &Environment) -> Vec<GasUse> {
    let mut usage: Vec<GasUse> = Vec::new();
    for interval in intervals {
        let liters = env.ambient_pressure(interval.depth_m) * interval.minutes * sac_l_min;
        match usage.iter_mut().find(|u| u.gas_name == interval.gas_name) {
            Some(entry) => entry.liters += liters,
            None => usage.push(GasUse {
                gas_name: interval.gas_name.clone(),
                liters,
            }),
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(gas_name: &str, depth_m: f64, minutes: f64) -> BreathedInterval {
        BreathedInterval {
            gas_name: gas_name.to_string(),
            depth_m,
            minutes,
        }
    }

    #[test]
    fn test_single_interval_math() {
        let env = Environment::default();
        // 10 minutes at 10 m with a 20 L/min SAC: 2.0265 bar * 10 * 20.
        let usage = estimate(&[interval("air", 10.0, 10.0)], 20.0, &env);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].gas_name, "air");
        assert!((usage[0].liters - 2.02650 * 10.0 * 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_groups_by_gas_in_first_breathed_order() {
        let env = Environment::default();
        let usage = estimate(
            &[
                interval("air", 30.0, 20.0),
                interval("air", 15.0, 2.0),
                interval("EAN50", 6.0, 8.0),
            ],
            18.0,
            &env,
        );
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].gas_name, "air");
        assert_eq!(usage[1].gas_name, "EAN50");

        let air_expected =
            (env.ambient_pressure(30.0) * 20.0 + env.ambient_pressure(15.0) * 2.0) * 18.0;
        assert!((usage[0].liters - air_expected).abs() < 1e-9);
    }

    #[test]
    fn test_deeper_costs_more() {
        let env = Environment::default();
        let shallow = estimate(&[interval("air", 10.0, 10.0)], 20.0, &env);
        let deep = estimate(&[interval("air", 40.0, 10.0)], 20.0, &env);
        assert!(deep[0].liters > 2.0 * shallow[0].liters);
    }
}
