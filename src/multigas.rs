//! Multi-gas plans and the richest-safe gas selector.
//!
//! A multi-gas dive carries a bottom gas plus deco gases staged by switch
//! depth. During ascent the planner switches to the richest gas that is
//! both reached (at or shallower than its switch depth) and breathable
//! (PO2 within the configured limit).

use tracing::warn;

use crate::error::PlanError;
use crate::gas::GasMix;
use crate::planner::{plan_internal, DecompressionPlan, PlanOptions};
use crate::pressure::Environment;

/// Tolerance applied to PO2 limit comparisons.
pub(crate) const PO2_TOLERANCE: f64 = 1e-6;

/// A deco gas and the depth at which it becomes breathable.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoGas {
    /// Shallowest depth (m) at which the switch is planned.
    pub switch_depth: f64,
    /// The mix itself.
    pub mix: GasMix,
    /// Display label, e.g. "EAN50".
    pub name: String,
}

/// Bottom gas plus the deco gases available on ascent.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGasPlan {
    pub bottom_gas: GasMix,
    /// Ideally sorted by descending switch depth; violations warn.
    pub deco_gases: Vec<DecoGas>,
}

/// Outcome of a gas-selection query.
#[derive(Debug, Clone, PartialEq)]
pub struct GasSelection {
    pub mix: GasMix,
    pub name: Option<String>,
    /// True only when the selected gas differs from the current one.
    pub should_switch: bool,
}

/// Pick the richest breathable gas at `depth_m`.
///
/// The current gas is kept when no usable candidate is richer in oxygen.
pub fn select_gas(
    depth_m: f64,
    deco_gases: &[DecoGas],
    current: &GasMix,
    current_name: Option<&str>,
    max_po2: f64,
    env: &Environment,
) -> GasSelection {
    let mut mix = *current;
    let mut name = current_name.map(str::to_string);
    let mut should_switch = false;
    for deco in deco_gases {
        let reached = depth_m <= deco.switch_depth + 1e-9;
        let breathable = deco.mix.po2(depth_m, env) <= max_po2 + PO2_TOLERANCE;
        if reached && breathable && deco.mix.fo2 > mix.fo2 {
            mix = deco.mix;
            name = Some(deco.name.clone());
            should_switch = true;
        }
    }
    GasSelection {
        mix,
        name,
        should_switch,
    }
}

/// Fail-fast checks on a multi-gas plan; returns advisory warnings.
///
/// The bottom gas must be breathable at the bottom, and every deco gas at
/// its own switch depth. Unsorted deco gases are an advisory, not an
/// error.
pub fn validate_gas_plan(
    plan: &MultiGasPlan,
    bottom_depth_m: f64,
    max_po2: f64,
    env: &Environment,
) -> Result<Vec<String>, PlanError> {
    let mut warnings = Vec::new();

    let bottom_po2 = plan.bottom_gas.po2(bottom_depth_m, env);
    if bottom_po2 > max_po2 + PO2_TOLERANCE {
        return Err(PlanError::UnsafeGasPlan {
            reason: format!(
                "bottom gas {} reaches PO2 {:.2} bar at {:.0} m (limit {:.2}, maximum operating depth {:.1} m)",
                plan.bottom_gas.label(),
                bottom_po2,
                bottom_depth_m,
                max_po2,
                plan.bottom_gas.max_operating_depth(max_po2, env),
            ),
        });
    }

    for deco in &plan.deco_gases {
        let po2 = deco.mix.po2(deco.switch_depth, env);
        if po2 > max_po2 + PO2_TOLERANCE {
            return Err(PlanError::UnsafeGasPlan {
                reason: format!(
                    "{} reaches PO2 {:.2} bar at its {:.0} m switch depth (limit {:.2}, maximum operating depth {:.1} m)",
                    deco.name,
                    po2,
                    deco.switch_depth,
                    max_po2,
                    deco.mix.max_operating_depth(max_po2, env),
                ),
            });
        }
    }

    let sorted = plan
        .deco_gases
        .windows(2)
        .all(|pair| pair[0].switch_depth >= pair[1].switch_depth);
    if !sorted {
        warn!("deco gases are not sorted by descending switch depth");
        warnings.push("deco gases are not sorted by descending switch depth".to_string());
    }

    Ok(warnings)
}

/// Plan a dive with gas switches on ascent.
///
/// Same contract as [`crate::planner::plan_dive`], with the single mix
/// replaced by a [`MultiGasPlan`] and PO2 enforced against
/// `options.max_po2` throughout the decompression phase.
pub fn plan_multi_gas(
    depth_meters: f64,
    bottom_minutes: f64,
    gases: MultiGasPlan,
    gf_low_percent: u8,
    gf_high_percent: u8,
    options: PlanOptions,
) -> Result<DecompressionPlan, PlanError> {
    options.validate()?;
    gases.bottom_gas.validate()?;
    for deco in &gases.deco_gases {
        deco.mix.validate()?;
        if !deco.switch_depth.is_finite() || deco.switch_depth < 0.0 {
            return Err(PlanError::InvalidProfile {
                reason: format!(
                    "switch depth for {} must be a non-negative number of metres",
                    deco.name
                ),
            });
        }
    }

    let env = Environment::with_surface_pressure(options.surface_pressure_bar);
    let warnings = validate_gas_plan(&gases, depth_meters, options.max_po2, &env)?;

    plan_internal(
        depth_meters,
        bottom_minutes,
        gases.bottom_gas,
        &gases.deco_gases,
        true,
        gf_low_percent,
        gf_high_percent,
        &options,
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ean50() -> DecoGas {
        DecoGas {
            switch_depth: 21.0,
            mix: GasMix::new(0.50, 0.0).unwrap(),
            name: "EAN50".to_string(),
        }
    }

    fn oxygen_at(switch_depth: f64) -> DecoGas {
        DecoGas {
            switch_depth,
            mix: GasMix::OXYGEN,
            name: "oxygen".to_string(),
        }
    }

    #[test]
    fn test_selector_ignores_unreached_gases() {
        let env = Environment::default();
        let gases = vec![ean50(), oxygen_at(3.0)];
        let selection = select_gas(30.0, &gases, &GasMix::AIR, None, 1.6, &env);
        assert!(!selection.should_switch, "nothing usable at 30 m");
        assert_eq!(selection.mix, GasMix::AIR);
    }

    #[test]
    fn test_selector_picks_richest_usable() {
        let env = Environment::default();
        let gases = vec![ean50(), oxygen_at(3.0)];

        // At 21 m only EAN50 is reached.
        let selection = select_gas(21.0, &gases, &GasMix::AIR, None, 1.6, &env);
        assert!(selection.should_switch);
        assert_eq!(selection.name.as_deref(), Some("EAN50"));

        // At 3 m oxygen wins over the current EAN50.
        let current = GasMix::new(0.50, 0.0).unwrap();
        let selection = select_gas(3.0, &gases, &current, Some("EAN50"), 1.6, &env);
        assert!(selection.should_switch);
        assert_eq!(selection.mix, GasMix::OXYGEN);
    }

    #[test]
    fn test_selector_respects_po2_limit() {
        let env = Environment::default();
        // Oxygen staged too deep: at 12 m its PO2 is ~2.2 bar.
        let gases = vec![oxygen_at(12.0)];
        let selection = select_gas(12.0, &gases, &GasMix::AIR, None, 1.6, &env);
        assert!(
            !selection.should_switch,
            "oxygen at 12 m exceeds the PO2 limit and must not be selected"
        );
    }

    #[test]
    fn test_selector_does_not_switch_to_itself() {
        let env = Environment::default();
        let current = GasMix::new(0.50, 0.0).unwrap();
        let selection = select_gas(15.0, &[ean50()], &current, Some("EAN50"), 1.6, &env);
        assert!(!selection.should_switch);
    }

    #[test]
    fn test_validate_rejects_unbreathable_deco_gas() {
        let env = Environment::default();
        // Pure O2 at a 6 m switch depth is 1.62 bar at sea level, over
        // the 1.6 bar limit, which is applied exactly.
        let plan = MultiGasPlan {
            bottom_gas: GasMix::AIR,
            deco_gases: vec![oxygen_at(6.0)],
        };
        let result = validate_gas_plan(&plan, 40.0, 1.6, &env);
        assert!(
            matches!(&result, Err(PlanError::UnsafeGasPlan { .. })),
            "got {result:?}"
        );

        // At 3 m the same gas is fine.
        let plan = MultiGasPlan {
            bottom_gas: GasMix::AIR,
            deco_gases: vec![oxygen_at(3.0)],
        };
        assert!(validate_gas_plan(&plan, 40.0, 1.6, &env).is_ok());
    }

    #[test]
    fn test_validate_rejects_unbreathable_bottom_gas() {
        let env = Environment::default();
        let plan = MultiGasPlan {
            bottom_gas: GasMix::AIR,
            deco_gases: vec![],
        };
        // Air beyond ~66 m exceeds 1.6 bar PO2.
        let result = validate_gas_plan(&plan, 70.0, 1.6, &env);
        assert!(matches!(result, Err(PlanError::UnsafeGasPlan { .. })));
    }

    #[test]
    fn test_validate_warns_on_unsorted_gases() {
        let env = Environment::default();
        let plan = MultiGasPlan {
            bottom_gas: GasMix::AIR,
            deco_gases: vec![oxygen_at(3.0), ean50()],
        };
        let warnings = validate_gas_plan(&plan, 40.0, 1.6, &env).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sorted"));
    }
}
