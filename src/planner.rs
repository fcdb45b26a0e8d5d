//! Decompression scheduler.
//!
//! Owns one [`TissueState`] per planning call and walks the dive through
//! its phases: descent, bottom, ascent to the first stop, the 3 m stop
//! loop, and the final ascent. Travel is simulated in small time steps so
//! tissues load against the changing depth; holds are stepped until the
//! ceiling at the next stop level clears.

use tracing::{debug, warn};

use crate::consumption::{self, BreathedInterval, GasUse};
use crate::error::PlanError;
use crate::gas::GasMix;
use crate::gradient::{round_up_to_stop, GradientFactors};
use crate::multigas::{select_gas, DecoGas, PO2_TOLERANCE};
use crate::oxtox::{self, ExposureSegment, OxygenToxicity};
use crate::pressure::{Environment, DEFAULT_SURFACE_PRESSURE};
use crate::tissue::TissueState;

/// Numerical slack when comparing a ceiling against a stop depth.
const CEILING_TOLERANCE_M: f64 = 1e-6;

/// Slack for floating-point depth stepping.
const DEPTH_TOLERANCE: f64 = 1e-9;

/// Cap for [`no_decompression_limit`] (minutes).
const NDL_CAP_MINUTES: f64 = 999.0;

/// Advisory threshold for the GF spread (percentage points).
const MAX_ADVISABLE_GF_SPREAD: f64 = 50.0;

/// Planner configuration with documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Depth of the shallowest stop, 3 or 6 m. Default 3.
    pub last_stop_depth: u32,
    /// Minimum hold at the last stop even without a ceiling. Default 0.
    pub min_last_stop_minutes: u32,
    /// Simulation step for travel and holds (minutes). Default 0.5.
    pub time_step_minutes: f64,
    /// Attach CNS/OTU figures to the plan. Default false.
    pub calculate_o2_toxicity: bool,
    /// Descent rate (m/min). Default 20.
    pub descent_rate: f64,
    /// Ascent rate (m/min), slower than the descent. Default 10.
    pub ascent_rate: f64,
    /// PO2 limit (bar) for multi-gas planning. Default 1.6.
    pub max_po2: f64,
    /// Per-stop hold cap before the plan is declared runaway. Default 360.
    pub max_stop_minutes: f64,
    /// Surface pressure (bar), for altitude dives. Default 1.01325.
    pub surface_pressure_bar: f64,
    /// Surface air consumption (L/min). When set, the plan carries a
    /// per-gas consumption estimate. Default none.
    pub sac_rate_l_min: Option<f64>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            last_stop_depth: 3,
            min_last_stop_minutes: 0,
            time_step_minutes: 0.5,
            calculate_o2_toxicity: false,
            descent_rate: 20.0,
            ascent_rate: 10.0,
            max_po2: 1.6,
            max_stop_minutes: 360.0,
            surface_pressure_bar: DEFAULT_SURFACE_PRESSURE,
            sac_rate_l_min: None,
        }
    }
}

impl PlanOptions {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.last_stop_depth != 3 && self.last_stop_depth != 6 {
            return Err(PlanError::InvalidOption {
                option: "last_stop_depth".to_string(),
                reason: format!("must be 3 or 6, got {}", self.last_stop_depth),
            });
        }
        for (option, value) in [
            ("time_step_minutes", self.time_step_minutes),
            ("descent_rate", self.descent_rate),
            ("ascent_rate", self.ascent_rate),
            ("max_po2", self.max_po2),
            ("max_stop_minutes", self.max_stop_minutes),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlanError::InvalidOption {
                    option: option.to_string(),
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if !self.surface_pressure_bar.is_finite()
            || !(0.5..=1.5).contains(&self.surface_pressure_bar)
        {
            return Err(PlanError::InvalidOption {
                option: "surface_pressure_bar".to_string(),
                reason: format!(
                    "must be in the 0.5-1.5 bar range, got {}",
                    self.surface_pressure_bar
                ),
            });
        }
        if let Some(sac) = self.sac_rate_l_min {
            if !sac.is_finite() || sac <= 0.0 {
                return Err(PlanError::InvalidOption {
                    option: "sac_rate_l_min".to_string(),
                    reason: format!("must be a positive number, got {sac}"),
                });
            }
        }
        Ok(())
    }
}

/// One scheduled stop, read-only once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompressionStop {
    /// Stop depth (m), a multiple of 3.
    pub depth: u32,
    /// Hold duration (minutes).
    pub minutes: f64,
    /// Interpolated gradient factor at this depth, for audit/display.
    pub gradient_factor: f64,
    /// Mix breathed at the stop; only filled for multi-gas plans.
    pub gas: Option<GasMix>,
    /// Label of the mix breathed at the stop.
    pub gas_name: Option<String>,
}

/// The single output artifact of a planning call.
#[derive(Debug, Clone)]
pub struct DecompressionPlan {
    /// Depth of the first (deepest) scheduled stop level, 0 when the
    /// profile has no stops.
    pub first_stop_depth: u32,
    /// Stops deepest first; zero-length holds are omitted.
    pub stops: Vec<DecompressionStop>,
    /// Decompression-phase time (minutes): everything after the bottom.
    pub tts: f64,
    /// descent + bottom + tts (minutes).
    pub total_dive_time: f64,
    /// Simulated descent duration (minutes).
    pub descent_time: f64,
    /// Bottom time as requested (minutes).
    pub bottom_time: f64,
    /// CNS/OTU figures, when requested.
    pub oxygen_toxicity: Option<OxygenToxicity>,
    /// Per-gas consumption estimate, when a SAC rate is configured.
    pub gas_consumption: Option<Vec<GasUse>>,
    /// Non-fatal advisories collected during validation and simulation.
    pub warnings: Vec<String>,
}

/// Plan a single-gas dive.
///
/// Gradient factors are percentages in 1..=99 with low ≤ high. See
/// [`PlanOptions`] for the defaults of everything else.
pub fn plan_dive(
    depth_meters: f64,
    bottom_minutes: f64,
    gas: GasMix,
    gf_low_percent: u8,
    gf_high_percent: u8,
    options: PlanOptions,
) -> Result<DecompressionPlan, PlanError> {
    plan_internal(
        depth_meters,
        bottom_minutes,
        gas,
        &[],
        false,
        gf_low_percent,
        gf_high_percent,
        &options,
        Vec::new(),
    )
}

/// Largest number of whole minutes at constant depth after which a direct
/// ascent to the surface is still permitted at GF-high, capped at 999.
pub fn no_decompression_limit(
    depth_meters: f64,
    gas: GasMix,
    gf_high_percent: u8,
    options: PlanOptions,
) -> Result<f64, PlanError> {
    options.validate()?;
    gas.validate()?;
    if !depth_meters.is_finite() || depth_meters < 0.0 {
        return Err(PlanError::InvalidProfile {
            reason: format!("depth must be a non-negative number of metres, got {depth_meters}"),
        });
    }
    let gf = GradientFactors::from_percent(gf_high_percent, gf_high_percent)?;
    let env = Environment::with_surface_pressure(options.surface_pressure_bar);
    let mut tissues = TissueState::surface_equilibrium(&env);
    let mut minutes = 0.0;
    while minutes < NDL_CAP_MINUTES {
        tissues.advance(depth_meters, &gas, 1.0, &env);
        if tissues.ceiling(gf.high(), &env) > CEILING_TOLERANCE_M {
            return Ok(minutes);
        }
        minutes += 1.0;
    }
    Ok(NDL_CAP_MINUTES)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn plan_internal(
    depth_meters: f64,
    bottom_minutes: f64,
    bottom_gas: GasMix,
    deco_gases: &[DecoGas],
    multi_gas: bool,
    gf_low_percent: u8,
    gf_high_percent: u8,
    options: &PlanOptions,
    mut warnings: Vec<String>,
) -> Result<DecompressionPlan, PlanError> {
    options.validate()?;
    bottom_gas.validate()?;
    if !depth_meters.is_finite() || depth_meters < 0.0 {
        return Err(PlanError::InvalidProfile {
            reason: format!("depth must be a non-negative number of metres, got {depth_meters}"),
        });
    }
    if !bottom_minutes.is_finite() || bottom_minutes < 0.0 {
        return Err(PlanError::InvalidProfile {
            reason: format!(
                "bottom time must be a non-negative number of minutes, got {bottom_minutes}"
            ),
        });
    }

    let gf = GradientFactors::from_percent(gf_low_percent, gf_high_percent)?;
    if gf.spread_percent() > MAX_ADVISABLE_GF_SPREAD {
        warn!(
            gf_low = gf_low_percent,
            gf_high = gf_high_percent,
            "wide gradient factor spread"
        );
        warnings.push(format!(
            "gradient factor spread {gf_low_percent}/{gf_high_percent} is wider than \
             {MAX_ADVISABLE_GF_SPREAD:.0} points"
        ));
    }

    let env = Environment::with_surface_pressure(options.surface_pressure_bar);
    let record_segments = options.calculate_o2_toxicity || options.sac_rate_l_min.is_some();
    let mut scheduler = Scheduler {
        env,
        gf,
        options,
        deco_gases,
        multi_gas,
        tissues: TissueState::surface_equilibrium(&env),
        depth: 0.0,
        gas: bottom_gas,
        gas_name: None,
        record_segments,
        segments: Vec::new(),
    };
    let outcome = scheduler.run(depth_meters, bottom_minutes)?;

    let oxygen_toxicity = if options.calculate_o2_toxicity {
        let exposure: Vec<ExposureSegment> = scheduler
            .segments
            .iter()
            .map(|s| ExposureSegment {
                depth_m: s.depth_m,
                minutes: s.minutes,
                fo2: s.fo2,
            })
            .collect();
        let (toxicity, toxicity_warnings) = oxtox::accumulate(&exposure, &env);
        warnings.extend(toxicity_warnings);
        Some(toxicity)
    } else {
        None
    };

    let gas_consumption = options.sac_rate_l_min.map(|sac| {
        let intervals: Vec<BreathedInterval> = scheduler
            .segments
            .iter()
            .map(|s| BreathedInterval {
                gas_name: s.gas_label.clone(),
                depth_m: s.depth_m,
                minutes: s.minutes,
            })
            .collect();
        consumption::estimate(&intervals, sac, &env)
    });

    Ok(DecompressionPlan {
        first_stop_depth: outcome.first_stop_depth,
        stops: outcome.stops,
        tts: outcome.tts,
        total_dive_time: outcome.descent_time + bottom_minutes + outcome.tts,
        descent_time: outcome.descent_time,
        bottom_time: bottom_minutes,
        oxygen_toxicity,
        gas_consumption,
        warnings,
    })
}

/// A constant-depth interval as actually breathed, for the toxicity and
/// consumption accumulators.
struct BreathedSegment {
    depth_m: f64,
    minutes: f64,
    fo2: f64,
    gas_label: String,
}

struct ScheduleOutcome {
    descent_time: f64,
    tts: f64,
    first_stop_depth: u32,
    stops: Vec<DecompressionStop>,
}

struct Scheduler<'a> {
    env: Environment,
    gf: GradientFactors,
    options: &'a PlanOptions,
    deco_gases: &'a [DecoGas],
    multi_gas: bool,
    tissues: TissueState,
    depth: f64,
    gas: GasMix,
    gas_name: Option<String>,
    record_segments: bool,
    segments: Vec<BreathedSegment>,
}

impl Scheduler<'_> {
    fn run(
        &mut self,
        target_depth: f64,
        bottom_minutes: f64,
    ) -> Result<ScheduleOutcome, PlanError> {
        let descent_time = self.descend_to(target_depth);
        debug!(depth_m = target_depth, minutes = descent_time, "descent complete");

        self.breathe(target_depth, bottom_minutes);
        let (ceiling, leading) = self.tissues.ceiling_with_leading(self.gf.low(), &self.env);
        debug!(
            ceiling_m = ceiling,
            compartment = leading,
            "ceiling at end of bottom time"
        );

        let last_stop = self.options.last_stop_depth;
        let needs_stops = ceiling > f64::from(last_stop) + CEILING_TOLERANCE_M;
        let forced_hold = self.options.min_last_stop_minutes > 0
            && target_depth + DEPTH_TOLERANCE >= f64::from(last_stop);

        let mut tts = 0.0;
        let mut stops = Vec::new();
        let mut first_stop_depth = 0_u32;

        if needs_stops || forced_hold {
            // The first stop cannot sit below the bottom itself.
            let deepest_level = ((target_depth / 3.0).floor() as u32 * 3).max(last_stop);
            let first_stop = if needs_stops {
                (round_up_to_stop(ceiling) as u32)
                    .max(last_stop)
                    .min(deepest_level)
            } else {
                last_stop
            };
            first_stop_depth = first_stop;
            let anchor = f64::from(first_stop);

            tts += self.ascend_to(anchor)?;
            let mut stop_depth = first_stop;
            loop {
                let held = self.hold_at_stop(stop_depth, anchor)?;
                tts += held;
                if held > 0.0 {
                    let (gas, gas_name) = if self.multi_gas {
                        (Some(self.gas), Some(self.current_gas_label()))
                    } else {
                        (None, None)
                    };
                    stops.push(DecompressionStop {
                        depth: stop_depth,
                        minutes: held,
                        gradient_factor: self.gf.at_depth(f64::from(stop_depth), anchor),
                        gas,
                        gas_name,
                    });
                }
                let next = stop_depth.saturating_sub(3);
                tts += self.ascend_to(f64::from(next))?;
                if stop_depth <= last_stop {
                    break;
                }
                stop_depth = next;
            }
        }

        // Safety net: whatever depth remains goes in one simulated leg.
        if self.depth > DEPTH_TOLERANCE {
            tts += self.ascend_to(0.0)?;
        }

        Ok(ScheduleOutcome {
            descent_time,
            tts,
            first_stop_depth,
            stops,
        })
    }

    /// Hold at a stop until the ceiling clears the next 3 m level under
    /// that level's gradient factor, honouring the last-stop minimum hold.
    fn hold_at_stop(&mut self, stop_depth: u32, anchor: f64) -> Result<f64, PlanError> {
        let depth = f64::from(stop_depth);
        self.maybe_switch(depth)?;

        let next_depth = f64::from(stop_depth.saturating_sub(3));
        let is_last = stop_depth <= self.options.last_stop_depth;
        let min_hold = if is_last {
            f64::from(self.options.min_last_stop_minutes)
        } else {
            0.0
        };
        let gf_next = self.gf.at_depth(next_depth, anchor);

        let mut held = 0.0;
        loop {
            let cleared =
                self.tissues.ceiling(gf_next, &self.env) <= next_depth + CEILING_TOLERANCE_M;
            if cleared && held + 1e-9 >= min_hold {
                break;
            }
            if !cleared && held >= self.options.max_stop_minutes {
                return Err(PlanError::RunawayStop {
                    depth_m: stop_depth,
                    cap_minutes: self.options.max_stop_minutes,
                });
            }
            self.breathe(depth, self.options.time_step_minutes);
            held += self.options.time_step_minutes;
        }
        if held > 0.0 {
            debug!(depth_m = stop_depth, minutes = held, "stop complete");
        }
        Ok(held)
    }

    fn descend_to(&mut self, target: f64) -> f64 {
        let mut elapsed = 0.0;
        while target - self.depth > DEPTH_TOLERANCE {
            let remaining = target - self.depth;
            let dt = (remaining / self.options.descent_rate).min(self.options.time_step_minutes);
            let next = self.depth + self.options.descent_rate * dt;
            self.breathe((self.depth + next) / 2.0, dt);
            self.depth = next;
            elapsed += dt;
        }
        self.depth = target;
        elapsed
    }

    fn ascend_to(&mut self, target: f64) -> Result<f64, PlanError> {
        let mut elapsed = 0.0;
        while self.depth - target > DEPTH_TOLERANCE {
            let remaining = self.depth - target;
            let dt = (remaining / self.options.ascent_rate).min(self.options.time_step_minutes);
            let next = self.depth - self.options.ascent_rate * dt;
            self.breathe((self.depth + next) / 2.0, dt);
            self.depth = next;
            self.maybe_switch(next)?;
            elapsed += dt;
        }
        self.depth = target;
        Ok(elapsed)
    }

    /// Switch to the richest breathable deco gas at `depth`, and enforce
    /// the PO2 limit on whatever is being breathed afterwards.
    fn maybe_switch(&mut self, depth: f64) -> Result<(), PlanError> {
        if !self.multi_gas {
            return Ok(());
        }
        let selection = select_gas(
            depth,
            self.deco_gases,
            &self.gas,
            self.gas_name.as_deref(),
            self.options.max_po2,
            &self.env,
        );
        if selection.should_switch {
            debug!(depth_m = depth, gas = %selection.mix.label(), "switching deco gas");
            self.gas = selection.mix;
            self.gas_name = selection.name;
        }
        let po2 = self.gas.po2(depth, &self.env);
        if po2 > self.options.max_po2 + PO2_TOLERANCE {
            return Err(PlanError::UnsafeGasPlan {
                reason: format!(
                    "no breathable gas at {:.1} m: {} reaches PO2 {:.2} bar (limit {:.2})",
                    depth,
                    self.current_gas_label(),
                    po2,
                    self.options.max_po2
                ),
            });
        }
        Ok(())
    }

    /// Advance tissues at a constant depth and log the interval.
    fn breathe(&mut self, depth_m: f64, minutes: f64) {
        if minutes <= 0.0 {
            return;
        }
        self.tissues.advance(depth_m, &self.gas, minutes, &self.env);
        if self.record_segments {
            let gas_label = self.current_gas_label();
            self.segments.push(BreathedSegment {
                depth_m,
                minutes,
                fo2: self.gas.fo2,
                gas_label,
            });
        }
    }

    fn current_gas_label(&self) -> String {
        self.gas_name
            .clone()
            .unwrap_or_else(|| self.gas.label())
    }
}
