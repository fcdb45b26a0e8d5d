//! Oxygen-toxicity accounting (CNS% and OTU).
//!
//! Integrates exposure over logged depth/time/FO2 segments. CNS uses a
//! linearly interpolated limit table, OTU the NOAA formula.

use crate::pressure::Environment;

/// One breathed interval of the simulated profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureSegment {
    /// Depth held for the segment (m).
    pub depth_m: f64,
    /// Segment duration (minutes).
    pub minutes: f64,
    /// Oxygen fraction of the breathed mix.
    pub fo2: f64,
}

/// Accumulated oxygen-toxicity figures for a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct OxygenToxicity {
    /// Central-nervous-system toxicity, % of the single-exposure limit.
    pub cns_percent: f64,
    /// Pulmonary oxygen tolerance units (NOAA).
    pub otu: f64,
    /// Highest PO2 (bar) seen across all segments.
    pub max_po2: f64,
}

/// Anchor points: PO2 (bar) → maximum single-exposure time (minutes).
/// Exposure between anchors interpolates linearly; above the last anchor
/// the 2.0 bar limit applies.
const CNS_LIMITS: [(f64, f64); 4] = [(0.5, 720.0), (1.0, 45.0), (1.6, 12.0), (2.0, 6.0)];

/// PO2 below which CNS and OTU accrue nothing.
const PO2_FLOOR: f64 = 0.5;

/// Working and hard PO2 limits for advisory warnings.
const PO2_ELEVATED: f64 = 1.6;
const PO2_DANGEROUS: f64 = 2.0;

/// Maximum tolerable exposure (minutes) at a PO2. `None` below the floor.
fn max_exposure_minutes(po2: f64) -> Option<f64> {
    if po2 < PO2_FLOOR {
        return None;
    }
    let last = CNS_LIMITS[CNS_LIMITS.len() - 1];
    if po2 >= last.0 {
        return Some(last.1);
    }
    for window in CNS_LIMITS.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        if po2 >= lo.0 && po2 <= hi.0 {
            let frac = (po2 - lo.0) / (hi.0 - lo.0);
            return Some(lo.1 + (hi.1 - lo.1) * frac);
        }
    }
    Some(last.1)
}

/// Integrate CNS%, OTU and the maximum PO2 across `segments`, returning
/// the figures plus any advisory warnings.
pub fn accumulate(segments: &[ExposureSegment], env: &Environment) -> (OxygenToxicity, Vec<String>) {
    let mut cns_percent = 0.0;
    let mut otu = 0.0;
    let mut max_po2 = 0.0_f64;

    for segment in segments {
        let po2 = env.ambient_pressure(segment.depth_m) * segment.fo2;
        if po2 > max_po2 {
            max_po2 = po2;
        }
        if let Some(limit) = max_exposure_minutes(po2) {
            cns_percent += segment.minutes / limit * 100.0;
        }
        if po2 > PO2_FLOOR {
            otu += segment.minutes * (po2 - PO2_FLOOR).powf(0.83);
        }
    }

    let toxicity = OxygenToxicity {
        cns_percent,
        otu,
        max_po2,
    };
    let warnings = advisory_warnings(&toxicity);
    (toxicity, warnings)
}

fn advisory_warnings(toxicity: &OxygenToxicity) -> Vec<String> {
    let mut warnings = Vec::new();
    if toxicity.max_po2 > PO2_DANGEROUS {
        warnings.push(format!(
            "PO2 {:.2} bar exceeds the {PO2_DANGEROUS:.1} bar hard limit",
            toxicity.max_po2
        ));
    } else if toxicity.max_po2 > PO2_ELEVATED {
        warnings.push(format!(
            "PO2 {:.2} bar exceeds the {PO2_ELEVATED:.1} bar working limit",
            toxicity.max_po2
        ));
    }
    if toxicity.cns_percent > 100.0 {
        warnings.push(format!(
            "CNS {:.0}% exceeds the single-exposure limit",
            toxicity.cns_percent
        ));
    } else if toxicity.cns_percent > 80.0 {
        warnings.push(format!(
            "CNS {:.0}% approaches the single-exposure limit",
            toxicity.cns_percent
        ));
    }
    if toxicity.otu > 300.0 {
        warnings.push(format!("OTU {:.0} exceeds the daily limit", toxicity.otu));
    } else if toxicity.otu > 200.0 {
        warnings.push(format!("OTU {:.0} approaches the daily limit", toxicity.otu));
    }
    warnings
}
