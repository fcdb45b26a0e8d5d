use thiserror::Error;

/// Error type for dive-plan validation and computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("invalid gas mix: {reason}")]
    InvalidGasMix { reason: String },

    #[error("invalid gas label: '{label}'")]
    InvalidGasLabel { label: String },

    #[error("invalid gradient factors: {reason}")]
    InvalidGradientFactors { reason: String },

    #[error("invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("invalid dive profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("unsafe gas plan: {reason}")]
    UnsafeGasPlan { reason: String },

    #[error("stop at {depth_m} m did not clear within {cap_minutes} minutes")]
    RunawayStop { depth_m: u32, cap_minutes: f64 },
}
