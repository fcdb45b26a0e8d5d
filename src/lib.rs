pub mod consumption;
pub mod error;
pub mod gas;
pub mod gradient;
pub mod multigas;
pub mod oxtox;
pub mod planner;
pub mod pressure;
pub mod tissue;
pub mod zhl16c;

uniffi::include_scaffolding!("decoplan");

pub use consumption::{BreathedInterval, GasUse};
pub use error::PlanError;
pub use gas::{gas_from_label, GasMix};
pub use gradient::GradientFactors;
pub use multigas::{plan_multi_gas, DecoGas, GasSelection, MultiGasPlan};
pub use oxtox::{ExposureSegment, OxygenToxicity};
pub use planner::{
    no_decompression_limit, plan_dive, DecompressionPlan, DecompressionStop, PlanOptions,
};
pub use pressure::Environment;
pub use tissue::TissueState;
