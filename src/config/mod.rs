//! Configuration loading and types for the reconciliation engine.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BusinessConfig, CustomFineUnit, Defaults, EngineConfig, FineConfig, FineMethod, FinePayout,
    FineRule, FineScope, HalfDayConfig, ShiftConfig,
};
