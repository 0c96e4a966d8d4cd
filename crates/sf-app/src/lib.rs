//! Shared application service layer for sofcflow.
//!
//! This crate sits between the case files and the command line front end:
//! it loads and validates cases, compiles them into process units, runs
//! the plant and collects a serializable report.

pub mod error;
pub mod project_service;
pub mod report;
pub mod run_service;
pub mod runtime_compile;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use project_service::{CaseSummary, load_case, save_case, summarize, validate_case};
pub use report::{
    FanRecord, GasTurbineRecord, PlantReport, RecuperatorRecord, ReformerRecord, StackRecord,
    StreamRecord, UnitRecord,
};
pub use run_service::{run_case, run_case_file, run_plant};
pub use runtime_compile::{
    FanStage, PlantRuntime, build_composition, build_gas_model, build_stream, compile_case,
};
