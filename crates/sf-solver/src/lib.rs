//! Numerical building blocks shared by the gas model and the process units.
//!
//! Everything here is generic over the caller's error type: closures return
//! `Result<_, E>` and solver failures are converted into `E` through
//! `From<SolverError>`, so a gas-property failure inside an update function
//! reaches the caller unchanged.

pub mod convergence;
pub mod error;
pub mod linear;
pub mod root;
pub mod scan;

pub use convergence::{ConvergenceLoop, ConvergenceResult, Step};
pub use error::{SolverError, SolverResult};
pub use linear::solve_truncated;
pub use root::{Root, RootConfig, bisect, newton_bracketed};
pub use scan::{
    MAX_SCAN_POINTS, ScanMinimum, ScanRange, golden_section, par_scan_minimize, scan_minimize,
};
