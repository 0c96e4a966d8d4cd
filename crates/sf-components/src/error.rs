//! Error types for process-unit calculations.

use sf_core::error::SfError;
use sf_gas::GasError;
use sf_solver::SolverError;
use thiserror::Error;

/// Errors raised while evaluating a process unit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// A stream cannot be used: zero or negative flow, or a composition the
    /// unit cannot handle.
    #[error("Invalid stream state: {what}")]
    InvalidStreamState { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The reformer shift polynomial has no root giving non-negative species.
    #[error("No physical root of the shift polynomial (Kp={kp:.6}): {what}")]
    NoPhysicalRoot { kp: f64, what: &'static str },

    #[error("Convergence exceeded in {what}: {iterations} iterations, residual {residual:e}")]
    ConvergenceExceeded {
        what: &'static str,
        iterations: usize,
        residual: f64,
    },

    /// The requested operating point cannot be reached.
    #[error("Infeasible operating point: {what}")]
    Infeasible { what: &'static str },

    #[error("Gas model error: {0}")]
    Gas(GasError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<GasError> for ComponentError {
    fn from(e: GasError) -> Self {
        match e {
            GasError::InvalidStream { what } | GasError::InvalidComposition { what } => {
                ComponentError::InvalidStreamState { what }
            }
            GasError::Solver(inner) => inner.into(),
            other => ComponentError::Gas(other),
        }
    }
}

impl From<SolverError> for ComponentError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ConvergenceExceeded {
                what,
                iterations,
                residual,
            } => ComponentError::ConvergenceExceeded {
                what,
                iterations,
                residual,
            },
            SolverError::NoBracket { .. } => ComponentError::Infeasible {
                what: "no root inside the search bracket",
            },
            SolverError::InvalidArg { what } => ComponentError::InvalidArg { what },
            other => ComponentError::Gas(GasError::Solver(other)),
        }
    }
}

impl From<ComponentError> for SfError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::InvalidArg { what } => SfError::InvalidArg { what },
            other => SfError::Upstream {
                context: "process unit",
                message: other.to_string(),
            },
        }
    }
}
