//! Error types for solver operations.

use sf_core::error::SfError;
use thiserror::Error;

/// Errors raised by the generic iteration and root-finding utilities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Convergence exceeded in {what}: {iterations} iterations, residual {residual:e}")]
    ConvergenceExceeded {
        what: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("Root not bracketed on [{lo}, {hi}]: f(lo)={f_lo:e}, f(hi)={f_hi:e}")]
    NoBracket {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite value in {what}")]
    NonFinite { what: &'static str },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for SfError {
    fn from(e: SolverError) -> Self {
        SfError::Upstream {
            context: "solver",
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SolverError::ConvergenceExceeded {
            what: "loop",
            iterations: 10,
            residual: 0.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("loop"));
        assert!(msg.contains("10 iterations"));
    }

    #[test]
    fn error_to_core_error() {
        let core: SfError = SolverError::InvalidArg { what: "bracket" }.into();
        assert!(matches!(core, SfError::Upstream { context: "solver", .. }));
    }
}
