//! Gas property errors.

use sf_core::SfError;
use sf_solver::SolverError;
use thiserror::Error;

/// Result type for gas-model operations.
pub type GasResult<T> = Result<T, GasError>;

/// Errors raised by gas property evaluation, inverse solves and equilibrium.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GasError {
    /// Non-physical values (negative pressure, temperature, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Composition violates its invariants (negative or mis-normalized fractions).
    #[error("Invalid composition: {what}")]
    InvalidComposition { what: &'static str },

    /// Stream-level invariant violated (negative or non-finite mass flow).
    #[error("Invalid stream: {what}")]
    InvalidStream { what: &'static str },

    /// Species or range not covered by the loaded thermodynamic data.
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Gibbs minimisation did not reach a converged composition.
    #[error("Equilibration failed: {reason} (iterations={iterations}, residual={residual:e})")]
    EquilibrationFailure {
        reason: &'static str,
        iterations: usize,
        residual: f64,
    },

    /// Temperature from (h, P) could not be found inside the bracket.
    #[error("Temperature solve failed for h={target} J/kg: {reason}")]
    TemperatureSolveFailure { target: f64, reason: String },

    /// Temperature from (s, P) could not be found inside the bracket.
    #[error("Entropy solve failed for s={target} J/(kg·K): {reason}")]
    EntropySolveFailure { target: f64, reason: String },

    /// Thermodynamic data file could not be read or parsed.
    #[error("Thermo data error: {message}")]
    Data { message: String },

    /// Failure inside a generic solver utility.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

impl From<SfError> for GasError {
    fn from(err: SfError) -> Self {
        match err {
            SfError::NonFinite { what, .. } => GasError::NonPhysical { what },
            SfError::InvalidArg { what } => GasError::InvalidArg { what },
            SfError::Invariant { what } => GasError::NonPhysical { what },
            SfError::Upstream { message, .. } => GasError::Data { message },
        }
    }
}

impl From<GasError> for SfError {
    fn from(err: GasError) -> Self {
        SfError::Upstream {
            context: "gas model",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GasError::NonPhysical { what: "pressure" };
        assert!(err.to_string().contains("pressure"));

        let err = GasError::TemperatureSolveFailure {
            target: -1.0e9,
            reason: "below bracket".into(),
        };
        assert!(err.to_string().contains("below bracket"));
    }

    #[test]
    fn core_error_round_trip() {
        let gas: GasError = SfError::NonFinite {
            what: "cp",
            value: f64::NAN,
        }
        .into();
        assert_eq!(gas, GasError::NonPhysical { what: "cp" });

        let core: SfError = GasError::NotSupported { what: "species" }.into();
        assert!(matches!(core, SfError::Upstream { context: "gas model", .. }));
    }
}
