//! Error types for the sf-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// gives the CLI one error interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Case error: {0}")]
    Project(String),

    #[error("Failed to read thermo data: {path}")]
    ThermoDataRead { path: PathBuf, message: String },

    #[error("Case compilation failed: {0}")]
    Compile(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Gas model error: {0}")]
    Gas(String),

    #[error("{unit} failed: {message}")]
    Unit { unit: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Attach the failing unit's name to a component error.
    pub fn unit(unit: &str, err: sf_components::ComponentError) -> Self {
        AppError::Unit {
            unit: unit.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<sf_project::ProjectError> for AppError {
    fn from(err: sf_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<sf_solver::SolverError> for AppError {
    fn from(err: sf_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<sf_gas::GasError> for AppError {
    fn from(err: sf_gas::GasError) -> Self {
        AppError::Gas(err.to_string())
    }
}

impl From<sf_components::ComponentError> for AppError {
    fn from(err: sf_components::ComponentError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
