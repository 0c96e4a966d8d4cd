//! sf-gas: gas mixture thermodynamics for sofcflow.
//!
//! Provides:
//! - Species and element definitions for reformer, fuel-cell and combustion
//!   mixtures
//! - Dense mole-fraction compositions with mass/mole conversion and
//!   complete-oxidation bookkeeping
//! - Gas and stream states
//! - The `GasStateModel` trait with an ideal-gas NASA-polynomial backend
//! - Gibbs-minimisation chemical equilibrium at fixed T and P
//! - Lower heating values and parallel property sweeps
//!
//! # Example
//!
//! ```no_run
//! use sf_gas::{Composition, GasStateModel, IdealGasModel, Species, StateInput};
//! use sf_core::units::{k, pa};
//!
//! let model = IdealGasModel::default();
//! let comp = Composition::new_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.79)])
//!     .unwrap();
//! let state = model
//!     .state(StateInput::PT { p: pa(101325.0), t: k(300.0) }, comp)
//!     .unwrap();
//! let props = model.properties_at(&state).unwrap();
//! println!("cp = {:.1} J/(kg·K)", props.cp);
//! ```

pub mod composition;
pub mod equilibrium;
pub mod error;
pub mod heating_value;
pub mod ideal_gas;
pub mod model;
pub mod nasa;
pub mod species;
pub mod state;
pub mod sweep;

pub use composition::Composition;
pub use equilibrium::{EquilibriumConfig, EquilibriumResult, gibbs_equilibrium};
pub use error::{GasError, GasResult};
pub use heating_value::{HeatingValueMethod, lower_heating_value};
pub use ideal_gas::{IdealGasModel, InverseSolveConfig};
pub use model::{GasProperties, GasStateModel};
pub use nasa::{Nasa7, ThermoTable};
pub use species::{Element, Species};
pub use state::{GasState, SpecEnthalpy, SpecEntropy, SpecHeatCapacity, StateInput, StreamState};
pub use sweep::{SweepDefinition, SweepType, pressure_sweep, temperature_sweep};
