//! sf-components: process units for SOFC power-plant models.
//!
//! Provides:
//! - Counterflow heat exchanger (rating and target-effectiveness modes)
//! - Steam-methane reformer (shift polynomial or Gibbs equilibrium)
//! - Compressor and turbine with isentropic efficiency, plus the
//!   compressor inlet-temperature search
//! - Adiabatic mixer, fuel-cell stack and air-cooled fan
//! - Micro gas-turbine cycles and cylinder charge initialisation
//!
//! Single-inlet units implement [`ProcessUnit`]. Every unit is a
//! deterministic function of its inlet streams and parameters and only
//! reads the shared [`GasStateModel`](sf_gas::GasStateModel).
//!
//! # Example
//!
//! ```no_run
//! use sf_components::{Reformer, steam_methane_feed};
//! use sf_core::units::{k, kgps, pa};
//! use sf_gas::IdealGasModel;
//!
//! let model = IdealGasModel::default();
//! let feed = steam_methane_feed(kgps(0.1), kgps(0.2), k(700.0), pa(101_325.0)).unwrap();
//! let result = Reformer::new("reformer", k(1100.0)).reform(&model, &feed).unwrap();
//! println!("outlet: {}", result.outlet.composition());
//! println!("heat: {:.1} kW", result.balance.heat.value / 1e3);
//! ```

pub mod cylinder;
pub mod error;
pub mod fan;
pub mod fuel_cell;
pub mod gas_turbine;
pub mod heat_exchanger;
pub mod mixer;
pub mod reformer;
pub mod traits;
pub mod turbomachinery;

pub use cylinder::{
    ChargeConditions, CylinderCharge, CylinderGeometry, hydrogen_air_intake, initialize_charge,
};
pub use error::{ComponentError, ComponentResult};
pub use fan::{Fan, FanConfig, FanResult};
pub use fuel_cell::{FuelCellConfig, FuelCellResult, FuelCellStack};
pub use gas_turbine::{
    CompressorSearch, FixedTemperatures, MicroTurbine, MicroTurbineResult, MicroTurbineVariant,
};
pub use heat_exchanger::{HeatExchanger, HeatExchangerResult, HotSideSpec};
pub use mixer::{Mixer, MixerResult, OutletPressure};
pub use reformer::{
    Reformer, ReformerModel, ReformerResult, ShiftEquilibrium, shift_extent, steam_methane_feed,
};
pub use traits::{EnergyBalance, ProcessUnit, UnitOutlet};
pub use turbomachinery::{
    Compressor, InletSearch, InletSearchResult, Turbine, search_compressor_inlet,
};
