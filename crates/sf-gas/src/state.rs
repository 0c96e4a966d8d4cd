//! Thermodynamic and stream state definitions.

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::species::Species;
use sf_core::units::{MassRate, Pressure, Temperature};

/// Specific enthalpy [J/kg], referenced to the elements at 298.15 K.
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Input specification for creating a thermodynamic state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateInput {
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Pressure and specific enthalpy.
    PH { p: Pressure, h: SpecEnthalpy },
    /// Pressure and specific entropy.
    PS { p: Pressure, s: SpecEntropy },
}

/// Pressure, temperature and composition of a gas.
///
/// Derived properties are computed on demand through
/// [`GasStateModel`](crate::model::GasStateModel).
#[derive(Debug, Clone, PartialEq)]
pub struct GasState {
    p: Pressure,
    t: Temperature,
    comp: Composition,
}

impl GasState {
    /// Validates that pressure and temperature are positive and finite.
    pub fn from_pt(p: Pressure, t: Temperature, comp: Composition) -> GasResult<Self> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(Self { p, t, comp })
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn composition(&self) -> &Composition {
        &self.comp
    }

    pub fn with_temperature(&self, t: Temperature) -> GasResult<Self> {
        Self::from_pt(self.p, t, self.comp.clone())
    }

    pub fn with_pressure(&self, p: Pressure) -> GasResult<Self> {
        Self::from_pt(p, self.t, self.comp.clone())
    }
}

/// A gas state carried by a mass flow.
///
/// The flow is non-negative and finite. Zero flow is representable; units
/// that divide by the flow reject it through [`StreamState::require_flow`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamState {
    state: GasState,
    mdot: MassRate,
}

impl StreamState {
    pub fn new(state: GasState, mdot: MassRate) -> GasResult<Self> {
        if !mdot.value.is_finite() {
            return Err(GasError::InvalidStream {
                what: "mass flow must be finite",
            });
        }
        if mdot.value < 0.0 {
            return Err(GasError::InvalidStream {
                what: "mass flow must be non-negative",
            });
        }
        Ok(Self { state, mdot })
    }

    pub fn state(&self) -> &GasState {
        &self.state
    }

    pub fn mass_flow(&self) -> MassRate {
        self.mdot
    }

    pub fn pressure(&self) -> Pressure {
        self.state.pressure()
    }

    pub fn temperature(&self) -> Temperature {
        self.state.temperature()
    }

    pub fn composition(&self) -> &Composition {
        self.state.composition()
    }

    /// Total molar flow [kmol/s].
    pub fn molar_flow(&self) -> f64 {
        self.mdot.value / self.composition().molar_mass()
    }

    /// Molar flow of every species [kmol/s] in [`Species::ALL`] order.
    pub fn species_molar_flows(&self) -> [f64; Species::COUNT] {
        let total = self.molar_flow();
        let mut flows = *self.composition().mole_fractions();
        for f in flows.iter_mut() {
            *f *= total;
        }
        flows
    }

    /// Rejects zero flow where a unit needs to divide by it.
    pub fn require_flow(&self) -> GasResult<()> {
        if self.mdot.value > 0.0 {
            Ok(())
        } else {
            Err(GasError::InvalidStream {
                what: "mass flow must be positive",
            })
        }
    }

    /// Same flow, new state.
    pub fn with_state(&self, state: GasState) -> Self {
        Self {
            state,
            mdot: self.mdot,
        }
    }
}
