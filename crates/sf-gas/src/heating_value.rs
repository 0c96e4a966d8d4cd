//! Lower heating value of a fuel mixture.
//!
//! The LHV is the enthalpy released when the fuel is oxidised with water
//! leaving as vapour, reported per kilogram of the fuel mixture as given.
//! Three strategies are offered; they agree for premixed stoichiometric
//! feeds but differ for fuels that carry no oxidiser of their own.

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::model::GasStateModel;
use crate::species::Species;
use crate::state::GasState;
use sf_core::units::constants::{ONE_ATM_PA, T_REF_K};
use sf_core::units::{k, pa};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeatingValueMethod {
    /// Equilibrate the fuel alone at 298.15 K and 1 atm. Only releases
    /// heat if the fuel carries its own oxidiser.
    PureFuelEquilibrium,
    /// Add `oxygen_per_fuel` moles of O₂ per mole of fuel and equilibrate
    /// at 300 K and 1 atm.
    ExcessOxidizer { oxygen_per_fuel: f64 },
    /// Complete oxidation to CO₂ and H₂O with just enough O₂, at 298.15 K.
    StoichiometricProducts,
}

impl Default for HeatingValueMethod {
    fn default() -> Self {
        HeatingValueMethod::StoichiometricProducts
    }
}

impl HeatingValueMethod {
    pub const EXCESS_OXYGEN_DEFAULT: f64 = 1000.0;
    const EXCESS_OXIDIZER_T: f64 = 300.0;

    pub fn label(&self) -> &'static str {
        match self {
            HeatingValueMethod::PureFuelEquilibrium => "pure-fuel-equilibrium",
            HeatingValueMethod::ExcessOxidizer { .. } => "excess-oxidizer",
            HeatingValueMethod::StoichiometricProducts => "stoichiometric-products",
        }
    }
}

impl std::str::FromStr for HeatingValueMethod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pure-fuel-equilibrium" | "pure" => Ok(HeatingValueMethod::PureFuelEquilibrium),
            "excess-oxidizer" | "excess" => Ok(HeatingValueMethod::ExcessOxidizer {
                oxygen_per_fuel: Self::EXCESS_OXYGEN_DEFAULT,
            }),
            "stoichiometric-products" | "stoichiometric" => {
                Ok(HeatingValueMethod::StoichiometricProducts)
            }
            _ => Err("unknown heating value method"),
        }
    }
}

/// Reactant-minus-product enthalpy per kg of mixture at (t, 1 atm).
fn release_per_kg(
    model: &dyn GasStateModel,
    t: f64,
    reactants: &Composition,
    products: &Composition,
) -> GasResult<f64> {
    let h_r = model.h(&GasState::from_pt(pa(ONE_ATM_PA), k(t), reactants.clone())?)?;
    let h_p = model.h(&GasState::from_pt(pa(ONE_ATM_PA), k(t), products.clone())?)?;
    Ok(h_r - h_p)
}

/// Mass of fuel per kg of fuel + `o2_moles` of O₂ per mole of fuel.
fn fuel_mass_fraction(fuel: &Composition, o2_moles: f64) -> f64 {
    let m_fuel = fuel.molar_mass();
    m_fuel / (m_fuel + o2_moles * Species::O2.molar_mass())
}

/// Lower heating value [J/kg of fuel mixture].
pub fn lower_heating_value(
    model: &dyn GasStateModel,
    fuel: &Composition,
    method: HeatingValueMethod,
) -> GasResult<f64> {
    let oxygen = Composition::pure(Species::O2);
    match method {
        HeatingValueMethod::PureFuelEquilibrium => {
            let products = model.equilibrate(k(T_REF_K), pa(ONE_ATM_PA), fuel)?;
            release_per_kg(model, T_REF_K, fuel, &products)
        }
        HeatingValueMethod::ExcessOxidizer { oxygen_per_fuel } => {
            if !oxygen_per_fuel.is_finite() || oxygen_per_fuel <= 0.0 {
                return Err(GasError::InvalidArg {
                    what: "oxygen per mole of fuel must be positive",
                });
            }
            let t = HeatingValueMethod::EXCESS_OXIDIZER_T;
            let reactants = Composition::blend_molar(&[(fuel, 1.0), (&oxygen, oxygen_per_fuel)])?;
            let products = model.equilibrate(k(t), pa(ONE_ATM_PA), &reactants)?;
            let per_kg_mix = release_per_kg(model, t, &reactants, &products)?;
            Ok(per_kg_mix / fuel_mass_fraction(fuel, oxygen_per_fuel))
        }
        HeatingValueMethod::StoichiometricProducts => {
            let needed = 0.5 * fuel.oxygen_demand() - fuel.mole_fraction(Species::O2);
            let extra = needed.max(0.0);
            let reactants = Composition::blend_molar(&[(fuel, 1.0), (&oxygen, extra)])?;
            let products = reactants.oxidized()?;
            let per_kg_mix = release_per_kg(model, T_REF_K, &reactants, &products)?;
            Ok(per_kg_mix / fuel_mass_fraction(fuel, extra))
        }
    }
}
