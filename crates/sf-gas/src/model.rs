//! Gas property model trait and validation helpers.

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::state::{GasState, SpecEnthalpy, SpecEntropy, SpecHeatCapacity, StateInput};
use sf_core::units::{Density, Pressure, Temperature};

/// Every property of one state, computed in a single model call.
#[derive(Clone, Debug, PartialEq)]
pub struct GasProperties {
    /// Pressure [Pa]
    pub p: Pressure,
    /// Temperature [K]
    pub t: Temperature,
    /// Specific enthalpy [J/kg]
    pub h: SpecEnthalpy,
    /// Specific entropy [J/(kg·K)]
    pub s: SpecEntropy,
    /// Specific heat at constant pressure [J/(kg·K)]
    pub cp: SpecHeatCapacity,
    /// Specific heat at constant volume [J/(kg·K)]
    pub cv: SpecHeatCapacity,
    /// Density [kg/m³]
    pub rho: Density,
    /// Specific internal energy [J/kg]
    pub u: f64,
    /// Mixture molar mass [kg/kmol]
    pub molar_mass: f64,
}

impl GasProperties {
    /// Heat capacity ratio γ = cp/cv.
    pub fn gamma(&self) -> f64 {
        self.cp / self.cv
    }

    pub fn summary(&self) -> String {
        format!(
            "Props(P={:.0}Pa,T={:.1}K,h={:.1}J/kg,s={:.2}J/kg·K,cp={:.2}J/kg·K,ρ={:.4}kg/m³,M={:.3})",
            self.p.value, self.t.value, self.h, self.s, self.cp, self.rho.value, self.molar_mass
        )
    }
}

/// Thermodynamic property provider for gas mixtures.
///
/// Implementations must be thread-safe (Send + Sync) so sweeps and scans can
/// query them in parallel.
pub trait GasStateModel: Send + Sync {
    /// Model name (for logging).
    fn name(&self) -> &str;

    /// Whether every species in `comp` has thermodynamic data.
    fn supports_composition(&self, comp: &Composition) -> bool;

    /// h, s, cp, cv, ρ and u at a (P, T, x) state.
    fn properties_at(&self, state: &GasState) -> GasResult<GasProperties>;

    /// Chemical-equilibrium composition at fixed T and P, conserving the
    /// element amounts of `comp`.
    fn equilibrate(&self, t: Temperature, p: Pressure, comp: &Composition)
    -> GasResult<Composition>;

    /// Temperature at which the mixture has specific enthalpy `h` at `p`.
    fn state_from_enthalpy(
        &self,
        h: SpecEnthalpy,
        p: Pressure,
        comp: &Composition,
    ) -> GasResult<Temperature>;

    /// Temperature at which the mixture has specific entropy `s` at `p`.
    fn state_from_entropy(
        &self,
        s: SpecEntropy,
        p: Pressure,
        comp: &Composition,
    ) -> GasResult<Temperature>;

    fn h(&self, state: &GasState) -> GasResult<SpecEnthalpy> {
        Ok(self.properties_at(state)?.h)
    }

    fn s(&self, state: &GasState) -> GasResult<SpecEntropy> {
        Ok(self.properties_at(state)?.s)
    }

    fn cp(&self, state: &GasState) -> GasResult<SpecHeatCapacity> {
        Ok(self.properties_at(state)?.cp)
    }

    /// Build a state from any supported input pair.
    ///
    /// PT input is validated directly; PH and PS solve for temperature.
    fn state(&self, input: StateInput, comp: Composition) -> GasResult<GasState> {
        match input {
            StateInput::PT { p, t } => GasState::from_pt(p, t, comp),
            StateInput::PH { p, h } => {
                validation::validate_pressure(p)?;
                let t = self.state_from_enthalpy(h, p, &comp)?;
                GasState::from_pt(p, t, comp)
            }
            StateInput::PS { p, s } => {
                validation::validate_pressure(p)?;
                let t = self.state_from_entropy(s, p, &comp)?;
                GasState::from_pt(p, t, comp)
            }
        }
    }
}

/// Validation helpers for gas properties.
pub mod validation {
    use super::*;

    pub fn validate_pressure(p: Pressure) -> GasResult<()> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn validate_temperature(t: Temperature) -> GasResult<()> {
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn validate_density(rho: Density) -> GasResult<()> {
        if !rho.value.is_finite() || rho.value <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn validate_cp(cp: f64) -> GasResult<()> {
        if !cp.is_finite() || cp <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }
        Ok(())
    }

    /// Enthalpy and entropy may be negative but must be finite.
    pub fn validate_finite(v: f64, what: &'static str) -> GasResult<()> {
        sf_core::numeric::ensure_finite(v, what)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;
    use sf_core::units::{k, kgpm3, pa};

    #[test]
    fn validate_positive_pressure() {
        assert!(validate_pressure(pa(101325.0)).is_ok());
        assert!(validate_pressure(pa(-100.0)).is_err());
        assert!(validate_pressure(pa(0.0)).is_err());
        assert!(validate_pressure(pa(f64::NAN)).is_err());
    }

    #[test]
    fn validate_positive_temperature() {
        assert!(validate_temperature(k(300.0)).is_ok());
        assert!(validate_temperature(k(-10.0)).is_err());
        assert!(validate_temperature(k(0.0)).is_err());
    }

    #[test]
    fn validate_density_and_cp() {
        assert!(validate_density(kgpm3(1.2)).is_ok());
        assert!(validate_density(kgpm3(0.0)).is_err());
        assert!(validate_cp(1000.0).is_ok());
        assert!(validate_cp(-1.0).is_err());
        assert!(validate_finite(-3.0e6, "h").is_ok());
        assert!(validate_finite(f64::INFINITY, "h").is_err());
    }

    #[test]
    fn gamma_from_properties() {
        let props = GasProperties {
            p: pa(101325.0),
            t: k(300.0),
            h: 0.0,
            s: 0.0,
            cp: 1005.0,
            cv: 718.0,
            rho: kgpm3(1.18),
            u: 0.0,
            molar_mass: 28.96,
        };
        assert!((props.gamma() - 1.3997).abs() < 1e-3);
        assert!(props.summary().contains("T=300.0K"));
    }
}
