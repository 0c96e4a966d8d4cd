//! Ideal-gas mixture model over NASA polynomial data.

use tracing::{debug, trace};

use crate::composition::Composition;
use crate::equilibrium::{EquilibriumConfig, gibbs_equilibrium};
use crate::error::{GasError, GasResult};
use crate::model::{GasProperties, GasStateModel, validation};
use crate::nasa::ThermoTable;
use crate::species::Species;
use crate::state::{GasState, SpecEnthalpy, SpecEntropy};
use sf_core::units::constants::{ONE_ATM_PA, R_UNIVERSAL};
use sf_core::units::{Pressure, Temperature, k, kgpm3};
use sf_solver::{RootConfig, newton_bracketed};

/// Temperature bracket and stopping rules for the (h, P) and (s, P) solves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InverseSolveConfig {
    pub t_min: f64,
    pub t_max: f64,
    pub root: RootConfig,
}

impl Default for InverseSolveConfig {
    fn default() -> Self {
        Self {
            t_min: 200.0,
            t_max: 3500.0,
            root: RootConfig {
                rel_tol: 1e-6,
                f_tol: 0.0,
                max_iterations: 200,
            },
        }
    }
}

/// Thermally perfect mixture of ideal gases.
///
/// Mixture entropy includes the ideal mixing term; enthalpy and heat
/// capacity are mole-fraction averages.
#[derive(Clone, Debug)]
pub struct IdealGasModel {
    table: ThermoTable,
    inverse: InverseSolveConfig,
    equilibrium: EquilibriumConfig,
}

impl Default for IdealGasModel {
    fn default() -> Self {
        Self::new(ThermoTable::gri30())
    }
}

/// Molar sums over the mixture, all dimensionless.
struct MolarSums {
    cp_r: f64,
    h_rt: f64,
    s_r: f64,
}

impl IdealGasModel {
    pub fn new(table: ThermoTable) -> Self {
        Self {
            table,
            inverse: InverseSolveConfig::default(),
            equilibrium: EquilibriumConfig::default(),
        }
    }

    pub fn with_inverse_config(mut self, cfg: InverseSolveConfig) -> Self {
        self.inverse = cfg;
        self
    }

    pub fn with_equilibrium_config(mut self, cfg: EquilibriumConfig) -> Self {
        self.equilibrium = cfg;
        self
    }

    pub fn table(&self) -> &ThermoTable {
        &self.table
    }

    fn require_supported(&self, comp: &Composition) -> GasResult<()> {
        if self.supports_composition(comp) {
            Ok(())
        } else {
            Err(GasError::NotSupported {
                what: "composition contains species without thermodynamic data",
            })
        }
    }

    /// `p` may be `None` when only cp and h are needed.
    fn sums(&self, t: f64, p: Option<f64>, comp: &Composition) -> GasResult<MolarSums> {
        let mut sums = MolarSums {
            cp_r: 0.0,
            h_rt: 0.0,
            s_r: 0.0,
        };
        for (species, x) in comp.iter() {
            let poly = self.table.require(species)?;
            sums.cp_r += x * poly.cp_r(t);
            sums.h_rt += x * poly.h_rt(t);
            if let Some(p) = p {
                sums.s_r += x * (poly.s_r(t) - (x * p / ONE_ATM_PA).ln());
            }
        }
        Ok(sums)
    }

    /// Specific enthalpy [J/kg] and cp [J/(kg·K)] at temperature `t`.
    fn h_cp(&self, t: f64, comp: &Composition) -> GasResult<(f64, f64)> {
        let r_s = R_UNIVERSAL / comp.molar_mass();
        let sums = self.sums(t, None, comp)?;
        Ok((sums.h_rt * r_s * t, sums.cp_r * r_s))
    }

    /// Specific entropy [J/(kg·K)] and cp [J/(kg·K)] at (t, p).
    fn s_cp(&self, t: f64, p: f64, comp: &Composition) -> GasResult<(f64, f64)> {
        let r_s = R_UNIVERSAL / comp.molar_mass();
        let sums = self.sums(t, Some(p), comp)?;
        Ok((sums.s_r * r_s, sums.cp_r * r_s))
    }

    /// Standard-state g°/RT of every species with data at `t`.
    pub fn gibbs_rt(&self, t: f64) -> [Option<f64>; Species::COUNT] {
        let mut g = [None; Species::COUNT];
        for species in Species::ALL {
            g[species.index()] = self.table.get(species).map(|poly| poly.g_rt(t));
        }
        g
    }

    /// Solve `value(T) = target` for T on the configured bracket.
    ///
    /// `eval` returns the property and its temperature derivative. Failures
    /// are reported through `fail`, which builds the contextual error.
    fn invert<F, W>(&self, target: f64, eval: F, fail: W) -> GasResult<Temperature>
    where
        F: Fn(f64) -> GasResult<(f64, f64)>,
        W: Fn(String) -> GasError,
    {
        let InverseSolveConfig { t_min, t_max, root } = self.inverse;
        let (v_lo, _) = eval(t_min)?;
        let (v_hi, _) = eval(t_max)?;
        if target < v_lo || target > v_hi {
            return Err(fail(format!(
                "target outside the achievable range [{v_lo:.6e}, {v_hi:.6e}] on {t_min}-{t_max} K"
            )));
        }

        // linear interpolation across the bracket
        let x0 = t_min + (target - v_lo) / (v_hi - v_lo) * (t_max - t_min);
        let solved = newton_bracketed::<_, GasError>(
            |t| {
                let (v, dv) = eval(t)?;
                Ok((v - target, dv))
            },
            t_min,
            t_max,
            Some(x0),
            &root,
        );
        match solved {
            Ok(found) => {
                trace!(t = found.x, iterations = found.iterations, "inverse solve");
                Ok(k(found.x))
            }
            Err(GasError::Solver(e)) => Err(fail(e.to_string())),
            Err(other) => Err(other),
        }
    }
}

impl GasStateModel for IdealGasModel {
    fn name(&self) -> &str {
        "ideal-gas (NASA-7)"
    }

    fn supports_composition(&self, comp: &Composition) -> bool {
        comp.iter().all(|(s, _)| self.table.contains(s))
    }

    fn properties_at(&self, state: &GasState) -> GasResult<GasProperties> {
        let p = state.pressure();
        let t = state.temperature();
        validation::validate_pressure(p)?;
        validation::validate_temperature(t)?;
        let comp = state.composition();
        self.require_supported(comp)?;

        let molar_mass = comp.molar_mass();
        let r_s = R_UNIVERSAL / molar_mass;
        let sums = self.sums(t.value, Some(p.value), comp)?;

        let cp = sums.cp_r * r_s;
        let h = sums.h_rt * r_s * t.value;
        let s = sums.s_r * r_s;
        let cv = cp - r_s;
        let rho = kgpm3(p.value / (r_s * t.value));
        let u = h - r_s * t.value;

        validation::validate_cp(cp)?;
        validation::validate_cp(cv)?;
        validation::validate_finite(h, "enthalpy must be finite")?;
        validation::validate_finite(s, "entropy must be finite")?;
        validation::validate_density(rho)?;

        Ok(GasProperties {
            p,
            t,
            h,
            s,
            cp,
            cv,
            rho,
            u,
            molar_mass,
        })
    }

    fn equilibrate(
        &self,
        t: Temperature,
        p: Pressure,
        comp: &Composition,
    ) -> GasResult<Composition> {
        self.require_supported(comp)?;
        let g_rt = if t.value.is_finite() && t.value > 0.0 {
            self.gibbs_rt(t.value)
        } else {
            [None; Species::COUNT]
        };
        let result = gibbs_equilibrium(&g_rt, t.value, p.value, comp, &self.equilibrium)?;
        debug!(
            t = t.value,
            p = p.value,
            iterations = result.iterations,
            "equilibrium composition"
        );
        Ok(result.composition)
    }

    fn state_from_enthalpy(
        &self,
        h: SpecEnthalpy,
        p: Pressure,
        comp: &Composition,
    ) -> GasResult<Temperature> {
        validation::validate_pressure(p)?;
        validation::validate_finite(h, "target enthalpy must be finite")?;
        self.require_supported(comp)?;
        self.invert(
            h,
            |t| self.h_cp(t, comp),
            |reason| GasError::TemperatureSolveFailure { target: h, reason },
        )
    }

    fn state_from_entropy(
        &self,
        s: SpecEntropy,
        p: Pressure,
        comp: &Composition,
    ) -> GasResult<Temperature> {
        validation::validate_pressure(p)?;
        validation::validate_finite(s, "target entropy must be finite")?;
        self.require_supported(comp)?;
        self.invert(
            s,
            |t| {
                let (s, cp) = self.s_cp(t, p.value, comp)?;
                Ok((s, cp / t))
            },
            |reason| GasError::EntropySolveFailure { target: s, reason },
        )
    }
}
