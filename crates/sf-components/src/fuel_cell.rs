//! Solid oxide fuel-cell stack.
//!
//! ## Model
//!
//! ```text
//! ΔG(T) = a − b·T                               [J/mol]
//! E     = ΔG / 2F + (RT / 2F)·ln(p_H2 · p_O2^½ / p_H2O)
//! j     = (E − V) / ASR
//! I     = j · A_cell · cells
//! U     = I / (2F · ṅ_H2,eq),   ṅ_H2,eq = ṅ_H2 + ṅ_CO + 4·ṅ_CH4
//! ```
//!
//! Partial pressures are in atmospheres at the mean of the inlet and the
//! target-utilisation outlet compositions. The cell voltage is found by
//! bisection on `[v_floor, E]`. Fuel species are converted uniformly at the
//! achieved utilisation and the O₂ they take leaves the cathode stream. Both
//! outlets leave at the stack temperature.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{EnergyBalance, check_fraction, check_positive, stream_enthalpy};
use sf_core::units::constants::{FARADAY, ONE_ATM_PA, R_UNIVERSAL};
use sf_core::units::{Area, Power, Temperature, kgps, m2, w};
use sf_gas::{
    Composition, GasState, GasStateModel, HeatingValueMethod, Species, StreamState,
    lower_heating_value,
};
use sf_solver::{RootConfig, bisect};
use tracing::{debug, warn};

/// Stack parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FuelCellConfig {
    pub cells: u32,
    /// Active area per cell
    pub cell_area: Area,
    /// Area-specific resistance [Ω·m²]
    pub asr: f64,
    /// ΔG correlation constant [J/mol]
    pub dg_a: f64,
    /// ΔG correlation slope [J/(mol·K)]
    pub dg_b: f64,
    /// Lowest admissible cell voltage [V]
    pub v_floor: f64,
    pub target_utilization: f64,
    /// Accepted |U − U_target|
    pub utilization_tol: f64,
    pub max_iterations: usize,
    /// Stack temperature; the anode inlet temperature when unset.
    pub temperature: Option<Temperature>,
    pub lhv_method: HeatingValueMethod,
}

impl Default for FuelCellConfig {
    fn default() -> Self {
        Self {
            cells: 300,
            cell_area: m2(1.2),
            // 0.1 Ω·cm²
            asr: 1.0e-5,
            dg_a: 242_000.0,
            dg_b: 45.8,
            v_floor: 0.3,
            target_utilization: 0.75,
            utilization_tol: 0.01,
            max_iterations: 100,
            temperature: None,
            lhv_method: HeatingValueMethod::StoichiometricProducts,
        }
    }
}

impl FuelCellConfig {
    pub fn validate(&self) -> ComponentResult<()> {
        if self.cells == 0 {
            return Err(ComponentError::InvalidArg {
                what: "stack needs at least one cell",
            });
        }
        check_positive(self.cell_area.value, "cell area must be positive")?;
        check_positive(self.asr, "area-specific resistance must be positive")?;
        check_fraction(self.target_utilization, "target utilization must be in (0,1]")?;
        check_positive(self.utilization_tol, "utilization tolerance must be positive")?;
        if !self.v_floor.is_finite() || self.v_floor < 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "voltage floor must be non-negative",
            });
        }
        if !self.dg_a.is_finite() || !self.dg_b.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "Gibbs correlation must be finite",
            });
        }
        Ok(())
    }

    /// Total active area [m²].
    pub fn total_area(&self) -> f64 {
        self.cell_area.value * f64::from(self.cells)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuelCellResult {
    pub anode_outlet: StreamState,
    pub cathode_outlet: StreamState,
    pub stack_temperature: Temperature,
    /// Nernst open-circuit voltage [V]
    pub ocv: f64,
    /// Operating cell voltage [V]
    pub voltage: f64,
    /// Stack current [A]
    pub current: f64,
    /// [A/m²]
    pub current_density: f64,
    pub utilization: f64,
    pub power: Power,
    /// Heat to remove to hold both outlets at stack temperature.
    pub heat_released: Power,
    /// Electrical power over fuel LHV input. `None` when the heating value
    /// is not positive.
    pub efficiency: Option<f64>,
    /// LHV of the anode feed [J/kg]
    pub lhv: f64,
    pub iterations: usize,
}

impl FuelCellResult {
    /// Energy balance of the combined anode and cathode streams.
    pub fn balance(&self) -> EnergyBalance {
        EnergyBalance {
            heat: -self.heat_released,
            work: -self.power,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FuelCellStack {
    pub name: String,
    pub config: FuelCellConfig,
}

impl FuelCellStack {
    pub fn new(name: impl Into<String>, config: FuelCellConfig) -> ComponentResult<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
        })
    }

    /// Open-circuit voltage from the Gibbs correlation alone [V].
    pub fn standard_potential(&self, t: Temperature) -> f64 {
        (self.config.dg_a - self.config.dg_b * t.value) / (2.0 * FARADAY)
    }

    pub fn solve(
        &self,
        model: &dyn GasStateModel,
        anode_in: &StreamState,
        cathode_in: &StreamState,
    ) -> ComponentResult<FuelCellResult> {
        anode_in.require_flow()?;
        cathode_in.require_flow()?;
        let cfg = &self.config;
        let t_stack = cfg.temperature.unwrap_or(anode_in.temperature());

        let anode = anode_in.species_molar_flows();
        let cathode = cathode_in.species_molar_flows();
        // kmol/s
        let n_eq = anode[Species::H2.index()]
            + anode[Species::CO.index()]
            + 4.0 * anode[Species::CH4.index()];
        if n_eq <= 0.0 {
            return Err(ComponentError::InvalidStreamState {
                what: "anode stream carries no fuel",
            });
        }
        let o2_available = cathode[Species::O2.index()];
        if o2_available < 0.5 * cfg.target_utilization * n_eq {
            return Err(ComponentError::Infeasible {
                what: "insufficient oxygen for the target utilization",
            });
        }

        let ocv = self.nernst_potential(anode_in, cathode_in, t_stack)?;

        // current per volt of overpotential
        let siemens = cfg.total_area() / cfg.asr;
        let charge_rate = 2.0 * FARADAY * n_eq * 1000.0;
        let utilization_at = |v: f64| (ocv - v) * siemens / charge_rate;

        if ocv <= cfg.v_floor || utilization_at(cfg.v_floor) < cfg.target_utilization {
            return Err(ComponentError::Infeasible {
                what: "target utilization unreachable above the voltage floor",
            });
        }
        let root = bisect(
            |v| Ok::<_, ComponentError>(utilization_at(v) - cfg.target_utilization),
            cfg.v_floor,
            ocv,
            &RootConfig {
                rel_tol: 1e-12,
                f_tol: cfg.utilization_tol,
                max_iterations: cfg.max_iterations,
            },
        )?;
        let voltage = root.x;
        let utilization = utilization_at(voltage);
        let current_density = (ocv - voltage) / cfg.asr;
        let current = current_density * cfg.total_area();
        if 0.5 * utilization * n_eq > o2_available {
            return Err(ComponentError::Infeasible {
                what: "insufficient oxygen for the achieved utilization",
            });
        }

        let anode_outlet = convert_anode(anode_in, &anode, utilization, t_stack)?;
        let cathode_outlet =
            deplete_cathode(cathode_in, &cathode, 0.5 * utilization * n_eq, t_stack)?;

        let power = voltage * current;
        let h_in = anode_in.mass_flow().value * stream_enthalpy(model, anode_in)?
            + cathode_in.mass_flow().value * stream_enthalpy(model, cathode_in)?;
        let h_out = anode_outlet.mass_flow().value * stream_enthalpy(model, &anode_outlet)?
            + cathode_outlet.mass_flow().value * stream_enthalpy(model, &cathode_outlet)?;
        let heat_released = h_in - h_out - power;

        let lhv = lower_heating_value(model, anode_in.composition(), cfg.lhv_method)?;
        let efficiency = (lhv > 0.0)
            .then(|| power / (anode_in.mass_flow().value * lhv))
            .filter(|eta| eta.is_finite());
        match efficiency {
            None => warn!(stack = %self.name, lhv, "stack efficiency undefined for this LHV"),
            Some(eta) if eta > 1.0 => {
                warn!(stack = %self.name, efficiency = eta, lhv, "stack efficiency exceeds one")
            }
            Some(_) => {}
        }
        if heat_released < 0.0 {
            warn!(stack = %self.name, heat_released, "stack absorbs heat at this operating point");
        }
        debug!(
            stack = %self.name,
            ocv,
            voltage,
            current,
            utilization,
            iterations = root.iterations,
            "fuel cell stack solved"
        );

        Ok(FuelCellResult {
            anode_outlet,
            cathode_outlet,
            stack_temperature: t_stack,
            ocv,
            voltage,
            current,
            current_density,
            utilization,
            power: w(power),
            heat_released: w(heat_released),
            efficiency,
            lhv,
            iterations: root.iterations,
        })
    }

    /// Nernst voltage at the mean of the inlet and target-utilisation outlet
    /// compositions.
    fn nernst_potential(
        &self,
        anode_in: &StreamState,
        cathode_in: &StreamState,
        t: Temperature,
    ) -> ComponentResult<f64> {
        let u = self.config.target_utilization;
        let anode = anode_in.species_molar_flows();
        let cathode = cathode_in.species_molar_flows();
        let n_eq = anode[Species::H2.index()]
            + anode[Species::CO.index()]
            + 4.0 * anode[Species::CH4.index()];

        let anode_out = Composition::from_moles(&converted_moles(&anode, u))?;
        let cathode_out = Composition::from_moles(&depleted_moles(&cathode, 0.5 * u * n_eq))?;
        let mean = |a: &Composition, b: &Composition, s: Species| {
            0.5 * (a.mole_fraction(s) + b.mole_fraction(s))
        };
        let x_h2 = mean(anode_in.composition(), &anode_out, Species::H2);
        let x_h2o = mean(anode_in.composition(), &anode_out, Species::H2O);
        let x_o2 = mean(cathode_in.composition(), &cathode_out, Species::O2);
        if x_h2 <= 0.0 || x_h2o <= 0.0 || x_o2 <= 0.0 {
            return Err(ComponentError::InvalidStreamState {
                what: "Nernst potential needs H2 and H2O at the anode and O2 at the cathode",
            });
        }

        let p_anode = anode_in.pressure().value / ONE_ATM_PA;
        let p_cathode = cathode_in.pressure().value / ONE_ATM_PA;
        let ratio = (x_h2 * p_anode) * (x_o2 * p_cathode).sqrt() / (x_h2o * p_anode);
        let r_molar = R_UNIVERSAL / 1000.0;
        Ok(self.standard_potential(t) + r_molar * t.value / (2.0 * FARADAY) * ratio.ln())
    }
}

/// Anode molar flows after converting a fraction `u` of every fuel species.
fn converted_moles(n: &[f64; Species::COUNT], u: f64) -> [f64; Species::COUNT] {
    let mut out = *n;
    let h2 = n[Species::H2.index()];
    let co = n[Species::CO.index()];
    let ch4 = n[Species::CH4.index()];
    out[Species::H2.index()] = h2 * (1.0 - u);
    out[Species::CO.index()] = co * (1.0 - u);
    out[Species::CH4.index()] = ch4 * (1.0 - u);
    out[Species::H2O.index()] += u * (h2 + 2.0 * ch4);
    out[Species::CO2.index()] += u * (co + ch4);
    out
}

fn depleted_moles(n: &[f64; Species::COUNT], o2_used: f64) -> [f64; Species::COUNT] {
    let mut out = *n;
    out[Species::O2.index()] = (n[Species::O2.index()] - o2_used).max(0.0);
    out
}

fn stream_from_moles(
    like: &StreamState,
    moles: &[f64; Species::COUNT],
    t: Temperature,
) -> ComponentResult<StreamState> {
    let mdot: f64 = Species::ALL
        .iter()
        .map(|s| moles[s.index()] * s.molar_mass())
        .sum();
    let comp = Composition::from_moles(moles)?;
    Ok(StreamState::new(
        GasState::from_pt(like.pressure(), t, comp)?,
        kgps(mdot),
    )?)
}

fn convert_anode(
    anode_in: &StreamState,
    moles: &[f64; Species::COUNT],
    u: f64,
    t: Temperature,
) -> ComponentResult<StreamState> {
    stream_from_moles(anode_in, &converted_moles(moles, u), t)
}

fn deplete_cathode(
    cathode_in: &StreamState,
    moles: &[f64; Species::COUNT],
    o2_used: f64,
    t: Temperature,
) -> ComponentResult<StreamState> {
    stream_from_moles(cathode_in, &depleted_moles(moles, o2_used), t)
}
