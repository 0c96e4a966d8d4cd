//! Recuperated micro gas-turbine cycles fired on stack exhaust.
//!
//! Two cycle descriptions are kept side by side. They rest on different
//! assumptions about which temperatures are known and are not meant to
//! agree:
//!
//! - [`CompressorSearch`] fixes the turbine inlet and both efficiencies and
//!   finds the compressor inlet temperature that makes the compressor
//!   efficiency come out at its target.
//! - [`FixedTemperatures`] fixes all four cycle temperatures and reports the
//!   turbine efficiency they imply.
//!
//! In both, the turbine stream is the compressor stream with its remaining
//! H₂, CO and CH₄ oxidised by its own O₂.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{check_fraction, check_positive};
use crate::turbomachinery::{Compressor, InletSearch, search_compressor_inlet};
use sf_core::units::{MassRate, Power, Pressure, Temperature, k, w};
use sf_gas::{Composition, GasState, GasStateModel};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct CompressorSearch {
    pub pressure_ratio: f64,
    pub turbine_inlet_temperature: Temperature,
    pub turbine_efficiency: f64,
    pub compressor_efficiency: f64,
    pub search: InletSearch,
}

impl Default for CompressorSearch {
    fn default() -> Self {
        Self {
            pressure_ratio: 4.8,
            turbine_inlet_temperature: k(1200.0),
            turbine_efficiency: 0.84,
            compressor_efficiency: 0.8,
            search: InletSearch::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FixedTemperatures {
    pub pressure_ratio: f64,
    pub compressor_outlet_temperature: Temperature,
    pub turbine_inlet_temperature: Temperature,
    pub turbine_outlet_temperature: Temperature,
}

impl Default for FixedTemperatures {
    fn default() -> Self {
        Self {
            pressure_ratio: 3.5,
            compressor_outlet_temperature: k(1173.15),
            turbine_inlet_temperature: k(1473.15),
            turbine_outlet_temperature: k(873.15),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MicroTurbineVariant {
    CompressorSearch(CompressorSearch),
    FixedTemperatures(FixedTemperatures),
}

impl MicroTurbineVariant {
    pub fn label(&self) -> &'static str {
        match self {
            MicroTurbineVariant::CompressorSearch(_) => "compressor-search",
            MicroTurbineVariant::FixedTemperatures(_) => "fixed-temperatures",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MicroTurbineResult {
    pub compressor_inlet_temperature: Temperature,
    pub compressor_outlet_temperature: Temperature,
    pub turbine_inlet_temperature: Temperature,
    pub turbine_outlet_temperature: Temperature,
    pub compressor_efficiency: f64,
    pub turbine_efficiency: f64,
    /// Work absorbed by the compressor (positive).
    pub compressor_work: Power,
    /// Work delivered by the turbine (positive).
    pub turbine_work: Power,
    pub net_work: Power,
    /// Net work over the supplied fuel energy rate. `None` without fuel energy.
    pub efficiency: Option<f64>,
    /// Composition through the turbine.
    pub turbine_composition: Composition,
}

#[derive(Clone, Debug)]
pub struct MicroTurbine {
    pub name: String,
    pub variant: MicroTurbineVariant,
}

impl MicroTurbine {
    pub fn new(name: impl Into<String>, variant: MicroTurbineVariant) -> ComponentResult<Self> {
        match &variant {
            MicroTurbineVariant::CompressorSearch(c) => {
                Compressor::new("check", c.pressure_ratio, c.compressor_efficiency)?;
                check_fraction(c.turbine_efficiency, "turbine efficiency must be in (0,1]")?;
            }
            MicroTurbineVariant::FixedTemperatures(f) => {
                check_positive(f.pressure_ratio - 1.0, "pressure ratio must exceed 1")?;
                if f.turbine_outlet_temperature >= f.turbine_inlet_temperature {
                    return Err(ComponentError::InvalidArg {
                        what: "turbine outlet must be cooler than its inlet",
                    });
                }
            }
        }
        Ok(Self {
            name: name.into(),
            variant,
        })
    }

    /// Run the cycle for a compressor stream of composition `comp` entering
    /// at `p_in` with mass flow `mdot`. `fuel_energy` is the fuel heat input
    /// the efficiency is referred to; the cycle still runs when it is zero.
    pub fn run(
        &self,
        model: &dyn GasStateModel,
        comp: &Composition,
        p_in: Pressure,
        mdot: MassRate,
        fuel_energy: Power,
    ) -> ComponentResult<MicroTurbineResult> {
        check_positive(mdot.value, "gas turbine mass flow must be positive")?;
        let turbine_comp = comp.oxidized().map_err(|_| ComponentError::Infeasible {
            what: "not enough oxygen to burn the turbine fuel",
        })?;

        let result = match &self.variant {
            MicroTurbineVariant::CompressorSearch(cycle) => {
                compressor_search(model, cycle, comp, turbine_comp, p_in, mdot, fuel_energy)?
            }
            MicroTurbineVariant::FixedTemperatures(cycle) => {
                fixed_temperatures(model, cycle, comp, turbine_comp, p_in, mdot, fuel_energy)?
            }
        };
        debug!(
            turbine = %self.name,
            variant = self.variant.label(),
            net_work = result.net_work.value,
            efficiency = ?result.efficiency,
            "micro turbine solved"
        );
        Ok(result)
    }
}

fn cycle_efficiency(net: f64, fuel_energy: Power) -> Option<f64> {
    (fuel_energy.value > 0.0)
        .then(|| net / fuel_energy.value)
        .filter(|eta| eta.is_finite())
}

fn state(p: Pressure, t: Temperature, comp: &Composition) -> ComponentResult<GasState> {
    Ok(GasState::from_pt(p, t, comp.clone())?)
}

fn compressor_search(
    model: &dyn GasStateModel,
    cycle: &CompressorSearch,
    comp: &Composition,
    turbine_comp: Composition,
    p_in: Pressure,
    mdot: MassRate,
    fuel_energy: Power,
) -> ComponentResult<MicroTurbineResult> {
    let p_out = p_in * cycle.pressure_ratio;
    let t_ti = cycle.turbine_inlet_temperature;
    let ti = state(p_out, t_ti, &turbine_comp)?;
    let h_ti = model.h(&ti)?;

    // turbine expansion back to the inlet pressure
    let t_to_s = model.state_from_entropy(model.s(&ti)?, p_in, &turbine_comp)?;
    let h_to_s = model.h(&state(p_in, t_to_s, &turbine_comp)?)?;
    let h_to = h_ti - cycle.turbine_efficiency * (h_ti - h_to_s);
    let t_to = model.state_from_enthalpy(h_to, p_in, &turbine_comp)?;
    let turbine_work = mdot.value * (h_ti - h_to);

    // the compressor delivers the turbine inlet enthalpy
    let t_co = model.state_from_enthalpy(h_ti, p_out, comp)?;
    let compressor = Compressor::new(
        "compressor",
        cycle.pressure_ratio,
        cycle.compressor_efficiency,
    )?;
    let found = search_compressor_inlet(model, &compressor, comp, p_in, h_ti, t_co, &cycle.search)?;
    let compressor_work = mdot.value * (h_ti - found.h_in);
    let net = turbine_work - compressor_work;

    Ok(MicroTurbineResult {
        compressor_inlet_temperature: found.t_in,
        compressor_outlet_temperature: t_co,
        turbine_inlet_temperature: t_ti,
        turbine_outlet_temperature: t_to,
        compressor_efficiency: found.efficiency,
        turbine_efficiency: cycle.turbine_efficiency,
        compressor_work: w(compressor_work),
        turbine_work: w(turbine_work),
        net_work: w(net),
        efficiency: cycle_efficiency(net, fuel_energy),
        turbine_composition: turbine_comp,
    })
}

fn fixed_temperatures(
    model: &dyn GasStateModel,
    cycle: &FixedTemperatures,
    comp: &Composition,
    turbine_comp: Composition,
    p_in: Pressure,
    mdot: MassRate,
    fuel_energy: Power,
) -> ComponentResult<MicroTurbineResult> {
    let p_out = p_in * cycle.pressure_ratio;
    let t_co = cycle.compressor_outlet_temperature;
    let co = model.properties_at(&state(p_out, t_co, comp)?)?;
    let kappa = co.gamma();
    let t_ci = k(t_co.value / cycle.pressure_ratio.powf((kappa - 1.0) / kappa));
    let h_ci = model.h(&state(p_in, t_ci, comp)?)?;
    let compressor_work = mdot.value * (co.h - h_ci);

    let ti = state(p_out, cycle.turbine_inlet_temperature, &turbine_comp)?;
    let h_ti = model.h(&ti)?;
    let h_to = model.h(&state(p_in, cycle.turbine_outlet_temperature, &turbine_comp)?)?;
    let turbine_work = mdot.value * (h_ti - h_to);

    let t_to_s = model.state_from_entropy(model.s(&ti)?, p_in, &turbine_comp)?;
    let h_to_s = model.h(&state(p_in, t_to_s, &turbine_comp)?)?;
    let turbine_efficiency = (h_ti - h_to) / (h_ti - h_to_s);
    if turbine_efficiency > 1.0 {
        warn!(
            turbine_efficiency,
            "fixed cycle temperatures imply a turbine efficiency above one"
        );
    }
    let compressor_s = model.state_from_entropy(
        model.s(&state(p_in, t_ci, comp)?)?,
        p_out,
        comp,
    )?;
    let h_co_s = model.h(&state(p_out, compressor_s, comp)?)?;
    let net = turbine_work - compressor_work;

    Ok(MicroTurbineResult {
        compressor_inlet_temperature: t_ci,
        compressor_outlet_temperature: t_co,
        turbine_inlet_temperature: cycle.turbine_inlet_temperature,
        turbine_outlet_temperature: cycle.turbine_outlet_temperature,
        compressor_efficiency: (h_co_s - h_ci) / (co.h - h_ci),
        turbine_efficiency,
        compressor_work: w(compressor_work),
        turbine_work: w(turbine_work),
        net_work: w(net),
        efficiency: cycle_efficiency(net, fuel_energy),
        turbine_composition: turbine_comp,
    })
}
