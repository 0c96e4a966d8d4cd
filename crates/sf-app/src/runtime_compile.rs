//! Runtime compilation of a CaseDef into process units and streams.

use std::path::{Path, PathBuf};

use sf_components::{
    CompressorSearch, Fan, FanConfig, FixedTemperatures, FuelCellConfig, FuelCellStack,
    HeatExchanger, InletSearch, MicroTurbine, MicroTurbineVariant, Mixer, Reformer,
    ReformerModel, ShiftEquilibrium, steam_methane_feed,
};
use sf_core::units::{Temperature, k, kgps, m2, pa};
use sf_gas::{
    Composition, EquilibriumConfig, GasState, HeatingValueMethod, IdealGasModel,
    InverseSolveConfig, Species, StreamState, ThermoTable,
};
use sf_project::schema::{
    Basis, CaseDef, CompositionDef, FanDef, GasTurbineDef, ReformerModelDef, StackDef, StreamDef,
};
use sf_solver::{ConvergenceLoop, RootConfig};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Heat rejection stage after the recuperator.
#[derive(Debug, Clone)]
pub struct FanStage {
    pub fan: Fan,
    pub outlet_temperature: Temperature,
}

/// Runtime representation of a compiled case.
#[derive(Debug, Clone)]
pub struct PlantRuntime {
    pub name: String,
    pub feed: StreamState,
    pub reformer: Reformer,
    pub stack: FuelCellStack,
    pub cathode_air: StreamState,
    pub mixer: Mixer,
    pub recuperator: HeatExchanger,
    pub recuperator_effectiveness: f64,
    pub recuperator_cold_inlet: StreamState,
    pub fan: Option<FanStage>,
    pub gas_turbine: Option<MicroTurbine>,
}

/// Compile a validated case into runtime units.
pub fn compile_case(case: &CaseDef) -> AppResult<PlantRuntime> {
    let feed_def = &case.reformer.feed;
    let feed = steam_methane_feed(
        kgps(feed_def.methane_kg_s),
        kgps(feed_def.steam_kg_s),
        k(feed_def.temperature_k),
        pa(feed_def.pressure_pa),
    )?;

    let model = match case.reformer.model {
        ReformerModelDef::ShiftPolynomial { a, b } => {
            ReformerModel::ShiftPolynomial(ShiftEquilibrium { a, b })
        }
        ReformerModelDef::GibbsEquilibrium => ReformerModel::GibbsEquilibrium,
    };
    let reformer =
        Reformer::new("reformer", k(case.reformer.outlet_temperature_k)).with_model(model);

    let stack = FuelCellStack::new("stack", build_stack_config(&case.stack)?)?;
    let cathode_air = build_stream(&case.stack.cathode_air)?;

    let solver = ConvergenceLoop::new(case.solver.rel_tol, case.solver.max_iterations)?;
    let recuperator = HeatExchanger::new("recuperator").with_solver(solver);
    let recuperator_cold_inlet = build_stream(&case.recuperator.cold_inlet)?;

    let fan = if case.fan.enabled {
        Some(FanStage {
            fan: Fan::new("fan", build_fan_config(&case.fan))?,
            outlet_temperature: k(case.fan.outlet_temperature_k),
        })
    } else {
        None
    };

    let gas_turbine = case
        .gas_turbine
        .as_ref()
        .map(|gt| MicroTurbine::new("micro-turbine", build_turbine_variant(gt)))
        .transpose()?;

    debug!(
        case = %case.name,
        fan = fan.is_some(),
        gas_turbine = gas_turbine.is_some(),
        "case compiled"
    );

    Ok(PlantRuntime {
        name: case.name.clone(),
        feed,
        reformer,
        stack,
        cathode_air,
        mixer: Mixer::new("exhaust-mixer"),
        recuperator,
        recuperator_effectiveness: case.recuperator.effectiveness,
        recuperator_cold_inlet,
        fan,
        gas_turbine,
    })
}

/// Gas model for the case: the built-in table unless `thermo_data` names a
/// YAML table. Relative paths resolve against `base_dir`. The `solver`
/// section also bounds the model's inverse solves and equilibrium.
pub fn build_gas_model(case: &CaseDef, base_dir: Option<&Path>) -> AppResult<IdealGasModel> {
    let table = match &case.thermo_data {
        Some(data) => {
            let path = resolve_path(data, base_dir);
            let table = ThermoTable::from_yaml_file(&path).map_err(|e| {
                AppError::ThermoDataRead {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            debug!(path = %path.display(), "thermo table loaded");
            table
        }
        None => ThermoTable::gri30(),
    };
    let inverse = InverseSolveConfig {
        root: RootConfig {
            rel_tol: case.solver.rel_tol,
            f_tol: 0.0,
            max_iterations: case.solver.max_iterations,
        },
        ..InverseSolveConfig::default()
    };
    let equilibrium = EquilibriumConfig {
        max_iterations: case.solver.max_iterations,
        ..EquilibriumConfig::default()
    };
    Ok(IdealGasModel::new(table)
        .with_inverse_config(inverse)
        .with_equilibrium_config(equilibrium))
}

fn resolve_path(data: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(data);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

pub fn build_composition(def: &CompositionDef) -> AppResult<Composition> {
    let mut fractions = Vec::with_capacity(def.fractions.len());
    for (name, value) in &def.fractions {
        fractions.push((parse_species(name)?, *value));
    }
    let comp = match def.basis {
        Basis::Mole => Composition::new_mole_fractions(fractions)?,
        Basis::Mass => Composition::new_mass_fractions(fractions)?,
    };
    Ok(comp)
}

pub fn build_stream(def: &StreamDef) -> AppResult<StreamState> {
    let comp = build_composition(&def.composition)?;
    let state = GasState::from_pt(pa(def.pressure_pa), k(def.temperature_k), comp)?;
    Ok(StreamState::new(state, kgps(def.mass_flow_kg_s))?)
}

fn parse_species(name: &str) -> AppResult<Species> {
    name.parse()
        .map_err(|_| AppError::Compile(format!("Unknown species: {}", name)))
}

fn build_stack_config(def: &StackDef) -> AppResult<FuelCellConfig> {
    let lhv_method: HeatingValueMethod = def
        .lhv_method
        .parse()
        .map_err(|e: &str| AppError::Compile(format!("{}: {}", e, def.lhv_method)))?;
    Ok(FuelCellConfig {
        cells: def.cells,
        cell_area: m2(def.cell_area_m2),
        asr: def.asr_ohm_m2,
        dg_a: def.dg_a_j_per_mol,
        dg_b: def.dg_b_j_per_mol_k,
        v_floor: def.v_floor,
        target_utilization: def.target_utilization,
        utilization_tol: def.utilization_tol,
        max_iterations: def.max_iterations,
        temperature: def.temperature_k.map(k),
        lhv_method,
    })
}

fn build_fan_config(def: &FanDef) -> FanConfig {
    FanConfig {
        u: def.u_w_per_m2_k,
        area: m2(def.area_m2),
        ambient_temperature: k(def.ambient_temperature_k),
        ambient_pressure: pa(def.ambient_pressure_pa),
        efficiency: def.efficiency,
        pressure_rise: pa(def.pressure_rise_pa),
    }
}

fn build_turbine_variant(def: &GasTurbineDef) -> MicroTurbineVariant {
    match def {
        GasTurbineDef::CompressorSearch {
            pressure_ratio,
            turbine_inlet_temperature_k,
            turbine_efficiency,
            compressor_efficiency,
            search_t_min_k,
            search_step_k,
            refine,
        } => MicroTurbineVariant::CompressorSearch(CompressorSearch {
            pressure_ratio: *pressure_ratio,
            turbine_inlet_temperature: k(*turbine_inlet_temperature_k),
            turbine_efficiency: *turbine_efficiency,
            compressor_efficiency: *compressor_efficiency,
            search: InletSearch {
                t_min: *search_t_min_k,
                step: *search_step_k,
                refine: *refine,
                ..InletSearch::default()
            },
        }),
        GasTurbineDef::FixedTemperatures {
            pressure_ratio,
            compressor_outlet_temperature_k,
            turbine_inlet_temperature_k,
            turbine_outlet_temperature_k,
        } => MicroTurbineVariant::FixedTemperatures(FixedTemperatures {
            pressure_ratio: *pressure_ratio,
            compressor_outlet_temperature: k(*compressor_outlet_temperature_k),
            turbine_inlet_temperature: k(*turbine_inlet_temperature_k),
            turbine_outlet_temperature: k(*turbine_outlet_temperature_k),
        }),
    }
}
