//! Plant run execution.
//!
//! The plant is evaluated once, front to back:
//!
//! 1. reformer on the methane/steam feed
//! 2. fuel-cell stack with the reformate on the anode
//! 3. anode and cathode exhaust mixed
//! 4. recuperator at fixed effectiveness preheating ambient air
//! 5. fan cooling what the recuperator leaves (skipped if nothing is left)
//! 6. micro gas turbine on the mixed exhaust, when configured
//!
//! A failing unit stops the run; its error names the unit.

use std::path::Path;
use std::time::Instant;

use sf_components::{FuelCellResult, MicroTurbineVariant};
use sf_core::units::w;
use sf_gas::GasStateModel;
use sf_project::schema::CaseDef;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::project_service;
use crate::report::{
    FanRecord, GasTurbineRecord, PlantReport, RecuperatorRecord, ReformerRecord, StackRecord,
    StreamRecord, UnitRecord,
};
use crate::runtime_compile::{self, PlantRuntime};

/// Load, compile and run the case at `path`. Relative `thermo_data`
/// paths resolve against the case file's directory.
pub fn run_case_file(path: &Path) -> AppResult<PlantReport> {
    let case = project_service::load_case(path)?;
    run_case(&case, path.parent())
}

/// Compile and run an already validated case.
pub fn run_case(case: &CaseDef, base_dir: Option<&Path>) -> AppResult<PlantReport> {
    let started = Instant::now();
    let model = runtime_compile::build_gas_model(case, base_dir)?;
    let runtime = runtime_compile::compile_case(case)?;
    let mut report = run_plant(&model, &runtime)?;
    report.elapsed_s = started.elapsed().as_secs_f64();
    info!(
        case = %case.name,
        net_power_w = report.net_power_w,
        elapsed_s = report.elapsed_s,
        "plant run complete"
    );
    Ok(report)
}

/// Run the compiled plant against `model`.
pub fn run_plant(model: &dyn GasStateModel, plant: &PlantRuntime) -> AppResult<PlantReport> {
    let mut diagnostics = Vec::new();
    let mut streams = vec![StreamRecord::from_stream("feed", &plant.feed)];
    let mut units = Vec::new();

    let reformer = &plant.reformer;
    let reformed = reformer
        .reform(model, &plant.feed)
        .map_err(|e| AppError::unit(&reformer.name, e))?;
    if reformed.residual > reformer.residual_warning {
        diagnostics.push(format!(
            "reformer residual {:.3e} exceeds {:.1e}",
            reformed.residual, reformer.residual_warning
        ));
    }
    streams.push(StreamRecord::from_stream("reformate", &reformed.outlet));
    units.push(UnitRecord::from_balance(&reformer.name, reformed.balance));

    streams.push(StreamRecord::from_stream("cathode-in", &plant.cathode_air));
    let stack = plant
        .stack
        .solve(model, &reformed.outlet, &plant.cathode_air)
        .map_err(|e| AppError::unit(&plant.stack.name, e))?;
    streams.push(StreamRecord::from_stream("anode-out", &stack.anode_outlet));
    streams.push(StreamRecord::from_stream("cathode-out", &stack.cathode_outlet));
    units.push(UnitRecord::from_balance(&plant.stack.name, stack.balance()));

    let fuel_input = stack.lhv * reformed.outlet.mass_flow().value;
    if fuel_input <= 0.0 {
        diagnostics.push(format!(
            "anode feed LHV is {:.3e} J/kg under {}; efficiencies are undefined",
            stack.lhv,
            plant.stack.config.lhv_method.label()
        ));
    }
    diagnostics.extend(efficiency_above_one("stack", stack.efficiency));

    let mixed = plant
        .mixer
        .mix(model, &[stack.anode_outlet.clone(), stack.cathode_outlet.clone()])
        .map_err(|e| AppError::unit(&plant.mixer.name, e))?;
    streams.push(StreamRecord::from_stream("exhaust", &mixed.outlet));

    let recuperator = &plant.recuperator;
    let recuperated = recuperator
        .solve_for_effectiveness(
            model,
            &mixed.outlet,
            &plant.recuperator_cold_inlet,
            plant.recuperator_effectiveness,
        )
        .map_err(|e| AppError::unit(&recuperator.name, e))?;
    if recuperated.duty.value < 0.0 {
        diagnostics.push("recuperator cold inlet is hotter than the exhaust".to_string());
    }
    streams.push(StreamRecord::from_stream(
        "preheat-air-in",
        &plant.recuperator_cold_inlet,
    ));
    streams.push(StreamRecord::from_stream(
        "preheat-air-out",
        &recuperated.cold_outlet,
    ));
    streams.push(StreamRecord::from_stream(
        "recuperator-hot-out",
        &recuperated.hot_outlet,
    ));
    units.push(UnitRecord::from_balance(
        &format!("{} (hot)", recuperator.name),
        recuperated.hot_balance,
    ));
    units.push(UnitRecord::from_balance(
        &format!("{} (cold)", recuperator.name),
        recuperated.cold_balance,
    ));

    let fan = match &plant.fan {
        Some(stage) if recuperated.hot_outlet.temperature() > stage.outlet_temperature => {
            let cooled = stage
                .fan
                .reject(model, &recuperated.hot_outlet, stage.outlet_temperature)
                .map_err(|e| AppError::unit(&stage.fan.name, e))?;
            streams.push(StreamRecord::from_stream("stack-out", &cooled.hot_outlet));
            units.push(UnitRecord {
                name: stage.fan.name.clone(),
                heat_w: cooled.balance.heat.value,
                work_w: cooled.power.value,
            });
            Some(FanRecord {
                duty_w: cooled.duty.value,
                air_outlet_temperature_k: cooled.air_outlet_temperature.value,
                lmtd_k: cooled.lmtd,
                air_mass_flow_kg_s: cooled.air_mass_flow.value,
                power_w: cooled.power.value,
            })
        }
        Some(stage) => {
            diagnostics.push(format!(
                "fan skipped: recuperator outlet at {:.1} K is not above {:.1} K",
                recuperated.hot_outlet.temperature().value,
                stage.outlet_temperature.value
            ));
            None
        }
        None => None,
    };

    let gas_turbine = match &plant.gas_turbine {
        Some(turbine) => {
            let cycle = turbine
                .run(
                    model,
                    mixed.outlet.composition(),
                    mixed.outlet.pressure(),
                    mixed.outlet.mass_flow(),
                    w(fuel_input),
                )
                .map_err(|e| AppError::unit(&turbine.name, e))?;
            if cycle.efficiency.is_none() {
                diagnostics.push(format!(
                    "gas turbine efficiency undefined for a fuel input of {fuel_input:.3e} W"
                ));
            }
            if matches!(turbine.variant, MicroTurbineVariant::FixedTemperatures(_))
                && cycle.turbine_efficiency > 1.0
            {
                diagnostics.push(format!(
                    "fixed cycle temperatures imply a turbine efficiency of {:.3}",
                    cycle.turbine_efficiency
                ));
            }
            Some(GasTurbineRecord {
                variant: turbine.variant.label().to_string(),
                compressor_inlet_temperature_k: cycle.compressor_inlet_temperature.value,
                compressor_outlet_temperature_k: cycle.compressor_outlet_temperature.value,
                turbine_inlet_temperature_k: cycle.turbine_inlet_temperature.value,
                turbine_outlet_temperature_k: cycle.turbine_outlet_temperature.value,
                compressor_efficiency: cycle.compressor_efficiency,
                turbine_efficiency: cycle.turbine_efficiency,
                compressor_work_w: cycle.compressor_work.value,
                turbine_work_w: cycle.turbine_work.value,
                net_work_w: cycle.net_work.value,
                efficiency: cycle.efficiency,
            })
        }
        None => None,
    };

    let net_power = stack.power.value
        + gas_turbine.as_ref().map_or(0.0, |gt| gt.net_work_w)
        - fan.as_ref().map_or(0.0, |f| f.power_w);
    let plant_efficiency = (fuel_input > 0.0)
        .then(|| net_power / fuel_input)
        .filter(|eta| eta.is_finite());
    diagnostics.extend(efficiency_above_one("plant", plant_efficiency));

    for note in &diagnostics {
        warn!(case = %plant.name, "{note}");
    }

    Ok(PlantReport {
        case_name: plant.name.clone(),
        gas_model: model.name().to_string(),
        streams,
        units,
        reformer: ReformerRecord {
            model: reformer.model.to_string(),
            heat_w: reformed.balance.heat.value,
            heat_j_per_kg: reformed.heat_per_kg,
            kp: reformed.kp,
            shift_extent: reformed.shift_extent,
            residual: reformed.residual,
        },
        stack: stack_record(&stack),
        recuperator: RecuperatorRecord {
            duty_w: recuperated.duty.value,
            effectiveness: recuperated.effectiveness,
            c_hot_w_per_k: recuperated.c_hot,
            c_cold_w_per_k: recuperated.c_cold,
            iterations: recuperated.iterations,
        },
        fan,
        gas_turbine,
        fuel_input_w: fuel_input,
        net_power_w: net_power,
        plant_efficiency,
        diagnostics,
        elapsed_s: 0.0,
    })
}

/// An efficiency above one means the heating value basis understates the
/// fuel energy.
fn efficiency_above_one(what: &str, efficiency: Option<f64>) -> Option<String> {
    efficiency
        .filter(|eta| *eta > 1.0)
        .map(|eta| format!("{what} efficiency of {eta:.3} exceeds one; check the LHV method"))
}

fn stack_record(stack: &FuelCellResult) -> StackRecord {
    StackRecord {
        temperature_k: stack.stack_temperature.value,
        ocv_v: stack.ocv,
        voltage_v: stack.voltage,
        current_a: stack.current,
        current_density_a_m2: stack.current_density,
        utilization: stack.utilization,
        power_w: stack.power.value,
        heat_released_w: stack.heat_released.value,
        efficiency: stack.efficiency,
        lhv_j_per_kg: stack.lhv,
        iterations: stack.iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_gas::IdealGasModel;

    #[test]
    fn disabled_fan_leaves_no_record() {
        let mut case = CaseDef::reference("no fan");
        case.fan.enabled = false;
        let report = run_case(&case, None).unwrap();
        assert!(report.fan.is_none());
        assert!(report.stream("stack-out").is_none());
        assert!(report.diagnostics.iter().all(|d| !d.contains("fan skipped")));
    }

    #[test]
    fn efficiencies_above_one_are_reported() {
        let mut case = CaseDef::reference("pure fuel lhv");
        case.stack.lhv_method = "pure-fuel-equilibrium".to_string();
        let report = run_case(&case, None).unwrap();
        let stack_eta = report.stack.efficiency.unwrap();
        assert!(stack_eta > 1.0, "{stack_eta}");
        assert!(
            report
                .diagnostics
                .iter()
                .any(|d| d.starts_with("stack efficiency") && d.contains("exceeds one"))
        );
        if report.plant_efficiency.is_some_and(|eta| eta > 1.0) {
            assert!(report.diagnostics.iter().any(|d| d.starts_with("plant efficiency")));
        }

        let reference = run_case(&CaseDef::reference("reference"), None).unwrap();
        assert!(reference.stack.efficiency.unwrap() < 1.0);
        assert!(reference.diagnostics.iter().all(|d| !d.contains("exceeds one")));
    }

    #[test]
    fn efficiency_notes_only_above_one() {
        assert_eq!(efficiency_above_one("plant", None), None);
        assert_eq!(efficiency_above_one("plant", Some(0.45)), None);
        let note = efficiency_above_one("plant", Some(2.612)).unwrap();
        assert!(note.starts_with("plant efficiency of 2.612 exceeds one"));
    }

    #[test]
    fn fan_is_skipped_when_exhaust_is_already_cool() {
        let mut case = CaseDef::reference("cool exhaust");
        // the recuperator leaves the exhaust well above 323 K
        case.fan.outlet_temperature_k = 1500.0;
        case.fan.ambient_temperature_k = 303.15;
        let model = IdealGasModel::default();
        let runtime = runtime_compile::compile_case(&case).unwrap();
        let report = run_plant(&model, &runtime).unwrap();
        assert!(report.fan.is_none());
        assert!(report.diagnostics.iter().any(|d| d.starts_with("fan skipped")));
    }
}
