use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use sf_app::{AppError, AppResult, PlantReport, project_service, run_service};
use sf_core::units::pa;
use sf_gas::{
    Composition, GasStateModel, HeatingValueMethod, IdealGasModel, SweepDefinition, SweepType,
    ThermoTable, lower_heating_value, temperature_sweep,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "sofcflow CLI - SOFC plant thermodynamic model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case file syntax and values
    Validate {
        /// Path to the case file (YAML, or JSON by extension)
        case_path: PathBuf,
    },
    /// Run the plant described by a case file
    Run {
        /// Path to the case file (YAML, or JSON by extension)
        case_path: PathBuf,
        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the stream table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Tabulate mixture properties over a temperature sweep
    Props {
        /// Mole fractions, e.g. "CH4:1,H2O:2" (normalized)
        #[arg(long)]
        composition: String,
        /// Pressure [Pa]
        #[arg(long, default_value_t = 101_325.0)]
        pressure: f64,
        /// First temperature [K]
        #[arg(long, default_value_t = 300.0)]
        t_start: f64,
        /// Last temperature [K]
        #[arg(long, default_value_t = 1500.0)]
        t_end: f64,
        /// Number of points
        #[arg(long, default_value_t = 13)]
        points: usize,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// NASA-7 coefficient table in YAML
        #[arg(long)]
        thermo_data: Option<PathBuf>,
    },
    /// Lower heating value of a fuel under each strategy
    Lhv {
        /// Mole fractions, e.g. "CH4:1"
        #[arg(long)]
        fuel: String,
        /// NASA-7 coefficient table in YAML
        #[arg(long)]
        thermo_data: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { case_path } => cmd_validate(&case_path),
        Commands::Run {
            case_path,
            json,
            csv,
        } => cmd_run(&case_path, json.as_deref(), csv.as_deref()),
        Commands::Props {
            composition,
            pressure,
            t_start,
            t_end,
            points,
            csv,
            thermo_data,
        } => cmd_props(
            &composition,
            pressure,
            (t_start, t_end, points),
            csv.as_deref(),
            thermo_data.as_deref(),
        ),
        Commands::Lhv { fuel, thermo_data } => cmd_lhv(&fuel, thermo_data.as_deref()),
    }
}

fn gas_model(thermo_data: Option<&Path>) -> AppResult<IdealGasModel> {
    match thermo_data {
        Some(path) => {
            let table = ThermoTable::from_yaml_file(path).map_err(|e| AppError::ThermoDataRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Ok(IdealGasModel::new(table))
        }
        None => Ok(IdealGasModel::default()),
    }
}

fn cmd_validate(case_path: &Path) -> AppResult<()> {
    println!("Validating case: {}", case_path.display());
    let case = project_service::load_case(case_path)?;
    let summary = project_service::summarize(&case);
    println!("✓ Case is valid");
    println!("  Name:        {}", summary.name);
    println!("  Version:     {}", summary.version);
    println!("  Reformer:    {}", summary.reformer_model);
    println!("  Gas turbine: {}", summary.gas_turbine.unwrap_or("none"));
    println!("  Fan:         {}", if summary.fan_enabled { "on" } else { "off" });
    if let Some(data) = &summary.thermo_data {
        println!("  Thermo data: {}", data);
    }
    Ok(())
}

fn cmd_run(case_path: &Path, json: Option<&Path>, csv: Option<&Path>) -> AppResult<()> {
    println!("Running case: {}", case_path.display());
    let report = run_service::run_case_file(case_path)?;
    print_report(&report);

    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("✓ Report written to {}", path.display());
    }
    if let Some(path) = csv {
        std::fs::write(path, report.stream_table_csv())?;
        println!(
            "✓ Exported {} streams to {}",
            report.streams.len(),
            path.display()
        );
    }
    Ok(())
}

fn print_report(report: &PlantReport) {
    println!("\n{} ({})", report.case_name, report.gas_model);

    println!("\nStreams:");
    println!(
        "  {:<20} {:>10} {:>12} {:>12}",
        "label", "T [K]", "p [Pa]", "m [kg/s]"
    );
    for s in &report.streams {
        println!(
            "  {:<20} {:>10.2} {:>12.1} {:>12.5}",
            s.label, s.temperature_k, s.pressure_pa, s.mass_flow_kg_s
        );
    }

    println!("\nReformer ({}):", report.reformer.model);
    println!("  Heat input: {:.1} kW", report.reformer.heat_w / 1e3);
    if let Some(kp) = report.reformer.kp {
        println!("  Kp:         {:.4}", kp);
    }
    println!("  Residual:   {:.3e}", report.reformer.residual);

    let stack = &report.stack;
    println!("\nStack:");
    println!("  OCV / V:     {:.4} / {:.4} V", stack.ocv_v, stack.voltage_v);
    println!(
        "  Current:     {:.1} A ({:.1} A/m²)",
        stack.current_a, stack.current_density_a_m2
    );
    println!("  Utilization: {:.4}", stack.utilization);
    println!("  Power:       {:.1} kW", stack.power_w / 1e3);
    println!("  Heat:        {:.1} kW", stack.heat_released_w / 1e3);
    if let Some(eta) = stack.efficiency {
        println!("  Efficiency:  {:.2} %", eta * 100.0);
    }

    println!("\nRecuperator:");
    println!(
        "  Duty: {:.1} kW at effectiveness {:.3} ({} iterations)",
        report.recuperator.duty_w / 1e3,
        report.recuperator.effectiveness,
        report.recuperator.iterations
    );

    if let Some(fan) = &report.fan {
        println!("\nFan:");
        println!("  Duty:     {:.1} kW", fan.duty_w / 1e3);
        println!("  Air flow: {:.3} kg/s", fan.air_mass_flow_kg_s);
        println!("  Power:    {:.2} kW", fan.power_w / 1e3);
    }

    if let Some(gt) = &report.gas_turbine {
        println!("\nGas turbine ({}):", gt.variant);
        println!(
            "  Compressor: {:.1} -> {:.1} K, eta {:.3}",
            gt.compressor_inlet_temperature_k,
            gt.compressor_outlet_temperature_k,
            gt.compressor_efficiency
        );
        println!(
            "  Turbine:    {:.1} -> {:.1} K, eta {:.3}",
            gt.turbine_inlet_temperature_k,
            gt.turbine_outlet_temperature_k,
            gt.turbine_efficiency
        );
        println!("  Net work:   {:.1} kW", gt.net_work_w / 1e3);
    }

    println!("\nPlant:");
    println!("  Fuel input: {:.1} kW", report.fuel_input_w / 1e3);
    println!("  Net power:  {:.1} kW", report.net_power_w / 1e3);
    if let Some(eta) = report.plant_efficiency {
        println!("  Efficiency: {:.2} %", eta * 100.0);
    }

    if !report.diagnostics.is_empty() {
        println!("\nDiagnostics:");
        for note in &report.diagnostics {
            println!("  ! {}", note);
        }
    }
    println!("\nElapsed: {:.3}s", report.elapsed_s);
}

fn cmd_props(
    composition: &str,
    pressure: f64,
    (t_start, t_end, points): (f64, f64, usize),
    output: Option<&Path>,
    thermo_data: Option<&Path>,
) -> AppResult<()> {
    let model = gas_model(thermo_data)?;
    let comp = Composition::parse_mole_fractions(composition)?;
    let sweep = SweepDefinition::new(t_start, t_end, points, SweepType::Linear)?;

    let started = Instant::now();
    let results = temperature_sweep(&model, &comp, pa(pressure), &sweep);
    debug!(
        points = results.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "sweep evaluated"
    );

    let mut csv =
        String::from("t_k,h_j_per_kg,s_j_per_kg_k,cp_j_per_kg_k,cv_j_per_kg_k,rho_kg_m3,gamma\n");
    let mut failures = 0;
    for (t, result) in sweep.values().iter().zip(&results) {
        match result {
            Ok(p) => csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                t,
                p.h,
                p.s,
                p.cp,
                p.cv,
                p.rho.value,
                p.gamma()
            )),
            Err(e) => {
                failures += 1;
                eprintln!("  T = {} K: {}", t, e);
            }
        }
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} points of {} to {}",
            results.len() - failures,
            model.name(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_lhv(fuel: &str, thermo_data: Option<&Path>) -> AppResult<()> {
    let model = gas_model(thermo_data)?;
    let comp = Composition::parse_mole_fractions(fuel)?;
    println!("Lower heating value of {}", comp);

    let methods = [
        HeatingValueMethod::StoichiometricProducts,
        HeatingValueMethod::ExcessOxidizer {
            oxygen_per_fuel: HeatingValueMethod::EXCESS_OXYGEN_DEFAULT,
        },
        HeatingValueMethod::PureFuelEquilibrium,
    ];
    for method in methods {
        match lower_heating_value(&model, &comp, method) {
            Ok(lhv) => println!("  {:<24} {:>10.4} MJ/kg", method.label(), lhv / 1e6),
            Err(e) => println!("  {:<24} failed: {}", method.label(), e),
        }
    }
    Ok(())
}
