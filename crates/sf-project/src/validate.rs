//! Case validation logic.

use crate::schema::{
    Basis, CaseDef, CompositionDef, FanDef, GasTurbineDef, ReformerModelDef, StackDef, StreamDef,
};
use sf_gas::{HeatingValueMethod, Species};

/// Fractions must sum to one within this tolerance.
pub const FRACTION_SUM_TOL: f64 = 1e-6;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown species: {name} in {context}")]
    UnknownSpecies { name: String, context: String },

    #[error("Duplicate species: {name} in {context}")]
    DuplicateSpecies { name: String, context: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_case(case: &CaseDef) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    validate_positive_finite("solver.rel_tol", case.solver.rel_tol)?;
    if case.solver.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be at least 1"));
    }

    let feed = &case.reformer.feed;
    validate_non_negative_finite("reformer.feed.methane_kg_s", feed.methane_kg_s)?;
    validate_non_negative_finite("reformer.feed.steam_kg_s", feed.steam_kg_s)?;
    if feed.methane_kg_s + feed.steam_kg_s <= 0.0 {
        return Err(invalid(
            "reformer.feed",
            feed.methane_kg_s + feed.steam_kg_s,
            "feed must carry some flow",
        ));
    }
    validate_positive_finite("reformer.feed.temperature_k", feed.temperature_k)?;
    validate_positive_finite("reformer.feed.pressure_pa", feed.pressure_pa)?;
    validate_positive_finite(
        "reformer.outlet_temperature_k",
        case.reformer.outlet_temperature_k,
    )?;
    if let ReformerModelDef::ShiftPolynomial { a, b } = case.reformer.model {
        validate_finite("reformer.model.a", a)?;
        validate_finite("reformer.model.b", b)?;
    }

    validate_stack(&case.stack)?;

    validate_fraction_closed(
        "recuperator.effectiveness",
        case.recuperator.effectiveness,
    )?;
    validate_stream("recuperator.cold_inlet", &case.recuperator.cold_inlet)?;

    validate_fan(&case.fan)?;

    if let Some(gt) = &case.gas_turbine {
        validate_gas_turbine(gt)?;
    }

    if let Some(path) = &case.thermo_data
        && path.trim().is_empty()
    {
        return Err(invalid("thermo_data", "''", "path must not be empty"));
    }

    Ok(())
}

fn validate_stack(stack: &StackDef) -> Result<(), ValidationError> {
    if stack.cells == 0 {
        return Err(invalid("stack.cells", 0, "must be at least 1"));
    }
    validate_positive_finite("stack.cell_area_m2", stack.cell_area_m2)?;
    validate_positive_finite("stack.asr_ohm_m2", stack.asr_ohm_m2)?;
    validate_finite("stack.dg_a_j_per_mol", stack.dg_a_j_per_mol)?;
    validate_finite("stack.dg_b_j_per_mol_k", stack.dg_b_j_per_mol_k)?;
    validate_non_negative_finite("stack.v_floor", stack.v_floor)?;
    validate_fraction_open("stack.target_utilization", stack.target_utilization)?;
    validate_positive_finite("stack.utilization_tol", stack.utilization_tol)?;
    if stack.max_iterations == 0 {
        return Err(invalid("stack.max_iterations", 0, "must be at least 1"));
    }
    if let Some(t) = stack.temperature_k {
        validate_positive_finite("stack.temperature_k", t)?;
    }
    if stack.lhv_method.parse::<HeatingValueMethod>().is_err() {
        return Err(invalid(
            "stack.lhv_method",
            &stack.lhv_method,
            "expected stoichiometric-products, excess-oxidizer or pure-fuel-equilibrium",
        ));
    }
    validate_stream("stack.cathode_air", &stack.cathode_air)
}

fn validate_fan(fan: &FanDef) -> Result<(), ValidationError> {
    validate_positive_finite("fan.outlet_temperature_k", fan.outlet_temperature_k)?;
    validate_positive_finite("fan.u_w_per_m2_k", fan.u_w_per_m2_k)?;
    validate_positive_finite("fan.area_m2", fan.area_m2)?;
    validate_positive_finite("fan.ambient_temperature_k", fan.ambient_temperature_k)?;
    validate_positive_finite("fan.ambient_pressure_pa", fan.ambient_pressure_pa)?;
    validate_fraction_open("fan.efficiency", fan.efficiency)?;
    validate_positive_finite("fan.pressure_rise_pa", fan.pressure_rise_pa)?;
    if fan.outlet_temperature_k <= fan.ambient_temperature_k {
        return Err(invalid(
            "fan.outlet_temperature_k",
            fan.outlet_temperature_k,
            "must be above the ambient temperature",
        ));
    }
    Ok(())
}

fn validate_gas_turbine(gt: &GasTurbineDef) -> Result<(), ValidationError> {
    match gt {
        GasTurbineDef::CompressorSearch {
            pressure_ratio,
            turbine_inlet_temperature_k,
            turbine_efficiency,
            compressor_efficiency,
            search_t_min_k,
            search_step_k,
            ..
        } => {
            validate_pressure_ratio("gas_turbine.pressure_ratio", *pressure_ratio)?;
            validate_positive_finite(
                "gas_turbine.turbine_inlet_temperature_k",
                *turbine_inlet_temperature_k,
            )?;
            validate_fraction_open("gas_turbine.turbine_efficiency", *turbine_efficiency)?;
            validate_fraction_open("gas_turbine.compressor_efficiency", *compressor_efficiency)?;
            validate_positive_finite("gas_turbine.search_t_min_k", *search_t_min_k)?;
            validate_positive_finite("gas_turbine.search_step_k", *search_step_k)?;
        }
        GasTurbineDef::FixedTemperatures {
            pressure_ratio,
            compressor_outlet_temperature_k,
            turbine_inlet_temperature_k,
            turbine_outlet_temperature_k,
        } => {
            validate_pressure_ratio("gas_turbine.pressure_ratio", *pressure_ratio)?;
            validate_positive_finite(
                "gas_turbine.compressor_outlet_temperature_k",
                *compressor_outlet_temperature_k,
            )?;
            validate_positive_finite(
                "gas_turbine.turbine_inlet_temperature_k",
                *turbine_inlet_temperature_k,
            )?;
            validate_positive_finite(
                "gas_turbine.turbine_outlet_temperature_k",
                *turbine_outlet_temperature_k,
            )?;
            if turbine_outlet_temperature_k >= turbine_inlet_temperature_k {
                return Err(invalid(
                    "gas_turbine.turbine_outlet_temperature_k",
                    turbine_outlet_temperature_k,
                    "must be below the turbine inlet temperature",
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_stream(field: &str, stream: &StreamDef) -> Result<(), ValidationError> {
    validate_positive_finite(&format!("{field}.temperature_k"), stream.temperature_k)?;
    validate_positive_finite(&format!("{field}.pressure_pa"), stream.pressure_pa)?;
    validate_positive_finite(&format!("{field}.mass_flow_kg_s"), stream.mass_flow_kg_s)?;
    validate_composition(&format!("{field}.composition"), &stream.composition)
}

/// Species must be known and listed once; fractions in [0, 1] summing to one.
pub fn validate_composition(field: &str, comp: &CompositionDef) -> Result<(), ValidationError> {
    if comp.fractions.is_empty() {
        return Err(invalid(field, "{}", "composition must list at least one species"));
    }
    let mut seen = Vec::new();
    let mut sum = 0.0;
    for (name, value) in &comp.fractions {
        let species: Species = name.parse().map_err(|_| ValidationError::UnknownSpecies {
            name: name.clone(),
            context: field.to_string(),
        })?;
        // "H2O" and "water" parse to the same species
        if seen.contains(&species) {
            return Err(ValidationError::DuplicateSpecies {
                name: name.clone(),
                context: field.to_string(),
            });
        }
        seen.push(species);
        if !value.is_finite() || *value < 0.0 || *value > 1.0 {
            return Err(invalid(
                &format!("{field}.fractions.{name}"),
                value,
                "must be in [0, 1]",
            ));
        }
        sum += value;
    }
    if (sum - 1.0).abs() > FRACTION_SUM_TOL {
        let basis = match comp.basis {
            Basis::Mole => "mole",
            Basis::Mass => "mass",
        };
        return Err(invalid(
            &format!("{field}.fractions"),
            sum,
            &format!("{basis} fractions must sum to 1"),
        ));
    }
    Ok(())
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(field, value, "must be finite"));
    }
    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

fn validate_non_negative_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, value, "must be non-negative and finite"));
    }
    Ok(())
}

fn validate_fraction_open(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(invalid(field, value, "must be in (0, 1]"));
    }
    Ok(())
}

fn validate_fraction_closed(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, value, "must be in [0, 1]"));
    }
    Ok(())
}

fn validate_pressure_ratio(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 1.0 {
        return Err(invalid(field, value, "must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn reference_case_is_valid() {
        validate_case(&CaseDef::reference("ok")).unwrap();
    }

    #[test]
    fn rejects_future_version() {
        let mut case = CaseDef::reference("future");
        case.version = crate::LATEST_VERSION + 1;
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn composition_checks() {
        let unknown = CompositionDef {
            basis: Basis::Mole,
            fractions: BTreeMap::from([("XE".to_string(), 1.0)]),
        };
        assert!(matches!(
            validate_composition("c", &unknown),
            Err(ValidationError::UnknownSpecies { .. })
        ));

        let duplicate = CompositionDef {
            basis: Basis::Mole,
            fractions: BTreeMap::from([("H2O".to_string(), 0.5), ("water".to_string(), 0.5)]),
        };
        assert!(matches!(
            validate_composition("c", &duplicate),
            Err(ValidationError::DuplicateSpecies { .. })
        ));

        let short = CompositionDef {
            basis: Basis::Mass,
            fractions: BTreeMap::from([("CH4".to_string(), 0.3), ("H2O".to_string(), 0.6)]),
        };
        let err = validate_composition("c", &short).unwrap_err();
        assert!(err.to_string().contains("mass fractions must sum to 1"));

        let out_of_range = CompositionDef {
            basis: Basis::Mole,
            fractions: BTreeMap::from([("N2".to_string(), 1.5), ("O2".to_string(), -0.5)]),
        };
        assert!(validate_composition("c", &out_of_range).is_err());
    }

    #[test]
    fn efficiencies_must_be_in_unit_interval() {
        let mut case = CaseDef::reference("eta");
        case.fan.efficiency = 1.2;
        assert!(validate_case(&case).is_err());

        let mut case = CaseDef::reference("eta");
        case.gas_turbine = Some(GasTurbineDef::CompressorSearch {
            pressure_ratio: 4.8,
            turbine_inlet_temperature_k: 1200.0,
            turbine_efficiency: 0.0,
            compressor_efficiency: 0.8,
            search_t_min_k: 250.0,
            search_step_k: 1.0,
            refine: true,
        });
        assert!(validate_case(&case).is_err());
    }

    #[test]
    fn unknown_lhv_method_is_rejected() {
        let mut case = CaseDef::reference("lhv");
        case.stack.lhv_method = "higher".to_string();
        let err = validate_case(&case).unwrap_err();
        assert!(err.to_string().contains("stack.lhv_method"));
    }
}
