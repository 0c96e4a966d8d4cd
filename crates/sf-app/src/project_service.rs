//! Case loading, saving, validation, and introspection.

use std::path::Path;

use sf_project::schema::{CaseDef, GasTurbineDef, ReformerModelDef};

use crate::error::AppResult;

/// One-line view of a case for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    pub name: String,
    pub version: u32,
    pub reformer_model: &'static str,
    pub gas_turbine: Option<&'static str>,
    pub fan_enabled: bool,
    pub thermo_data: Option<String>,
}

/// Load a case from YAML or JSON (by extension) and validate it.
pub fn load_case(path: &Path) -> AppResult<CaseDef> {
    Ok(sf_project::load_case(path)?)
}

/// Save a case, as JSON for a `.json` path and YAML otherwise.
pub fn save_case(path: &Path, case: &CaseDef) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => sf_project::save_json(path, case)?,
        _ => sf_project::save_yaml(path, case)?,
    }
    Ok(())
}

pub fn validate_case(case: &CaseDef) -> AppResult<()> {
    sf_project::validate_case(case).map_err(sf_project::ProjectError::from)?;
    Ok(())
}

pub fn summarize(case: &CaseDef) -> CaseSummary {
    CaseSummary {
        name: case.name.clone(),
        version: case.version,
        reformer_model: match case.reformer.model {
            ReformerModelDef::ShiftPolynomial { .. } => "shift-polynomial",
            ReformerModelDef::GibbsEquilibrium => "gibbs-equilibrium",
        },
        gas_turbine: case.gas_turbine.as_ref().map(|gt| match gt {
            GasTurbineDef::CompressorSearch { .. } => "compressor-search",
            GasTurbineDef::FixedTemperatures { .. } => "fixed-temperatures",
        }),
        fan_enabled: case.fan.enabled,
        thermo_data: case.thermo_data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_reference_case() {
        let summary = summarize(&CaseDef::reference("plant"));
        assert_eq!(summary.name, "plant");
        assert_eq!(summary.reformer_model, "shift-polynomial");
        assert_eq!(summary.gas_turbine, None);
        assert!(summary.fan_enabled);
    }

    #[test]
    fn save_then_load_json() {
        let path = std::env::temp_dir().join(format!("sf_app_{}_case.json", std::process::id()));
        let case = CaseDef::reference("json");
        save_case(&path, &case).unwrap();
        assert_eq!(load_case(&path).unwrap(), case);
    }
}
