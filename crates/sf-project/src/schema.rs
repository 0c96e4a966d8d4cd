//! Case file schema definitions.
//!
//! A case describes one steady operating point of the plant. Every section
//! except `version` and `name` may be omitted and falls back to the
//! reference plant.
//!
//! ```yaml
//! version: 1
//! name: Reference plant
//! reformer:
//!   feed:
//!     methane_kg_s: 0.1
//!     steam_kg_s: 0.2
//!     temperature_k: 700.0
//!     pressure_pa: 101325.0
//!   outlet_temperature_k: 1100.0
//!   model:
//!     type: ShiftPolynomial
//!     a: 4276.0
//!     b: -3.961
//! gas_turbine:
//!   type: CompressorSearch
//!   pressure_ratio: 4.8
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub reformer: ReformerDef,
    #[serde(default)]
    pub stack: StackDef,
    #[serde(default)]
    pub recuperator: RecuperatorDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_turbine: Option<GasTurbineDef>,
    #[serde(default)]
    pub fan: FanDef,
    /// NASA-7 coefficient table in YAML; the built-in table when absent.
    /// Relative paths resolve against the case file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermo_data: Option<String>,
}

impl CaseDef {
    /// Reference plant under the given name.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            version: crate::LATEST_VERSION,
            name: name.into(),
            solver: SolverDef::default(),
            reformer: ReformerDef::default(),
            stack: StackDef::default(),
            recuperator: RecuperatorDef::default(),
            gas_turbine: None,
            fan: FanDef::default(),
            thermo_data: None,
        }
    }
}

/// Capacity-rate loop settings shared by the iterative units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            rel_tol: default_rel_tol(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_rel_tol() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    200
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    Mole,
    Mass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositionDef {
    #[serde(default)]
    pub basis: Basis,
    /// Species key to fraction; fractions must sum to one.
    pub fractions: BTreeMap<String, f64>,
}

impl CompositionDef {
    pub fn air() -> Self {
        Self {
            basis: Basis::Mole,
            fractions: BTreeMap::from([("O2".to_string(), 0.21), ("N2".to_string(), 0.79)]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamDef {
    pub temperature_k: f64,
    pub pressure_pa: f64,
    pub mass_flow_kg_s: f64,
    pub composition: CompositionDef,
}

/// Methane and steam mixed ahead of the reformer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedDef {
    pub methane_kg_s: f64,
    pub steam_kg_s: f64,
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

impl Default for FeedDef {
    fn default() -> Self {
        Self {
            methane_kg_s: 0.1,
            steam_kg_s: 0.2,
            temperature_k: 700.0,
            pressure_pa: 101_325.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReformerModelDef {
    /// `ln Kp = a / T + b`
    ShiftPolynomial { a: f64, b: f64 },
    GibbsEquilibrium,
}

impl Default for ReformerModelDef {
    fn default() -> Self {
        ReformerModelDef::ShiftPolynomial {
            a: 4276.0,
            b: -3.961,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReformerDef {
    #[serde(default)]
    pub feed: FeedDef,
    #[serde(default = "default_reformer_outlet")]
    pub outlet_temperature_k: f64,
    #[serde(default)]
    pub model: ReformerModelDef,
}

impl Default for ReformerDef {
    fn default() -> Self {
        Self {
            feed: FeedDef::default(),
            outlet_temperature_k: default_reformer_outlet(),
            model: ReformerModelDef::default(),
        }
    }
}

fn default_reformer_outlet() -> f64 {
    1100.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackDef {
    pub cells: u32,
    pub cell_area_m2: f64,
    pub asr_ohm_m2: f64,
    pub dg_a_j_per_mol: f64,
    pub dg_b_j_per_mol_k: f64,
    pub v_floor: f64,
    pub target_utilization: f64,
    pub utilization_tol: f64,
    pub max_iterations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    /// `stoichiometric-products`, `excess-oxidizer` or `pure-fuel-equilibrium`
    pub lhv_method: String,
    pub cathode_air: StreamDef,
}

impl Default for StackDef {
    fn default() -> Self {
        Self {
            cells: 300,
            cell_area_m2: 1.2,
            asr_ohm_m2: 1.0e-5,
            dg_a_j_per_mol: 242_000.0,
            dg_b_j_per_mol_k: 45.8,
            v_floor: 0.3,
            target_utilization: 0.75,
            utilization_tol: 0.01,
            max_iterations: 100,
            temperature_k: None,
            lhv_method: "stoichiometric-products".to_string(),
            cathode_air: StreamDef {
                temperature_k: 1073.15,
                pressure_pa: 101_325.0,
                mass_flow_kg_s: 2.0,
                composition: CompositionDef::air(),
            },
        }
    }
}

/// Recuperator preheating ambient air with the stack exhaust.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecuperatorDef {
    pub effectiveness: f64,
    pub cold_inlet: StreamDef,
}

impl Default for RecuperatorDef {
    fn default() -> Self {
        Self {
            effectiveness: 0.85,
            cold_inlet: StreamDef {
                temperature_k: 300.0,
                pressure_pa: 101_325.0,
                mass_flow_kg_s: 2.0,
                composition: CompositionDef::air(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanDef {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Temperature the exhaust leaves the cooler at.
    pub outlet_temperature_k: f64,
    pub u_w_per_m2_k: f64,
    pub area_m2: f64,
    pub ambient_temperature_k: f64,
    pub ambient_pressure_pa: f64,
    pub efficiency: f64,
    pub pressure_rise_pa: f64,
}

impl Default for FanDef {
    fn default() -> Self {
        Self {
            enabled: true,
            outlet_temperature_k: 323.15,
            u_w_per_m2_k: 8.0,
            // sized for the reference plant exhaust
            area_m2: 1500.0,
            ambient_temperature_k: 303.15,
            ambient_pressure_pa: 101_325.0,
            efficiency: 0.85,
            pressure_rise_pa: 300.0,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GasTurbineDef {
    CompressorSearch {
        #[serde(default = "default_search_ratio")]
        pressure_ratio: f64,
        #[serde(default = "default_search_tit")]
        turbine_inlet_temperature_k: f64,
        #[serde(default = "default_search_eta_t")]
        turbine_efficiency: f64,
        #[serde(default = "default_search_eta_c")]
        compressor_efficiency: f64,
        #[serde(default = "default_search_t_min")]
        search_t_min_k: f64,
        #[serde(default = "default_search_step")]
        search_step_k: f64,
        #[serde(default = "default_true")]
        refine: bool,
    },
    FixedTemperatures {
        pressure_ratio: f64,
        compressor_outlet_temperature_k: f64,
        turbine_inlet_temperature_k: f64,
        turbine_outlet_temperature_k: f64,
    },
}

fn default_search_ratio() -> f64 {
    4.8
}

fn default_search_tit() -> f64 {
    1200.0
}

fn default_search_eta_t() -> f64 {
    0.84
}

fn default_search_eta_c() -> f64 {
    0.8
}

fn default_search_t_min() -> f64 {
    250.0
}

fn default_search_step() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_case_takes_reference_sections() {
        let case: CaseDef = serde_yaml::from_str("version: 1\nname: minimal\n").unwrap();
        assert_eq!(case, CaseDef::reference("minimal"));
    }

    #[test]
    fn tagged_variants_parse() {
        let text = r#"
version: 1
name: tagged
reformer:
  model:
    type: GibbsEquilibrium
gas_turbine:
  type: CompressorSearch
  pressure_ratio: 5.0
"#;
        let case: CaseDef = serde_yaml::from_str(text).unwrap();
        assert_eq!(case.reformer.model, ReformerModelDef::GibbsEquilibrium);
        match case.gas_turbine {
            Some(GasTurbineDef::CompressorSearch {
                pressure_ratio,
                turbine_efficiency,
                refine,
                ..
            }) => {
                assert_eq!(pressure_ratio, 5.0);
                assert_eq!(turbine_efficiency, 0.84);
                assert!(refine);
            }
            other => panic!("unexpected gas turbine section: {other:?}"),
        }
    }

    #[test]
    fn basis_is_lowercase() {
        let comp: CompositionDef =
            serde_yaml::from_str("basis: mass\nfractions:\n  CH4: 0.3\n  H2O: 0.7\n").unwrap();
        assert_eq!(comp.basis, Basis::Mass);
        assert_eq!(comp.fractions["H2O"], 0.7);
        let default: CompositionDef = serde_yaml::from_str("fractions: {N2: 1.0}").unwrap();
        assert_eq!(default.basis, Basis::Mole);
    }
}
