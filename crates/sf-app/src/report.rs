//! Serializable plant report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sf_components::EnergyBalance;
use sf_gas::{Species, StreamState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRecord {
    pub label: String,
    pub temperature_k: f64,
    pub pressure_pa: f64,
    pub mass_flow_kg_s: f64,
    /// Non-zero mole fractions keyed by species.
    pub mole_fractions: BTreeMap<String, f64>,
}

impl StreamRecord {
    pub fn from_stream(label: &str, stream: &StreamState) -> Self {
        Self {
            label: label.to_string(),
            temperature_k: stream.temperature().value,
            pressure_pa: stream.pressure().value,
            mass_flow_kg_s: stream.mass_flow().value,
            mole_fractions: stream
                .composition()
                .iter()
                .map(|(species, x)| (species.key().to_string(), x))
                .collect(),
        }
    }

    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.mole_fractions
            .get(species.key())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Heat and work into the streams a unit handles [W].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitRecord {
    pub name: String,
    pub heat_w: f64,
    pub work_w: f64,
}

impl UnitRecord {
    pub fn from_balance(name: &str, balance: EnergyBalance) -> Self {
        Self {
            name: name.to_string(),
            heat_w: balance.heat.value,
            work_w: balance.work.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReformerRecord {
    pub model: String,
    pub heat_w: f64,
    pub heat_j_per_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_extent: Option<f64>,
    pub residual: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackRecord {
    pub temperature_k: f64,
    pub ocv_v: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub current_density_a_m2: f64,
    pub utilization: f64,
    pub power_w: f64,
    pub heat_released_w: f64,
    /// Absent when the feed LHV is not positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    pub lhv_j_per_kg: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecuperatorRecord {
    pub duty_w: f64,
    pub effectiveness: f64,
    pub c_hot_w_per_k: f64,
    pub c_cold_w_per_k: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanRecord {
    pub duty_w: f64,
    pub air_outlet_temperature_k: f64,
    pub lmtd_k: f64,
    pub air_mass_flow_kg_s: f64,
    pub power_w: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasTurbineRecord {
    pub variant: String,
    pub compressor_inlet_temperature_k: f64,
    pub compressor_outlet_temperature_k: f64,
    pub turbine_inlet_temperature_k: f64,
    pub turbine_outlet_temperature_k: f64,
    pub compressor_efficiency: f64,
    pub turbine_efficiency: f64,
    pub compressor_work_w: f64,
    pub turbine_work_w: f64,
    pub net_work_w: f64,
    /// Absent without fuel input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

/// Everything a plant run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantReport {
    pub case_name: String,
    pub gas_model: String,
    pub streams: Vec<StreamRecord>,
    pub units: Vec<UnitRecord>,
    pub reformer: ReformerRecord,
    pub stack: StackRecord,
    pub recuperator: RecuperatorRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<FanRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_turbine: Option<GasTurbineRecord>,
    /// LHV rate of the anode feed [W]
    pub fuel_input_w: f64,
    /// Stack power plus turbine net work less fan power [W]
    pub net_power_w: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_efficiency: Option<f64>,
    /// Non-fatal findings worth a look.
    #[serde(default)]
    pub diagnostics: Vec<String>,
    pub elapsed_s: f64,
}

impl PlantReport {
    pub fn stream(&self, label: &str) -> Option<&StreamRecord> {
        self.streams.iter().find(|s| s.label == label)
    }

    /// Stream table with one mole-fraction column per known species.
    pub fn stream_table_csv(&self) -> String {
        let mut csv = String::from("label,temperature_k,pressure_pa,mass_flow_kg_s");
        for species in Species::ALL {
            csv.push_str(&format!(",x_{}", species.key()));
        }
        csv.push('\n');
        for stream in &self.streams {
            csv.push_str(&format!(
                "{},{},{},{}",
                stream.label, stream.temperature_k, stream.pressure_pa, stream.mass_flow_kg_s
            ));
            for species in Species::ALL {
                csv.push_str(&format!(",{}", stream.mole_fraction(species)));
            }
            csv.push('\n');
        }
        csv
    }
}
