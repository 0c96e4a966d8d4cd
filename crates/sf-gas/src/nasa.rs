//! NASA 7-coefficient polynomial thermodynamic data.
//!
//! Each species carries two coefficient sets split at `t_mid`:
//!
//! ```text
//! cp/R  = a0 + a1 T + a2 T² + a3 T³ + a4 T⁴
//! h/RT  = a0 + a1 T/2 + a2 T²/3 + a3 T³/4 + a4 T⁴/5 + a5/T
//! s°/R  = a0 ln T + a1 T + a2 T²/2 + a3 T³/3 + a4 T⁴/4 + a6
//! ```
//!
//! Enthalpies include the heat of formation, so `h` is referenced to the
//! elements in their standard state at 298.15 K. Entropies are at the
//! reference pressure of one standard atmosphere.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GasError, GasResult};
use crate::species::Species;

/// Two-range NASA polynomial for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nasa7 {
    pub t_min: f64,
    pub t_mid: f64,
    pub t_max: f64,
    /// Coefficients for `t_min <= T < t_mid`.
    pub low: [f64; 7],
    /// Coefficients for `t_mid <= T <= t_max`.
    pub high: [f64; 7],
}

impl Nasa7 {
    pub const fn new(t_min: f64, t_mid: f64, t_max: f64, low: [f64; 7], high: [f64; 7]) -> Self {
        Self {
            t_min,
            t_mid,
            t_max,
            low,
            high,
        }
    }

    fn coeffs(&self, t: f64) -> &[f64; 7] {
        if t < self.t_mid { &self.low } else { &self.high }
    }

    /// Dimensionless heat capacity cp/R.
    pub fn cp_r(&self, t: f64) -> f64 {
        let a = self.coeffs(t);
        a[0] + t * (a[1] + t * (a[2] + t * (a[3] + t * a[4])))
    }

    /// Dimensionless enthalpy h/(RT).
    pub fn h_rt(&self, t: f64) -> f64 {
        let a = self.coeffs(t);
        a[0] + t * (a[1] / 2.0 + t * (a[2] / 3.0 + t * (a[3] / 4.0 + t * a[4] / 5.0))) + a[5] / t
    }

    /// Dimensionless standard-state entropy s°/R.
    pub fn s_r(&self, t: f64) -> f64 {
        let a = self.coeffs(t);
        a[0] * t.ln() + t * (a[1] + t * (a[2] / 2.0 + t * (a[3] / 3.0 + t * a[4] / 4.0))) + a[6]
    }

    /// Dimensionless standard-state Gibbs energy g°/(RT).
    pub fn g_rt(&self, t: f64) -> f64 {
        self.h_rt(t) - self.s_r(t)
    }

    pub fn covers(&self, t: f64) -> bool {
        t >= self.t_min && t <= self.t_max
    }

    fn check(&self) -> Result<(), &'static str> {
        let ordered = self.t_min > 0.0 && self.t_min < self.t_mid && self.t_mid < self.t_max;
        if !ordered {
            return Err("temperature ranges must satisfy 0 < t_min < t_mid < t_max");
        }
        if self.low.iter().chain(self.high.iter()).any(|c| !c.is_finite()) {
            return Err("coefficients must be finite");
        }
        Ok(())
    }
}

/// On-disk layout: species key -> polynomial.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThermoFile {
    #[serde(default)]
    description: Option<String>,
    species: BTreeMap<String, Nasa7>,
}

/// Polynomial data for the species set, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoTable {
    entries: [Option<Nasa7>; Species::COUNT],
}

impl Default for ThermoTable {
    fn default() -> Self {
        Self::gri30()
    }
}

impl ThermoTable {
    /// GRI-Mech 3.0 coefficients for every species in [`Species::ALL`].
    pub fn gri30() -> Self {
        let mut entries: [Option<Nasa7>; Species::COUNT] = Default::default();
        for species in Species::ALL {
            entries[species.index()] = Some(builtin(species));
        }
        Self { entries }
    }

    /// Parse a YAML table. Species absent from the file are unsupported.
    pub fn from_yaml_str(text: &str) -> GasResult<Self> {
        let file: ThermoFile = serde_yaml::from_str(text).map_err(|e| GasError::Data {
            message: e.to_string(),
        })?;
        let mut entries: [Option<Nasa7>; Species::COUNT] = Default::default();
        for (key, poly) in file.species {
            let species: Species = key.parse().map_err(|_| GasError::Data {
                message: format!("unknown species '{key}' in thermo data"),
            })?;
            poly.check().map_err(|reason| GasError::Data {
                message: format!("{key}: {reason}"),
            })?;
            entries[species.index()] = Some(poly);
        }
        Ok(Self { entries })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> GasResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GasError::Data {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&text)
    }

    /// Serialize the table in the same layout [`ThermoTable::from_yaml_str`] reads.
    pub fn to_yaml_string(&self) -> GasResult<String> {
        let species = Species::ALL
            .into_iter()
            .filter_map(|s| self.get(s).map(|p| (s.key().to_string(), p.clone())))
            .collect();
        let file = ThermoFile {
            description: None,
            species,
        };
        serde_yaml::to_string(&file).map_err(|e| GasError::Data {
            message: e.to_string(),
        })
    }

    pub fn get(&self, species: Species) -> Option<&Nasa7> {
        self.entries[species.index()].as_ref()
    }

    pub fn require(&self, species: Species) -> GasResult<&Nasa7> {
        self.get(species).ok_or(GasError::NotSupported {
            what: "species has no thermodynamic data",
        })
    }

    pub fn contains(&self, species: Species) -> bool {
        self.get(species).is_some()
    }
}

fn builtin(species: Species) -> Nasa7 {
    match species {
        Species::H2 => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                2.344_331_12,
                7.980_520_75e-3,
                -1.947_815_10e-5,
                2.015_720_94e-8,
                -7.376_117_61e-12,
                -917.935_173,
                0.683_010_238,
            ],
            [
                3.337_279_20,
                -4.940_247_31e-5,
                4.994_567_78e-7,
                -1.795_663_94e-10,
                2.002_553_76e-14,
                -950.158_922,
                -3.205_023_31,
            ],
        ),
        Species::O2 => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                3.782_456_36,
                -2.996_734_16e-3,
                9.847_302_01e-6,
                -9.681_295_09e-9,
                3.243_728_37e-12,
                -1_063.943_56,
                3.657_675_73,
            ],
            [
                3.282_537_84,
                1.483_087_54e-3,
                -7.579_666_69e-7,
                2.094_705_55e-10,
                -2.167_177_94e-14,
                -1_088.457_72,
                5.453_231_29,
            ],
        ),
        Species::H2O => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                4.198_640_56,
                -2.036_434_10e-3,
                6.520_402_11e-6,
                -5.487_970_62e-9,
                1.771_978_17e-12,
                -30_293.726_7,
                -0.849_032_208,
            ],
            [
                3.033_992_49,
                2.176_918_04e-3,
                -1.640_725_18e-7,
                -9.704_198_70e-11,
                1.682_009_92e-14,
                -30_004.297_1,
                4.966_770_10,
            ],
        ),
        Species::CO => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                3.579_533_47,
                -6.103_536_80e-4,
                1.016_814_33e-6,
                9.070_058_84e-10,
                -9.044_244_99e-13,
                -14_344.086_0,
                3.508_409_28,
            ],
            [
                2.715_185_61,
                2.062_527_43e-3,
                -9.988_257_71e-7,
                2.300_530_08e-10,
                -2.036_477_16e-14,
                -14_151.872_4,
                7.818_687_72,
            ],
        ),
        Species::CO2 => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                2.356_773_52,
                8.984_596_77e-3,
                -7.123_562_69e-6,
                2.459_190_22e-9,
                -1.436_995_48e-13,
                -48_371.969_7,
                9.901_052_22,
            ],
            [
                3.857_460_29,
                4.414_370_26e-3,
                -2.214_814_04e-6,
                5.234_901_88e-10,
                -4.720_841_64e-14,
                -48_759.166_0,
                2.271_638_06,
            ],
        ),
        Species::CH4 => Nasa7::new(
            200.0,
            1000.0,
            3500.0,
            [
                5.149_876_13,
                -1.367_097_88e-2,
                4.918_005_99e-5,
                -4.847_430_26e-8,
                1.666_939_56e-11,
                -10_246.647_6,
                -4.641_303_76,
            ],
            [
                7.485_149_50e-2,
                1.339_094_67e-2,
                -5.732_858_09e-6,
                1.222_925_35e-9,
                -1.018_152_30e-13,
                -9_468.344_59,
                18.437_318_0,
            ],
        ),
        Species::N2 => Nasa7::new(
            300.0,
            1000.0,
            5000.0,
            [
                3.298_677,
                1.408_240_4e-3,
                -3.963_222e-6,
                5.641_515e-9,
                -2.444_854e-12,
                -1_020.899_9,
                3.950_372,
            ],
            [
                2.926_64,
                1.487_976_8e-3,
                -5.684_760e-7,
                1.009_703_8e-10,
                -6.753_351e-15,
                -922.797_7,
                5.980_528,
            ],
        ),
        Species::Ar => Nasa7::new(
            300.0,
            1000.0,
            5000.0,
            [2.5, 0.0, 0.0, 0.0, 0.0, -745.375, 4.366],
            [2.5, 0.0, 0.0, 0.0, 0.0, -745.375, 4.366],
        ),
    }
}
