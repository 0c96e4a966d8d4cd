//! Property sweeps over temperature or pressure.
//!
//! Points are evaluated in parallel; results keep the order of the sweep
//! values and failed points stay in place as errors.

use std::fmt;

use rayon::prelude::*;

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::model::{GasProperties, GasStateModel};
use crate::state::GasState;
use sf_core::numeric::linspace;
use sf_core::units::{Pressure, Temperature, k, pa};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepType {
    /// Uniformly spaced points
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

impl fmt::Display for SweepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepDefinition {
    pub start: f64,
    pub end: f64,
    pub points: usize,
    pub sweep_type: SweepType,
}

impl SweepDefinition {
    pub fn new(start: f64, end: f64, points: usize, sweep_type: SweepType) -> GasResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(GasError::InvalidArg {
                what: "sweep bounds must be finite",
            });
        }
        if points == 0 {
            return Err(GasError::InvalidArg {
                what: "sweep needs at least one point",
            });
        }
        if sweep_type == SweepType::Logarithmic && (start <= 0.0 || end <= 0.0) {
            return Err(GasError::InvalidArg {
                what: "logarithmic sweep bounds must be positive",
            });
        }
        Ok(Self {
            start,
            end,
            points,
            sweep_type,
        })
    }

    /// All sweep values, endpoints exact.
    pub fn values(&self) -> Vec<f64> {
        let mut values = match self.sweep_type {
            SweepType::Linear => linspace(self.start, self.end, self.points),
            SweepType::Logarithmic => linspace(self.start.ln(), self.end.ln(), self.points)
                .into_iter()
                .map(f64::exp)
                .collect(),
        };
        if let Some(first) = values.first_mut() {
            *first = self.start;
        }
        if self.points > 1 {
            if let Some(last) = values.last_mut() {
                *last = self.end;
            }
        }
        values
    }
}

impl fmt::Display for SweepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sweep from {} to {} ({} points, {})",
            self.start, self.end, self.points, self.sweep_type
        )
    }
}

/// Properties at fixed pressure over a temperature sweep [K].
pub fn temperature_sweep(
    model: &dyn GasStateModel,
    comp: &Composition,
    p: Pressure,
    sweep: &SweepDefinition,
) -> Vec<GasResult<GasProperties>> {
    sweep
        .values()
        .par_iter()
        .map(|t| model.properties_at(&GasState::from_pt(p, k(*t), comp.clone())?))
        .collect()
}

/// Properties at fixed temperature over a pressure sweep [Pa].
pub fn pressure_sweep(
    model: &dyn GasStateModel,
    comp: &Composition,
    t: Temperature,
    sweep: &SweepDefinition,
) -> Vec<GasResult<GasProperties>> {
    sweep
        .values()
        .par_iter()
        .map(|p| model.properties_at(&GasState::from_pt(pa(*p), t, comp.clone())?))
        .collect()
}
