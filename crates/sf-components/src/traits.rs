//! Core traits and shared result types for process units.

use crate::error::{ComponentError, ComponentResult};
use sf_core::units::{Power, Pressure, w};
use sf_gas::{GasState, GasStateModel, SpecEnthalpy, StreamState};

/// Heat and work exchanged with a stream.
///
/// Positive values flow *into* the stream described.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyBalance {
    pub heat: Power,
    pub work: Power,
}

impl EnergyBalance {
    pub fn zero() -> Self {
        Self {
            heat: w(0.0),
            work: w(0.0),
        }
    }

    pub fn heat(heat: Power) -> Self {
        Self { heat, work: w(0.0) }
    }

    pub fn work(work: Power) -> Self {
        Self { heat: w(0.0), work }
    }

    /// Net energy added to the stream.
    pub fn total(&self) -> Power {
        self.heat + self.work
    }
}

/// Outlet stream of a single-inlet unit and the energy it picked up.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitOutlet {
    pub outlet: StreamState,
    pub balance: EnergyBalance,
}

/// A unit with one inlet and one outlet stream.
///
/// Units are deterministic functions of the inlet and their parameters, so
/// independent units may be evaluated from several threads against one
/// shared model.
pub trait ProcessUnit: Send + Sync {
    /// Unit name for logging and reports.
    fn name(&self) -> &str;

    /// Outlet stream and energy balance for `inlet`.
    fn process(&self, model: &dyn GasStateModel, inlet: &StreamState)
    -> ComponentResult<UnitOutlet>;
}

/// Specific enthalpy of a stream [J/kg].
pub(crate) fn stream_enthalpy(
    model: &dyn GasStateModel,
    stream: &StreamState,
) -> ComponentResult<SpecEnthalpy> {
    Ok(model.h(stream.state())?)
}

/// Stream with the inlet's composition and flow at a new (h, P) state.
pub(crate) fn stream_at_enthalpy(
    model: &dyn GasStateModel,
    like: &StreamState,
    h: SpecEnthalpy,
    p: Pressure,
) -> ComponentResult<StreamState> {
    let comp = like.composition().clone();
    let t = model.state_from_enthalpy(h, p, &comp)?;
    Ok(like.with_state(GasState::from_pt(p, t, comp)?))
}

pub(crate) fn check_fraction(value: f64, what: &'static str) -> ComponentResult<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(ComponentError::InvalidArg { what });
    }
    Ok(())
}

pub(crate) fn check_positive(value: f64, what: &'static str) -> ComponentResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ComponentError::InvalidArg { what });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_totals() {
        let b = EnergyBalance {
            heat: w(150.0),
            work: w(-50.0),
        };
        assert_eq!(b.total().value, 100.0);
        assert_eq!(EnergyBalance::zero().total().value, 0.0);
        assert_eq!(EnergyBalance::work(w(3.0)).heat.value, 0.0);
    }

    #[test]
    fn parameter_checks() {
        assert!(check_fraction(1.0, "eta").is_ok());
        assert!(check_fraction(0.0, "eta").is_err());
        assert!(check_fraction(f64::NAN, "eta").is_err());
        assert!(check_positive(-1.0, "ratio").is_err());
    }
}
