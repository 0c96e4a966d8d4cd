//! Two-stream counterflow heat exchanger.
//!
//! Heat-capacity rates are evaluated at each stream's mean temperature,
//! `C = ṁ · cp((T_in + T_out) / 2)`, and the effectiveness is the duty over
//! `C_min · (T_hot,in − T_cold,in)`. Pressure drop is not modelled.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{EnergyBalance, stream_at_enthalpy, stream_enthalpy};
use sf_core::units::{Power, Temperature, k, w};
use sf_gas::{GasState, GasStateModel, StreamState};
use sf_solver::{ConvergenceLoop, Step};
use tracing::{debug, warn};

/// What is known about the hot side in rating mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HotSideSpec {
    /// Hot outlet temperature.
    OutletTemperature(Temperature),
    /// Heat removed from the hot stream.
    Duty(Power),
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatExchangerResult {
    pub hot_outlet: StreamState,
    pub cold_outlet: StreamState,
    /// Heat passed from the hot to the cold stream.
    pub duty: Power,
    pub effectiveness: f64,
    /// Heat-capacity rates at the mean temperatures [W/K].
    pub c_hot: f64,
    pub c_cold: f64,
    pub hot_balance: EnergyBalance,
    pub cold_balance: EnergyBalance,
    /// Passes of the capacity-rate loop (zero in rating mode).
    pub iterations: usize,
}

impl HeatExchangerResult {
    pub fn c_min(&self) -> f64 {
        self.c_hot.min(self.c_cold)
    }
}

#[derive(Clone, Debug)]
pub struct HeatExchanger {
    pub name: String,
    pub solver: ConvergenceLoop,
}

impl HeatExchanger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solver: ConvergenceLoop::default(),
        }
    }

    pub fn with_solver(mut self, solver: ConvergenceLoop) -> Self {
        self.solver = solver;
        self
    }

    /// Rating mode: the hot-side change is known, the cold outlet follows
    /// from `ΔH_hot = ΔH_cold`.
    pub fn rate(
        &self,
        model: &dyn GasStateModel,
        hot_in: &StreamState,
        cold_in: &StreamState,
        hot_side: HotSideSpec,
    ) -> ComponentResult<HeatExchangerResult> {
        check_streams(hot_in, cold_in)?;
        let m_hot = hot_in.mass_flow().value;
        let m_cold = cold_in.mass_flow().value;
        let h_hot_in = stream_enthalpy(model, hot_in)?;
        let h_cold_in = stream_enthalpy(model, cold_in)?;

        let (hot_outlet, duty) = match hot_side {
            HotSideSpec::OutletTemperature(t) => {
                let out = hot_in.with_state(hot_in.state().with_temperature(t)?);
                let h_out = stream_enthalpy(model, &out)?;
                (out, m_hot * (h_hot_in - h_out))
            }
            HotSideSpec::Duty(q) => {
                let h_out = h_hot_in - q.value / m_hot;
                let out = stream_at_enthalpy(model, hot_in, h_out, hot_in.pressure())?;
                (out, q.value)
            }
        };

        let h_cold_out = h_cold_in + duty / m_cold;
        let cold_outlet = stream_at_enthalpy(model, cold_in, h_cold_out, cold_in.pressure())?;

        let c_hot = capacity_rate(model, hot_in, hot_outlet.temperature())?;
        let c_cold = capacity_rate(model, cold_in, cold_outlet.temperature())?;
        let dt_max = hot_in.temperature().value - cold_in.temperature().value;
        if dt_max == 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "hot and cold inlets are at the same temperature",
            });
        }
        let effectiveness = duty.abs() / (c_hot.min(c_cold) * dt_max.abs());
        if effectiveness > 1.0 {
            warn!(
                exchanger = %self.name,
                effectiveness, "rated effectiveness exceeds one"
            );
        }

        Ok(HeatExchangerResult {
            hot_outlet,
            cold_outlet,
            duty: w(duty),
            effectiveness,
            c_hot,
            c_cold,
            hot_balance: EnergyBalance::heat(w(-duty)),
            cold_balance: EnergyBalance::heat(w(duty)),
            iterations: 0,
        })
    }

    /// Duty-given mode: find both outlet temperatures for a target
    /// effectiveness, iterating the mean-temperature capacity rates to
    /// self-consistency.
    pub fn solve_for_effectiveness(
        &self,
        model: &dyn GasStateModel,
        hot_in: &StreamState,
        cold_in: &StreamState,
        effectiveness: f64,
    ) -> ComponentResult<HeatExchangerResult> {
        if !(0.0..=1.0).contains(&effectiveness) {
            return Err(ComponentError::InvalidArg {
                what: "effectiveness must be in [0, 1]",
            });
        }
        check_streams(hot_in, cold_in)?;

        let m_hot = hot_in.mass_flow().value;
        let m_cold = cold_in.mass_flow().value;
        let h_hot_in = stream_enthalpy(model, hot_in)?;
        let h_cold_in = stream_enthalpy(model, cold_in)?;
        let dt_max = hot_in.temperature().value - cold_in.temperature().value;

        // the first pass sees outlet = inlet, i.e. inlet heat capacities
        let initial = vec![hot_in.temperature().value, cold_in.temperature().value];
        let result = self.solver.run(initial, |guess| {
            let c_hot = capacity_rate(model, hot_in, k(guess[0]))?;
            let c_cold = capacity_rate(model, cold_in, k(guess[1]))?;
            let q = effectiveness * c_hot.min(c_cold) * dt_max;
            let t_hot = model.state_from_enthalpy(
                h_hot_in - q / m_hot,
                hot_in.pressure(),
                hot_in.composition(),
            )?;
            let t_cold = model.state_from_enthalpy(
                h_cold_in + q / m_cold,
                cold_in.pressure(),
                cold_in.composition(),
            )?;
            Ok::<_, ComponentError>(Step::of_guess(vec![t_hot.value, t_cold.value]))
        })?;
        let result = result.require_converged("heat exchanger capacity-rate loop")?;
        debug!(
            exchanger = %self.name,
            iterations = result.iterations,
            residual = result.residual,
            "heat exchanger converged"
        );

        let hot_outlet = hot_in.with_state(hot_in.state().with_temperature(k(result.solution[0]))?);
        let cold_outlet =
            cold_in.with_state(cold_in.state().with_temperature(k(result.solution[1]))?);
        let duty = m_hot * (h_hot_in - stream_enthalpy(model, &hot_outlet)?);
        let c_hot = capacity_rate(model, hot_in, hot_outlet.temperature())?;
        let c_cold = capacity_rate(model, cold_in, cold_outlet.temperature())?;

        Ok(HeatExchangerResult {
            hot_outlet,
            cold_outlet,
            duty: w(duty),
            effectiveness,
            c_hot,
            c_cold,
            hot_balance: EnergyBalance::heat(w(-duty)),
            cold_balance: EnergyBalance::heat(w(duty)),
            iterations: result.iterations,
        })
    }
}

fn check_streams(hot_in: &StreamState, cold_in: &StreamState) -> ComponentResult<()> {
    hot_in.require_flow()?;
    cold_in.require_flow()?;
    Ok(())
}

/// `ṁ · cp` at the mean of the inlet and `t_out` [W/K].
fn capacity_rate(
    model: &dyn GasStateModel,
    inlet: &StreamState,
    t_out: Temperature,
) -> ComponentResult<f64> {
    let t_mean = 0.5 * (inlet.temperature().value + t_out.value);
    let mean = GasState::from_pt(inlet.pressure(), k(t_mean), inlet.composition().clone())?;
    let c = inlet.mass_flow().value * model.cp(&mean)?;
    if !c.is_finite() || c <= 0.0 {
        return Err(ComponentError::InvalidStreamState {
            what: "heat-capacity rate must be positive",
        });
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{kgps, pa};
    use sf_gas::{Composition, IdealGasModel, Species};

    fn air() -> Composition {
        Composition::new_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.79)]).unwrap()
    }

    fn stream(t: f64, mdot: f64) -> StreamState {
        StreamState::new(
            GasState::from_pt(pa(101325.0), k(t), air()).unwrap(),
            kgps(mdot),
        )
        .unwrap()
    }

    #[test]
    fn rating_conserves_energy() {
        let model = IdealGasModel::default();
        let hx = HeatExchanger::new("recuperator");
        let hot = stream(1000.0, 0.5);
        let cold = stream(300.0, 0.4);
        let r = hx
            .rate(&model, &hot, &cold, HotSideSpec::OutletTemperature(k(900.0)))
            .unwrap();
        let dh_hot = 0.5 * (model.h(hot.state()).unwrap() - model.h(r.hot_outlet.state()).unwrap());
        let dh_cold =
            0.4 * (model.h(r.cold_outlet.state()).unwrap() - model.h(cold.state()).unwrap());
        assert!((dh_hot - dh_cold).abs() < 1e-6 * dh_hot);
        assert!(r.effectiveness > 0.0 && r.effectiveness < 1.0);
        assert_eq!(r.hot_balance.heat.value, -r.cold_balance.heat.value);
    }

    #[test]
    fn duty_given_reaches_target() {
        let model = IdealGasModel::default();
        let hx = HeatExchanger::new("recuperator");
        let hot = stream(1100.0, 0.3);
        let cold = stream(300.0, 0.35);
        let r = hx.solve_for_effectiveness(&model, &hot, &cold, 0.8).unwrap();
        assert!(r.iterations >= 2);
        // re-rating the solved outlet gives back the target
        let check = hx
            .rate(
                &model,
                &hot,
                &cold,
                HotSideSpec::OutletTemperature(r.hot_outlet.temperature()),
            )
            .unwrap();
        assert!((check.effectiveness - 0.8).abs() < 1e-4, "{}", check.effectiveness);
        assert!(
            (check.cold_outlet.temperature().value - r.cold_outlet.temperature().value).abs()
                < 1e-2
        );
    }

    #[test]
    fn zero_effectiveness_leaves_streams_unchanged() {
        let model = IdealGasModel::default();
        let hx = HeatExchanger::new("hx");
        let r = hx
            .solve_for_effectiveness(&model, &stream(900.0, 1.0), &stream(400.0, 1.0), 0.0)
            .unwrap();
        assert!((r.hot_outlet.temperature().value - 900.0).abs() < 1e-6);
        assert!(r.duty.value.abs() < 1.0);
    }

    #[test]
    fn zero_flow_is_invalid_stream() {
        let model = IdealGasModel::default();
        let hx = HeatExchanger::new("hx");
        let err = hx
            .solve_for_effectiveness(&model, &stream(900.0, 0.0), &stream(400.0, 1.0), 0.5)
            .unwrap_err();
        assert!(matches!(err, ComponentError::InvalidStreamState { .. }));
        let err = hx
            .rate(&model, &stream(900.0, 1.0), &stream(400.0, 0.0), HotSideSpec::Duty(w(1e3)))
            .unwrap_err();
        assert!(matches!(err, ComponentError::InvalidStreamState { .. }));
    }

    #[test]
    fn effectiveness_out_of_range_is_rejected() {
        let model = IdealGasModel::default();
        let hx = HeatExchanger::new("hx");
        for eff in [-0.1, 1.2, f64::NAN] {
            let err = hx
                .solve_for_effectiveness(&model, &stream(900.0, 1.0), &stream(400.0, 1.0), eff)
                .unwrap_err();
            assert!(matches!(err, ComponentError::InvalidArg { .. }));
        }
    }
}
