//! Air-cooled heat rejection with a forced-draft fan.
//!
//! The hot stream is cooled to a set temperature and the heat goes to
//! ambient air:
//!
//! ```text
//! T_air,out = Q / (U·A) + T_amb
//! ṁ_air     = Q / (cp · (T_air,out − T_amb))
//! P_fan     = ṁ_air · cp · T_amb / η · (((Δp + P_amb) / P_amb)^((γ−1)/γ) − 1)
//! ```
//!
//! Air properties are taken at ambient conditions.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{EnergyBalance, check_fraction, check_positive, stream_enthalpy};
use sf_core::units::{Area, MassRate, Power, Pressure, Temperature, k, kgps, m2, pa, w};
use sf_gas::{Composition, GasState, GasStateModel, Species, StreamState};
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct FanConfig {
    /// Overall heat transfer coefficient [W/(m²·K)]
    pub u: f64,
    pub area: Area,
    pub ambient_temperature: Temperature,
    pub ambient_pressure: Pressure,
    pub efficiency: f64,
    pub pressure_rise: Pressure,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            u: 8.0,
            area: m2(14.9),
            ambient_temperature: k(303.15),
            ambient_pressure: pa(101_325.0),
            efficiency: 0.85,
            pressure_rise: pa(300.0),
        }
    }
}

impl FanConfig {
    pub fn validate(&self) -> ComponentResult<()> {
        check_positive(self.u, "heat transfer coefficient must be positive")?;
        check_positive(self.area.value, "heat transfer area must be positive")?;
        check_positive(
            self.ambient_temperature.value,
            "ambient temperature must be positive",
        )?;
        check_positive(self.ambient_pressure.value, "ambient pressure must be positive")?;
        check_fraction(self.efficiency, "fan efficiency must be in (0,1]")?;
        check_positive(self.pressure_rise.value, "fan pressure rise must be positive")?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FanResult {
    pub hot_outlet: StreamState,
    /// Heat rejected to the air.
    pub duty: Power,
    pub air_outlet_temperature: Temperature,
    /// Log-mean temperature difference [K]
    pub lmtd: f64,
    pub air_mass_flow: MassRate,
    pub power: Power,
    /// Balance of the cooled stream.
    pub balance: EnergyBalance,
}

#[derive(Clone, Debug)]
pub struct Fan {
    pub name: String,
    pub config: FanConfig,
}

impl Fan {
    pub fn new(name: impl Into<String>, config: FanConfig) -> ComponentResult<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
        })
    }

    fn air() -> ComponentResult<Composition> {
        Ok(Composition::new_mole_fractions(vec![
            (Species::O2, 0.21),
            (Species::N2, 0.79),
        ])?)
    }

    /// Cool `hot_in` to `t_out` at constant pressure and size the air side.
    pub fn reject(
        &self,
        model: &dyn GasStateModel,
        hot_in: &StreamState,
        t_out: Temperature,
    ) -> ComponentResult<FanResult> {
        hot_in.require_flow()?;
        let cfg = &self.config;
        let hot_outlet = hot_in.with_state(hot_in.state().with_temperature(t_out)?);
        let duty = hot_in.mass_flow().value
            * (stream_enthalpy(model, hot_in)? - stream_enthalpy(model, &hot_outlet)?);
        if duty <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "fan duty must be positive; outlet is not cooler than inlet",
            });
        }

        let t_amb = cfg.ambient_temperature.value;
        let t_air_out = duty / (cfg.u * cfg.area.value) + t_amb;
        let lmtd = log_mean(
            hot_in.temperature().value - t_air_out,
            t_out.value - t_amb,
        )?;

        let ambient =
            GasState::from_pt(cfg.ambient_pressure, cfg.ambient_temperature, Self::air()?)?;
        let props = model.properties_at(&ambient)?;
        let gamma = props.gamma();
        let m_air = duty / (props.cp * (t_air_out - t_amb));
        let p_amb = cfg.ambient_pressure.value;
        let pressure_term =
            ((cfg.pressure_rise.value + p_amb) / p_amb).powf((gamma - 1.0) / gamma) - 1.0;
        let power = m_air * props.cp * t_amb / cfg.efficiency * pressure_term;
        debug!(
            fan = %self.name,
            duty,
            m_air,
            power,
            lmtd,
            "fan sized"
        );

        Ok(FanResult {
            hot_outlet,
            duty: w(duty),
            air_outlet_temperature: k(t_air_out),
            lmtd,
            air_mass_flow: kgps(m_air),
            power: w(power),
            balance: EnergyBalance::heat(w(-duty)),
        })
    }
}

/// LMTD of two terminal differences; both must be positive.
fn log_mean(dt_a: f64, dt_b: f64) -> ComponentResult<f64> {
    if dt_a <= 0.0 || dt_b <= 0.0 {
        return Err(ComponentError::Infeasible {
            what: "temperature cross between the cooled stream and the air",
        });
    }
    if (dt_a - dt_b).abs() <= 1e-12 * dt_a.max(dt_b) {
        return Ok(0.5 * (dt_a + dt_b));
    }
    Ok((dt_a - dt_b) / (dt_a / dt_b).ln())
}
