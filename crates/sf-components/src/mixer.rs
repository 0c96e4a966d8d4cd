//! Adiabatic mixing of several streams.

use crate::error::{ComponentError, ComponentResult};
use sf_core::units::{Pressure, kgps};
use sf_gas::{Composition, GasState, GasStateModel, StreamState};
use tracing::debug;

/// Which inlet sets the outlet pressure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutletPressure {
    #[default]
    FirstInlet,
    Lowest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MixerResult {
    pub outlet: StreamState,
    /// Entropy generated by mixing [W/K].
    pub entropy_generation: f64,
}

#[derive(Clone, Debug)]
pub struct Mixer {
    pub name: String,
    pub outlet_pressure: OutletPressure,
}

impl Mixer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outlet_pressure: OutletPressure::default(),
        }
    }

    pub fn with_outlet_pressure(mut self, outlet_pressure: OutletPressure) -> Self {
        self.outlet_pressure = outlet_pressure;
        self
    }

    /// Mix `inlets` at constant total enthalpy. Zero-flow inlets are ignored
    /// apart from their pressure.
    pub fn mix(
        &self,
        model: &dyn GasStateModel,
        inlets: &[StreamState],
    ) -> ComponentResult<MixerResult> {
        let first = inlets.first().ok_or(ComponentError::InvalidArg {
            what: "mixer needs at least one inlet",
        })?;
        let p_out: Pressure = match self.outlet_pressure {
            OutletPressure::FirstInlet => first.pressure(),
            OutletPressure::Lowest => inlets
                .iter()
                .map(|s| s.pressure())
                .fold(first.pressure(), |a, b| if b < a { b } else { a }),
        };

        let flowing: Vec<&StreamState> = inlets
            .iter()
            .filter(|s| s.mass_flow().value > 0.0)
            .collect();
        let m_total: f64 = flowing.iter().map(|s| s.mass_flow().value).sum();
        if m_total <= 0.0 {
            return Err(ComponentError::InvalidStreamState {
                what: "mixer inlets carry no flow",
            });
        }

        let mut enthalpy = 0.0;
        let mut entropy_in = 0.0;
        let mut parts = Vec::with_capacity(flowing.len());
        for s in &flowing {
            let props = model.properties_at(s.state())?;
            enthalpy += s.mass_flow().value * props.h;
            entropy_in += s.mass_flow().value * props.s;
            parts.push((s.composition(), s.molar_flow()));
        }
        let comp = Composition::blend_molar(&parts)?;

        let h_out = enthalpy / m_total;
        let t_out = model.state_from_enthalpy(h_out, p_out, &comp)?;
        let outlet = StreamState::new(
            GasState::from_pt(p_out, t_out, comp)?,
            kgps(m_total),
        )?;
        let entropy_generation = m_total * model.s(outlet.state())? - entropy_in;
        debug!(
            mixer = %self.name,
            t_out = t_out.value,
            entropy_generation,
            "mixer solved"
        );

        Ok(MixerResult {
            outlet,
            entropy_generation,
        })
    }
}
