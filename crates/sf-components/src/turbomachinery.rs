//! Compressor and turbine with isentropic efficiency.
//!
//! ## Model
//!
//! The ideal exit state keeps the inlet entropy and composition at the exit
//! pressure:
//!
//! ```text
//! T_s = T(s_in, P_out)
//! turbine:    h_out = h_in − η · (h_in − h_s)
//! compressor: h_out = h_in + (h_s − h_in) / η
//! ```
//!
//! ## Sign Conventions
//!
//! The energy balance is seen from the stream: compressor work is positive,
//! turbine work negative.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{
    EnergyBalance, ProcessUnit, UnitOutlet, check_fraction, check_positive, stream_at_enthalpy,
    stream_enthalpy,
};
use sf_core::units::{Pressure, Temperature, k, w};
use sf_gas::{Composition, GasState, GasStateModel, SpecEnthalpy, StreamState};
use sf_solver::{ScanRange, golden_section, par_scan_minimize};
use tracing::debug;

/// Isentropic exit enthalpy at `p_out` for a stream starting at `inlet`.
fn isentropic_enthalpy(
    model: &dyn GasStateModel,
    inlet: &GasState,
    p_out: Pressure,
) -> ComponentResult<SpecEnthalpy> {
    let s_in = model.s(inlet)?;
    let t_s = model.state_from_entropy(s_in, p_out, inlet.composition())?;
    Ok(model.h(&GasState::from_pt(p_out, t_s, inlet.composition().clone())?)?)
}

#[derive(Clone, Debug)]
pub struct Compressor {
    pub name: String,
    /// Outlet over inlet pressure (>= 1)
    pub pressure_ratio: f64,
    /// Isentropic efficiency (0 < eta <= 1)
    pub eta: f64,
}

impl Compressor {
    pub fn new(name: impl Into<String>, pressure_ratio: f64, eta: f64) -> ComponentResult<Self> {
        check_ratio(pressure_ratio)?;
        check_fraction(eta, "compressor efficiency must be in (0,1]")?;
        Ok(Self {
            name: name.into(),
            pressure_ratio,
            eta,
        })
    }
}

impl ProcessUnit for Compressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        model: &dyn GasStateModel,
        inlet: &StreamState,
    ) -> ComponentResult<UnitOutlet> {
        let p_out = inlet.pressure() * self.pressure_ratio;
        let h_in = stream_enthalpy(model, inlet)?;
        let h_s = isentropic_enthalpy(model, inlet.state(), p_out)?;
        let h_out = h_in + (h_s - h_in) / self.eta;
        let outlet = stream_at_enthalpy(model, inlet, h_out, p_out)?;
        let work = inlet.mass_flow().value * (h_out - h_in);
        debug!(
            compressor = %self.name,
            t_out = outlet.temperature().value,
            work,
            "compressor solved"
        );
        Ok(UnitOutlet {
            outlet,
            balance: EnergyBalance::work(w(work)),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Turbine {
    pub name: String,
    /// Inlet over outlet pressure (>= 1)
    pub pressure_ratio: f64,
    /// Isentropic efficiency (0 < eta <= 1)
    pub eta: f64,
}

impl Turbine {
    pub fn new(name: impl Into<String>, pressure_ratio: f64, eta: f64) -> ComponentResult<Self> {
        check_ratio(pressure_ratio)?;
        check_fraction(eta, "turbine efficiency must be in (0,1]")?;
        Ok(Self {
            name: name.into(),
            pressure_ratio,
            eta,
        })
    }
}

impl ProcessUnit for Turbine {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        model: &dyn GasStateModel,
        inlet: &StreamState,
    ) -> ComponentResult<UnitOutlet> {
        let p_out = inlet.pressure() / self.pressure_ratio;
        let h_in = stream_enthalpy(model, inlet)?;
        let h_s = isentropic_enthalpy(model, inlet.state(), p_out)?;
        let h_out = h_in - self.eta * (h_in - h_s);
        let outlet = stream_at_enthalpy(model, inlet, h_out, p_out)?;
        let work = inlet.mass_flow().value * (h_out - h_in);
        debug!(
            turbine = %self.name,
            t_out = outlet.temperature().value,
            work,
            "turbine solved"
        );
        Ok(UnitOutlet {
            outlet,
            balance: EnergyBalance::work(w(work)),
        })
    }
}

fn check_ratio(pressure_ratio: f64) -> ComponentResult<()> {
    check_positive(pressure_ratio, "pressure ratio must be positive")?;
    if pressure_ratio < 1.0 {
        return Err(ComponentError::InvalidArg {
            what: "pressure ratio must be at least 1",
        });
    }
    Ok(())
}

/// Grid and refinement settings for [`search_compressor_inlet`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InletSearch {
    /// Lowest candidate inlet temperature [K]
    pub t_min: f64,
    /// Scan resolution [K]
    pub step: f64,
    /// Golden-section refinement around the best grid point.
    pub refine: bool,
    pub refine_tol: f64,
}

impl Default for InletSearch {
    fn default() -> Self {
        Self {
            t_min: 250.0,
            step: 1.0,
            refine: true,
            refine_tol: 1e-6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InletSearchResult {
    pub t_in: Temperature,
    pub h_in: SpecEnthalpy,
    /// Efficiency implied at `t_in`.
    pub efficiency: f64,
    /// |efficiency − target|
    pub mismatch: f64,
    pub evaluations: usize,
}

/// Find the inlet temperature at which `compressor` would need exactly its
/// own efficiency to reach the outlet enthalpy `h_out`.
///
/// The implied efficiency at inlet temperature `T` is
/// `(h_s(T) − h(T)) / (h_out − h(T))` with `h_s` the isentropic enthalpy at
/// the compressor outlet pressure. Candidates run from `search.t_min` up to
/// (not including) `t_max`, normally the compressor outlet temperature.
pub fn search_compressor_inlet(
    model: &dyn GasStateModel,
    compressor: &Compressor,
    comp: &Composition,
    p_in: Pressure,
    h_out: SpecEnthalpy,
    t_max: Temperature,
    search: &InletSearch,
) -> ComponentResult<InletSearchResult> {
    let target_eta = compressor.eta;
    let p_out = p_in * compressor.pressure_ratio;

    let implied = |t: f64| -> ComponentResult<(f64, SpecEnthalpy)> {
        let state = GasState::from_pt(p_in, k(t), comp.clone())?;
        let h = model.h(&state)?;
        let h_s = isentropic_enthalpy(model, &state, p_out)?;
        Ok(((h_s - h) / (h_out - h), h))
    };
    let mismatch = |t: f64| -> ComponentResult<f64> {
        let (eta, _) = implied(t)?;
        Ok((eta - target_eta).abs())
    };

    let hi = t_max.value - search.step;
    if hi <= search.t_min {
        return Err(ComponentError::Infeasible {
            what: "compressor outlet is below the inlet search range",
        });
    }
    let range = ScanRange::new(search.t_min, hi, search.step)?;
    let mut best = par_scan_minimize(&range, &mismatch)?;
    let grid_evaluations = best.evaluations;

    if search.refine {
        let lo = (best.x - search.step).max(range.lo);
        let up = (best.x + search.step).min(range.hi);
        if up > lo {
            let refined = golden_section(&mismatch, lo, up, search.refine_tol, 200)?;
            let evaluations = grid_evaluations + refined.evaluations;
            if refined.value <= best.value {
                best = refined;
            }
            best.evaluations = evaluations;
        }
    }

    let (efficiency, h_in) = implied(best.x)?;
    debug!(
        t_in = best.x,
        efficiency,
        evaluations = best.evaluations,
        "compressor inlet search finished"
    );
    Ok(InletSearchResult {
        t_in: k(best.x),
        h_in,
        efficiency,
        mismatch: (efficiency - target_eta).abs(),
        evaluations: best.evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{kgps, pa};
    use sf_gas::Species;

    fn air() -> Composition {
        Composition::new_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.79)]).unwrap()
    }

    fn air_stream(t: f64, p: f64) -> StreamState {
        StreamState::new(GasState::from_pt(pa(p), k(t), air()).unwrap(), kgps(1.0)).unwrap()
    }

    #[test]
    fn ideal_compression_matches_isentropic_relation() {
        let model = sf_gas::IdealGasModel::default();
        let c = Compressor::new("c", 4.0, 1.0).unwrap();
        let out = c.process(&model, &air_stream(300.0, 1e5)).unwrap();
        // cp varies a little over the range, so compare loosely with γ = 1.4
        let t_ideal = 300.0 * 4.0_f64.powf(0.4 / 1.4);
        assert!((out.outlet.temperature().value - t_ideal).abs() < 5.0);
        assert_eq!(out.outlet.pressure().value, 4e5);
        assert!(out.balance.work.value > 0.0);
        assert_eq!(out.balance.heat.value, 0.0);
    }

    #[test]
    fn losses_heat_the_outlet() {
        let model = sf_gas::IdealGasModel::default();
        let inlet = air_stream(300.0, 1e5);
        let ideal = Compressor::new("c", 3.0, 1.0).unwrap().process(&model, &inlet).unwrap();
        let real = Compressor::new("c", 3.0, 0.8).unwrap().process(&model, &inlet).unwrap();
        assert!(real.outlet.temperature() > ideal.outlet.temperature());
        let ratio = ideal.balance.work.value / real.balance.work.value;
        assert!((ratio - 0.8).abs() < 1e-6);

        let hot = air_stream(1200.0, 4e5);
        let ideal = Turbine::new("t", 4.0, 1.0).unwrap().process(&model, &hot).unwrap();
        let real = Turbine::new("t", 4.0, 0.85).unwrap().process(&model, &hot).unwrap();
        assert!(real.outlet.temperature() > ideal.outlet.temperature());
        assert!(real.balance.work.value < 0.0);
        let ratio = real.balance.work.value / ideal.balance.work.value;
        assert!((ratio - 0.85).abs() < 1e-6);
    }

    #[test]
    fn invalid_parameters() {
        assert!(Compressor::new("c", 0.5, 0.8).is_err());
        assert!(Compressor::new("c", 2.0, 0.0).is_err());
        assert!(Turbine::new("t", 2.0, 1.1).is_err());
        assert!(Turbine::new("t", f64::NAN, 0.9).is_err());
    }

    #[test]
    fn inlet_search_recovers_known_efficiency() {
        let model = sf_gas::IdealGasModel::default();
        let comp = air();
        // build a compressor outlet from a 320 K inlet at eta 0.8
        let inlet = StreamState::new(
            GasState::from_pt(pa(1e5), k(320.0), comp.clone()).unwrap(),
            kgps(1.0),
        )
        .unwrap();
        let out = Compressor::new("c", 3.5, 0.8).unwrap().process(&model, &inlet).unwrap();
        let h_out = model.h(out.outlet.state()).unwrap();

        let compressor = Compressor::new("c", 3.5, 0.8).unwrap();
        let found = search_compressor_inlet(
            &model,
            &compressor,
            &comp,
            pa(1e5),
            h_out,
            out.outlet.temperature(),
            &InletSearch::default(),
        )
        .unwrap();
        assert!((found.t_in.value - 320.0).abs() < 0.05, "{}", found.t_in.value);
        assert!(found.mismatch < 1e-4);

        let coarse = InletSearch {
            refine: false,
            ..InletSearch::default()
        };
        let grid = search_compressor_inlet(
            &model,
            &compressor,
            &comp,
            pa(1e5),
            h_out,
            out.outlet.temperature(),
            &coarse,
        )
        .unwrap();
        assert_eq!(grid.t_in.value, 320.0);
    }

    #[test]
    fn inlet_search_rejects_a_step_too_fine_to_scan() {
        let model = sf_gas::IdealGasModel::default();
        let fine = InletSearch {
            step: 1e-9,
            ..InletSearch::default()
        };
        let err = search_compressor_inlet(
            &model,
            &Compressor::new("c", 4.0, 0.8).unwrap(),
            &air(),
            pa(1e5),
            6.0e5,
            k(640.0),
            &fine,
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::InvalidArg { .. }));
    }

    #[test]
    fn inlet_search_needs_room_below_outlet() {
        let model = sf_gas::IdealGasModel::default();
        let err = search_compressor_inlet(
            &model,
            &Compressor::new("c", 2.0, 0.8).unwrap(),
            &air(),
            pa(1e5),
            3.0e5,
            k(240.0),
            &InletSearch::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::Infeasible { .. }));
    }
}
