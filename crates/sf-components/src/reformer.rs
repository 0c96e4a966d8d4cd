//! Steam-methane reformer held at a fixed outlet temperature.
//!
//! The polynomial model reforms all methane (`CH₄ + H₂O → CO + 3H₂`) and
//! then places the water-gas shift `CO + H₂O ⇌ CO₂ + H₂` at equilibrium.
//! Per mole of feed with methane fraction `c` and steam fraction `w`, the
//! shift extent `x` (outlet CO₂ before renormalisation) solves
//!
//! ```text
//! (Kp − 1)·x² − (Kp·w + 3c)·x + Kp·c·(w − c) = 0
//! ```
//!
//! and the outlet holds `CO = c − x`, `H₂O = w − c − x`, `H₂ = 3c + x`.
//! The Gibbs model equilibrates the whole feed instead.

use std::fmt;

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{EnergyBalance, ProcessUnit, UnitOutlet, stream_enthalpy};
use sf_core::units::{MassRate, Pressure, Temperature, w};
use sf_gas::{Composition, Element, GasState, GasStateModel, Species, StreamState};
use tracing::{debug, warn};

/// Van't Hoff-type correlation `ln Kp = a / T + b` for the shift reaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShiftEquilibrium {
    /// [K]
    pub a: f64,
    pub b: f64,
}

impl Default for ShiftEquilibrium {
    fn default() -> Self {
        Self {
            a: 4276.0,
            b: -3.961,
        }
    }
}

impl ShiftEquilibrium {
    pub fn kp(&self, t: Temperature) -> f64 {
        (self.a / t.value + self.b).exp()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReformerModel {
    ShiftPolynomial(ShiftEquilibrium),
    GibbsEquilibrium,
}

impl Default for ReformerModel {
    fn default() -> Self {
        ReformerModel::ShiftPolynomial(ShiftEquilibrium::default())
    }
}

impl fmt::Display for ReformerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReformerModel::ShiftPolynomial(_) => write!(f, "shift-polynomial"),
            ReformerModel::GibbsEquilibrium => write!(f, "gibbs-equilibrium"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReformerResult {
    pub outlet: StreamState,
    pub balance: EnergyBalance,
    /// Heat added per kg of feed [J/kg].
    pub heat_per_kg: f64,
    /// Shift constant at the outlet temperature (polynomial model only).
    pub kp: Option<f64>,
    /// Shift extent per mole of feed (polynomial model only).
    pub shift_extent: Option<f64>,
    /// Largest of the relative shift residual and element imbalance.
    pub residual: f64,
}

#[derive(Clone, Debug)]
pub struct Reformer {
    pub name: String,
    pub outlet_temperature: Temperature,
    pub model: ReformerModel,
    /// Residual above which a warning is logged.
    pub residual_warning: f64,
}

impl Reformer {
    pub fn new(name: impl Into<String>, outlet_temperature: Temperature) -> Self {
        Self {
            name: name.into(),
            outlet_temperature,
            model: ReformerModel::default(),
            residual_warning: 1e-6,
        }
    }

    pub fn with_model(mut self, model: ReformerModel) -> Self {
        self.model = model;
        self
    }

    pub fn reform(
        &self,
        model: &dyn GasStateModel,
        inlet: &StreamState,
    ) -> ComponentResult<ReformerResult> {
        inlet.require_flow()?;
        let feed = inlet.composition();
        check_feed(feed)?;
        let p = inlet.pressure();
        let t_out = self.outlet_temperature;

        let (composition, kp, extent, shift_err) = match self.model {
            ReformerModel::ShiftPolynomial(shift) => {
                let kp = shift.kp(t_out);
                let c = feed.mole_fraction(Species::CH4);
                let w_steam = feed.mole_fraction(Species::H2O);
                let x = shift_extent(kp, c, w_steam)?;

                let mut n = *feed.mole_fractions();
                n[Species::CH4.index()] = 0.0;
                n[Species::CO.index()] = (c - x).max(0.0);
                n[Species::CO2.index()] = x;
                n[Species::H2O.index()] = (w_steam - c - x).max(0.0);
                n[Species::H2.index()] = 3.0 * c + x;
                let out = Composition::from_moles(&n)?;
                let residual = shift_residual(kp, &out);
                (out, Some(kp), Some(x), residual)
            }
            ReformerModel::GibbsEquilibrium => {
                (model.equilibrate(t_out, p, feed)?, None, None, 0.0)
            }
        };

        let residual = shift_err.max(element_imbalance(feed, &composition));
        if residual > self.residual_warning {
            warn!(reformer = %self.name, residual, "reformer balance residual is large");
        }

        let outlet = inlet.with_state(GasState::from_pt(p, t_out, composition)?);
        let heat_per_kg = stream_enthalpy(model, &outlet)? - stream_enthalpy(model, inlet)?;
        let heat = heat_per_kg * inlet.mass_flow().value;
        debug!(
            reformer = %self.name,
            model = %self.model,
            heat,
            residual,
            "reformer solved"
        );

        Ok(ReformerResult {
            outlet,
            balance: EnergyBalance::heat(w(heat)),
            heat_per_kg,
            kp,
            shift_extent: extent,
            residual,
        })
    }
}

impl ProcessUnit for Reformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        model: &dyn GasStateModel,
        inlet: &StreamState,
    ) -> ComponentResult<UnitOutlet> {
        let r = self.reform(model, inlet)?;
        Ok(UnitOutlet {
            outlet: r.outlet,
            balance: r.balance,
        })
    }
}

/// Steam-methane feed stream from component mass flows.
pub fn steam_methane_feed(
    m_ch4: MassRate,
    m_h2o: MassRate,
    t: Temperature,
    p: Pressure,
) -> ComponentResult<StreamState> {
    let comp = Composition::new_mass_fractions(vec![
        (Species::CH4, m_ch4.value),
        (Species::H2O, m_h2o.value),
    ])?;
    Ok(StreamState::new(
        GasState::from_pt(p, t, comp)?,
        m_ch4 + m_h2o,
    )?)
}

/// Physical root of the shift polynomial for feed fractions `c` (CH₄) and
/// `w` (H₂O).
pub fn shift_extent(kp: f64, c: f64, w: f64) -> ComponentResult<f64> {
    if !kp.is_finite() || kp < 0.0 {
        return Err(ComponentError::InvalidArg {
            what: "shift constant must be finite and non-negative",
        });
    }
    if w < c {
        return Err(ComponentError::NoPhysicalRoot {
            kp,
            what: "insufficient steam to reform the methane",
        });
    }
    let upper = c.min(w - c);
    let qa = kp - 1.0;
    let qb = -(kp * w + 3.0 * c);
    let qc = kp * c * (w - c);

    let candidates: Vec<f64> = if qa == 0.0 {
        if qb == 0.0 {
            vec![0.0]
        } else {
            vec![-qc / qb]
        }
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return Err(ComponentError::NoPhysicalRoot {
                kp,
                what: "complex roots",
            });
        }
        // cancellation-free pair
        let q = -0.5 * (qb + qb.signum() * disc.sqrt());
        if q == 0.0 {
            vec![0.0]
        } else {
            vec![q / qa, qc / q]
        }
    };

    let tol = 1e-9 * upper.max(1e-12);
    candidates
        .into_iter()
        .filter(|x| x.is_finite() && *x >= -tol && *x <= upper + tol && *x <= 1.0)
        .map(|x| x.clamp(0.0, upper))
        .next()
        .ok_or(ComponentError::NoPhysicalRoot {
            kp,
            what: "no root gives non-negative species",
        })
}

fn check_feed(feed: &Composition) -> ComponentResult<()> {
    let allowed = [Species::CH4, Species::H2O, Species::N2, Species::Ar];
    if feed.iter().any(|(s, _)| !allowed.contains(&s)) {
        return Err(ComponentError::InvalidStreamState {
            what: "reformer feed may only hold CH4, H2O, N2 and Ar",
        });
    }
    Ok(())
}

/// |Kp·CO·H₂O − CO₂·H₂| relative to the larger side.
fn shift_residual(kp: f64, out: &Composition) -> f64 {
    let lhs = kp * out.mole_fraction(Species::CO) * out.mole_fraction(Species::H2O);
    let rhs = out.mole_fraction(Species::CO2) * out.mole_fraction(Species::H2);
    let scale = lhs.max(rhs);
    if scale <= 0.0 {
        0.0
    } else {
        (lhs - rhs).abs() / scale
    }
}

/// Largest change in element atom fractions between two compositions.
fn element_imbalance(a: &Composition, b: &Composition) -> f64 {
    let fractions = |c: &Composition| {
        let moles = c.element_moles();
        let total: f64 = moles.iter().sum();
        moles.map(|m| if total > 0.0 { m / total } else { 0.0 })
    };
    let (fa, fb) = (fractions(a), fractions(b));
    Element::ALL
        .iter()
        .map(|e| (fa[e.index()] - fb[e.index()]).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{k, kgps, pa};
    use sf_gas::IdealGasModel;

    fn feed(t: f64) -> StreamState {
        steam_methane_feed(kgps(0.1), kgps(0.2), k(t), pa(101325.0)).unwrap()
    }

    #[test]
    fn kp_correlation() {
        let shift = ShiftEquilibrium::default();
        let kp = shift.kp(k(1100.0));
        assert!((kp - 0.929).abs() < 5e-3, "{kp}");
        assert!(shift.kp(k(500.0)) > shift.kp(k(1000.0)));
    }

    #[test]
    fn extent_limits() {
        // Kp = 1 is the linear case
        let x = shift_extent(1.0, 0.25, 0.75).unwrap();
        assert!((x - 0.25 * 0.5 / 1.5).abs() < 1e-12);
        // no shift at Kp = 0
        assert_eq!(shift_extent(0.0, 0.25, 0.75).unwrap(), 0.0);
        // complete shift with excess steam
        let x = shift_extent(1e12, 0.25, 0.75).unwrap();
        assert!((x - 0.25).abs() < 1e-9);
    }

    #[test]
    fn insufficient_steam_has_no_root() {
        let err = shift_extent(0.9, 0.6, 0.4).unwrap_err();
        assert!(matches!(err, ComponentError::NoPhysicalRoot { .. }));
    }

    #[test]
    fn polynomial_outlet_satisfies_shift_equilibrium() {
        let model = IdealGasModel::default();
        let reformer = Reformer::new("reformer", k(1100.0));
        let r = reformer.reform(&model, &feed(700.0)).unwrap();
        let out = r.outlet.composition();
        assert_eq!(out.mole_fraction(Species::CH4), 0.0);
        let kp = r.kp.unwrap();
        let q = out.mole_fraction(Species::CO2) * out.mole_fraction(Species::H2)
            / (out.mole_fraction(Species::CO) * out.mole_fraction(Species::H2O));
        assert!((q / kp - 1.0).abs() < 1e-9);
        assert!(r.residual < 1e-9);
        // endothermic
        assert!(r.heat_per_kg > 0.0);
        assert!((r.balance.heat.value - 0.3 * r.heat_per_kg).abs() < 1e-6 * r.balance.heat.value);
    }

    #[test]
    fn gibbs_model_conserves_elements() {
        let model = IdealGasModel::default();
        let reformer =
            Reformer::new("reformer", k(1100.0)).with_model(ReformerModel::GibbsEquilibrium);
        let r = reformer.reform(&model, &feed(700.0)).unwrap();
        assert!(r.kp.is_none());
        assert!(r.residual < 1e-8);
        assert!(r.outlet.composition().mole_fraction(Species::H2) > 0.5);
        assert!((r.outlet.mass_flow().value - 0.3).abs() < 1e-12);
    }

    #[test]
    fn inerts_pass_through() {
        let model = IdealGasModel::default();
        let comp = Composition::new_mole_fractions(vec![
            (Species::CH4, 0.2),
            (Species::H2O, 0.6),
            (Species::N2, 0.2),
        ])
        .unwrap();
        let inlet = StreamState::new(
            GasState::from_pt(pa(101325.0), k(800.0), comp).unwrap(),
            kgps(0.1),
        )
        .unwrap();
        let r = Reformer::new("r", k(1000.0)).reform(&model, &inlet).unwrap();
        let n2_moles_out = r.outlet.species_molar_flows()[Species::N2.index()];
        let n2_moles_in = inlet.species_molar_flows()[Species::N2.index()];
        assert!((n2_moles_out - n2_moles_in).abs() < 1e-12);
    }

    #[test]
    fn foreign_feed_species_rejected() {
        let model = IdealGasModel::default();
        let comp =
            Composition::new_mole_fractions(vec![(Species::CH4, 0.3), (Species::H2, 0.7)]).unwrap();
        let inlet = StreamState::new(
            GasState::from_pt(pa(101325.0), k(800.0), comp).unwrap(),
            kgps(0.1),
        )
        .unwrap();
        let err = Reformer::new("r", k(1000.0)).reform(&model, &inlet).unwrap_err();
        assert!(matches!(err, ComponentError::InvalidStreamState { .. }));
    }
}
