//! Initial cylinder charge of a hydrogen-fuelled piston engine.
//!
//! At bottom dead centre the cylinder holds fresh intake, exhaust pushed
//! back from the manifold and the exhaust left in the clearance volume.
//! With `m = P·V / (R_mix·T)` the charge temperature satisfies the
//! open-system balance
//!
//! ```text
//! m·u(T) = m_int·h_int + m_res·h_res + m_clr·(u_clr − h_res) − P·(V − V_c)
//! ```
//!
//! where `m_res = rmf·m` is all residual gas, `m_clr` the part of it
//! already in the clearance volume and `m_int = (1 − rmf)·m`.

use std::f64::consts::PI;

use crate::error::{ComponentError, ComponentResult};
use crate::traits::check_positive;
use sf_core::units::constants::R_UNIVERSAL;
use sf_core::units::{Length, Pressure, Temperature, k, m, pa};
use sf_gas::{Composition, GasState, GasStateModel, Species};
use sf_solver::{RootConfig, bisect};
use tracing::debug;

/// Cylinder dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CylinderGeometry {
    pub bore: Length,
    pub stroke: Length,
    pub compression_ratio: f64,
}

impl Default for CylinderGeometry {
    fn default() -> Self {
        Self {
            bore: m(0.1),
            stroke: m(0.15),
            compression_ratio: 12.0,
        }
    }
}

impl CylinderGeometry {
    pub fn validate(&self) -> ComponentResult<()> {
        check_positive(self.bore.value, "bore must be positive")?;
        check_positive(self.stroke.value, "stroke must be positive")?;
        if !self.compression_ratio.is_finite() || self.compression_ratio <= 1.0 {
            return Err(ComponentError::InvalidArg {
                what: "compression ratio must exceed 1",
            });
        }
        Ok(())
    }

    /// Swept volume [m³].
    pub fn displacement(&self) -> f64 {
        PI / 4.0 * self.bore.value.powi(2) * self.stroke.value
    }

    /// Clearance volume [m³].
    pub fn clearance_volume(&self) -> f64 {
        self.displacement() / (self.compression_ratio - 1.0)
    }

    /// Volume at bottom dead centre [m³].
    pub fn total_volume(&self) -> f64 {
        self.displacement() + self.clearance_volume()
    }
}

/// Operating point for the charge calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChargeConditions {
    /// Fuel-air equivalence ratio of the intake (0 for air only).
    pub equivalence_ratio: f64,
    /// Residual gas mass fraction.
    pub residual_fraction: f64,
    pub intake_temperature: Temperature,
    pub exhaust_temperature: Temperature,
    pub clearance_temperature: Temperature,
    pub pressure: Pressure,
    /// Exhaust of a previous cycle; complete-combustion products when unset.
    pub residual_composition: Option<Composition>,
}

impl Default for ChargeConditions {
    fn default() -> Self {
        Self {
            equivalence_ratio: 0.85,
            residual_fraction: 0.1,
            intake_temperature: k(300.0),
            exhaust_temperature: k(800.0),
            clearance_temperature: k(800.0),
            pressure: pa(101_325.0),
            residual_composition: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CylinderCharge {
    pub composition: Composition,
    pub temperature: Temperature,
    pub pressure: Pressure,
    /// [kg]
    pub total_mass: f64,
    pub intake_mass: f64,
    /// Exhaust drawn back into the cylinder beyond the clearance gas.
    pub backflow_mass: f64,
    pub clearance_mass: f64,
    pub iterations: usize,
}

/// H₂–air intake at equivalence ratio `phi`.
pub fn hydrogen_air_intake(phi: f64) -> ComponentResult<Composition> {
    if !phi.is_finite() || phi < 0.0 {
        return Err(ComponentError::InvalidArg {
            what: "equivalence ratio must be non-negative",
        });
    }
    if phi > 1.0 {
        return Err(ComponentError::InvalidArg {
            what: "rich intake cannot be burnt to completion",
        });
    }
    Ok(Composition::new_mole_fractions(vec![
        (Species::H2, phi),
        (Species::O2, 0.5),
        (Species::N2, 0.5 * 3.76),
    ])?)
}

/// Charge temperature and mass split at bottom dead centre.
pub fn initialize_charge(
    model: &dyn GasStateModel,
    geometry: &CylinderGeometry,
    conditions: &ChargeConditions,
    root: &RootConfig,
) -> ComponentResult<CylinderCharge> {
    geometry.validate()?;
    let rmf = conditions.residual_fraction;
    if !(0.0..1.0).contains(&rmf) {
        return Err(ComponentError::InvalidArg {
            what: "residual fraction must be in [0, 1)",
        });
    }
    let p = conditions.pressure;

    let intake = hydrogen_air_intake(conditions.equivalence_ratio)?;
    let exhaust = match &conditions.residual_composition {
        Some(c) => c.clone(),
        None => intake.oxidized()?,
    };
    let charge = Composition::blend_mass(&[(&intake, 1.0 - rmf), (&exhaust, rmf)])?;

    let h_int = model.h(&GasState::from_pt(p, conditions.intake_temperature, intake)?)?;
    let h_res = model.h(&GasState::from_pt(
        p,
        conditions.exhaust_temperature,
        exhaust.clone(),
    )?)?;
    let clearance = model.properties_at(&GasState::from_pt(
        p,
        conditions.clearance_temperature,
        exhaust.clone(),
    )?)?;

    let v = geometry.total_volume();
    let v_c = geometry.clearance_volume();
    let r_exh = R_UNIVERSAL / exhaust.molar_mass();
    let m_clr = p.value * v_c / (r_exh * conditions.clearance_temperature.value);
    let r_mix = R_UNIVERSAL / charge.molar_mass();
    let mass_at = |t: f64| p.value * v / (r_mix * t);

    let balance = |t: f64| -> ComponentResult<f64> {
        let mass = mass_at(t);
        let u = model.properties_at(&GasState::from_pt(p, k(t), charge.clone())?)?.u;
        let rhs = (1.0 - rmf) * mass * h_int
            + rmf * mass * h_res
            + m_clr * (clearance.u - h_res)
            - p.value * (v - v_c);
        // per unit mass keeps the residual of order J/kg
        Ok(u - rhs / mass)
    };
    let solved = bisect(balance, 200.0, 3500.0, root)?;
    let t = solved.x;

    let total_mass = mass_at(t);
    let backflow_mass = rmf * total_mass - m_clr;
    if backflow_mass < 0.0 {
        return Err(ComponentError::Infeasible {
            what: "clearance gas exceeds the residual mass; residual gas mass would be negative",
        });
    }
    debug!(
        t,
        total_mass,
        m_clr,
        iterations = solved.iterations,
        "cylinder charge initialised"
    );

    Ok(CylinderCharge {
        composition: charge,
        temperature: k(t),
        pressure: p,
        total_mass,
        intake_mass: (1.0 - rmf) * total_mass,
        backflow_mass,
        clearance_mass: m_clr,
        iterations: solved.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_gas::IdealGasModel;

    fn root() -> RootConfig {
        RootConfig {
            rel_tol: 1e-10,
            f_tol: 0.0,
            max_iterations: 200,
        }
    }

    #[test]
    fn geometry_volumes() {
        let g = CylinderGeometry::default();
        let vd = PI / 4.0 * 0.01 * 0.15;
        assert!((g.displacement() - vd).abs() < 1e-15);
        assert!((g.total_volume() / g.clearance_volume() - 12.0).abs() < 1e-12);
        let bad = CylinderGeometry {
            compression_ratio: 1.0,
            ..g
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn intake_stoichiometry() {
        let x = hydrogen_air_intake(1.0).unwrap();
        assert!((x.mole_fraction(Species::H2) / x.mole_fraction(Species::O2) - 2.0).abs() < 1e-12);
        let air = hydrogen_air_intake(0.0).unwrap();
        assert!(!air.contains(Species::H2));
        assert!(hydrogen_air_intake(1.2).is_err());
    }

    #[test]
    fn equal_temperatures_give_that_temperature() {
        let model = IdealGasModel::default();
        let conditions = ChargeConditions {
            intake_temperature: k(500.0),
            exhaust_temperature: k(500.0),
            clearance_temperature: k(500.0),
            ..ChargeConditions::default()
        };
        let charge =
            initialize_charge(&model, &CylinderGeometry::default(), &conditions, &root()).unwrap();
        assert!((charge.temperature.value - 500.0).abs() < 1e-3, "{}", charge.temperature.value);
        let sum = charge.intake_mass + charge.backflow_mass + charge.clearance_mass;
        assert!((sum - charge.total_mass).abs() < 1e-15);
    }

    #[test]
    fn hot_residual_warms_the_charge() {
        let model = IdealGasModel::default();
        let charge = initialize_charge(
            &model,
            &CylinderGeometry::default(),
            &ChargeConditions::default(),
            &root(),
        )
        .unwrap();
        let t = charge.temperature.value;
        assert!(t > 300.0 && t < 800.0, "{t}");
        assert!(charge.backflow_mass > 0.0);
    }

    #[test]
    fn small_residual_fraction_is_infeasible() {
        let model = IdealGasModel::default();
        let conditions = ChargeConditions {
            residual_fraction: 0.01,
            ..ChargeConditions::default()
        };
        let err = initialize_charge(&model, &CylinderGeometry::default(), &conditions, &root())
            .unwrap_err();
        assert!(matches!(err, ComponentError::Infeasible { .. }));
    }
}
