//! Chemical equilibrium at fixed temperature and pressure.
//!
//! Minimises the mixture Gibbs energy subject to element conservation with
//! the element-potential Newton method of Gordon & McBride (NASA RP-1311).
//! Each iteration solves for the element potentials `π` and the correction
//! to the log of total moles, then updates every species through
//!
//! ```text
//! Δln n_j = -μ_j/RT + Σ_i a_ij π_i + Δln n
//! ```
//!
//! Only species whose elements are all present in the feed take part.
//! Amounts are tracked per mole of feed.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace, warn};

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::species::{Element, Species};
use sf_core::units::constants::ONE_ATM_PA;
use sf_solver::solve_truncated;

/// ln(1e-8): below this a species counts as trace for step control.
const TRACE_LN: f64 = -18.420_680_743_952_367;
/// ln(1e-4): ceiling a trace species may reach in one step.
const TRACE_CEILING_LN: f64 = -9.210_340_371_976_182;
/// Lowest ln(n_j / n) kept; anything smaller is numerically zero.
const LN_FLOOR: f64 = -700.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquilibriumConfig {
    pub max_iterations: usize,
    /// Bound on `n_j |Δln n_j| / Σn` and on the element residual relative
    /// to the largest feed element amount.
    pub tolerance: f64,
    /// Relative singular-value cutoff for the Newton system.
    pub svd_cutoff: f64,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-10,
            svd_cutoff: 1e-13,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EquilibriumResult {
    pub composition: Composition,
    pub iterations: usize,
    /// Largest element-balance residual relative to the feed.
    pub residual: f64,
}

fn failure(reason: &'static str, iterations: usize, residual: f64) -> GasError {
    GasError::EquilibrationFailure {
        reason,
        iterations,
        residual,
    }
}

/// Equilibrium composition of `feed` at `t` [K] and `p` [Pa].
///
/// `g_rt[j]` is the standard-state g°/RT of species `j` at `t`; `None`
/// means the species has no data and is left out.
pub fn gibbs_equilibrium(
    g_rt: &[Option<f64>; Species::COUNT],
    t: f64,
    p: f64,
    feed: &Composition,
    cfg: &EquilibriumConfig,
) -> GasResult<EquilibriumResult> {
    if !t.is_finite() || t <= 0.0 || !p.is_finite() || p <= 0.0 {
        return Err(failure(
            "non-physical temperature or pressure",
            0,
            f64::INFINITY,
        ));
    }
    if feed.iter().any(|(s, _)| g_rt[s.index()].is_none()) {
        return Err(GasError::NotSupported {
            what: "feed species without Gibbs data",
        });
    }

    let b_feed = feed.element_moles();
    let b_scale = b_feed.iter().copied().fold(0.0, f64::max);
    let elements: Vec<Element> = Element::ALL
        .into_iter()
        .filter(|e| b_feed[e.index()] > 1e-14 * b_scale)
        .collect();

    let ln_p = (p / ONE_ATM_PA).ln();
    let (species, g): (Vec<Species>, Vec<f64>) = Species::ALL
        .into_iter()
        .filter(|s| s.elements().iter().all(|(e, _)| elements.contains(e)))
        .filter_map(|s| g_rt[s.index()].map(|g| (s, g + ln_p)))
        .unzip();

    let ne = elements.len();
    let ns = species.len();
    let a: Vec<Vec<f64>> = elements
        .iter()
        .map(|e| species.iter().map(|s| s.atoms(*e)).collect())
        .collect();
    let b0: Vec<f64> = elements.iter().map(|e| b_feed[e.index()]).collect();

    let mut ln_nj = vec![-(ns as f64).ln(); ns];
    let mut ln_n = 0.0_f64;
    // previous solution [π, Δln n]; singular directions keep their last value
    let mut prev = DVector::<f64>::zeros(ne + 1);
    let mut element_residual = f64::INFINITY;

    for iteration in 1..=cfg.max_iterations {
        let nj: Vec<f64> = ln_nj.iter().map(|v| v.exp()).collect();
        let n = ln_n.exp();
        let sum_n: f64 = nj.iter().sum();
        let mu: Vec<f64> = (0..ns).map(|j| g[j] + ln_nj[j] - ln_n).collect();
        let b: Vec<f64> = a
            .iter()
            .map(|row| row.iter().zip(&nj).map(|(aij, n)| aij * n).sum())
            .collect();

        let mut m = DMatrix::<f64>::zeros(ne + 1, ne + 1);
        let mut rhs = DVector::<f64>::zeros(ne + 1);
        for i in 0..ne {
            for k in 0..ne {
                m[(i, k)] = (0..ns).map(|j| a[i][j] * a[k][j] * nj[j]).sum();
            }
            m[(i, ne)] = b[i];
            m[(ne, i)] = b[i];
            rhs[i] = b0[i] - b[i] + (0..ns).map(|j| a[i][j] * nj[j] * mu[j]).sum::<f64>();
        }
        m[(ne, ne)] = sum_n - n;
        rhs[ne] = n - sum_n + (0..ns).map(|j| nj[j] * mu[j]).sum::<f64>();

        let shifted = &rhs - &m * &prev;
        let delta = solve_truncated(m, &shifted, cfg.svd_cutoff)
            .map_err(|_| {
                failure("singular element-potential system", iteration, element_residual)
            })?;
        let x = &prev + delta;
        let d_ln_n = x[ne];
        let d_ln_nj: Vec<f64> = (0..ns)
            .map(|j| -mu[j] + (0..ne).map(|i| a[i][j] * x[i]).sum::<f64>() + d_ln_n)
            .collect();

        element_residual = b0
            .iter()
            .zip(&b)
            .map(|(b0, b)| (b0 - b).abs() / b_scale)
            .fold(0.0, f64::max);
        let correction = nj
            .iter()
            .zip(&d_ln_nj)
            .map(|(n_j, d)| n_j * d.abs() / sum_n)
            .fold(n * d_ln_n.abs() / sum_n, f64::max);
        if !correction.is_finite() || d_ln_nj.iter().any(|d| !d.is_finite()) {
            warn!(iteration, "equilibrium correction became non-finite");
            return Err(failure(
                "non-finite Newton correction",
                iteration,
                element_residual,
            ));
        }
        trace!(iteration, correction, element_residual, "equilibrium step");

        // step control: majors move by at most a factor e^2 per step,
        // traces may not climb past 1e-4 in one step
        let mut largest = 5.0 * d_ln_n.abs();
        let mut lambda2 = 1.0_f64;
        for j in 0..ns {
            let ln_x = ln_nj[j] - ln_n;
            if ln_x > TRACE_LN {
                largest = largest.max(d_ln_nj[j].abs());
            } else {
                let rise = d_ln_nj[j] - d_ln_n;
                if d_ln_nj[j] >= 0.0 && rise > 0.0 {
                    lambda2 = lambda2.min(((TRACE_CEILING_LN - ln_x) / rise).abs());
                }
            }
        }
        let lambda1 = if largest > 2.0 { 2.0 / largest } else { 1.0 };
        let lambda = lambda1.min(lambda2);

        ln_n += lambda * d_ln_n;
        for (ln, d) in ln_nj.iter_mut().zip(&d_ln_nj) {
            *ln = (*ln + lambda * d).max(ln_n + LN_FLOOR);
        }
        prev = x;

        if correction <= cfg.tolerance && element_residual <= cfg.tolerance {
            let mut moles = [0.0; Species::COUNT];
            for (s, ln) in species.iter().zip(&ln_nj) {
                moles[s.index()] = ln.exp();
            }
            let composition = Composition::from_moles(&moles)?;
            debug!(
                t,
                p,
                iterations = iteration,
                residual = element_residual,
                "equilibrium converged"
            );
            return Ok(EquilibriumResult {
                composition,
                iterations: iteration,
                residual: element_residual,
            });
        }
    }

    warn!(
        t,
        p,
        iterations = cfg.max_iterations,
        residual = element_residual,
        "equilibrium hit iteration cap"
    );
    Err(failure(
        "iteration cap reached",
        cfg.max_iterations,
        element_residual,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nasa::ThermoTable;

    fn g_at(t: f64) -> [Option<f64>; Species::COUNT] {
        let table = ThermoTable::gri30();
        let mut g = [None; Species::COUNT];
        for s in Species::ALL {
            g[s.index()] = table.get(s).map(|poly| poly.g_rt(t));
        }
        g
    }

    fn assert_elements_conserved(feed: &Composition, out: &Composition) {
        let b0 = feed.element_moles();
        let b1 = out.element_moles();
        // out is per mole of products; compare element ratios through the
        // most abundant feed element
        let (ref_idx, _) = b0
            .iter()
            .enumerate()
            .fold((0, 0.0), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });
        let scale = b0[ref_idx] / b1[ref_idx];
        for e in Element::ALL {
            let i = e.index();
            assert!(
                (b1[i] * scale - b0[i]).abs() <= 1e-8 * b0[ref_idx],
                "{}: {} vs {}",
                e.symbol(),
                b1[i] * scale,
                b0[i]
            );
        }
    }

    #[test]
    fn hydrogen_and_excess_oxygen_burn_out() {
        let feed =
            Composition::new_mole_fractions(vec![(Species::H2, 2.0), (Species::O2, 2.0)]).unwrap();
        let out = gibbs_equilibrium(&g_at(1000.0), 1000.0, ONE_ATM_PA, &feed, &Default::default())
            .unwrap();
        // 2 H2 + 2 O2 -> 2 H2O + O2
        assert!((out.composition.mole_fraction(Species::H2O) - 2.0 / 3.0).abs() < 1e-6);
        assert!((out.composition.mole_fraction(Species::O2) - 1.0 / 3.0).abs() < 1e-6);
        assert!(out.composition.mole_fraction(Species::H2) < 1e-8);
        assert_elements_conserved(&feed, &out.composition);
    }

    #[test]
    fn stoichiometric_mixture_converges() {
        let feed =
            Composition::new_mole_fractions(vec![(Species::H2, 2.0), (Species::O2, 1.0)]).unwrap();
        let out = gibbs_equilibrium(&g_at(600.0), 600.0, ONE_ATM_PA, &feed, &Default::default())
            .unwrap();
        assert!(out.composition.mole_fraction(Species::H2O) > 1.0 - 1e-8);
        assert_elements_conserved(&feed, &out.composition);
    }

    #[test]
    fn inert_feed_is_unchanged() {
        let feed =
            Composition::new_mole_fractions(vec![(Species::N2, 0.99), (Species::Ar, 0.01)])
                .unwrap();
        let out = gibbs_equilibrium(&g_at(1500.0), 1500.0, 5.0e5, &feed, &Default::default())
            .unwrap();
        assert!((out.composition.mole_fraction(Species::N2) - 0.99).abs() < 1e-10);
        assert!((out.composition.mole_fraction(Species::Ar) - 0.01).abs() < 1e-10);
    }

    #[test]
    fn steam_methane_satisfies_shift_equilibrium() {
        let t = 1100.0;
        let g = g_at(t);
        let feed =
            Composition::new_mass_fractions(vec![(Species::CH4, 0.1), (Species::H2O, 0.2)])
                .unwrap();
        let out = gibbs_equilibrium(&g, t, ONE_ATM_PA, &feed, &Default::default()).unwrap();
        let x = |s: Species| out.composition.mole_fraction(s);
        let gi = |s: Species| g[s.index()].unwrap();

        let sum: f64 = out.composition.mole_fractions().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_elements_conserved(&feed, &out.composition);

        // CO + H2O <-> CO2 + H2 has no change in moles
        let kp = (-(gi(Species::CO2) + gi(Species::H2) - gi(Species::CO) - gi(Species::H2O))).exp();
        let q = x(Species::CO2) * x(Species::H2) / (x(Species::CO) * x(Species::H2O));
        assert!((q / kp - 1.0).abs() < 1e-6, "q={q} kp={kp}");

        // high temperature, low pressure: methane nearly consumed
        assert!(x(Species::CH4) < 0.01);
        assert!(x(Species::H2) > 0.5);
    }

    #[test]
    fn pure_methane_has_no_carbon_sink() {
        let feed = Composition::pure(Species::CH4);
        let out = gibbs_equilibrium(&g_at(298.15), 298.15, ONE_ATM_PA, &feed, &Default::default())
            .unwrap();
        assert!(out.composition.mole_fraction(Species::CH4) > 1.0 - 1e-8);
    }

    #[test]
    fn non_physical_input_fails() {
        let feed = Composition::pure(Species::N2);
        let g = g_at(300.0);
        for (t, p) in [(-1.0, ONE_ATM_PA), (300.0, 0.0), (f64::NAN, ONE_ATM_PA)] {
            let err = gibbs_equilibrium(&g, t, p, &feed, &Default::default()).unwrap_err();
            assert!(matches!(err, GasError::EquilibrationFailure { .. }));
        }
    }

    #[test]
    fn iteration_cap_reported() {
        let feed =
            Composition::new_mass_fractions(vec![(Species::CH4, 0.1), (Species::H2O, 0.2)])
                .unwrap();
        let cfg = EquilibriumConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let err = gibbs_equilibrium(&g_at(1100.0), 1100.0, ONE_ATM_PA, &feed, &cfg).unwrap_err();
        assert!(matches!(
            err,
            GasError::EquilibrationFailure { iterations: 1, .. }
        ));
    }
}
