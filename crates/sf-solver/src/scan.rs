//! Derivative-free one-dimensional minimisation.
//!
//! A grid scan over a configurable range finds the best sample. Optional
//! golden-section refinement then narrows the neighbouring cells when the
//! objective is unimodal there.

use crate::error::{SolverError, SolverResult};
use rayon::prelude::*;

/// Most samples a [`ScanRange`] may hold.
pub const MAX_SCAN_POINTS: usize = 1_000_000;

/// Closed scan interval sampled every `step`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanRange {
    pub lo: f64,
    pub hi: f64,
    pub step: f64,
}

impl ScanRange {
    pub fn new(lo: f64, hi: f64, step: f64) -> SolverResult<Self> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(SolverError::InvalidArg {
                what: "scan range must be finite with lo <= hi",
            });
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(SolverError::InvalidArg {
                what: "scan step must be positive",
            });
        }
        if (hi - lo) / step >= MAX_SCAN_POINTS as f64 {
            return Err(SolverError::InvalidArg {
                what: "scan step too fine for the range",
            });
        }
        Ok(Self { lo, hi, step })
    }

    /// Sample points `lo, lo + step, ...` not exceeding `hi`.
    pub fn points(&self) -> Vec<f64> {
        let n = ((self.hi - self.lo) / self.step + 1e-9).floor() as usize;
        (0..=n).map(|i| self.lo + self.step * i as f64).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanMinimum {
    pub x: f64,
    pub value: f64,
    /// Index of the best sample (scans only; zero after refinement).
    pub index: usize,
    pub evaluations: usize,
}

fn pick_minimum(points: &[f64], values: &[f64]) -> SolverResult<ScanMinimum> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        // strict comparison keeps the lowest index on ties
        match best {
            Some((_, b)) if *v >= b => {}
            _ => best = Some((i, *v)),
        }
    }
    let (index, value) = best.ok_or(SolverError::NonFinite {
        what: "every scan objective value",
    })?;
    Ok(ScanMinimum {
        x: points[index],
        value,
        index,
        evaluations: values.len(),
    })
}

/// Sequential grid scan. Non-finite objective values are skipped.
pub fn scan_minimize<F, E>(range: &ScanRange, mut f: F) -> Result<ScanMinimum, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<SolverError>,
{
    let points = range.points();
    let values = points
        .iter()
        .map(|x| f(*x))
        .collect::<Result<Vec<_>, E>>()?;
    Ok(pick_minimum(&points, &values)?)
}

/// Parallel grid scan. Same result as [`scan_minimize`] for a pure objective.
pub fn par_scan_minimize<F, E>(range: &ScanRange, f: F) -> Result<ScanMinimum, E>
where
    F: Fn(f64) -> Result<f64, E> + Sync,
    E: From<SolverError> + Send,
{
    let points = range.points();
    let values = points
        .par_iter()
        .map(|x| f(*x))
        .collect::<Result<Vec<_>, E>>()?;
    Ok(pick_minimum(&points, &values)?)
}

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Golden-section search for a minimum on `[lo, hi]`.
pub fn golden_section<F, E>(
    mut f: F,
    lo: f64,
    hi: f64,
    x_tol: f64,
    max_iterations: usize,
) -> Result<ScanMinimum, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<SolverError>,
{
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(SolverError::InvalidArg {
            what: "golden-section bracket must be finite with lo < hi",
        }
        .into());
    }
    if !x_tol.is_finite() || x_tol <= 0.0 {
        return Err(SolverError::InvalidArg {
            what: "golden-section tolerance must be positive",
        }
        .into());
    }

    let (mut a, mut b) = (lo, hi);
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c)?;
    let mut fd = f(d)?;
    let mut evaluations = 2;

    for _ in 0..max_iterations {
        if (b - a).abs() <= x_tol {
            break;
        }
        if fc <= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d)?;
        }
        evaluations += 1;
    }

    if (b - a).abs() > x_tol {
        return Err(SolverError::ConvergenceExceeded {
            what: "golden-section search",
            iterations: max_iterations,
            residual: (b - a).abs(),
        }
        .into());
    }

    let (x, value) = if fc <= fd { (c, fc) } else { (d, fd) };
    Ok(ScanMinimum {
        x,
        value,
        index: 0,
        evaluations,
    })
}
