//! Bracketed one-dimensional root finding.

use crate::error::SolverError;
use tracing::trace;

/// Stopping rules shared by the bracketed solvers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootConfig {
    /// Stop once the step (or half bracket) is below `rel_tol * max(|x|, 1)`.
    pub rel_tol: f64,
    /// Stop once `|f(x)| <= f_tol`. Zero disables the residual test.
    pub f_tol: f64,
    pub max_iterations: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            f_tol: 0.0,
            max_iterations: 200,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Root {
    pub x: f64,
    /// Residual at the last evaluated point.
    pub f: f64,
    pub iterations: usize,
}

fn check_bracket(lo: f64, hi: f64) -> Result<(), SolverError> {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(SolverError::InvalidArg {
            what: "bracket must be finite with lo < hi",
        });
    }
    Ok(())
}

fn check_value(v: f64) -> Result<f64, SolverError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SolverError::NonFinite {
            what: "root-finding residual",
        })
    }
}

/// Bisection on `[lo, hi]`. `f(lo)` and `f(hi)` must differ in sign.
pub fn bisect<F, E>(mut f: F, lo: f64, hi: f64, cfg: &RootConfig) -> Result<Root, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<SolverError>,
{
    check_bracket(lo, hi)?;
    let f_lo = check_value(f(lo)?)?;
    let f_hi = check_value(f(hi)?)?;

    if f_lo == 0.0 {
        return Ok(Root {
            x: lo,
            f: 0.0,
            iterations: 0,
        });
    }
    if f_hi == 0.0 {
        return Ok(Root {
            x: hi,
            f: 0.0,
            iterations: 0,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SolverError::NoBracket { lo, hi, f_lo, f_hi }.into());
    }

    let (mut a, mut b, mut fa) = (lo, hi, f_lo);
    for iteration in 1..=cfg.max_iterations {
        let mid = 0.5 * (a + b);
        let fm = check_value(f(mid)?)?;
        trace!(iteration, x = mid, f = fm, "bisection step");

        let half_width = 0.5 * (b - a);
        if fm.abs() <= cfg.f_tol || half_width <= cfg.rel_tol * mid.abs().max(1.0) {
            return Ok(Root {
                x: mid,
                f: fm,
                iterations: iteration,
            });
        }

        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }

    Err(SolverError::ConvergenceExceeded {
        what: "bisection",
        iterations: cfg.max_iterations,
        residual: b - a,
    }
    .into())
}

/// Newton iteration kept inside a shrinking bracket.
///
/// `f` returns the residual and its derivative. Any Newton step that would
/// leave the current bracket, or a vanishing derivative, is replaced by a
/// bisection step.
pub fn newton_bracketed<F, E>(
    mut f: F,
    lo: f64,
    hi: f64,
    x0: Option<f64>,
    cfg: &RootConfig,
) -> Result<Root, E>
where
    F: FnMut(f64) -> Result<(f64, f64), E>,
    E: From<SolverError>,
{
    check_bracket(lo, hi)?;
    let f_lo = check_value(f(lo)?.0)?;
    let f_hi = check_value(f(hi)?.0)?;

    if f_lo == 0.0 {
        return Ok(Root {
            x: lo,
            f: 0.0,
            iterations: 0,
        });
    }
    if f_hi == 0.0 {
        return Ok(Root {
            x: hi,
            f: 0.0,
            iterations: 0,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SolverError::NoBracket { lo, hi, f_lo, f_hi }.into());
    }

    // neg end has f < 0
    let (mut neg, mut pos) = if f_lo < 0.0 { (lo, hi) } else { (hi, lo) };
    let mut x = x0
        .filter(|x| x.is_finite() && *x > lo && *x < hi)
        .unwrap_or(0.5 * (lo + hi));
    let mut last_f = f64::NAN;

    for iteration in 1..=cfg.max_iterations {
        let (fx, dfx) = f(x)?;
        let fx = check_value(fx)?;
        last_f = fx;

        if fx == 0.0 || fx.abs() <= cfg.f_tol {
            return Ok(Root {
                x,
                f: fx,
                iterations: iteration,
            });
        }

        if fx < 0.0 {
            neg = x;
        } else {
            pos = x;
        }

        let (a, b) = (neg.min(pos), neg.max(pos));
        let newton = x - fx / dfx;
        let next = if dfx.is_finite() && dfx != 0.0 && newton > a && newton < b {
            newton
        } else {
            0.5 * (a + b)
        };
        trace!(iteration, x, f = fx, next, "bracketed newton step");

        let dx = (next - x).abs();
        x = next;
        if dx <= cfg.rel_tol * x.abs().max(1.0) {
            return Ok(Root {
                x,
                f: fx,
                iterations: iteration,
            });
        }
    }

    Err(SolverError::ConvergenceExceeded {
        what: "bracketed newton",
        iterations: cfg.max_iterations,
        residual: last_f.abs(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisect_finds_sqrt2() {
        let cfg = RootConfig {
            rel_tol: 1e-12,
            ..Default::default()
        };
        let root = bisect::<_, SolverError>(|x| Ok(x * x - 2.0), 0.0, 2.0, &cfg).unwrap();
        assert!((root.x - 2.0_f64.sqrt()).abs() < 1e-10);
        assert!(root.iterations > 10);
    }

    #[test]
    fn bisect_stops_on_residual_tolerance() {
        let cfg = RootConfig {
            rel_tol: 1e-15,
            f_tol: 0.01,
            max_iterations: 200,
        };
        let root = bisect::<_, SolverError>(|x| Ok(x - 0.3), 0.0, 1.0, &cfg).unwrap();
        assert!((root.x - 0.3).abs() <= 0.01);
        assert!(root.iterations < 10);
    }

    #[test]
    fn bisect_requires_sign_change() {
        let cfg = RootConfig::default();
        let err = bisect::<_, SolverError>(|x| Ok(x * x + 1.0), -1.0, 1.0, &cfg).unwrap_err();
        assert!(matches!(err, SolverError::NoBracket { .. }));
    }

    #[test]
    fn bisect_rejects_inverted_bracket() {
        let cfg = RootConfig::default();
        let err = bisect::<_, SolverError>(|x| Ok(x), 1.0, -1.0, &cfg).unwrap_err();
        assert!(matches!(err, SolverError::InvalidArg { .. }));
    }

    #[test]
    fn bisect_reports_cap() {
        let cfg = RootConfig {
            rel_tol: 1e-300,
            f_tol: 0.0,
            max_iterations: 5,
        };
        let err = bisect::<_, SolverError>(|x| Ok(x - 0.123), 0.0, 1.0, &cfg).unwrap_err();
        assert!(matches!(
            err,
            SolverError::ConvergenceExceeded { iterations: 5, .. }
        ));
    }

    #[test]
    fn newton_converges_quickly_on_smooth_function() {
        let cfg = RootConfig {
            rel_tol: 1e-12,
            ..Default::default()
        };
        let root = newton_bracketed::<_, SolverError>(
            |x| Ok((x.exp() - 5.0, x.exp())),
            0.0,
            4.0,
            None,
            &cfg,
        )
        .unwrap();
        assert!((root.x - 5.0_f64.ln()).abs() < 1e-10);
        assert!(root.iterations < 15);
    }

    #[test]
    fn newton_falls_back_when_derivative_vanishes() {
        let cfg = RootConfig {
            rel_tol: 1e-10,
            ..Default::default()
        };
        // derivative reported as zero everywhere: pure bisection
        let root = newton_bracketed::<_, SolverError>(
            |x| Ok((x - 0.7, 0.0)),
            0.0,
            1.0,
            Some(0.1),
            &cfg,
        )
        .unwrap();
        assert!((root.x - 0.7).abs() < 1e-8);
    }

    #[test]
    fn newton_handles_decreasing_function() {
        let cfg = RootConfig {
            rel_tol: 1e-12,
            ..Default::default()
        };
        let root =
            newton_bracketed::<_, SolverError>(|x| Ok((1.0 - x * x, -2.0 * x)), 0.5, 3.0, None, &cfg)
                .unwrap();
        assert!((root.x - 1.0).abs() < 1e-10);
    }
}
