use crate::SfError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Relative change between two successive iterates.
///
/// Falls back to the absolute change when the new value is exactly zero so a
/// sequence settling on zero still reports convergence.
pub fn relative_change(previous: Real, current: Real) -> Real {
    let diff = (current - previous).abs();
    if current == 0.0 {
        diff
    } else {
        diff / current.abs()
    }
}

/// Linearly spaced points including both endpoints.
pub fn linspace(start: Real, end: Real, points: usize) -> Vec<Real> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as Real;
            (0..n).map(|i| start + step * i as Real).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn relative_change_handles_zero() {
        assert_eq!(relative_change(1e-3, 0.0), 1e-3);
        assert!((relative_change(100.0, 101.0) - 1.0 / 101.0).abs() < 1e-15);
    }

    #[test]
    fn linspace_endpoints() {
        let pts = linspace(300.0, 1000.0, 8);
        assert_eq!(pts.len(), 8);
        assert_eq!(pts[0], 300.0);
        assert!((pts[7] - 1000.0).abs() < 1e-9);
        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }
}
