//! Fixed-point iteration with an explicit cap.
//!
//! The loop repeatedly feeds the current guess to an update function which
//! returns the next guess together with the scalars being tracked for
//! convergence. Consecutive tracked vectors are compared componentwise and the
//! loop stops only once every component has settled below the relative
//! threshold at the same time. Hitting the cap is not an error here; the
//! result carries `converged = false` and the last iterate so the caller can
//! decide, or use [`ConvergenceResult::require_converged`].

use crate::error::{SolverError, SolverResult};
use sf_core::numeric::relative_change;
use tracing::{debug, trace, warn};

/// Output of one update: the next guess and the scalars to compare.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub next: Vec<f64>,
    pub tracked: Vec<f64>,
}

impl Step {
    pub fn new(next: Vec<f64>, tracked: Vec<f64>) -> Self {
        Self { next, tracked }
    }

    /// Track the guess itself.
    pub fn of_guess(next: Vec<f64>) -> Self {
        let tracked = next.clone();
        Self { next, tracked }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceResult {
    pub converged: bool,
    pub iterations: usize,
    /// Largest componentwise relative change of the last comparison.
    pub residual: f64,
    /// Last guess returned by the update function.
    pub solution: Vec<f64>,
    /// Tracked scalars of the last update.
    pub tracked: Vec<f64>,
}

impl ConvergenceResult {
    /// Turn a capped run into [`SolverError::ConvergenceExceeded`].
    pub fn require_converged(self, what: &'static str) -> SolverResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(SolverError::ConvergenceExceeded {
                what,
                iterations: self.iterations,
                residual: self.residual,
            })
        }
    }
}

/// Relative-change fixed-point loop configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergenceLoop {
    pub rel_tol: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceLoop {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            max_iterations: 200,
        }
    }
}

impl ConvergenceLoop {
    pub fn new(rel_tol: f64, max_iterations: usize) -> SolverResult<Self> {
        if !rel_tol.is_finite() || rel_tol <= 0.0 {
            return Err(SolverError::InvalidArg {
                what: "convergence tolerance must be positive and finite",
            });
        }
        if max_iterations == 0 {
            return Err(SolverError::InvalidArg {
                what: "iteration cap must be at least 1",
            });
        }
        Ok(Self {
            rel_tol,
            max_iterations,
        })
    }

    /// Run the loop from `initial`.
    ///
    /// The first update has nothing to compare against, so the earliest
    /// possible convergence is on the second update.
    pub fn run<F, E>(&self, initial: Vec<f64>, mut update: F) -> Result<ConvergenceResult, E>
    where
        F: FnMut(&[f64]) -> Result<Step, E>,
        E: From<SolverError>,
    {
        let mut guess = initial;
        let mut previous: Option<Vec<f64>> = None;
        let mut residual = f64::INFINITY;

        for iteration in 1..=self.max_iterations {
            let step = update(&guess)?;

            if step.tracked.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::NonFinite {
                    what: "tracked convergence output",
                }
                .into());
            }

            if let Some(prev) = &previous {
                if prev.len() != step.tracked.len() {
                    return Err(SolverError::InvalidArg {
                        what: "tracked output length changed between iterations",
                    }
                    .into());
                }
                residual = prev
                    .iter()
                    .zip(&step.tracked)
                    .map(|(a, b)| relative_change(*a, *b))
                    .fold(0.0, f64::max);
                trace!(iteration, residual, "convergence loop step");
            }

            let done = previous.is_some() && residual < self.rel_tol;
            guess = step.next;
            previous = Some(step.tracked);

            if done {
                debug!(iterations = iteration, residual, "convergence loop settled");
                return Ok(ConvergenceResult {
                    converged: true,
                    iterations: iteration,
                    residual,
                    solution: guess,
                    tracked: previous.unwrap_or_default(),
                });
            }
        }

        warn!(
            iterations = self.max_iterations,
            residual, "convergence loop hit iteration cap"
        );
        Ok(ConvergenceResult {
            converged: false,
            iterations: self.max_iterations,
            residual,
            solution: guess,
            tracked: previous.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_config() {
        assert!(ConvergenceLoop::new(0.0, 10).is_err());
        assert!(ConvergenceLoop::new(f64::NAN, 10).is_err());
        assert!(ConvergenceLoop::new(1e-6, 0).is_err());
    }

    #[test]
    fn halving_map_reaches_fixed_point() {
        let cl = ConvergenceLoop::new(1e-10, 200).unwrap();
        let result = cl
            .run::<_, SolverError>(vec![0.0], |x| Ok(Step::of_guess(vec![x[0] / 2.0 + 1.0])))
            .unwrap();
        assert!(result.converged);
        assert!((result.solution[0] - 2.0).abs() < 1e-8);
        assert!(result.iterations < 60);
        assert!(result.residual < 1e-10);
    }

    #[test]
    fn all_components_must_settle() {
        // first component is fixed immediately, second creeps slowly
        let cl = ConvergenceLoop::new(1e-3, 500).unwrap();
        let result = cl
            .run::<_, SolverError>(vec![1.0, 0.0], |x| {
                Ok(Step::of_guess(vec![x[0], 0.9 * x[1] + 0.1]))
            })
            .unwrap();
        assert!(result.converged);
        assert!(result.iterations > 10);
        assert!((result.solution[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn oscillation_reports_not_converged() {
        let cl = ConvergenceLoop::new(1e-6, 25).unwrap();
        let result = cl
            .run::<_, SolverError>(vec![1.0], |x| Ok(Step::of_guess(vec![-x[0]])))
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 25);
        assert!(result.residual >= 1.0);

        let err = result.require_converged("oscillation").unwrap_err();
        assert!(matches!(
            err,
            SolverError::ConvergenceExceeded { iterations: 25, .. }
        ));
    }

    #[test]
    fn update_errors_propagate() {
        #[derive(Debug, PartialEq)]
        enum TestError {
            Boom,
            Solver(SolverError),
        }
        impl From<SolverError> for TestError {
            fn from(e: SolverError) -> Self {
                TestError::Solver(e)
            }
        }

        let cl = ConvergenceLoop::default();
        let err = cl
            .run::<_, TestError>(vec![1.0], |_| Err(TestError::Boom))
            .unwrap_err();
        assert_eq!(err, TestError::Boom);

        let err = cl
            .run::<_, TestError>(vec![1.0], |_| Ok(Step::of_guess(vec![f64::NAN])))
            .unwrap_err();
        assert!(matches!(err, TestError::Solver(SolverError::NonFinite { .. })));
    }

    #[test]
    fn tracked_outputs_can_differ_from_guess() {
        // guess is x, tracked output is x^2
        let cl = ConvergenceLoop::new(1e-9, 100).unwrap();
        let result = cl
            .run::<_, SolverError>(vec![3.0], |x| {
                let next = 0.5 * (x[0] + 2.0 / x[0]);
                Ok(Step::new(vec![next], vec![next * next]))
            })
            .unwrap();
        assert!(result.converged);
        assert!((result.tracked[0] - 2.0).abs() < 1e-8);
    }
}
