//! Integration tests for the fixed-point loop and root finders working together.

use sf_solver::{ConvergenceLoop, RootConfig, SolverError, Step, bisect};

/// Toy counterflow exchanger: cp rises linearly with temperature, so the
/// capacity rates depend on the mean temperatures being solved for.
fn cp(t: f64) -> f64 {
    1000.0 + 0.2 * t
}

#[test]
fn dual_temperature_loop_self_consistent() {
    let (t_hot_in, t_cold_in) = (1000.0, 300.0);
    let (m_hot, m_cold) = (0.1, 0.2);
    let eff = 0.8;

    let cl = ConvergenceLoop::new(1e-9, 200).unwrap();
    let result = cl
        .run::<_, SolverError>(vec![t_hot_in, t_cold_in], |g| {
            let c_hot = m_hot * cp(0.5 * (t_hot_in + g[0]));
            let c_cold = m_cold * cp(0.5 * (t_cold_in + g[1]));
            let q = eff * c_hot.min(c_cold) * (t_hot_in - t_cold_in);
            let next = vec![t_hot_in - q / c_hot, t_cold_in + q / c_cold];
            Ok(Step::of_guess(next))
        })
        .unwrap();

    assert!(result.converged);
    let (t1, t4) = (result.solution[0], result.solution[1]);
    let c_hot = m_hot * cp(0.5 * (t_hot_in + t1));
    let c_cold = m_cold * cp(0.5 * (t_cold_in + t4));
    // duty seen by both sides agrees at the fixed point
    let q_hot = c_hot * (t_hot_in - t1);
    let q_cold = c_cold * (t4 - t_cold_in);
    assert!((q_hot - q_cold).abs() / q_hot < 1e-6);
    assert!(t1 > t_cold_in && t1 < t_hot_in);
}

#[test]
fn bisection_inside_loop_update() {
    // each update solves an inner root problem; errors flow through unchanged
    let cl = ConvergenceLoop::default();
    let cfg = RootConfig {
        rel_tol: 1e-12,
        ..Default::default()
    };
    let result = cl
        .run::<_, SolverError>(vec![1.0], |g| {
            let target = 0.5 * g[0] + 1.0;
            let root = bisect(|x: f64| Ok::<_, SolverError>(x * x * x - target), 0.0, 10.0, &cfg)?;
            Ok(Step::new(vec![root.x.powi(3)], vec![root.x]))
        })
        .unwrap();
    assert!(result.converged);
    assert!((result.solution[0] - 2.0).abs() < 1e-4);
}
