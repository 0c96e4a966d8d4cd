//! Property tests for the water-gas shift root.

use proptest::prelude::*;
use sf_components::shift_extent;

fn feed() -> impl Strategy<Value = (f64, f64)> {
    (0.01f64..0.5, 1.0f64..4.0)
        .prop_map(|(c, ratio)| (c, c * ratio))
        .prop_filter("fractions exceed one", |(c, w)| c + w <= 1.0)
}

proptest! {
    #[test]
    fn root_is_physical_and_satisfies_equilibrium(
        (c, w) in feed(),
        log_kp in -3.0f64..3.0,
    ) {
        let kp = 10f64.powf(log_kp);
        let x = shift_extent(kp, c, w).unwrap();
        prop_assert!(x >= 0.0 && x <= c.min(w - c));

        // Kp = x (3c + x) / ((c - x)(w - c - x))
        let forward = x * (3.0 * c + x);
        let backward = kp * (c - x) * (w - c - x);
        let scale = forward + kp * c * (w - c);
        prop_assert!((forward - backward).abs() <= 1e-9 * scale);
    }

    #[test]
    fn extent_grows_with_kp(
        (c, w) in feed(),
        log_kp in -3.0f64..3.0,
        step in 0.01f64..1.0,
    ) {
        let low = shift_extent(10f64.powf(log_kp), c, w).unwrap();
        let high = shift_extent(10f64.powf(log_kp + step), c, w).unwrap();
        prop_assert!(high >= low - 1e-12);
    }
}
