use proptest::prelude::*;
use rstest::rstest;
use soc_core::{SOC_LEVELS, soc_for_voltage};

#[rstest]
#[case(4.25, 100.0)]
#[case(4.20, 100.0)]
#[case(4.19, 95.0)]
#[case(4.15, 95.0)]
#[case(4.10, 90.0)]
#[case(4.05, 85.0)]
#[case(4.00, 80.0)]
#[case(3.95, 75.0)]
#[case(3.90, 70.0)]
#[case(3.85, 65.0)]
#[case(3.80, 60.0)]
#[case(3.79, 50.0)]
#[case(3.75, 50.0)]
#[case(3.70, 40.0)]
#[case(3.65, 30.0)]
#[case(3.60, 20.0)]
#[case(3.55, 10.0)]
#[case(3.50, 5.0)]
#[case(3.49, 0.0)]
#[case(0.0, 0.0)]
fn breakpoints_are_inclusive(#[case] voltage: f64, #[case] soc: f64) {
    assert_eq!(soc_for_voltage(voltage), soc);
}

#[test]
fn gap_between_60_and_50_is_preserved() {
    assert_eq!(soc_for_voltage(3.80), 60.0);
    assert_eq!(soc_for_voltage(3.7999), 50.0);
    // No 55% level exists.
    assert!(!SOC_LEVELS.contains(&55.0));
}

#[rstest]
#[case(f64::NAN, 0.0)]
#[case(-3.9, 0.0)]
#[case(f64::NEG_INFINITY, 0.0)]
#[case(f64::INFINITY, 100.0)]
fn non_physical_voltages(#[case] voltage: f64, #[case] soc: f64) {
    assert_eq!(soc_for_voltage(voltage), soc);
}

proptest! {
    #[test]
    fn at_or_above_top_is_full(v in 4.20f64..1.0e6) {
        prop_assert_eq!(soc_for_voltage(v), 100.0);
    }

    #[test]
    fn below_floor_is_empty(v in -1.0e6f64..3.4999) {
        prop_assert_eq!(soc_for_voltage(v), 0.0);
    }

    #[test]
    fn output_is_a_known_level(v in proptest::num::f64::ANY) {
        prop_assert!(SOC_LEVELS.contains(&soc_for_voltage(v)));
    }

    #[test]
    fn non_decreasing_in_voltage(a in 3.0f64..4.5, b in 3.0f64..4.5) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(soc_for_voltage(lo) <= soc_for_voltage(hi));
    }

    #[test]
    fn deterministic(v in 3.0f64..4.5) {
        prop_assert_eq!(soc_for_voltage(v).to_bits(), soc_for_voltage(v).to_bits());
    }
}
