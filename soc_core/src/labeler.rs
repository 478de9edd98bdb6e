//! Voltage → SOC step function.
//!
//! Labels are a lookup over [`THRESHOLDS`], scanned top-down: the first
//! inclusive lower bound the voltage meets wins, and anything below the last
//! bound is 0%. The spacing is deliberately uneven (3.80 V → 60 but
//! 3.75 V → 50); trained models depend on these exact breakpoints.

/// `(lower bound in volts, SOC percent)`, strictly descending by voltage.
pub const THRESHOLDS: [(f64, f64); 15] = [
    (4.20, 100.0),
    (4.15, 95.0),
    (4.10, 90.0),
    (4.05, 85.0),
    (4.00, 80.0),
    (3.95, 75.0),
    (3.90, 70.0),
    (3.85, 65.0),
    (3.80, 60.0),
    (3.75, 50.0),
    (3.70, 40.0),
    (3.65, 30.0),
    (3.60, 20.0),
    (3.55, 10.0),
    (3.50, 5.0),
];

/// Every value [`soc_for_voltage`] can return, ascending.
pub const SOC_LEVELS: [f64; 16] = [
    0.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 100.0,
];

/// SOC percent for a mean voltage.
///
/// NaN and negative voltages meet no bound and label as 0; `+inf` labels as 100.
#[inline]
pub fn soc_for_voltage(voltage: f64) -> f64 {
    THRESHOLDS
        .iter()
        .find(|(bound, _)| voltage >= *bound)
        .map_or(0.0, |&(_, soc)| soc)
}
