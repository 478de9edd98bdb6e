//! Record and feature types shared by extraction, training, and serving.
use serde::Serialize;

use crate::labeler::soc_for_voltage;

/// Model input order. Changing it invalidates every trained artifact.
pub const FEATURE_NAMES: [&str; 4] = [
    "voltage_mean",
    "current_mean",
    "temperature_mean",
    "time_max",
];

/// One extracted charge/discharge cycle.
///
/// Channel summaries are `None` when the instrument did not record that
/// channel for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleRecord {
    /// 1-based position in the extracted sequence.
    pub cycle_index: u32,
    pub type_charge: bool,
    pub type_discharge: bool,
    pub voltage_mean: Option<f64>,
    pub voltage_min: Option<f64>,
    pub voltage_max: Option<f64>,
    pub current_mean: Option<f64>,
    pub temperature_mean: Option<f64>,
    pub time_max: Option<f64>,
    pub estimated_soc: f64,
}

impl CycleRecord {
    /// Feature vector in `FEATURE_NAMES` order; absent values become NaN.
    pub fn features(&self) -> [f64; 4] {
        [
            self.voltage_mean.unwrap_or(f64::NAN),
            self.current_mean.unwrap_or(f64::NAN),
            self.temperature_mean.unwrap_or(f64::NAN),
            self.time_max.unwrap_or(f64::NAN),
        ]
    }

    /// Recompute `estimated_soc` from the mean voltage.
    pub fn relabel(&mut self) {
        self.estimated_soc = soc_for_voltage(self.voltage_mean.unwrap_or(f64::NAN));
    }
}
