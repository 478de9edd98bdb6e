//! Regression metrics reported in `model_info.json`.
use soc_config::Metrics;

/// Round to 4 decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Coefficient of determination.
///
/// A constant target has no variance to explain: a perfect fit scores 1, anything else 0.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(actual);
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    let sq: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .collect();
    mean(&sq).sqrt()
}

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    let abs: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .collect();
    mean(&abs)
}

/// All three metrics, rounded.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Metrics {
    Metrics {
        r2: round4(r2(actual, predicted)),
        rmse: round4(rmse(actual, predicted)),
        mae: round4(mae(actual, predicted)),
    }
}
