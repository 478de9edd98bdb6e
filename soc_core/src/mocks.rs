//! Test and helper regressors for soc_core

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

use soc_traits::Regressor;

/// Always returns `value`.
pub struct ConstRegressor {
    pub value: f64,
    pub n_features: usize,
}

impl Regressor for ConstRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Ok(self.value)
    }
}

/// Returns the first feature unchanged; fails when it is NaN.
pub struct EchoRegressor {
    pub n_features: usize,
}

impl Regressor for EchoRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<f64, Box<dyn Error + Send + Sync>> {
        match features.first() {
            Some(v) if !v.is_nan() => Ok(*v),
            _ => Err(Box::new(std::io::Error::other("echo regressor got NaN"))),
        }
    }
}

/// Counts calls; shares the counter so tests can keep a handle after moving
/// the regressor into a serving context.
pub struct CountingRegressor {
    pub value: f64,
    pub n_features: usize,
    pub calls: std::sync::Arc<AtomicUsize>,
}

impl Regressor for CountingRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, Box<dyn Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value)
    }
}
