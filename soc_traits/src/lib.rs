pub mod node;

pub use node::{Node, Variables};

/// A trained model mapping one feature vector to a raw SOC estimate.
///
/// Implementations are read-only once constructed; the serving layer shares
/// them across requests without locking.
pub trait Regressor {
    /// Number of features the model was fitted on.
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).predict(features)
    }
}
