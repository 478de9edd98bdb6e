//! Serving context: the read-only model state behind every prediction.
//!
//! Built once (from disk, or from any [`Regressor`] in tests) and shared by
//! reference. Feature count and order come from the metadata document, never
//! from a hardcoded list.
use std::path::Path;

use serde::Serialize;
use soc_config::{Metrics, ModelInfo};
use soc_traits::Regressor;

use crate::error::SocError;
use crate::model::{ModelArtifact, load_artifact};

pub const SOC_MIN: f64 = 0.0;
pub const SOC_MAX: f64 = 100.0;

/// Clamp a raw regressor output into `[0, 100]`.
///
/// Non-finite output means the model is broken, not that the battery is
/// full or empty.
pub fn clamp_soc(raw: f64) -> Result<f64, SocError> {
    if !raw.is_finite() {
        return Err(SocError::Model(format!("non-finite model output {raw}")));
    }
    Ok(raw.clamp(SOC_MIN, SOC_MAX))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_soc: f64,
    pub model_name: String,
}

/// One slot of a batch result; `index` is the position in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItem {
    Success { index: usize, predicted_soc: f64 },
    Error { index: usize, error: String },
}

impl BatchItem {
    pub fn index(&self) -> usize {
        match self {
            BatchItem::Success { index, .. } | BatchItem::Error { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchItem::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub loaded: bool,
    pub model_name: Option<String>,
    pub metrics: Option<Metrics>,
}

struct Loaded {
    regressor: Box<dyn Regressor + Send + Sync>,
    info: ModelInfo,
}

pub struct ServingContext {
    model: Option<Loaded>,
}

impl std::fmt::Debug for ServingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServingContext")
            .field("model", &self.model.as_ref().map(|m| &m.info.best_model_name))
            .finish()
    }
}

impl ServingContext {
    /// A context with no model: every prediction reports `ModelUnavailable`.
    pub fn unloaded() -> Self {
        Self { model: None }
    }

    /// Wrap a regressor and its metadata; the two must agree on feature count.
    pub fn new<R>(regressor: R, info: ModelInfo) -> Result<Self, SocError>
    where
        R: Regressor + Send + Sync + 'static,
    {
        info.validate()
            .map_err(|e| SocError::InvalidArtifact(e.to_string()))?;
        if regressor.n_features() != info.feature_names.len() {
            return Err(SocError::InvalidArtifact(format!(
                "metadata lists {} features but the model takes {}",
                info.feature_names.len(),
                regressor.n_features()
            )));
        }
        Ok(Self {
            model: Some(Loaded {
                regressor: Box::new(regressor),
                info,
            }),
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, SocError> {
        artifact.validate()?;
        Self::new(artifact.model, artifact.info)
    }

    /// Load the artifact in `dir`.
    pub fn load(dir: &Path) -> Result<Self, SocError> {
        Self::from_artifact(load_artifact(dir)?)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn loaded(&self) -> Result<&Loaded, SocError> {
        self.model.as_ref().ok_or(SocError::ModelUnavailable)
    }

    pub fn model_info(&self) -> Result<&ModelInfo, SocError> {
        Ok(&self.loaded()?.info)
    }

    pub fn feature_names(&self) -> Result<&[String], SocError> {
        Ok(&self.loaded()?.info.feature_names)
    }

    pub fn health(&self) -> Health {
        match &self.model {
            Some(m) => Health {
                loaded: true,
                model_name: Some(m.info.best_model_name.clone()),
                metrics: Some(m.info.metrics),
            },
            None => Health {
                loaded: false,
                model_name: None,
                metrics: None,
            },
        }
    }

    /// Predict one clamped SOC value.
    ///
    /// The length check runs before the regressor is touched.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, SocError> {
        let m = self.loaded()?;
        let expected = m.info.feature_names.len();
        if features.len() != expected {
            return Err(SocError::FeatureCountMismatch {
                expected,
                received: features.len(),
            });
        }
        let raw = m
            .regressor
            .predict(features)
            .map_err(|e| SocError::Model(e.to_string()))?;
        Ok(Prediction {
            predicted_soc: clamp_soc(raw)?,
            model_name: m.info.best_model_name.clone(),
        })
    }

    /// Predict every vector independently.
    ///
    /// Only a missing model fails the whole call; any other failure becomes
    /// an error slot and the result always has one entry per input.
    pub fn batch_predict<V: AsRef<[f64]>>(&self, batch: &[V]) -> Result<Vec<BatchItem>, SocError> {
        self.batch_predict_rows(batch.iter().map(|v| Ok(v.as_ref())))
    }

    /// Like [`batch_predict`](Self::batch_predict) for rows whose decoding
    /// may already have failed; an `Err` row becomes an error slot at its
    /// own index.
    pub fn batch_predict_rows<'a, I>(&self, rows: I) -> Result<Vec<BatchItem>, SocError>
    where
        I: IntoIterator<Item = Result<&'a [f64], String>>,
    {
        self.loaded()?;
        let items = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                match row.and_then(|features| self.predict(features).map_err(|e| e.to_string())) {
                    Ok(p) => BatchItem::Success {
                        index,
                        predicted_soc: p.predicted_soc,
                    },
                    Err(error) => {
                        tracing::debug!(index, %error, "batch item failed");
                        BatchItem::Error { index, error }
                    }
                }
            })
            .collect();
        Ok(items)
    }
}
