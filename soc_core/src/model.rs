//! Trained regressor and its on-disk artifact.
use std::path::Path;

use serde::{Deserialize, Serialize};
use soc_config::{INFO_FILE, MODEL_FILE, ModelInfo};
use soc_traits::Regressor;

use crate::error::SocError;
use crate::forest::RandomForest;

/// Mean imputation followed by a random forest.
///
/// Serialized as `battery_soc_model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSocModel {
    pub feature_names: Vec<String>,
    /// Replacement for missing (NaN) inputs, per feature.
    pub impute_means: Vec<f64>,
    pub forest: RandomForest,
}

impl ForestSocModel {
    pub fn validate(&self) -> Result<(), SocError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(SocError::InvalidArtifact("model has no features".into()));
        }
        if self.impute_means.len() != n {
            return Err(SocError::InvalidArtifact(format!(
                "model has {n} feature names but {} imputer means",
                self.impute_means.len()
            )));
        }
        if !self.impute_means.iter().all(|v| v.is_finite()) {
            return Err(SocError::InvalidArtifact(
                "imputer means must be finite".into(),
            ));
        }
        if self.forest.trees.is_empty() {
            return Err(SocError::InvalidArtifact("forest has no trees".into()));
        }
        for (i, tree) in self.forest.trees.iter().enumerate() {
            tree.validate(n)
                .map_err(|e| SocError::InvalidArtifact(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    /// Unclamped output for an already length-checked vector.
    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        let imputed: Vec<f64> = features
            .iter()
            .zip(&self.impute_means)
            .map(|(&x, &fill)| if x.is_nan() { fill } else { x })
            .collect();
        self.forest.predict(&imputed)
    }
}

impl Regressor for ForestSocModel {
    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        if features.len() != self.feature_names.len() {
            return Err(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                features.len()
            )
            .into());
        }
        Ok(self.predict_raw(features))
    }
}

/// Regressor plus the metadata that describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub model: ForestSocModel,
    pub info: ModelInfo,
}

impl ModelArtifact {
    /// Reject artifacts whose metadata disagrees with the regressor.
    pub fn validate(&self) -> Result<(), SocError> {
        self.model.validate()?;
        self.info
            .validate()
            .map_err(|e| SocError::InvalidArtifact(e.to_string()))?;
        if self.info.feature_names != self.model.feature_names {
            return Err(SocError::InvalidArtifact(format!(
                "metadata lists features [{}] but the model was trained on [{}]",
                self.info.feature_names.join(", "),
                self.model.feature_names.join(", ")
            )));
        }
        Ok(())
    }
}

/// Load `battery_soc_model.json` and `model_info.json` from `dir`.
pub fn load_artifact(dir: &Path) -> Result<ModelArtifact, SocError> {
    let model_path = dir.join(MODEL_FILE);
    let info_path = dir.join(INFO_FILE);
    for p in [&model_path, &info_path] {
        if !p.is_file() {
            return Err(SocError::ModelArtifactMissing(p.display().to_string()));
        }
    }

    let text = std::fs::read_to_string(&model_path)?;
    let model: ForestSocModel = serde_json::from_str(&text)
        .map_err(|e| SocError::InvalidArtifact(format!("{}: {e}", model_path.display())))?;
    let info = soc_config::load_model_info(&info_path)
        .map_err(|e| SocError::InvalidArtifact(e.to_string()))?;

    let artifact = ModelArtifact { model, info };
    artifact.validate()?;
    tracing::info!(
        dir = %dir.display(),
        model = %artifact.info.best_model_name,
        features = artifact.info.feature_names.len(),
        "model artifact loaded"
    );
    Ok(artifact)
}

/// Write both artifact files into `dir`, replacing any previous ones.
pub fn save_artifact(dir: &Path, artifact: &ModelArtifact) -> Result<(), SocError> {
    std::fs::create_dir_all(dir)?;
    let model_path = dir.join(MODEL_FILE);
    let info_path = dir.join(INFO_FILE);
    for p in [&model_path, &info_path] {
        if p.exists() {
            tracing::debug!(path = %p.display(), "removing previous artifact file");
            std::fs::remove_file(p)?;
        }
    }

    let text = serde_json::to_string_pretty(&artifact.model)
        .map_err(|e| SocError::Io(e.to_string()))?;
    std::fs::write(&model_path, text)?;
    soc_config::write_model_info(&info_path, &artifact.info)
        .map_err(|e| SocError::Io(e.to_string()))?;
    tracing::info!(dir = %dir.display(), "model artifact saved");
    Ok(())
}
