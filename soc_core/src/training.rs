//! Offline training: processed table → `ModelArtifact`.
//!
//! Labels are always recomputed with [`soc_for_voltage`], so a model is
//! trained on exactly the step function used everywhere else, whatever the
//! `estimated_soc` column of the input says.
use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use soc_config::ModelInfo;

use crate::error::SocError;
use crate::labeler::soc_for_voltage;
use crate::forest::{ForestParams, RandomForest};
use crate::metrics;
use crate::model::{ForestSocModel, ModelArtifact, save_artifact};
use crate::types::{CycleRecord, FEATURE_NAMES};

pub const MODEL_NAME: &str = "RandomForest";

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the split and for the forest's bootstrap draws.
    pub seed: u64,
    pub min_rows: usize,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            min_rows: 5,
            n_trees: 100,
            max_depth: None,
        }
    }
}

/// Shuffled `(train, test)` row indices; the test side gets `ceil(n * ratio)` rows.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    let n_test = ((n as f64 * test_ratio).ceil() as usize).clamp(1, n.saturating_sub(1).max(1));
    let train = idx.split_off(n_test);
    (train, idx)
}

/// Per-column mean over non-missing values; an all-missing column imputes as 0.
#[allow(clippy::cast_precision_loss)]
fn column_means(rows: &[[f64; 4]]) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (j, slot) in out.iter_mut().enumerate() {
        let present: Vec<f64> = rows.iter().map(|r| r[j]).filter(|v| !v.is_nan()).collect();
        if !present.is_empty() {
            *slot = present.iter().sum::<f64>() / present.len() as f64;
        }
    }
    out
}

/// Fit the SOC regressor on `records`.
pub fn train(records: &[CycleRecord], opts: &TrainOptions) -> Result<ModelArtifact, SocError> {
    let n = records.len();
    if n < opts.min_rows {
        return Err(SocError::InsufficientData {
            required: opts.min_rows,
            available: n,
        });
    }

    let features: Vec<[f64; 4]> = records.iter().map(CycleRecord::features).collect();
    let targets: Vec<f64> = records
        .iter()
        .map(|r| soc_for_voltage(r.voltage_mean.unwrap_or(f64::NAN)))
        .collect();

    let (train_idx, test_idx) = split_indices(n, opts.test_ratio, opts.seed);
    let raw_train: Vec<[f64; 4]> = train_idx.iter().map(|&i| features[i]).collect();
    let impute_means = column_means(&raw_train);
    let impute = |row: [f64; 4]| -> [f64; 4] {
        let mut out = row;
        for (v, fill) in out.iter_mut().zip(impute_means) {
            if v.is_nan() {
                *v = fill;
            }
        }
        out
    };
    let x_train: Vec<[f64; 4]> = raw_train.into_iter().map(impute).collect();
    let y_train: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();

    let params = ForestParams {
        n_trees: opts.n_trees,
        max_depth: opts.max_depth,
        seed: opts.seed,
        ..ForestParams::default()
    };
    let (forest, importances) = RandomForest::fit(&x_train, &y_train, &params)?;

    let model = ForestSocModel {
        feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
        impute_means: impute_means.to_vec(),
        forest,
    };
    model.validate()?;

    let y_test: Vec<f64> = test_idx.iter().map(|&i| targets[i]).collect();
    let y_pred: Vec<f64> = test_idx
        .iter()
        .map(|&i| model.predict_raw(&features[i]))
        .collect();
    let metrics = metrics::evaluate(&y_test, &y_pred);

    let feature_importances: BTreeMap<String, f64> = model
        .feature_names
        .iter()
        .zip(&importances)
        .map(|(name, w)| (name.clone(), metrics::round4(*w)))
        .collect();

    tracing::info!(
        rows = n,
        trees = opts.n_trees,
        train = train_idx.len(),
        test = test_idx.len(),
        r2 = metrics.r2,
        rmse = metrics.rmse,
        mae = metrics.mae,
        "trained SOC regressor"
    );

    Ok(ModelArtifact {
        info: ModelInfo {
            best_model_name: MODEL_NAME.to_string(),
            feature_names: model.feature_names.clone(),
            feature_importances,
            metrics,
        },
        model,
    })
}

/// Train from a processed CSV and write the artifact into `model_dir`.
pub fn train_from_csv(
    csv: &Path,
    model_dir: &Path,
    opts: &TrainOptions,
) -> crate::Result<ModelArtifact> {
    if !csv.exists() {
        return Err(SocError::SourceFileMissing(csv.display().to_string()).into());
    }
    let rows = soc_config::load_processed_csv(csv)?;
    let records: Vec<CycleRecord> = rows.iter().map(CycleRecord::from).collect();
    let artifact = train(&records, opts)?;
    save_artifact(model_dir, &artifact)?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sizes_use_ceiling() {
        let (train, test) = split_indices(11, 0.2, 42);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_seeded() {
        assert_eq!(split_indices(30, 0.2, 7), split_indices(30, 0.2, 7));
    }

    #[test]
    fn means_skip_missing_and_default_to_zero() {
        let rows = [
            [1.0, f64::NAN, 5.0, f64::NAN],
            [3.0, 2.0, f64::NAN, f64::NAN],
        ];
        assert_eq!(column_means(&rows), [2.0, 2.0, 5.0, 0.0]);
    }
}
