#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and on-disk table formats for the SOC pipeline.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The processed-cycle CSV loader enforces the exact header row.
//! - `ModelInfo` is the metadata document written next to a trained model.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the serialized regressor inside the model directory.
pub const MODEL_FILE: &str = "battery_soc_model.json";
/// File name of the metadata document inside the model directory.
pub const INFO_FILE: &str = "model_info.json";

/// Processed-cycle CSV schema, one row per extracted cycle.
///
/// Expected headers:
/// cycle_index,type_charge,type_discharge,voltage_mean,voltage_min,voltage_max,current_mean,temperature_mean,time_max,estimated_soc
///
/// Absent channel values are empty cells.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ProcessedRow {
    pub cycle_index: u32,
    pub type_charge: u8,
    pub type_discharge: u8,
    pub voltage_mean: Option<f64>,
    pub voltage_min: Option<f64>,
    pub voltage_max: Option<f64>,
    pub current_mean: Option<f64>,
    pub temperature_mean: Option<f64>,
    pub time_max: Option<f64>,
    pub estimated_soc: f64,
}

pub const PROCESSED_HEADERS: [&str; 10] = [
    "cycle_index",
    "type_charge",
    "type_discharge",
    "voltage_mean",
    "voltage_min",
    "voltage_max",
    "current_mean",
    "temperature_mean",
    "time_max",
    "estimated_soc",
];

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Raw instrument file (`.mat` or `.json`).
    pub raw_file: PathBuf,
    /// Processed-cycle CSV written by `extract`, read by `train`.
    pub processed_csv: PathBuf,
    /// Directory holding the model and its metadata.
    pub model_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            raw_file: PathBuf::from("data/raw/B0005.mat"),
            processed_csv: PathBuf::from("data/processed/B0005_processed.csv"),
            model_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractCfg {
    /// Top-level variable holding the battery record. Defaults to the raw file stem.
    pub variable: Option<String>,
    /// Maximum single-element unwrapping steps before a value is rejected.
    pub max_unwrap_depth: usize,
}

impl Default for ExtractCfg {
    fn default() -> Self {
        Self {
            variable: None,
            max_unwrap_depth: 32,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrainingCfg {
    /// Fraction of rows held out for evaluation, in (0.0, 1.0).
    pub test_ratio: f64,
    /// Seed for the shuffled split.
    pub seed: u64,
    /// Minimum number of processed rows required to train.
    pub min_rows: usize,
    /// Trees in the random forest.
    pub n_trees: usize,
    /// Depth limit per tree; unset grows trees until their leaves are pure.
    pub max_depth: Option<usize>,
}

impl Default for TrainingCfg {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerCfg {
    pub host: String,
    pub port: u16,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub extract: ExtractCfg,
    pub training: TrainingCfg,
    pub server: ServerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Extract
        if self.extract.max_unwrap_depth == 0 {
            eyre::bail!("extract.max_unwrap_depth must be >= 1");
        }
        if self.extract.max_unwrap_depth > 1024 {
            eyre::bail!("extract.max_unwrap_depth is unreasonably large (>1024)");
        }
        if let Some(v) = &self.extract.variable {
            if v.trim().is_empty() {
                eyre::bail!("extract.variable must not be blank");
            }
        }

        // Training
        let r = self.training.test_ratio;
        if !(r > 0.0 && r < 1.0) {
            eyre::bail!("training.test_ratio must be in (0.0, 1.0)");
        }
        if self.training.min_rows < 3 {
            eyre::bail!("training.min_rows must be >= 3");
        }
        if self.training.n_trees == 0 || self.training.n_trees > 10_000 {
            eyre::bail!("training.n_trees must be in 1..=10000");
        }
        if self.training.max_depth == Some(0) {
            eyre::bail!("training.max_depth must be >= 1 when set");
        }

        // Server
        if self.server.host.trim().is_empty() {
            eyre::bail!("server.host must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
            }
        }

        Ok(())
    }

    /// Variable name to extract from `raw`: the configured one, else the file stem.
    pub fn variable_for(&self, raw: &Path) -> Option<String> {
        self.extract.variable.clone().or_else(|| {
            raw.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
    }
}

pub fn load_processed_csv(path: &Path) -> eyre::Result<Vec<ProcessedRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open processed CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != PROCESSED_HEADERS {
        eyre::bail!(
            "processed CSV must have headers '{}', got: {}",
            PROCESSED_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProcessedRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

pub fn write_processed_csv(path: &Path, rows: &[ProcessedRow]) -> eyre::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre::eyre!("create directory {:?}: {}", parent, e))?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| eyre::eyre!("create processed CSV {:?}: {}", path, e))?;
    // Header written explicitly so an empty table still carries it.
    wtr.write_record(PROCESSED_HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Evaluation metrics on the held-out split.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Metadata document stored next to the trained model.
///
/// `feature_names` is authoritative for feature order and count at serve time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInfo {
    pub best_model_name: String,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_importances: BTreeMap<String, f64>,
    pub metrics: Metrics,
}

impl ModelInfo {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.feature_names.is_empty() {
            eyre::bail!("model_info.feature_names must not be empty");
        }
        if self.best_model_name.trim().is_empty() {
            eyre::bail!("model_info.best_model_name must not be empty");
        }
        Ok(())
    }
}

pub fn load_model_info(path: &Path) -> eyre::Result<ModelInfo> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read model info {:?}: {}", path, e))?;
    let info: ModelInfo = serde_json::from_str(&text)
        .map_err(|e| eyre::eyre!("parse model info {:?}: {}", path, e))?;
    info.validate()?;
    Ok(info)
}

pub fn write_model_info(path: &Path, info: &ModelInfo) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(info)?;
    std::fs::write(path, text).map_err(|e| eyre::eyre!("write model info {:?}: {}", path, e))?;
    Ok(())
}
