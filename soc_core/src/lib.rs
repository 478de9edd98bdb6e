#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core battery SOC logic.
//!
//! This crate is independent of file formats on the input side (readers live
//! in `soc_reader`) and of transport on the output side (the HTTP layer lives
//! in `soc_server`). Models are reached through `soc_traits::Regressor`.
//!
//! ## Architecture
//!
//! - **Extraction**: nested battery record → `CycleRecord`s (`extract` module)
//! - **Labeling**: voltage → SOC step function (`labeler` module)
//! - **Training**: seeded split, mean imputation, random forest (`training`, `forest` modules)
//! - **Serving**: read-only `ServingContext` with clamped predictions (`predictor` module)
//! - **Reporting**: descriptive statistics over a processed table (`stats` module)

// Module declarations
pub mod conversions;
pub mod error;
pub mod extract;
pub mod forest;
pub mod labeler;
pub mod metrics;
pub mod mocks;
pub mod model;
pub mod predictor;
pub mod stats;
pub mod training;
pub mod types;

pub use error::{Report, Result, SocError};
pub use extract::{
    ExtractOptions, Extraction, SkippedCycle, extract_cycles, extract_file, safe_extract,
};
pub use forest::{ForestParams, RandomForest};
pub use labeler::{SOC_LEVELS, THRESHOLDS, soc_for_voltage};
pub use model::{ForestSocModel, ModelArtifact, load_artifact, save_artifact};
pub use predictor::{BatchItem, Health, Prediction, ServingContext, clamp_soc};
pub use stats::{Summary, summarize};
pub use training::{TrainOptions, train, train_from_csv};
pub use types::{CycleRecord, FEATURE_NAMES};
