mod common;

use rstest::rstest;
use soc_config::ProcessedRow;
use soc_core::{
    CycleRecord, FEATURE_NAMES, ServingContext, SocError, TrainOptions, load_artifact,
    save_artifact, soc_for_voltage, train, train_from_csv,
};
use tempfile::tempdir;

fn synthetic(n: u32) -> Vec<CycleRecord> {
    (1..=n)
        .map(|i| {
            let t = f64::from(i);
            let v = 3.45 + 0.8 * t / f64::from(n);
            CycleRecord {
                cycle_index: i,
                type_charge: i % 2 == 0,
                type_discharge: i % 2 == 1,
                voltage_mean: Some(v),
                voltage_min: Some(v - 0.3),
                voltage_max: Some(v + 0.1),
                current_mean: Some(-2.0 + 0.1 * (t * 0.7).sin()),
                temperature_mean: Some(24.0 + (t * 1.3).cos()),
                time_max: Some(3000.0 + 37.0 * t + f64::from(i * i % 7) * 11.0),
                // Deliberately wrong; training relabels.
                estimated_soc: 1.0,
            }
        })
        .collect()
}

#[rstest]
fn trains_and_reports_metadata() {
    let artifact = train(&synthetic(40), &TrainOptions::default()).unwrap();
    let info = &artifact.info;
    assert_eq!(info.best_model_name, "RandomForest");
    assert_eq!(info.feature_names, FEATURE_NAMES.map(String::from).to_vec());
    assert!(info.metrics.rmse.is_finite());
    assert!(info.metrics.mae <= info.metrics.rmse + 1e-9);
    assert!(info.metrics.rmse < 20.0, "rmse {}", info.metrics.rmse);

    let total: f64 = info.feature_importances.values().sum();
    assert!((total - 1.0).abs() < 1e-3, "importances sum to {total}");
    assert_eq!(info.feature_importances.len(), 4);
}

#[rstest]
fn training_is_deterministic_for_a_seed() {
    let a = train(&synthetic(40), &TrainOptions::default()).unwrap();
    let b = train(&synthetic(40), &TrainOptions::default()).unwrap();
    assert_eq!(a, b);
}

#[rstest]
fn too_few_rows() {
    let err = train(&synthetic(3), &TrainOptions::default()).unwrap_err();
    assert_eq!(
        err,
        SocError::InsufficientData {
            required: 5,
            available: 3
        }
    );

    // min_rows is the only floor; the split still leaves one test row.
    let artifact = train(&synthetic(5), &TrainOptions::default()).unwrap();
    assert_eq!(artifact.model.forest.trees.len(), 100);
}

#[rstest]
fn missing_values_are_imputed() {
    let mut rows = synthetic(40);
    rows[3].current_mean = None;
    rows[10].temperature_mean = None;
    let artifact = train(&rows, &TrainOptions::default()).unwrap();
    assert!(artifact.model.impute_means.iter().all(|m| m.is_finite()));
    let ctx = ServingContext::from_artifact(artifact).unwrap();
    let p = ctx.predict(&[3.9, f64::NAN, 25.0, 3500.0]).unwrap();
    assert!((0.0..=100.0).contains(&p.predicted_soc));
}

#[rstest]
fn channel_missing_in_every_row_still_trains() {
    let mut rows = synthetic(40);
    for r in &mut rows {
        r.temperature_mean = None;
    }
    let artifact = train(&rows, &TrainOptions::default()).unwrap();
    assert_eq!(artifact.model.impute_means[2], 0.0);
    assert_eq!(artifact.info.feature_importances["temperature_mean"], 0.0);
    assert!(artifact.info.metrics.rmse < 20.0, "rmse {}", artifact.info.metrics.rmse);

    let ctx = ServingContext::from_artifact(artifact).unwrap();
    let p = ctx.predict(&[4.1, -2.0, f64::NAN, 3500.0]).unwrap();
    assert!((0.0..=100.0).contains(&p.predicted_soc));
}

#[rstest]
fn forest_reproduces_the_step_labels() {
    // Voltage alone determines the label, so in-range voltages seen in
    // training come back at their exact level.
    let rows = synthetic(60);
    let opts = TrainOptions {
        test_ratio: 0.1,
        ..TrainOptions::default()
    };
    let artifact = train(&rows, &opts).unwrap();
    assert!(artifact.info.feature_importances["voltage_mean"] > 0.5);
    let ctx = ServingContext::from_artifact(artifact).unwrap();
    let p = ctx.predict(&[4.22, -2.0, 24.0, 5000.0]).unwrap();
    assert!(p.predicted_soc > 90.0, "predicted {}", p.predicted_soc);
    let p = ctx.predict(&[3.40, -2.0, 24.0, 3000.0]).unwrap();
    assert!(p.predicted_soc < 10.0, "predicted {}", p.predicted_soc);
}

#[rstest]
fn csv_to_artifact_to_serving() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("processed.csv");
    let rows: Vec<ProcessedRow> = synthetic(40).iter().map(ProcessedRow::from).collect();
    soc_config::write_processed_csv(&csv, &rows).unwrap();

    let model_dir = dir.path().join("models");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join(soc_config::MODEL_FILE), "stale").unwrap();

    let trained = train_from_csv(&csv, &model_dir, &TrainOptions::default()).unwrap();
    let loaded = load_artifact(&model_dir).unwrap();
    assert_eq!(loaded, trained);

    let ctx = ServingContext::load(&model_dir).unwrap();
    let p = ctx.predict(&[4.1, -2.0, 24.5, 3500.0]).unwrap();
    assert!((0.0..=100.0).contains(&p.predicted_soc));
}

#[rstest]
fn train_from_missing_csv() {
    let dir = tempdir().unwrap();
    let err = train_from_csv(
        &dir.path().join("nope.csv"),
        dir.path(),
        &TrainOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SocError>(),
        Some(SocError::SourceFileMissing(_))
    ));
}

#[rstest]
fn missing_artifact_files() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_artifact(dir.path()),
        Err(SocError::ModelArtifactMissing(_))
    ));

    let artifact = train(&synthetic(40), &TrainOptions::default()).unwrap();
    save_artifact(dir.path(), &artifact).unwrap();
    std::fs::remove_file(dir.path().join(soc_config::INFO_FILE)).unwrap();
    assert!(matches!(
        load_artifact(dir.path()),
        Err(SocError::ModelArtifactMissing(p)) if p.ends_with("model_info.json")
    ));
}

#[rstest]
fn mismatched_metadata_is_rejected() {
    let dir = tempdir().unwrap();
    let mut artifact = train(&synthetic(40), &TrainOptions::default()).unwrap();
    artifact.info.feature_names.pop();
    // Bypass validation by writing the files directly.
    std::fs::write(
        dir.path().join(soc_config::MODEL_FILE),
        serde_json::to_string(&artifact.model).unwrap(),
    )
    .unwrap();
    soc_config::write_model_info(&dir.path().join(soc_config::INFO_FILE), &artifact.info)
        .unwrap();
    assert!(matches!(
        load_artifact(dir.path()),
        Err(SocError::InvalidArtifact(_))
    ));
}

#[rstest]
fn reordered_metadata_is_rejected() {
    let dir = tempdir().unwrap();
    let mut artifact = train(&synthetic(40), &TrainOptions::default()).unwrap();
    artifact.info.feature_names.swap(0, 1);
    std::fs::write(
        dir.path().join(soc_config::MODEL_FILE),
        serde_json::to_string(&artifact.model).unwrap(),
    )
    .unwrap();
    soc_config::write_model_info(&dir.path().join(soc_config::INFO_FILE), &artifact.info)
        .unwrap();
    assert!(matches!(
        load_artifact(dir.path()),
        Err(SocError::InvalidArtifact(_))
    ));
}

#[rstest]
fn labels_match_serving_labeler() {
    // Training targets come from the same function used for validation.
    for r in synthetic(40) {
        let mut relabeled = r;
        relabeled.relabel();
        assert_eq!(
            relabeled.estimated_soc.to_bits(),
            soc_for_voltage(r.voltage_mean.unwrap()).to_bits()
        );
    }
}
