mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::info;
use proptest::prelude::*;
use rstest::rstest;
use soc_core::mocks::{ConstRegressor, CountingRegressor, EchoRegressor};
use soc_core::{BatchItem, ServingContext, SocError, clamp_soc};

fn echo() -> ServingContext {
    ServingContext::new(EchoRegressor { n_features: 4 }, info()).unwrap()
}

#[rstest]
#[case(-5.0, 0.0)]
#[case(142.0, 100.0)]
#[case(63.5, 63.5)]
#[case(0.0, 0.0)]
#[case(100.0, 100.0)]
fn output_is_clamped(#[case] raw: f64, #[case] expected: f64) {
    let ctx = ServingContext::new(
        ConstRegressor {
            value: raw,
            n_features: 4,
        },
        info(),
    )
    .unwrap();
    let p = ctx.predict(&[3.9, -2.0, 25.0, 3000.0]).unwrap();
    assert_eq!(p.predicted_soc, expected);
    assert_eq!(p.model_name, "RandomForest");
}

#[rstest]
#[case(vec![])]
#[case(vec![3.9, -2.0, 25.0])]
#[case(vec![3.9, -2.0, 25.0, 3000.0, 1.0])]
fn wrong_length_never_reaches_the_model(#[case] features: Vec<f64>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = ServingContext::new(
        CountingRegressor {
            value: 50.0,
            n_features: 4,
            calls: Arc::clone(&calls),
        },
        info(),
    )
    .unwrap();
    let err = ctx.predict(&features).unwrap_err();
    assert_eq!(
        err,
        SocError::FeatureCountMismatch {
            expected: 4,
            received: features.len(),
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    ctx.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn batch_keeps_length_and_indices_when_middle_item_fails() {
    let ctx = echo();
    let batch = vec![
        vec![10.0, 0.0, 0.0, 0.0],
        vec![20.0, 0.0, 0.0, 0.0],
        vec![30.0, 0.0, 0.0, 0.0],
        vec![f64::NAN, 0.0, 0.0, 0.0],
        vec![50.0, 0.0, 0.0, 0.0],
    ];
    let out = ctx.batch_predict(&batch).unwrap();
    assert_eq!(out.len(), 5);
    for (i, item) in out.iter().enumerate() {
        assert_eq!(item.index(), i);
        assert_eq!(item.is_success(), i != 3);
    }
    assert_eq!(
        out[4],
        BatchItem::Success {
            index: 4,
            predicted_soc: 50.0
        }
    );
    assert!(matches!(&out[3], BatchItem::Error { error, .. } if error.contains("model error")));
}

#[rstest]
fn batch_reports_wrong_length_items_in_place() {
    let ctx = echo();
    let batch: Vec<Vec<f64>> = vec![vec![10.0, 0.0, 0.0, 0.0], vec![1.0], vec![]];
    let out = ctx.batch_predict(&batch).unwrap();
    assert_eq!(out.len(), 3);
    assert!(out[0].is_success());
    assert_eq!(
        out[1],
        BatchItem::Error {
            index: 1,
            error: "expected 4 features, got 1".into()
        }
    );
    assert_eq!(out[2].index(), 2);
}

#[rstest]
fn undecodable_rows_become_error_slots() {
    let ctx = echo();
    let good = [10.0, 0.0, 0.0, 0.0];
    let rows: Vec<Result<&[f64], String>> = vec![
        Ok(&good[..]),
        Err("item 1: expected an array of numbers".into()),
        Ok(&good[..]),
    ];
    let out = ctx.batch_predict_rows(rows).unwrap();
    assert_eq!(out.len(), 3);
    assert!(out[0].is_success() && out[2].is_success());
    assert_eq!(
        out[1],
        BatchItem::Error {
            index: 1,
            error: "item 1: expected an array of numbers".into()
        }
    );
}

#[rstest]
fn empty_batch_is_empty() {
    let out = echo().batch_predict::<Vec<f64>>(&[]).unwrap();
    assert!(out.is_empty());
}

#[rstest]
fn unloaded_context_is_unavailable() {
    let ctx = ServingContext::unloaded();
    assert_eq!(
        ctx.predict(&[1.0, 2.0, 3.0, 4.0]).unwrap_err(),
        SocError::ModelUnavailable
    );
    assert_eq!(
        ctx.batch_predict(&[vec![1.0, 2.0, 3.0, 4.0]]).unwrap_err(),
        SocError::ModelUnavailable
    );
    assert_eq!(ctx.model_info().unwrap_err(), SocError::ModelUnavailable);
    let h = ctx.health();
    assert!(!h.loaded);
    assert_eq!(h.model_name, None);
}

#[rstest]
fn health_reports_loaded_model() {
    let h = echo().health();
    assert!(h.loaded);
    assert_eq!(h.model_name.as_deref(), Some("RandomForest"));
    assert_eq!(h.metrics.unwrap().r2, 0.9);
}

#[rstest]
fn metadata_must_match_regressor() {
    let err = ServingContext::new(EchoRegressor { n_features: 3 }, info()).unwrap_err();
    assert!(matches!(err, SocError::InvalidArtifact(_)));
}

#[rstest]
fn non_finite_output_is_a_model_error() {
    let ctx = ServingContext::new(
        ConstRegressor {
            value: f64::NAN,
            n_features: 4,
        },
        info(),
    )
    .unwrap();
    assert!(matches!(
        ctx.predict(&[1.0, 2.0, 3.0, 4.0]),
        Err(SocError::Model(_))
    ));
}

#[rstest]
fn batch_item_serializes_with_status_tag() {
    let ok = serde_json::to_value(BatchItem::Success {
        index: 0,
        predicted_soc: 12.5,
    })
    .unwrap();
    assert_eq!(
        ok,
        serde_json::json!({"status": "success", "index": 0, "predicted_soc": 12.5})
    );
    let err = serde_json::to_value(BatchItem::Error {
        index: 2,
        error: "boom".into(),
    })
    .unwrap();
    assert_eq!(
        err,
        serde_json::json!({"status": "error", "index": 2, "error": "boom"})
    );
}

proptest! {
    #[test]
    fn clamp_stays_in_range(raw in -1.0e9f64..1.0e9) {
        let v = clamp_soc(raw).unwrap();
        prop_assert!((0.0..=100.0).contains(&v));
    }

    #[test]
    fn prediction_stays_in_range(x in -1.0e6f64..1.0e6) {
        let p = echo().predict(&[x, 0.0, 0.0, 0.0]).unwrap();
        prop_assert!((0.0..=100.0).contains(&p.predicted_soc));
    }
}
