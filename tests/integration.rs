//! Integration tests for vitalis.
//!
//! These tests verify end-to-end workflows combining multiple components.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;
use vitalis::prelude::*;

const SAMPLES: [[f64; 2]; 3] = [[0.2, 0.3], [0.6, 0.5], [0.9, 0.8]];

/// 100 rows, two balanced labels, both features already in [0, 1].
fn balanced_table() -> (Matrix<f64>, Vec<&'static str>) {
    let mut rows = Vec::with_capacity(100);
    let mut targets = Vec::with_capacity(100);
    for i in 0..100u32 {
        let hr = f64::from(i) / 99.0;
        let activity = f64::from((i * 37) % 100) / 99.0;
        rows.push([hr, activity]);
        targets.push(if i < 50 { "LOW" } else { "HIGH" });
    }
    let x = Matrix::from_rows(&rows).expect("Matrix creation should succeed with valid test data");
    (x, targets)
}

fn trainer() -> ModelTrainer {
    ModelTrainer::new(
        TrainConfig::default()
            .with_seed(42)
            .with_n_estimators(50),
    )
}

#[test]
fn test_training_workflow_is_reproducible() {
    let (x, y) = balanced_table();
    let names = ["heart_rate", "activity_level"];

    let (first_model, first) = trainer().train(&x, &y, &names).expect("training succeeds");
    let (second_model, second) = trainer().train(&x, &y, &names).expect("training succeeds");

    assert_eq!(first.n_train, 80);
    assert_eq!(first.n_test, 20);
    assert!((0.0..=1.0).contains(&first.train_accuracy));
    assert!((0.0..=1.0).contains(&first.test_accuracy));
    assert_eq!(first, second);

    for sample in SAMPLES {
        assert_eq!(
            first_model.predict(&sample).expect("valid sample"),
            second_model.predict(&sample).expect("valid sample")
        );
    }
}

#[test]
fn test_save_and_reload_preserves_predictions() {
    let (x, y) = balanced_table();
    let (model, _) = trainer()
        .train(&x, &y, &["heart_rate", "activity_level"])
        .expect("training succeeds");

    let dir = TempDir::new().expect("temp dir");
    let store = ModelStore::new(dir.path());
    store.save(&model, "health_model").expect("save succeeds");
    let reloaded = store.load("health_model").expect("load succeeds");

    assert_eq!(reloaded, model);
    for sample in SAMPLES {
        assert_eq!(
            model.predict(&sample).expect("valid sample"),
            reloaded.predict(&sample).expect("valid sample")
        );
    }
}

#[test]
fn test_load_never_saved_key_is_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let err = ModelStore::new(dir.path()).load("bmi_model").unwrap_err();
    assert!(matches!(err, VitalisError::NotFound { .. }));
}

#[test]
fn test_overwrite_replaces_model() {
    let (x, y) = balanced_table();
    let dir = TempDir::new().expect("temp dir");
    let store = ModelStore::new(dir.path());

    let (small, _) = ModelTrainer::new(TrainConfig::default().with_n_estimators(5))
        .train(&x, &y, &["heart_rate", "activity_level"])
        .expect("training succeeds");
    store.save(&small, "health_model").expect("save succeeds");

    let (large, _) = trainer()
        .train(&x, &y, &["heart_rate", "activity_level"])
        .expect("training succeeds");
    store.save(&large, "health_model").expect("save succeeds");

    let loaded = store.load("health_model").expect("load succeeds");
    assert_eq!(loaded.forest().n_estimators(), 50);
}

/// Full path through the caller-facing API, with CSV files on disk.
#[test]
fn test_health_monitor_workflow() {
    let dir = TempDir::new().expect("temp dir");

    let mut heart = String::from("heart_rate,activity_level,risk_level\n");
    for i in 0..80u32 {
        let hr = 60 + i;
        let high = hr >= 120;
        let activity = f64::from(i % 5) / 10.0 + if high { 0.6 } else { 0.0 };
        let risk = if high { "HIGH" } else { "LOW" };
        writeln!(heart, "{hr},{activity},{risk}").expect("write to string");
    }
    fs::write(dir.path().join("health_data.csv"), heart).expect("write heart csv");

    let config = PipelineConfig::from_toml(&format!(
        "data_dir = {:?}\nmodel_dir = {:?}\n",
        dir.path().display().to_string(),
        dir.path().join("models").display().to_string(),
    ))
    .expect("valid config");
    let monitor = HealthMonitor::new(config);

    let summary = monitor
        .load_dataset(Domain::HeartRate)
        .expect("dataset loads");
    assert_eq!(summary.n_rows, 80);

    let report = monitor
        .pipeline(Domain::HeartRate)
        .train()
        .expect("training succeeds");
    assert_eq!(report.sample_predictions.len(), 3);

    let raw = BTreeMap::from([
        ("heart_rate".to_string(), 135.0),
        ("activity_level".to_string(), 0.8),
    ]);
    let prediction = monitor
        .predict_with_confidence(Domain::HeartRate, &raw)
        .expect("valid record");
    assert_eq!(prediction.label.as_str(), "HIGH");

    let raw = BTreeMap::from([
        ("heart_rate".to_string(), 59.0),
        ("activity_level".to_string(), 0.2),
    ]);
    let err = monitor.predict(Domain::HeartRate, &raw).unwrap_err();
    assert!(matches!(err, VitalisError::ValidationError { ref field, .. } if field == "heart_rate"));
}
