//! Tests for the domain pipelines.

use super::*;
use crate::error::VitalisError;
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

/// Heart-rate CSV: risk is HIGH above 110 bpm, where activity is also
/// above 0.5. Row 3 lacks a heart rate, row 5 lacks a target.
fn heart_csv() -> String {
    let mut csv = String::from("heart_rate,activity_level,risk_level\n");
    for i in 0..60u32 {
        let hr = 70 + i;
        let activity = f64::from(i % 5) / 10.0 + if hr > 110 { 0.6 } else { 0.0 };
        match i {
            3 => writeln!(csv, ",{activity},LOW"),
            5 => writeln!(csv, "{hr},{activity},"),
            _ => {
                let risk = if hr > 110 { "HIGH" } else { "LOW" };
                writeln!(csv, "{hr},{activity},{risk}")
            }
        }
        .expect("write to string");
    }
    csv
}

fn bmi_csv() -> String {
    let mut csv = String::from("Height (m),Weight (kg),Category\n");
    for i in 0..40u32 {
        let height = 1.5 + f64::from(i % 8) * 0.05;
        let weight = 50.0 + f64::from(i) * 1.5;
        let bmi = weight / (height * height);
        let category = if bmi >= 25.0 { "Overweight" } else { "Normal" };
        writeln!(csv, "{height},{weight},{category}").expect("write to string");
    }
    csv
}

fn sugar_csv() -> String {
    let mut csv = String::from("Fasting Blood Sugar (mg/dL),Category\n");
    for i in 0..40u32 {
        let sugar = 70 + i * 3;
        let category = if sugar >= 126 { "Diabetes" } else { "Normal" };
        writeln!(csv, "{sugar},{category}").expect("write to string");
    }
    csv
}

fn workspace() -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("health_data.csv"), heart_csv()).expect("write heart csv");
    fs::write(dir.path().join("bmi_data_200.csv"), bmi_csv()).expect("write bmi csv");
    fs::write(dir.path().join("blood_sugar_data.csv"), sugar_csv()).expect("write sugar csv");

    let config = PipelineConfig {
        data_dir: dir.path().to_path_buf(),
        model_dir: dir.path().join("models"),
        ..PipelineConfig::default()
    };
    (dir, config)
}

fn heart_record(hr: f64, activity: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("heart_rate".to_string(), hr),
        ("activity_level".to_string(), activity),
    ])
}

#[test]
fn test_preprocess_heart_rate() {
    let (_dir, config) = workspace();
    let pipeline = DomainPipeline::new(Domain::HeartRate, &config);
    let dataset = pipeline.load_dataset().expect("dataset loads");
    let prepared = pipeline.preprocess(&dataset).expect("preprocess");

    assert_eq!(prepared.n_dropped, 1);
    assert_eq!(prepared.features.n_rows(), 59);
    assert_eq!(prepared.targets.len(), 59);

    let params = prepared.scaling.get("heart_rate").expect("heart rate is normalized");
    assert_eq!((params.min, params.max), (70.0, 129.0));
    assert!(prepared.scaling.get("activity_level").is_none());

    // First row is 70 bpm, the training minimum.
    assert_eq!(prepared.features.get(0, 0), 0.0);
    for row in prepared.features.rows() {
        assert!(row.iter().all(|v| v.is_finite()));
        assert!((0.0..=1.0).contains(&row[0]));
    }
}

#[test]
fn test_preprocess_leaves_bmi_unscaled() {
    let (_dir, config) = workspace();
    let pipeline = DomainPipeline::new(Domain::Bmi, &config);
    let dataset = pipeline.load_dataset().expect("dataset loads");
    let prepared = pipeline.preprocess(&dataset).expect("preprocess");

    assert!(prepared.scaling.is_empty());
    assert_eq!(prepared.n_dropped, 0);
    assert_eq!(prepared.features.get(0, 0), 1.5);
    assert_eq!(prepared.features.get(0, 1), 50.0);
}

#[test]
fn test_train_saves_and_reports() {
    let (_dir, config) = workspace();
    let pipeline = DomainPipeline::new(Domain::HeartRate, &config);
    let report = pipeline.train().expect("training succeeds");

    assert_eq!(report.domain, Domain::HeartRate);
    assert_eq!(report.n_dropped, 1);
    assert!(report.model_path.is_file());
    assert!(pipeline.store().exists("health_model"));
    assert_eq!(report.sample_predictions.len(), 3);
    assert_eq!(report.feature_importances.len(), 2);
    assert!(report.metrics.train_accuracy > 0.9);
    assert!(report.to_string().contains("[heart_rate]"));

    let model = pipeline.load_model().expect("model was saved");
    assert_eq!(model.forest().n_estimators(), 50);
    for (input, label) in &report.sample_predictions {
        assert_eq!(&model.predict(input).expect("valid input"), label);
    }
}

#[test]
fn test_training_is_reproducible() {
    let (_dir, config) = workspace();
    let pipeline = DomainPipeline::new(Domain::BloodSugar, &config);
    let first = pipeline.train().expect("first run");
    let second = pipeline.train().expect("second run");
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.feature_importances, second.feature_importances);
}

#[test]
fn test_predict_uses_stored_model() {
    let (_dir, config) = workspace();
    let monitor = HealthMonitor::new(config);
    monitor
        .pipeline(Domain::HeartRate)
        .train()
        .expect("training succeeds");

    let high = monitor
        .predict(Domain::HeartRate, &heart_record(125.0, 0.8))
        .expect("valid record");
    assert_eq!(high.as_str(), "HIGH");
    let low = monitor
        .predict(Domain::HeartRate, &heart_record(75.0, 0.2))
        .expect("valid record");
    assert_eq!(low.as_str(), "LOW");

    let with_confidence = monitor
        .predict_with_confidence(Domain::HeartRate, &heart_record(125.0, 0.8))
        .expect("valid record");
    assert_eq!(with_confidence.label, high);
    assert!(with_confidence.confidence > 0.5);
}

#[test]
fn test_predict_rejects_out_of_range() {
    let (_dir, config) = workspace();
    let monitor = HealthMonitor::new(config);
    monitor
        .pipeline(Domain::HeartRate)
        .train()
        .expect("training succeeds");

    // Inside the declared 60..=160 bounds but outside the training range.
    let err = monitor
        .predict(Domain::HeartRate, &heart_record(150.0, 0.5))
        .unwrap_err();
    assert!(matches!(err, VitalisError::ValidationError { ref field, .. } if field == "heart_rate"));

    let err = monitor
        .predict(Domain::HeartRate, &heart_record(200.0, 0.5))
        .unwrap_err();
    assert!(matches!(err, VitalisError::ValidationError { .. }));
}

#[test]
fn test_predict_before_training_is_not_found() {
    let (_dir, config) = workspace();
    let monitor = HealthMonitor::new(config);
    let raw = BTreeMap::from([("Fasting Blood Sugar (mg/dL)".to_string(), 100.0)]);
    let err = monitor.predict(Domain::BloodSugar, &raw).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_train_all() {
    let (_dir, config) = workspace();
    let monitor = HealthMonitor::new(config);
    let reports = monitor.train_all().expect("all domains train");

    let domains: Vec<Domain> = reports.iter().map(|r| r.domain).collect();
    assert_eq!(domains, Domain::ALL.to_vec());

    let raw = BTreeMap::from([
        ("Height (m)".to_string(), 1.6),
        ("Weight (kg)".to_string(), 100.0),
    ]);
    let label = monitor.predict(Domain::Bmi, &raw).expect("valid record");
    assert_eq!(label.as_str(), "Overweight");
}

#[test]
fn test_train_all_stops_on_missing_dataset() {
    let (dir, config) = workspace();
    fs::remove_file(dir.path().join("bmi_data_200.csv")).expect("remove bmi csv");
    let monitor = HealthMonitor::new(config);

    let err = monitor.train_all().unwrap_err();
    assert!(err.is_not_found());
    assert!(monitor.pipeline(Domain::HeartRate).store().exists("health_model"));
    assert!(!monitor.pipeline(Domain::BloodSugar).store().exists("blood_sugar_model"));
}

#[test]
fn test_missing_target_column_is_schema_error() {
    let (dir, config) = workspace();
    fs::write(
        dir.path().join("blood_sugar_data.csv"),
        "Fasting Blood Sugar (mg/dL),Label\n90,Normal\n140,Diabetes\n",
    )
    .expect("write csv");
    let err = DomainPipeline::new(Domain::BloodSugar, &config)
        .train()
        .unwrap_err();
    assert!(matches!(err, VitalisError::SchemaError { .. }));
}

#[test]
fn test_load_dataset_summary() {
    let (_dir, config) = workspace();
    let summary = HealthMonitor::new(config)
        .load_dataset(Domain::HeartRate)
        .expect("dataset loads");
    assert_eq!(summary.n_rows, 60);
    assert!(summary.column("risk_level").is_some());
}
