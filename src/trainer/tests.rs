//! Tests for the model trainer.

use super::*;

/// 40 records, risk rising with heart rate. HIGH rows sit at or above
/// 0.6 activity, LOW rows at or below 0.4.
fn heart_table() -> (Matrix<f64>, Vec<&'static str>) {
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for i in 0..40 {
        let hr = f64::from(i) / 39.0;
        let high = hr >= 0.5;
        let activity = f64::from((i * 7) % 5) / 10.0 + if high { 0.6 } else { 0.0 };
        rows.push([hr, activity]);
        targets.push(if high { "HIGH" } else { "LOW" });
    }
    (
        Matrix::from_rows(&rows).expect("Matrix creation should succeed with valid test data"),
        targets,
    )
}

const NAMES: [&str; 2] = ["heart_rate", "activity_level"];

#[test]
fn test_train_reports_both_accuracies() {
    let (x, y) = heart_table();
    let trainer = ModelTrainer::new(TrainConfig::default().with_n_estimators(15));
    let (model, metrics) = trainer.train(&x, &y, &NAMES).expect("training should succeed");

    assert_eq!(metrics.n_train, 32);
    assert_eq!(metrics.n_test, 8);
    assert!((0.0..=1.0).contains(&metrics.train_accuracy));
    assert!((0.0..=1.0).contains(&metrics.test_accuracy));
    assert!(metrics.train_accuracy > 0.9);
    assert_eq!(metrics.confusion.shape(), (2, 2));
    assert_eq!(metrics.confusion.as_slice().iter().sum::<usize>(), 8);

    assert_eq!(model.feature_names(), &["heart_rate", "activity_level"]);
    assert_eq!(model.labels().len(), 2);
    assert_eq!(model.forest().trees().len(), 15);
}

#[test]
fn test_train_is_reproducible() {
    let (x, y) = heart_table();
    let trainer = ModelTrainer::new(TrainConfig::default().with_n_estimators(10));
    let (m1, metrics1) = trainer.train(&x, &y, &NAMES).expect("first run");
    let (m2, metrics2) = trainer.train(&x, &y, &NAMES).expect("second run");
    assert_eq!(metrics1, metrics2);
    assert_eq!(m1, m2);
}

#[test]
fn test_predict_returns_label_from_set() {
    let (x, y) = heart_table();
    let (model, _) = ModelTrainer::default()
        .train(&x, &y, &NAMES)
        .expect("training should succeed");

    assert_eq!(model.predict(&[0.05, 0.2]).expect("valid").as_str(), "LOW");
    assert_eq!(model.predict(&[0.95, 0.8]).expect("valid").as_str(), "HIGH");

    let batch = model.predict_batch(&x).expect("valid");
    assert!(batch.iter().all(|l| model.labels().contains(l.as_str())));
}

#[test]
fn test_predict_proba_covers_every_label() {
    let (x, y) = heart_table();
    let (model, _) = ModelTrainer::default()
        .train(&x, &y, &NAMES)
        .expect("training should succeed");

    let proba = model.predict_proba(&[0.9, 0.1]).expect("valid");
    let names: Vec<&str> = proba.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(names, vec!["HIGH", "LOW"]);
    assert!((proba.iter().map(|(_, p)| p).sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn test_feature_importances_named() {
    let (x, y) = heart_table();
    let (model, _) = ModelTrainer::new(TrainConfig {
        max_features: MaxFeatures::All,
        ..TrainConfig::default()
    })
    .train(&x, &y, &NAMES)
    .expect("training should succeed");

    let importances = model.feature_importances();
    assert_eq!(importances[0].0, "heart_rate");
    assert!(importances[0].1 > importances[1].1);
}

#[test]
fn test_wrong_feature_count_rejected() {
    let (x, y) = heart_table();
    let (model, _) = ModelTrainer::default()
        .train(&x, &y, &NAMES)
        .expect("training should succeed");
    assert!(matches!(
        model.predict(&[0.5]).unwrap_err(),
        VitalisError::DimensionMismatch { .. }
    ));
}

#[test]
fn test_single_label_is_insufficient() {
    let x = Matrix::from_vec(3, 1, vec![0.1, 0.2, 0.3]).expect("valid");
    let err = ModelTrainer::default()
        .train(&x, &["LOW", "LOW", "LOW"], &["heart_rate"])
        .unwrap_err();
    assert!(matches!(err, VitalisError::InsufficientData { .. }));
}

#[test]
fn test_single_record_is_insufficient() {
    let x = Matrix::from_vec(1, 1, vec![0.1]).expect("valid");
    let err = ModelTrainer::default()
        .train(&x, &["LOW"], &["heart_rate"])
        .unwrap_err();
    assert!(matches!(err, VitalisError::InsufficientData { .. }));
}

#[test]
fn test_length_mismatch() {
    let (x, _) = heart_table();
    let err = ModelTrainer::default()
        .train(&x, &["LOW", "HIGH"], &NAMES)
        .unwrap_err();
    assert!(matches!(err, VitalisError::DimensionMismatch { .. }));

    let (x, y) = heart_table();
    let err = ModelTrainer::default()
        .train(&x, &y, &["heart_rate"])
        .unwrap_err();
    assert!(matches!(err, VitalisError::DimensionMismatch { .. }));
}

#[test]
fn test_validate_rejects_bad_hyperparameters() {
    assert!(TrainConfig::default().validate().is_ok());

    let cases = [
        TrainConfig {
            test_size: 1.0,
            ..TrainConfig::default()
        },
        TrainConfig::default().with_n_estimators(0),
        TrainConfig::default().with_max_depth(0),
        TrainConfig {
            max_features: MaxFeatures::Count(0),
            ..TrainConfig::default()
        },
    ];
    for config in cases {
        assert!(matches!(
            config.validate().unwrap_err(),
            VitalisError::InvalidHyperparameter { .. }
        ));
    }
}

#[test]
fn test_scaling_is_attached() {
    use crate::preprocessing::NormalizationParams;

    let (x, y) = heart_table();
    let (model, _) = ModelTrainer::default()
        .train(&x, &y, &NAMES)
        .expect("training should succeed");
    assert!(model.scaling().is_empty());

    let mut scaling = FeatureScaling::new();
    scaling.insert(
        "heart_rate",
        NormalizationParams {
            min: 60.0,
            max: 160.0,
        },
    );
    let model = model.with_scaling(scaling);
    assert!(model.scaling().get("heart_rate").is_some());
}
