//! End-to-end training runs against temporary directories

use irisflow_core::{Error, LOCAL_RUN_ID};
use irisflow_model::{Dataset, ForestParams, ModelArtifact, Predictor, TrainingParams};
use irisflow_tracking::{FileTracker, LocalTracker, RunStatus};
use irisflow_trainer::{train, train_on, TrainerConfig};
use std::path::Path;

fn config_in(dir: &Path) -> TrainerConfig {
    TrainerConfig {
        model_path: dir.join("models").join("trained_model.pkl"),
        ..Default::default()
    }
}

fn weak_params() -> TrainingParams {
    TrainingParams {
        forest: ForestParams {
            n_estimators: 5,
            max_depth: Some(0),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_train_writes_artifact_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let report = train(&config, &LocalTracker).await.unwrap();

    assert_eq!(report.run_id, LOCAL_RUN_ID);
    assert_eq!((report.n_train, report.n_test), (120, 30));
    assert!(report.accuracy() >= 0.85);

    let artifact = ModelArtifact::load(&config.model_path).unwrap();
    assert_eq!(artifact.run_id, LOCAL_RUN_ID);
    assert_eq!(artifact.metrics, report.metrics);

    let predictor = Predictor::from_artifact(artifact).unwrap();
    let prediction = predictor.predict_single(&[5.1, 3.5, 1.4, 0.2]).unwrap();
    assert_eq!(prediction.class_name, "setosa");

    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report.metrics_path).unwrap()).unwrap();
    assert_eq!(report.metrics_path, dir.path().join("models").join("metrics.json"));
    let keys: Vec<&String> = metrics.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["accuracy", "f1_score", "precision", "recall"]);
}

#[tokio::test]
async fn test_train_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = train(&config_in(&dir.path().join("a")), &LocalTracker)
        .await
        .unwrap();
    let second = train(&config_in(&dir.path().join("b")), &LocalTracker)
        .await
        .unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(
        std::fs::read(&first.model_path).unwrap(),
        std::fs::read(&second.model_path).unwrap()
    );
}

#[tokio::test]
async fn test_quality_gate_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let dataset = Dataset::iris().unwrap();

    let err = train_on(&config, &LocalTracker, &dataset, &weak_params())
        .await
        .unwrap_err();

    match err {
        Error::QualityGate { accuracy, threshold } => {
            assert!(accuracy < threshold);
            assert_eq!(threshold, 0.85);
        }
        other => panic!("expected quality gate failure, got {other:?}"),
    }
    assert!(!config.model_path.exists());
    assert!(!config.metrics_path().exists());
}

#[tokio::test]
async fn test_quality_gate_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    train(&config, &LocalTracker).await.unwrap();
    let before = std::fs::read(&config.model_path).unwrap();

    let dataset = Dataset::iris().unwrap();
    let result = train_on(&config, &LocalTracker, &dataset, &weak_params()).await;

    assert!(matches!(result, Err(Error::QualityGate { .. })));
    assert_eq!(std::fs::read(&config.model_path).unwrap(), before);
}

#[tokio::test]
async fn test_failed_metrics_write_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    train(&config, &LocalTracker).await.unwrap();
    let before = std::fs::read(&config.model_path).unwrap();

    // A regular file where the metrics directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let config = TrainerConfig {
        metrics_path: Some(blocker.join("metrics.json")),
        accuracy_threshold: 0.0,
        ..config_in(dir.path())
    };
    let dataset = Dataset::iris().unwrap();
    let params = TrainingParams {
        forest: ForestParams {
            seed: 7,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = train_on(&config, &LocalTracker, &dataset, &params).await;

    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(std::fs::read(&config.model_path).unwrap(), before);
    let leftovers = std::fs::read_dir(config.model_path.parent().unwrap())
        .unwrap()
        .count();
    assert_eq!(leftovers, 2, "only the artifact and its metrics.json remain");
}

#[tokio::test]
async fn test_zero_threshold_accepts_weak_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig {
        accuracy_threshold: 0.0,
        ..config_in(dir.path())
    };
    let dataset = Dataset::iris().unwrap();

    let report = train_on(&config, &LocalTracker, &dataset, &weak_params())
        .await
        .unwrap();
    assert!(report.accuracy() < 0.85);
    assert!(config.model_path.exists());
}

#[tokio::test]
async fn test_file_tracker_records_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let tracker = FileTracker::new(dir.path().join("mlruns"), "iris-classifier");

    let report = train(&config, &tracker).await.unwrap();
    assert_ne!(report.run_id, LOCAL_RUN_ID);

    let meta = tracker.read_meta(&report.run_id).await.unwrap();
    assert_eq!(meta.status, RunStatus::Finished);

    let run_dir = tracker.run_dir(&report.run_id);
    assert_eq!(
        std::fs::read_to_string(run_dir.join("params").join("n_estimators")).unwrap(),
        "100"
    );
    assert!(run_dir.join("metrics").join("accuracy").exists());
    assert_eq!(
        std::fs::read(run_dir.join("artifacts").join("model").join("model.bin")).unwrap(),
        std::fs::read(&config.model_path).unwrap()
    );

    // The artifact carries the tracking run id
    let artifact = ModelArtifact::load(&config.model_path).unwrap();
    assert_eq!(artifact.run_id, report.run_id);
}

#[tokio::test]
async fn test_file_tracker_marks_gated_run_failed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let tracker = FileTracker::new(dir.path().join("mlruns"), "iris-classifier");
    let dataset = Dataset::iris().unwrap();

    let result = train_on(&config, &tracker, &dataset, &weak_params()).await;
    assert!(result.is_err());

    let experiment_dir = dir.path().join("mlruns").join("iris-classifier");
    let runs: Vec<_> = std::fs::read_dir(&experiment_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(runs.len(), 1);

    let meta = tracker.read_meta(&runs[0]).await.unwrap();
    assert_eq!(meta.status, RunStatus::Failed);
}
