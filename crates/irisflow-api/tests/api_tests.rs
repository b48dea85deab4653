//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use irisflow_api::{create_router, ApiConfig, AppState, ModelStore};
use irisflow_model::{fit_iris, ModelArtifact, Predictor};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tower::ServiceExt;

/// Encoded artifact shared by every test
fn artifact_bytes() -> &'static [u8] {
    static BYTES: OnceLock<Vec<u8>> = OnceLock::new();
    BYTES.get_or_init(|| {
        fit_iris()
            .unwrap()
            .into_artifact("test-run")
            .encode()
            .unwrap()
    })
}

fn app_for(model_path: &Path) -> Router {
    let config = ApiConfig {
        model_path: model_path.to_path_buf(),
        ..Default::default()
    };
    create_router(AppState::new(config))
}

/// Router over a freshly written artifact
fn trained_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained_model.pkl");
    std::fs::write(&path, artifact_bytes()).unwrap();
    let app = app_for(&path);
    (dir, app)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_with_model() {
    let (_dir, app) = trained_app();
    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["model_accuracy"].as_f64().unwrap() >= 0.85);
    assert_eq!(body["run_id"], "test-run");
}

#[tokio::test]
async fn test_health_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for(&dir.path().join("missing.pkl"));
    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "model_unavailable");
    assert!(body["error"]["message"].as_str().unwrap().contains("missing.pkl"));
}

#[tokio::test]
async fn test_corrupt_artifact_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained_model.pkl");
    std::fs::write(&path, b"not a model").unwrap();

    let (status, _) = send(app_for(&path), get("/model/info")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained_model.pkl");
    let app = app_for(&path);

    let (status, _) = send(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    std::fs::write(&path, artifact_bytes()).unwrap();
    let (status, _) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_model_info() {
    let (_dir, app) = trained_app();
    let (status, body) = send(app, get("/model/info")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feature_names"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["target_names"],
        json!(["setosa", "versicolor", "virginica"])
    );
    for key in ["accuracy", "f1_score", "precision", "recall"] {
        assert!(body["metrics"][key].is_number(), "missing metric {key}");
    }
    assert_eq!(body["run_id"], "test-run");
}

#[tokio::test]
async fn test_predict_setosa() {
    let (_dir, app) = trained_app();
    let (status, body) = send(
        app,
        post_json("/predict", json!({ "features": [5.1, 3.5, 1.4, 0.2] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input"], json!([5.1, 3.5, 1.4, 0.2]));
    assert_eq!(body["prediction"], 0);
    assert_eq!(body["class_name"], "setosa");

    let total: f64 = body["probabilities"]
        .as_object()
        .unwrap()
        .values()
        .map(|p| p.as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_predict_virginica() {
    let (_dir, app) = trained_app();
    let (status, body) = send(
        app,
        post_json("/predict", json!({ "features": [6.7, 3.0, 5.2, 2.3] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class_name"], "virginica");
}

#[tokio::test]
async fn test_predict_wrong_length() {
    let (_dir, app) = trained_app();
    let (status, body) = send(app, post_json("/predict", json!({ "features": [5.1, 3.5] }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_predict_wrong_length_needs_no_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for(&dir.path().join("missing.pkl"));
    let (status, _) = send(
        app,
        post_json("/predict", json!({ "features": [1.0, 2.0, 3.0, 4.0, 5.0] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_non_numeric() {
    let (_dir, app) = trained_app();
    let (status, body) = send(
        app,
        post_json("/predict", json!({ "features": ["a", "b", "c", "d"] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_predict_malformed_json() {
    let (_dir, app) = trained_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"features\": [1.0,"))
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_batch() {
    let (_dir, app) = trained_app();
    let (status, body) = send(
        app.clone(),
        post_json(
            "/predict/batch",
            json!({
                "features": [
                    [5.1, 3.5, 1.4, 0.2],
                    [6.7, 3.0, 5.2, 2.3],
                    [5.0, 3.4, 1.5, 0.2],
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0]["class_name"], "setosa");
    assert_eq!(predictions[1]["class_name"], "virginica");
    assert_eq!(predictions[2]["class_name"], "setosa");

    // Batch entries match single predictions
    let (_, single) = send(
        app,
        post_json("/predict", json!({ "features": [6.7, 3.0, 5.2, 2.3] })),
    )
    .await;
    assert_eq!(predictions[1]["probabilities"], single["probabilities"]);
}

#[tokio::test]
async fn test_predict_batch_bad_item_fails_whole_batch() {
    let (_dir, app) = trained_app();
    let (status, body) = send(
        app,
        post_json(
            "/predict/batch",
            json!({ "features": [[5.1, 3.5, 1.4, 0.2], [1.0, 2.0]] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "prediction_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("item 1"));
}

#[tokio::test]
async fn test_predict_batch_wrong_shape() {
    let (_dir, app) = trained_app();
    let (status, _) = send(
        app,
        post_json("/predict/batch", json!({ "features": [5.1, 3.5, 1.4, 0.2] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (_dir, app) = trained_app();
    let (status, body) = send(app, get("/metrics")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, app) = trained_app();
    let (status, body) = send(app, get("/does-not-exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_share_one_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained_model.pkl");
    std::fs::write(&path, artifact_bytes()).unwrap();
    let store = Arc::new(ModelStore::new(&path));
    assert!(!store.is_loaded());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.get().await.unwrap() })
        })
        .collect();
    let mut predictors = Vec::new();
    for handle in handles {
        predictors.push(handle.await.unwrap());
    }

    assert!(store.is_loaded());
    for predictor in &predictors[1..] {
        assert!(Arc::ptr_eq(&predictors[0], predictor));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_health_checks() {
    let (_dir, app) = trained_app();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(app, get("/health")).await.0 })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_store_stays_empty_after_failed_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trained_model.pkl");
    let store = ModelStore::new(&path);
    assert_eq!(store.path(), path.as_path());

    assert!(store.get().await.is_err());
    assert!(!store.is_loaded());

    std::fs::write(&path, artifact_bytes()).unwrap();
    assert_eq!(store.model_info().await.unwrap().run_id, "test-run");
    assert!(store.is_loaded());
}

#[tokio::test]
async fn test_preloaded_store_skips_disk() {
    let dir = tempfile::tempdir().unwrap();
    let predictor =
        Predictor::from_artifact(ModelArtifact::decode(artifact_bytes()).unwrap()).unwrap();
    let store = ModelStore::with_predictor(dir.path().join("absent.pkl"), predictor);

    assert!(store.is_loaded());
    let info = store.model_info().await.unwrap();
    assert_eq!(info.run_id, "test-run");
}
