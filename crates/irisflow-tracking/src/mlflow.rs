//! MLflow tracking server client (REST API 2.0)

use crate::tracker::{ExperimentTracker, Params, RunStatus};
use async_trait::async_trait;
use irisflow_core::{Error, Metrics, Result};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const API_PREFIX: &str = "api/2.0/mlflow";
const ARTIFACTS_PREFIX: &str = "api/2.0/mlflow-artifacts/artifacts";

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Debug, Deserialize)]
struct RunInfo {
    run_id: String,
}

#[derive(Debug, Serialize)]
struct Param<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct Metric<'a> {
    key: &'a str,
    value: f64,
    timestamp: i64,
    step: i64,
}

/// Tracker backed by an MLflow tracking server
#[derive(Debug, Clone)]
pub struct MlflowTracker {
    client: Client,
    base: Url,
    experiment_id: String,
}

impl MlflowTracker {
    /// Connect to the server and resolve (or create) the experiment.
    ///
    /// Fails when the server is unreachable, which callers use as the
    /// availability probe.
    pub async fn connect(uri: &str, experiment_name: &str) -> Result<Self> {
        let mut base = Url::parse(uri)
            .map_err(|e| Error::tracking(format!("invalid tracking uri '{}': {}", uri, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::tracking(e.to_string()))?;

        let mut tracker = Self {
            client,
            base,
            experiment_id: String::new(),
        };
        tracker.experiment_id = tracker.resolve_experiment(experiment_name).await?;

        info!(
            uri = %tracker.base,
            experiment = %experiment_name,
            experiment_id = %tracker.experiment_id,
            "Connected to MLflow tracking server"
        );
        Ok(tracker)
    }

    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(&format!("{}/{}", API_PREFIX, path))
            .map_err(|e| Error::tracking(e.to_string()))
    }

    async fn resolve_experiment(&self, name: &str) -> Result<String> {
        let url = Url::parse_with_params(
            self.endpoint("experiments/get-by-name")?.as_str(),
            &[("experiment_name", name)],
        )
        .map_err(|e| Error::tracking(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::tracking(format!("MLflow unreachable: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(experiment = %name, "Creating MLflow experiment");
            let created: CreateExperimentResponse = self
                .post("experiments/create", &json!({ "name": name }))
                .await?;
            return Ok(created.experiment_id);
        }

        let found: GetExperimentResponse = decode(response).await?;
        Ok(found.experiment.experiment_id)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::tracking(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::tracking(format!("MLflow returned {}: {}", status, body)));
    }
    response
        .json()
        .await
        .map_err(|e| Error::tracking(format!("unexpected MLflow response: {}", e)))
}

#[async_trait]
impl ExperimentTracker for MlflowTracker {
    fn name(&self) -> &str {
        "mlflow"
    }

    async fn start_run(&self) -> Result<String> {
        let created: CreateRunResponse = self
            .post(
                "runs/create",
                &json!({
                    "experiment_id": self.experiment_id,
                    "start_time": chrono::Utc::now().timestamp_millis(),
                    "tags": [{ "key": "mlflow.source.name", "value": "irisflow-train" }],
                }),
            )
            .await?;
        Ok(created.run.info.run_id)
    }

    async fn log_params(&self, run_id: &str, params: &Params) -> Result<()> {
        let params: Vec<Param<'_>> = params
            .iter()
            .map(|(key, value)| Param { key, value })
            .collect();
        let _: serde_json::Value = self
            .post(
                "runs/log-batch",
                &json!({ "run_id": run_id, "params": params }),
            )
            .await?;
        Ok(())
    }

    async fn log_metrics(&self, run_id: &str, metrics: &Metrics) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let metrics: Vec<Metric<'_>> = metrics
            .iter()
            .map(|(key, value)| Metric {
                key,
                value: *value,
                timestamp,
                step: 0,
            })
            .collect();
        let _: serde_json::Value = self
            .post(
                "runs/log-batch",
                &json!({ "run_id": run_id, "metrics": metrics }),
            )
            .await?;
        Ok(())
    }

    async fn log_model(&self, run_id: &str, artifact: &[u8]) -> Result<()> {
        let url = self
            .base
            .join(&format!(
                "{}/{}/{}/artifacts/model/model.bin",
                ARTIFACTS_PREFIX, self.experiment_id, run_id
            ))
            .map_err(|e| Error::tracking(e.to_string()))?;

        let response = self
            .client
            .put(url)
            .header("Content-Type", "application/octet-stream")
            .body(artifact.to_vec())
            .send()
            .await
            .map_err(|e| Error::tracking(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::tracking(format!(
                "artifact upload returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                "runs/update",
                &json!({
                    "run_id": run_id,
                    "status": status.as_str(),
                    "end_time": chrono::Utc::now().timestamp_millis(),
                }),
            )
            .await?;
        Ok(())
    }
}
