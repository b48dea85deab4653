//! Tracker trait and the local fallback

use async_trait::async_trait;
use irisflow_core::{Metrics, Result, LOCAL_RUN_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run parameters, stringly typed as tracking backends store them
pub type Params = BTreeMap<String, String>;

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
        }
    }
}

/// Trait for experiment tracking backends
#[async_trait]
pub trait ExperimentTracker: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Open a run and return its id
    async fn start_run(&self) -> Result<String>;

    /// Record run parameters
    async fn log_params(&self, run_id: &str, params: &Params) -> Result<()>;

    /// Record evaluation metrics
    async fn log_metrics(&self, run_id: &str, metrics: &Metrics) -> Result<()>;

    /// Attach the encoded model artifact
    async fn log_model(&self, run_id: &str, artifact: &[u8]) -> Result<()>;

    /// Close the run
    async fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()>;
}

/// Used when no tracking backend is configured or reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTracker;

#[async_trait]
impl ExperimentTracker for LocalTracker {
    fn name(&self) -> &str {
        "local"
    }

    async fn start_run(&self) -> Result<String> {
        Ok(LOCAL_RUN_ID.to_string())
    }

    async fn log_params(&self, _run_id: &str, _params: &Params) -> Result<()> {
        Ok(())
    }

    async fn log_metrics(&self, _run_id: &str, _metrics: &Metrics) -> Result<()> {
        Ok(())
    }

    async fn log_model(&self, _run_id: &str, _artifact: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn end_run(&self, _run_id: &str, _status: RunStatus) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_tracker_uses_sentinel() {
        let tracker = LocalTracker;
        let run_id = tracker.start_run().await.unwrap();
        assert_eq!(run_id, "local-no-mlflow");

        tracker.log_params(&run_id, &Params::new()).await.unwrap();
        tracker.log_metrics(&run_id, &Metrics::new()).await.unwrap();
        tracker.log_model(&run_id, b"model").await.unwrap();
        tracker.end_run(&run_id, RunStatus::Finished).await.unwrap();
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(RunStatus::Finished.as_str(), "FINISHED");
        assert_eq!(
            serde_json::to_string(&RunStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }
}
