//! On-disk run store
//!
//! Layout under the tracking root:
//!
//! ```text
//! <root>/<experiment>/<run_id>/meta.yaml
//! <root>/<experiment>/<run_id>/params/<key>          value
//! <root>/<experiment>/<run_id>/metrics/<key>         "<timestamp_ms> <value> <step>" per line
//! <root>/<experiment>/<run_id>/artifacts/model/model.bin
//! ```

use crate::tracker::{ExperimentTracker, Params, RunStatus};
use async_trait::async_trait;
use irisflow_core::{Error, Metrics, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Run metadata stored as `meta.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub experiment_name: String,
    pub status: RunStatus,
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
}

/// Tracker writing runs to a local directory
#[derive(Debug, Clone)]
pub struct FileTracker {
    root: PathBuf,
    experiment: String,
}

impl FileTracker {
    pub fn new(root: impl Into<PathBuf>, experiment: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            experiment: experiment.into(),
        }
    }

    /// Directory holding one run
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(&self.experiment).join(run_id)
    }

    /// Read back a run's metadata
    pub async fn read_meta(&self, run_id: &str) -> Result<RunMeta> {
        let text = fs::read_to_string(self.run_dir(run_id).join("meta.yaml")).await?;
        serde_yaml::from_str(&text).map_err(|e| Error::tracking(format!("bad meta.yaml: {}", e)))
    }

    async fn write_meta(&self, meta: &RunMeta) -> Result<()> {
        let yaml = serde_yaml::to_string(meta)
            .map_err(|e| Error::tracking(format!("cannot encode meta.yaml: {}", e)))?;
        fs::write(self.run_dir(&meta.run_id).join("meta.yaml"), yaml).await?;
        Ok(())
    }

    fn existing_run_dir(&self, run_id: &str) -> Result<PathBuf> {
        let dir = self.run_dir(run_id);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::tracking(format!("unknown run '{}'", run_id)))
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && key != "."
        && key != "..";
    if valid {
        Ok(())
    } else {
        Err(Error::tracking(format!("invalid key '{}'", key)))
    }
}

async fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

#[async_trait]
impl ExperimentTracker for FileTracker {
    fn name(&self) -> &str {
        "file"
    }

    async fn start_run(&self) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let dir = self.run_dir(&run_id);
        for sub in ["params", "metrics", "artifacts"] {
            fs::create_dir_all(dir.join(sub)).await?;
        }

        self.write_meta(&RunMeta {
            run_id: run_id.clone(),
            experiment_name: self.experiment.clone(),
            status: RunStatus::Running,
            start_time: chrono::Utc::now().timestamp_millis(),
            end_time: None,
        })
        .await?;

        debug!(run_id = %run_id, dir = %dir.display(), "File tracking run started");
        Ok(run_id)
    }

    async fn log_params(&self, run_id: &str, params: &Params) -> Result<()> {
        let dir = self.existing_run_dir(run_id)?.join("params");
        for (key, value) in params {
            check_key(key)?;
            fs::write(dir.join(key), value).await?;
        }
        Ok(())
    }

    async fn log_metrics(&self, run_id: &str, metrics: &Metrics) -> Result<()> {
        let dir = self.existing_run_dir(run_id)?.join("metrics");
        let timestamp = chrono::Utc::now().timestamp_millis();
        for (key, value) in metrics {
            check_key(key)?;
            append_line(&dir.join(key), &format!("{} {} 0", timestamp, value)).await?;
        }
        Ok(())
    }

    async fn log_model(&self, run_id: &str, artifact: &[u8]) -> Result<()> {
        let dir = self.existing_run_dir(run_id)?.join("artifacts").join("model");
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join("model.bin"), artifact).await?;
        Ok(())
    }

    async fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        self.existing_run_dir(run_id)?;
        let mut meta = self.read_meta(run_id).await?;
        meta.status = status;
        meta.end_time = Some(chrono::Utc::now().timestamp_millis());
        self.write_meta(&meta).await
    }
}
