//! Shared application state

use crate::config::ApiConfig;
use irisflow_core::{Error, ModelInfo, Result};
use irisflow_model::{ModelArtifact, Predictor};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,

    /// Lazily loaded model
    pub models: Arc<ModelStore>,

    /// Prometheus handle for `/metrics`; `None` when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        let models = ModelStore::new(&config.model_path);
        Self {
            config: Arc::new(config),
            models: Arc::new(models),
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// Loads the artifact once and hands out the shared predictor.
///
/// Concurrent first callers wait on a single load. A failed load leaves the
/// store empty so the next call tries again.
#[derive(Debug)]
pub struct ModelStore {
    path: PathBuf,
    cell: OnceCell<Arc<Predictor>>,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Store that already holds a predictor
    pub fn with_predictor(path: impl Into<PathBuf>, predictor: Predictor) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new_with(Some(Arc::new(predictor))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<Arc<Predictor>> {
        self.cell
            .get_or_try_init(|| load_predictor(&self.path))
            .await
            .cloned()
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        Ok(self.get().await?.model_info())
    }
}

async fn load_predictor(path: &Path) -> Result<Arc<Predictor>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::load(format!(
            "cannot read model artifact {}: {}",
            path.display(),
            e
        ))
    })?;
    let predictor = Predictor::from_artifact(ModelArtifact::decode(&bytes)?)?;

    info!(
        path = %path.display(),
        run_id = %predictor.artifact().run_id,
        "Model loaded"
    );
    Ok(Arc::new(predictor))
}
