//! Tracker selection

use crate::file_store::FileTracker;
use crate::mlflow::MlflowTracker;
use crate::tracker::{ExperimentTracker, LocalTracker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Experiment name used when none is configured
pub const DEFAULT_EXPERIMENT_NAME: &str = "iris-classifier";

/// Where (and whether) to report training runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// `http(s)://` for an MLflow server, a path or `file://` URI for the
    /// file store, unset for no tracking
    #[serde(default)]
    pub tracking_uri: Option<String>,

    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracking_uri: None,
            experiment_name: default_experiment_name(),
        }
    }
}

fn default_experiment_name() -> String {
    DEFAULT_EXPERIMENT_NAME.to_string()
}

/// Pick a tracker once at startup. Never fails: an unreachable server
/// degrades to `LocalTracker`.
pub async fn select_tracker(config: &TrackingConfig) -> Arc<dyn ExperimentTracker> {
    let uri = config
        .tracking_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty());

    let Some(uri) = uri else {
        info!("No tracking URI configured, runs will use the local run id");
        return Arc::new(LocalTracker);
    };

    if uri.starts_with("http://") || uri.starts_with("https://") {
        return match MlflowTracker::connect(uri, &config.experiment_name).await {
            Ok(tracker) => Arc::new(tracker),
            Err(e) => {
                warn!("Experiment tracking unavailable ({}), continuing without it", e);
                Arc::new(LocalTracker)
            }
        };
    }

    let root = uri.strip_prefix("file://").unwrap_or(uri);
    info!(root = %root, experiment = %config.experiment_name, "Tracking runs on local filesystem");
    Arc::new(FileTracker::new(root, config.experiment_name.clone()))
}
