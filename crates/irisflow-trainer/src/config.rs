//! Trainer configuration
//!
//! Layered lowest to highest: built-in defaults, an optional YAML file,
//! environment variables (`MODEL_PATH`, `METRICS_PATH`,
//! `ACCURACY_THRESHOLD`, `MLFLOW_TRACKING_URI`, `EXPERIMENT_NAME`), then
//! command-line flags.

use crate::cli::Cli;
use config::{Config, Environment, File};
use irisflow_core::{Error, Result};
use irisflow_tracking::{TrackingConfig, DEFAULT_EXPERIMENT_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default artifact location
pub const DEFAULT_MODEL_PATH: &str = "models/trained_model.pkl";

/// Default minimum held-out accuracy
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.85;

/// Trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Where the model artifact is written
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Where the metrics summary is written; next to the artifact if unset
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,

    /// Quality gate on held-out accuracy
    #[serde(default = "default_threshold")]
    pub accuracy_threshold: f64,

    /// Experiment tracking backend, if any
    #[serde(default)]
    pub mlflow_tracking_uri: Option<String>,

    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            metrics_path: None,
            accuracy_threshold: default_threshold(),
            mlflow_tracking_uri: None,
            experiment_name: default_experiment_name(),
        }
    }
}

impl TrainerConfig {
    /// Load from the process environment, optional file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Self::from_sources(
            cli.config.as_deref(),
            Environment::default().try_parsing(true),
        )?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Build from an optional file plus the given environment source
    pub fn from_sources(file: Option<&str>, env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Apply command-line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.model_path {
            self.model_path = path.clone();
        }
        if let Some(path) = &cli.metrics_path {
            self.metrics_path = Some(path.clone());
        }
        if let Some(threshold) = cli.threshold {
            self.accuracy_threshold = threshold;
        }
        if let Some(uri) = &cli.tracking_uri {
            self.mlflow_tracking_uri = Some(uri.clone());
        }
        if let Some(experiment) = &cli.experiment {
            self.experiment_name = experiment.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.accuracy_threshold) {
            return Err(Error::config(format!(
                "accuracy_threshold must be within [0, 1], got {}",
                self.accuracy_threshold
            )));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(Error::config("model_path must not be empty"));
        }
        Ok(())
    }

    /// Resolved metrics summary path
    pub fn metrics_path(&self) -> PathBuf {
        match &self.metrics_path {
            Some(path) => path.clone(),
            None => self
                .model_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("metrics.json"),
        }
    }

    /// Tracking section for `select_tracker`
    pub fn tracking(&self) -> TrackingConfig {
        TrackingConfig {
            tracking_uri: self.mlflow_tracking_uri.clone(),
            experiment_name: self.experiment_name.clone(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_threshold() -> f64 {
    DEFAULT_ACCURACY_THRESHOLD
}

fn default_experiment_name() -> String {
    DEFAULT_EXPERIMENT_NAME.to_string()
}
