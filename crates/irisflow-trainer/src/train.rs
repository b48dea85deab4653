//! Training run orchestration

use crate::config::TrainerConfig;
use irisflow_core::{Error, Metrics, Result, ACCURACY, LOCAL_RUN_ID};
use irisflow_model::artifact::{encode_metrics, StagedFile};
use irisflow_model::{fit, Dataset, TrainingParams};
use irisflow_tracking::{ExperimentTracker, Params, RunStatus};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of a successful training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: String,
    pub metrics: Metrics,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
}

impl TrainingReport {
    pub fn accuracy(&self) -> f64 {
        self.metrics.get(ACCURACY).copied().unwrap_or_default()
    }
}

/// A tracking run whose failures are logged and otherwise ignored
struct TrackedRun<'a> {
    tracker: &'a dyn ExperimentTracker,
    run_id: String,
    active: bool,
}

impl<'a> TrackedRun<'a> {
    async fn start(tracker: &'a dyn ExperimentTracker) -> TrackedRun<'a> {
        match tracker.start_run().await {
            Ok(run_id) => {
                info!(run_id = %run_id, backend = tracker.name(), "Tracking run started");
                Self {
                    tracker,
                    run_id,
                    active: true,
                }
            }
            Err(e) => {
                warn!(backend = tracker.name(), "Could not start tracking run: {}", e);
                Self {
                    tracker,
                    run_id: LOCAL_RUN_ID.to_string(),
                    active: false,
                }
            }
        }
    }

    fn id(&self) -> &str {
        &self.run_id
    }

    fn report(&self, what: &str, result: Result<()>) {
        if let Err(e) = result {
            warn!(run_id = %self.run_id, "Failed to log {}: {}", what, e);
        }
    }

    async fn log_params(&self, params: &Params) {
        if self.active {
            self.report("params", self.tracker.log_params(&self.run_id, params).await);
        }
    }

    async fn log_metrics(&self, metrics: &Metrics) {
        if self.active {
            self.report("metrics", self.tracker.log_metrics(&self.run_id, metrics).await);
        }
    }

    async fn log_model(&self, bytes: &[u8]) {
        if self.active {
            self.report("model", self.tracker.log_model(&self.run_id, bytes).await);
        }
    }

    async fn finish(&self, status: RunStatus) {
        if self.active {
            self.report("run status", self.tracker.end_run(&self.run_id, status).await);
        }
    }
}

/// Train on the bundled Iris dataset with the fixed default parameters
pub async fn train(
    config: &TrainerConfig,
    tracker: &dyn ExperimentTracker,
) -> Result<TrainingReport> {
    let dataset = Dataset::iris()?;
    train_on(config, tracker, &dataset, &TrainingParams::default()).await
}

/// Fit, evaluate, gate and persist.
///
/// Nothing is written to `model_path` or the metrics path unless held-out
/// accuracy meets `config.accuracy_threshold`.
pub async fn train_on(
    config: &TrainerConfig,
    tracker: &dyn ExperimentTracker,
    dataset: &Dataset,
    params: &TrainingParams,
) -> Result<TrainingReport> {
    info!(
        samples = dataset.len(),
        classes = dataset.n_classes(),
        n_estimators = params.forest.n_estimators,
        "Starting training run"
    );

    let run = TrackedRun::start(tracker).await;
    run.log_params(&params.forest.as_params()).await;

    let fitted = match fit(dataset, params) {
        Ok(fitted) => fitted,
        Err(e) => {
            run.finish(RunStatus::Failed).await;
            return Err(e);
        }
    };
    let (n_train, n_test) = (fitted.n_train, fitted.n_test);
    let metrics = fitted.metrics.clone();

    run.log_metrics(&metrics).await;
    info!("Run ID: {}", run.id());
    for (name, value) in &metrics {
        info!("  {}: {:.4}", name, value);
    }

    let artifact = fitted.into_artifact(run.id());
    let bytes = artifact.encode()?;
    run.log_model(&bytes).await;

    let accuracy = artifact.accuracy().unwrap_or_default();
    if accuracy < config.accuracy_threshold {
        error!(
            accuracy,
            threshold = config.accuracy_threshold,
            "Quality gate failed, model not saved"
        );
        run.finish(RunStatus::Failed).await;
        return Err(Error::QualityGate {
            accuracy,
            threshold: config.accuracy_threshold,
        });
    }

    let metrics_path = config.metrics_path();
    if let Err(e) = persist(&config.model_path, &bytes, &metrics_path, &metrics) {
        run.finish(RunStatus::Failed).await;
        return Err(e);
    }

    info!(path = %config.model_path.display(), "Model saved");
    info!(path = %metrics_path.display(), "Metrics summary saved");
    info!("Quality gate passed: accuracy={:.4}", accuracy);
    run.finish(RunStatus::Finished).await;

    Ok(TrainingReport {
        run_id: run.id().to_string(),
        metrics,
        model_path: config.model_path.clone(),
        metrics_path,
        n_train,
        n_test,
    })
}

/// Stage both outputs before renaming either; the artifact is renamed last
/// so any earlier failure leaves the previous artifact in place.
fn persist(
    model_path: &Path,
    bytes: &[u8],
    metrics_path: &Path,
    metrics: &Metrics,
) -> Result<()> {
    let artifact = StagedFile::new(model_path, bytes)?;
    let summary = StagedFile::new(metrics_path, &encode_metrics(metrics)?)?;
    summary.commit()?;
    artifact.commit()
}
