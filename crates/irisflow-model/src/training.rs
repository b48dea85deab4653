//! Split, scale, fit, evaluate

use crate::artifact::ModelArtifact;
use crate::dataset::Dataset;
use crate::evaluation;
use crate::forest::{ForestParams, RandomForest};
use crate::scaler::StandardScaler;
use crate::split::stratified_split;
use irisflow_core::{FeatureVector, Metrics, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything that controls a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the train/test split
    pub split_seed: u64,

    /// Forest hyperparameters
    pub forest: ForestParams,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            split_seed: 42,
            forest: ForestParams::default(),
        }
    }
}

/// A fitted model with its held-out evaluation, not yet persisted
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub metrics: Metrics,
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
}

impl FittedModel {
    /// Bundle into a persistable artifact under the given run id
    pub fn into_artifact(self, run_id: impl Into<String>) -> ModelArtifact {
        ModelArtifact::new(
            self.forest,
            self.scaler,
            self.feature_names,
            self.target_names,
            self.metrics,
            run_id,
        )
    }
}

/// Run the training pipeline with no I/O.
///
/// The scaler is fit on the training rows only and then applied to both
/// splits.
pub fn fit(dataset: &Dataset, params: &TrainingParams) -> Result<FittedModel> {
    let n_classes = dataset.n_classes();
    let split = stratified_split(&dataset.targets, n_classes, params.test_size, params.split_seed)?;

    let select = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<usize>) {
        idx.iter()
            .map(|&i| (dataset.features[i], dataset.targets[i]))
            .unzip()
    };
    let (x_train, y_train) = select(&split.train);
    let (x_test, y_test) = select(&split.test);

    let scaler = StandardScaler::fit(&x_train)?;
    let x_train = scaler.transform_all(&x_train);
    let x_test = scaler.transform_all(&x_test);

    let forest = RandomForest::fit(&x_train, &y_train, n_classes, &params.forest)?;

    let y_pred: Vec<usize> = x_test.iter().map(|row| forest.predict(row)).collect();
    let metrics = evaluation::evaluate(&y_test, &y_pred, n_classes);

    info!(
        train_rows = x_train.len(),
        test_rows = x_test.len(),
        trees = forest.n_trees(),
        "Model fitted"
    );

    Ok(FittedModel {
        forest,
        scaler,
        metrics,
        feature_names: dataset.feature_names.clone(),
        target_names: dataset.target_names.clone(),
        n_train: split.train.len(),
        n_test: split.test.len(),
    })
}

/// Fit on the bundled Iris dataset with default parameters
pub fn fit_iris() -> Result<FittedModel> {
    fit(&Dataset::iris()?, &TrainingParams::default())
}
