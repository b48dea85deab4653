//! Core types for irisflow

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of input features per sample
pub const N_FEATURES: usize = 4;

/// Number of target classes
pub const N_CLASSES: usize = 3;

/// Run identifier used when no tracking backend is available
pub const LOCAL_RUN_ID: &str = "local-no-mlflow";

pub const ACCURACY: &str = "accuracy";
pub const PRECISION: &str = "precision";
pub const RECALL: &str = "recall";
pub const F1_SCORE: &str = "f1_score";

/// A single input sample
pub type FeatureVector = [f64; N_FEATURES];

/// Evaluation metrics keyed by metric name
pub type Metrics = BTreeMap<String, f64>;

/// Result of classifying one feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class index into `target_names`
    pub prediction: usize,

    /// Name of the predicted class
    pub class_name: String,

    /// Class name to probability, rounded to 4 decimal places
    pub probabilities: BTreeMap<String, f64>,
}

impl Prediction {
    /// Probability assigned to the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(&self.class_name)
            .copied()
            .unwrap_or_default()
    }
}

/// Metadata describing the loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Ordered feature names
    pub feature_names: Vec<String>,

    /// Ordered class names, index-aligned with class labels
    pub target_names: Vec<String>,

    /// Held-out evaluation metrics
    pub metrics: Metrics,

    /// Training run identifier
    pub run_id: String,
}

impl ModelInfo {
    /// Held-out accuracy, if recorded
    pub fn accuracy(&self) -> Option<f64> {
        self.metrics.get(ACCURACY).copied()
    }
}
