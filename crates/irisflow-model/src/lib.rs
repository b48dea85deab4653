//! irisflow Model
//!
//! Everything needed to train and serve the Iris classifier:
//! - The embedded Iris dataset and stratified train/test splitting
//! - Standard scaling and a seeded random forest of CART trees
//! - Held-out evaluation (accuracy, weighted precision/recall/F1)
//! - The bincode model artifact and the `Predictor` that serves it
//!
//! All fitting is deterministic for a given seed.

pub mod artifact;
pub mod dataset;
pub mod evaluation;
pub mod forest;
pub mod predictor;
pub mod scaler;
pub mod split;
pub mod training;
pub mod tree;

pub use artifact::{
    encode_metrics, write_metrics, ModelArtifact, StagedFile, ARTIFACT_FORMAT_VERSION,
};
pub use dataset::{Dataset, IRIS_TARGET_NAMES};
pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use predictor::Predictor;
pub use scaler::StandardScaler;
pub use training::{fit, fit_iris, FittedModel, TrainingParams};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::ModelArtifact;
    pub use crate::dataset::Dataset;
    pub use crate::forest::{ForestParams, RandomForest};
    pub use crate::predictor::Predictor;
    pub use crate::training::{fit, FittedModel, TrainingParams};
}
