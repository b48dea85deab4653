//! irisflow Core
//!
//! Types shared by the trainer and the inference API.
//!
//! This crate provides:
//! - The error type and result alias used across the workspace
//! - Wire types for predictions and model metadata
//! - Dataset shape constants and metric names

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    FeatureVector, Metrics, ModelInfo, Prediction, ACCURACY, F1_SCORE, LOCAL_RUN_ID, N_CLASSES,
    N_FEATURES, PRECISION, RECALL,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{FeatureVector, Metrics, ModelInfo, Prediction};
}
