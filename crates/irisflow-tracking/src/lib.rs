//! irisflow Tracking
//!
//! Best-effort experiment tracking for training runs.
//!
//! Provides:
//! - The `ExperimentTracker` capability trait
//! - `LocalTracker`, which hands out a fixed local run id and records nothing
//! - `FileTracker`, an on-disk run store (`<root>/<experiment>/<run_id>/...`)
//! - `MlflowTracker`, a client for the MLflow tracking REST API
//! - `select_tracker`, which picks one of the above once at startup

pub mod file_store;
pub mod mlflow;
pub mod select;
pub mod tracker;

pub use file_store::FileTracker;
pub use mlflow::MlflowTracker;
pub use select::{select_tracker, TrackingConfig, DEFAULT_EXPERIMENT_NAME};
pub use tracker::{ExperimentTracker, LocalTracker, Params, RunStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::select::{select_tracker, TrackingConfig};
    pub use crate::tracker::{ExperimentTracker, LocalTracker, Params, RunStatus};
}
