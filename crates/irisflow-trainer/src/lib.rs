//! irisflow Trainer
//!
//! Fits the Iris classifier, enforces the accuracy quality gate, and writes
//! the model artifact plus a metrics summary. Experiment tracking is best
//! effort and never decides whether a run succeeds.

pub mod cli;
pub mod config;
pub mod train;

pub use config::TrainerConfig;
pub use train::{train, train_on, TrainingReport};
