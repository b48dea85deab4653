//! irisflow API
//!
//! HTTP inference service for the Iris classifier.
//!
//! The model artifact is loaded lazily on first use and shared across
//! requests through `AppState`. Handlers only validate input, call the
//! predictor and shape responses.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::{AppState, ModelStore};
