//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use irisflow_core::Error;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by handlers, rendered as `{"error": {"message", "type"}}`
#[derive(Debug)]
pub enum AppError {
    Core(Error),
    NotFound(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(Error::Load(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Core(Error::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Core(Error::Load(_)) => "model_unavailable",
            AppError::Core(Error::Validation(_)) => "invalid_request_error",
            AppError::Core(Error::Prediction(_)) => "prediction_error",
            AppError::Core(_) => "internal_error",
            AppError::NotFound(_) => "not_found",
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Core(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Core(Error::validation(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            AppError::Core(err) => err.to_string(),
            AppError::NotFound(msg) => msg,
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }
        metrics::counter!("irisflow_errors_total", "type" => kind).increment(1);

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
