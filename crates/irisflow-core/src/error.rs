//! Error types for irisflow

/// Result type alias using irisflow's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for irisflow operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Held-out accuracy fell below the configured threshold
    #[error("quality gate failed: accuracy {accuracy:.4} below threshold {threshold}")]
    QualityGate { accuracy: f64, threshold: f64 },

    /// Model artifact missing, corrupt, or structurally invalid
    #[error("model not loaded: {0}")]
    Load(String),

    /// Malformed request input
    #[error("validation error: {0}")]
    Validation(String),

    /// Inference failed
    #[error("prediction error: {0}")]
    Prediction(String),

    /// Embedded dataset could not be parsed
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Experiment tracking backend errors
    #[error("tracking error: {0}")]
    Tracking(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }

    /// Create a new dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new tracking error
    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means the model artifact is unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_gate_message() {
        let err = Error::QualityGate {
            accuracy: 0.8,
            threshold: 0.85,
        };
        assert_eq!(
            err.to_string(),
            "quality gate failed: accuracy 0.8000 below threshold 0.85"
        );
    }

    #[test]
    fn test_only_load_is_unavailable() {
        assert!(Error::load("missing").is_unavailable());
        assert!(!Error::prediction("boom").is_unavailable());
        assert!(!Error::validation("bad").is_unavailable());
    }
}
