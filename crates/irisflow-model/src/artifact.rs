//! Persisted model artifact
//!
//! The artifact bundles the fitted forest, the fitted scaler and the
//! metadata the API reports. It is encoded with bincode and always written
//! through a temporary file in the destination directory followed by a
//! rename, so a reader never observes a partially written file.

use crate::forest::RandomForest;
use crate::scaler::StandardScaler;
use bincode::Options;
use irisflow_core::{Error, Metrics, ModelInfo, Result, ACCURACY, N_CLASSES, N_FEATURES};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Current artifact encoding version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Upper bound on decoded artifact size; corrupt length prefixes fail fast
const MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Fitted model, scaler and metadata in one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model: RandomForest,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
    pub metrics: Metrics,
    pub run_id: String,
}

fn codec() -> impl Options {
    bincode::options().with_limit(MAX_ARTIFACT_BYTES)
}

impl ModelArtifact {
    pub fn new(
        model: RandomForest,
        scaler: StandardScaler,
        feature_names: Vec<String>,
        target_names: Vec<String>,
        metrics: Metrics,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model,
            scaler,
            feature_names,
            target_names,
            metrics,
            run_id: run_id.into(),
        }
    }

    /// Serialize to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec()
            .serialize(self)
            .map_err(|e| Error::internal(format!("failed to encode artifact: {}", e)))
    }

    /// Deserialize and validate
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = codec()
            .deserialize(bytes)
            .map_err(|e| Error::load(format!("corrupt artifact: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check the structural invariants of the record
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::load(format!(
                "unsupported artifact version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.feature_names.len() != N_FEATURES {
            return Err(Error::load(format!(
                "expected {} feature names, found {}",
                N_FEATURES,
                self.feature_names.len()
            )));
        }
        if self.target_names.len() != N_CLASSES {
            return Err(Error::load(format!(
                "expected {} target names, found {}",
                N_CLASSES,
                self.target_names.len()
            )));
        }
        if self.scaler.n_features() != N_FEATURES || self.scaler.scale.len() != N_FEATURES {
            return Err(Error::load("scaler does not match feature count"));
        }
        if self.model.n_classes() != self.target_names.len() {
            return Err(Error::load(format!(
                "model predicts {} classes but {} target names are recorded",
                self.model.n_classes(),
                self.target_names.len()
            )));
        }
        self.model.validate()
    }

    /// Write atomically to `path`, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.encode()?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Model artifact saved");
        Ok(())
    }

    /// Read and validate an artifact; any failure is a load error
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::load(format!("cannot read {}: {}", path.display(), e)))?;
        let artifact = Self::decode(&bytes)?;
        debug!(path = %path.display(), run_id = %artifact.run_id, "Model artifact loaded");
        Ok(artifact)
    }

    /// Held-out accuracy, if recorded
    pub fn accuracy(&self) -> Option<f64> {
        self.metrics.get(ACCURACY).copied()
    }

    /// Metadata view served by the API
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            feature_names: self.feature_names.clone(),
            target_names: self.target_names.clone(),
            metrics: self.metrics.clone(),
            run_id: self.run_id.clone(),
        }
    }
}

/// Write the flat metrics summary as pretty JSON
pub fn write_metrics(path: impl AsRef<Path>, metrics: &Metrics) -> Result<()> {
    let path = path.as_ref();
    write_atomic(path, &encode_metrics(metrics)?)?;
    info!(path = %path.display(), "Metrics summary saved");
    Ok(())
}

/// Metrics summary bytes as written by `write_metrics`
pub fn encode_metrics(metrics: &Metrics) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(metrics)?)
}

/// Write via a temporary sibling file and rename into place
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    StagedFile::new(path, bytes)?.commit()
}

/// Contents written and synced next to their destination, not yet visible
/// there. Dropping without `commit` removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: &Path, bytes: &[u8]) -> Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        Ok(Self {
            tmp,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename into place
    pub fn commit(self) -> Result<()> {
        self.tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}
