//! Inference over a loaded artifact

use crate::artifact::ModelArtifact;
use crate::forest::argmax;
use irisflow_core::{Error, FeatureVector, ModelInfo, Prediction, Result, N_FEATURES};
use std::collections::BTreeMap;
use std::path::Path;

/// Decimal places kept in reported probabilities
pub const PROBABILITY_DECIMALS: u32 = 4;

/// Scales raw feature vectors and runs the forest
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: ModelArtifact,
}

impl Predictor {
    /// Wrap an in-memory artifact after validating it
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    /// Read an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            artifact: ModelArtifact::load(path)?,
        })
    }

    /// Classify one vector of exactly `N_FEATURES` values
    pub fn predict_single(&self, features: &[f64]) -> Result<Prediction> {
        let row: FeatureVector = features.try_into().map_err(|_| {
            Error::prediction(format!(
                "expected {} features, got {}",
                N_FEATURES,
                features.len()
            ))
        })?;

        let scaled = self.artifact.scaler.transform(&row);
        let proba = self.artifact.model.predict_proba(&scaled);
        let index = argmax(&proba);

        let class_name = self
            .artifact
            .target_names
            .get(index)
            .cloned()
            .ok_or_else(|| Error::prediction(format!("class index {} has no name", index)))?;

        let probabilities: BTreeMap<String, f64> = self
            .artifact
            .target_names
            .iter()
            .cloned()
            .zip(round_probabilities(&proba, PROBABILITY_DECIMALS))
            .collect();

        Ok(Prediction {
            prediction: index,
            class_name,
            probabilities,
        })
    }

    /// Classify each vector independently, preserving order. The first
    /// failing vector fails the whole batch.
    pub fn predict_batch<V: AsRef<[f64]>>(&self, batch: &[V]) -> Result<Vec<Prediction>> {
        batch
            .iter()
            .enumerate()
            .map(|(i, features)| {
                self.predict_single(features.as_ref()).map_err(|e| match e {
                    Error::Prediction(msg) => Error::prediction(format!("item {}: {}", i, msg)),
                    other => other,
                })
            })
            .collect()
    }

    /// Feature names, target names, metrics and run id
    pub fn model_info(&self) -> ModelInfo {
        self.artifact.info()
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

/// Round to `decimals` places with largest-remainder apportionment, so a
/// distribution that summed to 1 still sums to 1 after rounding.
pub fn round_probabilities(proba: &[f64], decimals: u32) -> Vec<f64> {
    let units = 10u64.pow(decimals);
    let scaled: Vec<f64> = proba.iter().map(|p| p.max(0.0) * units as f64).collect();
    let mut counts: Vec<u64> = scaled.iter().map(|s| s.floor() as u64).collect();

    let target = (proba.iter().sum::<f64>() * units as f64).round() as u64;
    let assigned: u64 = counts.iter().sum();
    let missing = target.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra)
    });
    for &i in order.iter().take(missing) {
        counts[i] += 1;
    }

    counts
        .into_iter()
        .map(|c| c as f64 / units as f64)
        .collect()
}
