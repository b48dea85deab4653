//! Per-feature standardization

use irisflow_core::{Error, FeatureVector, Result, N_FEATURES};
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance feature scaling fit on training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean
    pub mean: Vec<f64>,

    /// Per-feature standard deviation (population); 1.0 for constant features
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and scale on the given rows
    pub fn fit(rows: &[FeatureVector]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::dataset("cannot fit scaler on zero rows"));
        }
        let n = rows.len() as f64;

        let mut mean = vec![0.0; N_FEATURES];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; N_FEATURES];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }

        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Standardize one row
    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Standardize many rows
    pub fn transform_all(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    /// Number of features the scaler was fit on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}
