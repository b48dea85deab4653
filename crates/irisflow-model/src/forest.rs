//! Random forest classifier (bagged CART trees)

use crate::tree::{DecisionTree, TreeParams};
use irisflow_core::{Error, FeatureVector, Result, N_FEATURES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Number of candidate features per split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolve against the number of available features
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            Self::All => n_features,
            Self::Sqrt => (n_features as f64).sqrt() as usize,
            Self::Log2 => (n_features as f64).log2() as usize,
            Self::Fixed(k) => k,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(5),
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Parameters as reported to experiment tracking
    pub fn as_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("n_estimators".to_string(), self.n_estimators.to_string());
        params.insert(
            "max_depth".to_string(),
            self.max_depth
                .map_or_else(|| "None".to_string(), |d| d.to_string()),
        );
        params.insert(
            "min_samples_split".to_string(),
            self.min_samples_split.to_string(),
        );
        params.insert("random_state".to_string(), self.seed.to_string());
        params
    }
}

/// A fitted ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    /// Fit `params.n_estimators` trees, each on a bootstrap resample
    pub fn fit(
        rows: &[FeatureVector],
        targets: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::dataset("cannot fit a forest on zero rows"));
        }
        if params.n_estimators == 0 {
            return Err(Error::config("n_estimators must be at least 1"));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: Some(params.max_features.resolve(N_FEATURES)),
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = rows.len();
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());
            let sample: Vec<usize> = if params.bootstrap {
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(
                rows,
                targets,
                &sample,
                n_classes,
                &tree_params,
                &mut tree_rng,
            )?);
        }

        debug!(
            trees = trees.len(),
            nodes = trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            "Random forest fitted"
        );

        Ok(Self { trees, n_classes })
    }

    /// Mean class distribution across all trees
    pub fn predict_proba(&self, row: &FeatureVector) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable class; the lowest index wins ties
    pub fn predict(&self, row: &FeatureVector) -> usize {
        argmax(&self.predict_proba(row))
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural checks used when decoding artifacts
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::load("forest has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_classes() != self.n_classes {
                return Err(Error::load(format!(
                    "tree {} predicts {} classes, forest expects {}",
                    i,
                    tree.n_classes(),
                    self.n_classes
                )));
            }
            tree.validate()?;
        }
        Ok(())
    }
}

/// Index of the largest value, first one on ties
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
