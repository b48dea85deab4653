//! CART decision tree classifier
//!
//! Trees are grown greedily on Gini impurity with midpoint thresholds and
//! stored as a flat arena of nodes. Leaves keep the class distribution of
//! the training samples that reached them, so a single tree already yields
//! class probabilities.

use irisflow_core::{Error, FeatureVector, Result, N_FEATURES};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until leaves are pure
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,

    /// Candidate features examined per split; `None` examines all
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

/// A node in the tree arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal node: `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node with the class distribution of its samples
    Leaf { proba: Vec<f64> },
}

/// A fitted classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows selected by `sample` (duplicates allowed)
    pub fn fit<R: Rng + ?Sized>(
        rows: &[FeatureVector],
        targets: &[usize],
        sample: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self> {
        if sample.is_empty() {
            return Err(Error::dataset("cannot grow a tree on zero samples"));
        }
        if rows.len() != targets.len() {
            return Err(Error::dataset(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        if sample.iter().any(|&i| i >= rows.len()) {
            return Err(Error::dataset("sample index out of range"));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t >= n_classes) {
            return Err(Error::dataset(format!(
                "label {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let mut tree = Self {
            nodes: Vec::new(),
            n_classes,
        };
        tree.grow(rows, targets, sample.to_vec(), 0, params, rng);
        Ok(tree)
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        rows: &[FeatureVector],
        targets: &[usize],
        idx: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> usize {
        let counts = class_counts(targets, &idx, self.n_classes);
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: distribution(&counts),
        });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_deep || idx.len() < params.min_samples_split.max(2) {
            return node_id;
        }

        let Some(best) = self.best_split(rows, targets, &idx, params, rng) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .iter()
            .partition(|&&i| rows[i][best.feature] <= best.threshold);

        let left = self.grow(rows, targets, left_idx, depth + 1, params, rng);
        let right = self.grow(rows, targets, right_idx, depth + 1, params, rng);

        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    /// Search a random subset of features for the lowest weighted Gini.
    /// Keeps drawing past `max_features` until at least one valid split
    /// has been seen.
    fn best_split<R: Rng + ?Sized>(
        &self,
        rows: &[FeatureVector],
        targets: &[usize],
        idx: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Option<Candidate> {
        let mut features: Vec<usize> = (0..N_FEATURES).collect();
        features.shuffle(rng);
        let max_features = params.max_features.unwrap_or(N_FEATURES).clamp(1, N_FEATURES);

        let mut best: Option<Candidate> = None;
        for (visited, &feature) in features.iter().enumerate() {
            if visited >= max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.split_on(rows, targets, idx, feature) {
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn split_on(
        &self,
        rows: &[FeatureVector],
        targets: &[usize],
        idx: &[usize],
        feature: usize,
    ) -> Option<Candidate> {
        let mut sorted: Vec<(f64, usize)> = idx
            .iter()
            .map(|&i| (rows[i][feature], targets[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len() as f64;
        let mut right = vec![0usize; self.n_classes];
        for &(_, t) in &sorted {
            right[t] += 1;
        }
        let mut left = vec![0usize; self.n_classes];

        let mut best: Option<Candidate> = None;
        for i in 0..sorted.len() - 1 {
            let (value, target) = sorted[i];
            left[target] += 1;
            right[target] -= 1;

            let next = sorted[i + 1].0;
            if next <= value {
                continue;
            }

            let n_left = (i + 1) as f64;
            let n_right = n - n_left;
            let impurity = (n_left * gini(&left) + n_right * gini(&right)) / n;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Candidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }

    /// Class distribution of the leaf `row` falls into
    pub fn predict_proba(&self, row: &FeatureVector) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of classes the tree predicts over
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (a lone root leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check arena links and leaf widths; used when decoding artifacts
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::load("tree has no nodes"));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } if proba.len() != self.n_classes => {
                    return Err(Error::load(format!(
                        "leaf {} has {} classes, expected {}",
                        id,
                        proba.len(),
                        self.n_classes
                    )));
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } if *feature >= N_FEATURES || *left <= id || *right <= id
                    || *left >= self.nodes.len()
                    || *right >= self.nodes.len() =>
                {
                    return Err(Error::load(format!("split node {} is malformed", id)));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn class_counts(targets: &[usize], idx: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in idx {
        counts[targets[i]] += 1;
    }
    counts
}

fn distribution(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    counts
        .iter()
        .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
        .collect()
}

fn gini(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
