//! Classification metrics

use irisflow_core::{Metrics, ACCURACY, F1_SCORE, PRECISION, RECALL};

/// Fraction of predictions equal to the truth
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Support-weighted precision, recall and F1. A class with no predicted
/// (or no true) samples contributes 0 for the undefined ratio.
pub fn weighted_scores(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> (f64, f64, f64) {
    let mut tp = vec![0usize; n_classes];
    let mut predicted = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];

    for (&t, &p) in y_true.iter().zip(y_pred) {
        support[t] += 1;
        predicted[p] += 1;
        if t == p {
            tp[t] += 1;
        }
    }

    let total: usize = support.iter().sum();
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }

    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for class in 0..n_classes {
        let p = ratio(tp[class], predicted[class]);
        let r = ratio(tp[class], support[class]);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };

        let weight = support[class] as f64 / total as f64;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }
    (precision, recall, f1)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Accuracy plus weighted precision/recall/F1, keyed by metric name
pub fn evaluate(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Metrics {
    let (precision, recall, f1) = weighted_scores(y_true, y_pred, n_classes);

    let mut metrics = Metrics::new();
    metrics.insert(ACCURACY.to_string(), accuracy(y_true, y_pred));
    metrics.insert(PRECISION.to_string(), precision);
    metrics.insert(RECALL.to_string(), recall);
    metrics.insert(F1_SCORE.to_string(), f1);
    metrics
}
