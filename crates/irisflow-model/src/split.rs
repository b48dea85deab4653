//! Stratified train/test splitting

use irisflow_core::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices selected for each side of a split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split sample indices so every class keeps its proportion in both halves.
///
/// The test side receives `ceil(n * test_size)` rows, apportioned across
/// classes by largest remainder. Selection within a class is a seeded
/// shuffle, so the same seed always yields the same split.
pub fn stratified_split(
    targets: &[usize],
    n_classes: usize,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = targets.len();
    if n == 0 {
        return Err(Error::dataset("cannot split an empty dataset"));
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (idx, &target) in targets.iter().enumerate() {
        let bucket = by_class.get_mut(target).ok_or_else(|| {
            Error::dataset(format!("label {} out of range for {} classes", target, n_classes))
        })?;
        bucket.push(idx);
    }

    let n_test = ((n as f64 * test_size) - 1e-9).ceil() as usize;
    if n_test >= n {
        return Err(Error::config(format!(
            "test split of {} rows leaves no training data",
            n_test
        )));
    }
    let per_class = apportion(n_test, &by_class, n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (mut members, take) in by_class.into_iter().zip(per_class) {
        members.shuffle(&mut rng);
        let (test_part, train_part) = members.split_at(take.min(members.len()));
        test.extend_from_slice(test_part);
        train.extend_from_slice(train_part);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(TrainTestSplit { train, test })
}

/// Largest-remainder apportionment of `total` rows across classes
fn apportion(total: usize, by_class: &[Vec<usize>], n: usize) -> Vec<usize> {
    let exact: Vec<f64> = by_class
        .iter()
        .map(|members| total as f64 * members.len() as f64 / n as f64)
        .collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &class in order.iter().take(total.saturating_sub(assigned)) {
        counts[class] += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced_targets() -> Vec<usize> {
        (0..150).map(|i| i / 50).collect()
    }

    #[test]
    fn test_preserves_class_proportions() {
        let targets = balanced_targets();
        let split = stratified_split(&targets, 3, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 30);
        assert_eq!(split.train.len(), 120);
        for class in 0..3 {
            let in_test = split.test.iter().filter(|&&i| targets[i] == class).count();
            assert_eq!(in_test, 10);
        }
    }

    #[test]
    fn test_partitions_every_row_once() {
        let targets = balanced_targets();
        let split = stratified_split(&targets, 3, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..150).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let targets = balanced_targets();
        let a = stratified_split(&targets, 3, 0.2, 42).unwrap();
        let b = stratified_split(&targets, 3, 0.2, 42).unwrap();
        let c = stratified_split(&targets, 3, 0.2, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_uneven_classes() {
        let targets: Vec<usize> = [vec![0; 7], vec![1; 3]].concat();
        let split = stratified_split(&targets, 2, 0.3, 1).unwrap();
        assert_eq!(split.test.len(), 3);
        let class0 = split.test.iter().filter(|&&i| targets[i] == 0).count();
        assert_eq!(class0, 2);
    }

    #[test]
    fn test_rejects_bad_test_size() {
        assert!(stratified_split(&[0, 1], 2, 0.0, 1).is_err());
        assert!(stratified_split(&[0, 1], 2, 1.0, 1).is_err());
    }
}
