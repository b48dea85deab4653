//! The embedded Iris dataset

use irisflow_core::{Error, FeatureVector, Result, N_CLASSES, N_FEATURES};

const IRIS_CSV: &str = include_str!("../data/iris.csv");

/// Class names in label order
pub const IRIS_TARGET_NAMES: [&str; N_CLASSES] = ["setosa", "versicolor", "virginica"];

/// A labelled, in-memory classification dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    /// One feature vector per sample
    pub features: Vec<FeatureVector>,

    /// Class label per sample, index into `target_names`
    pub targets: Vec<usize>,

    /// Ordered feature names
    pub feature_names: Vec<String>,

    /// Ordered class names
    pub target_names: Vec<String>,
}

impl Dataset {
    /// Load the bundled Iris dataset (150 samples, 4 features, 3 classes)
    pub fn iris() -> Result<Self> {
        Self::from_csv(IRIS_CSV, &IRIS_TARGET_NAMES)
    }

    /// Parse a CSV with a header row, `N_FEATURES` numeric columns, and a
    /// trailing class-name column
    pub fn from_csv(text: &str, target_names: &[&str]) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| Error::dataset("empty dataset"))?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        if columns.len() != N_FEATURES + 1 {
            return Err(Error::dataset(format!(
                "expected {} columns in header, found {}",
                N_FEATURES + 1,
                columns.len()
            )));
        }
        let feature_names = columns[..N_FEATURES]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (line_no, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != N_FEATURES + 1 {
                return Err(Error::dataset(format!(
                    "row {}: expected {} fields, found {}",
                    line_no + 1,
                    N_FEATURES + 1,
                    fields.len()
                )));
            }

            let mut row = [0.0; N_FEATURES];
            for (slot, raw) in row.iter_mut().zip(&fields[..N_FEATURES]) {
                *slot = raw.parse().map_err(|_| {
                    Error::dataset(format!("row {}: invalid number '{}'", line_no + 1, raw))
                })?;
            }

            let label = fields[N_FEATURES];
            let target = target_names
                .iter()
                .position(|name| *name == label)
                .ok_or_else(|| {
                    Error::dataset(format!("row {}: unknown class '{}'", line_no + 1, label))
                })?;

            features.push(row);
            targets.push(target);
        }

        Ok(Self {
            features,
            targets,
            feature_names,
            target_names: target_names.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the dataset has no samples
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.target_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iris_shape() {
        let iris = Dataset::iris().unwrap();
        assert_eq!(iris.len(), 150);
        assert_eq!(iris.feature_names.len(), 4);
        assert_eq!(iris.target_names, vec!["setosa", "versicolor", "virginica"]);
        assert_eq!(iris.feature_names[0], "sepal length (cm)");

        for class in 0..3 {
            assert_eq!(iris.targets.iter().filter(|&&t| t == class).count(), 50);
        }
    }

    #[test]
    fn test_iris_first_row() {
        let iris = Dataset::iris().unwrap();
        assert_eq!(iris.features[0], [5.1, 3.5, 1.4, 0.2]);
        assert_eq!(iris.targets[0], 0);
    }

    #[test]
    fn test_rejects_unknown_class() {
        let csv = "a,b,c,d,species\n1,2,3,4,daisy\n";
        let err = Dataset::from_csv(csv, &IRIS_TARGET_NAMES).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn test_rejects_bad_number() {
        let csv = "a,b,c,d,species\n1,x,3,4,setosa\n";
        assert!(Dataset::from_csv(csv, &IRIS_TARGET_NAMES).is_err());
    }
}
