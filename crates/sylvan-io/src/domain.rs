//! Domain types for sylvan-io.

use sylvan_rf::Dataset;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unlabeled feature rows read by [`FeatureReader`](crate::FeatureReader).
///
/// `features[i]` is the i-th data row in file order.
#[derive(Debug)]
pub struct FeatureTable {
    /// Feature column names from the CSV header.
    feature_names: Vec<String>,
    /// Feature values: `features[sample_index][feature_index]`.
    features: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub(crate) fn new(feature_names: Vec<String>, features: Vec<Vec<f64>>) -> Self {
        Self {
            feature_names,
            features,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// A labeled training table read by [`LabeledReader`](crate::LabeledReader).
#[derive(Debug)]
pub struct LabeledTable {
    feature_names: Vec<String>,
    label_name: String,
    dataset: Dataset,
}

impl LabeledTable {
    pub(crate) fn new(feature_names: Vec<String>, label_name: String, dataset: Dataset) -> Self {
        Self {
            feature_names,
            label_name,
            dataset,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the header of the label column.
    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Return the validated dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume the table, returning the dataset.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
