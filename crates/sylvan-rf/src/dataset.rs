//! Labeled training data: rows of numeric features with an integer class label.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::RfError;

/// Integer class label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct Label(i64);

impl Label {
    /// Create a label from its integer value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Convert a whole-number float, or `None` when `value` has a fractional
    /// part or lies outside the `i64` range.
    ///
    /// `i64::MAX as f64` rounds up to 2^63, so that bound is exclusive.
    #[must_use]
    pub fn from_whole(value: f64) -> Option<Self> {
        let in_range = value >= i64::MIN as f64 && value < -(i64::MIN as f64);
        (in_range && value.fract() == 0.0).then(|| Self(value as i64))
    }

    /// Return the integer value of the label.
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One training example: feature values plus its class label.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    features: Vec<f64>,
    label: Label,
}

impl Row {
    /// Create a row from feature values and a label.
    #[must_use]
    pub fn new(features: Vec<f64>, label: impl Into<Label>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }

    /// Return the feature values.
    #[must_use]
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Return the value of one feature column.
    #[must_use]
    pub fn feature(&self, index: usize) -> f64 {
        self.features[index]
    }

    /// Return the class label.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }
}

/// A validated, non-empty set of rows sharing one feature width.
///
/// Every value is finite and every row has the same number of features.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Row>,
    n_features: usize,
}

impl Dataset {
    /// Validate and wrap a set of rows.
    ///
    /// # Errors
    ///
    /// | Variant                           | When                               |
    /// |-----------------------------------|------------------------------------|
    /// | [`RfError::EmptyDataset`]         | `rows` is empty                    |
    /// | [`RfError::ZeroFeatures`]         | rows have zero feature columns     |
    /// | [`RfError::FeatureCountMismatch`] | rows have inconsistent lengths     |
    /// | [`RfError::NonFiniteValue`]       | any value is NaN or infinite       |
    pub fn new(rows: Vec<Row>) -> Result<Self, RfError> {
        let first = rows.first().ok_or(RfError::EmptyDataset)?;
        let n_features = first.features.len();
        if n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }

        for (sample_index, row) in rows.iter().enumerate() {
            if row.features.len() != n_features {
                return Err(RfError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.features.len(),
                    sample_index,
                });
            }
            if let Some(feature_index) = row.features.iter().position(|v| !v.is_finite()) {
                return Err(RfError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }

        Ok(Self { rows, n_features })
    }

    /// Build a dataset from rows whose last value is the class label.
    ///
    /// `[[1.0, 1.0, 0.0], [0.0, 1.0, 1.0]]` is two rows with two features each,
    /// labeled 0 and 1.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::NonIntegralLabel`] when a trailing value is not a
    /// whole number within the `i64` range, plus every error of [`Dataset::new`].
    pub fn from_labeled_rows(rows: &[Vec<f64>]) -> Result<Self, RfError> {
        let mut parsed = Vec::with_capacity(rows.len());
        for (sample_index, raw) in rows.iter().enumerate() {
            let Some((&label, features)) = raw.split_last() else {
                return Err(RfError::ZeroFeatures);
            };
            let Some(label) = Label::from_whole(label) else {
                return Err(RfError::NonIntegralLabel {
                    sample_index,
                    value: label,
                });
            };
            parsed.push(Row::new(features.to_vec(), label));
        }
        Self::new(parsed)
    }

    /// Return the rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the class labels in row order.
    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        self.rows.iter().map(Row::label).collect()
    }

    /// Return the sorted, deduplicated label domain.
    #[must_use]
    pub fn classes(&self) -> Vec<Label> {
        let mut classes = self.labels();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Copy the rows at `indices` into a new dataset.
    ///
    /// Callers guarantee `indices` is non-empty and in bounds.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        debug_assert!(!indices.is_empty(), "selection must not be empty");
        Self {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            n_features: self.n_features,
        }
    }
}

/// Return the most frequent label, or `None` when there are no labels.
///
/// Ties go to the smallest label value.
pub(crate) fn majority_label(labels: impl IntoIterator<Item = Label>) -> Option<Label> {
    let mut counts: BTreeMap<Label, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut best: Option<(Label, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[i64]) -> Vec<Label> {
        values.iter().copied().map(Label::new).collect()
    }

    #[test]
    fn label_display() {
        assert_eq!(format!("{}", Label::new(-3)), "-3");
    }

    #[test]
    fn from_labeled_rows_splits_trailing_label() {
        let ds = Dataset::from_labeled_rows(&[vec![1.0, 2.0, 0.0], vec![3.0, 4.0, 1.0]]).unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.rows()[1].features(), &[3.0, 4.0]);
        assert_eq!(ds.rows()[1].label(), Label::new(1));
    }

    #[test]
    fn non_integral_label_error() {
        let err = Dataset::from_labeled_rows(&[vec![1.0, 0.5]]).unwrap_err();
        assert!(matches!(err, RfError::NonIntegralLabel { sample_index: 0, .. }));
    }

    #[test]
    fn out_of_range_label_error() {
        for value in [1e19, 9.3e18, -1e19, f64::INFINITY, f64::NAN] {
            let err = Dataset::from_labeled_rows(&[vec![1.0, value]]).unwrap_err();
            assert!(matches!(err, RfError::NonIntegralLabel { sample_index: 0, .. }));
        }
    }

    #[test]
    fn whole_floats_convert_exactly() {
        assert_eq!(Label::from_whole(-3.0), Some(Label::new(-3)));
        assert_eq!(Label::from_whole(i64::MIN as f64), Some(Label::new(i64::MIN)));
        assert_eq!(Label::from_whole(9_223_372_036_854_775_808.0), None);
        assert_eq!(Label::from_whole(2.5), None);
    }

    #[test]
    fn empty_dataset_error() {
        let err = Dataset::new(vec![]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn zero_features_error() {
        let err = Dataset::from_labeled_rows(&[vec![1.0]]).unwrap_err();
        assert!(matches!(err, RfError::ZeroFeatures));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let rows = vec![Row::new(vec![1.0, 2.0], 0), Row::new(vec![1.0], 1)];
        let err = Dataset::new(rows).unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureCountMismatch { expected: 2, got: 1, sample_index: 1 }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let rows = vec![Row::new(vec![1.0, f64::INFINITY], 0)];
        let err = Dataset::new(rows).unwrap_err();
        assert!(matches!(
            err,
            RfError::NonFiniteValue { sample_index: 0, feature_index: 1 }
        ));
    }

    #[test]
    fn classes_sorted_and_unique() {
        let rows = vec![
            Row::new(vec![0.0], 5),
            Row::new(vec![0.0], 2),
            Row::new(vec![0.0], 5),
            Row::new(vec![0.0], -1),
        ];
        let ds = Dataset::new(rows).unwrap();
        assert_eq!(ds.classes(), labels(&[-1, 2, 5]));
    }

    #[test]
    fn majority_picks_most_frequent() {
        assert_eq!(majority_label(labels(&[1, 2, 2, 3])), Some(Label::new(2)));
    }

    #[test]
    fn majority_tie_goes_to_smallest_label() {
        assert_eq!(majority_label(labels(&[3, 1, 3, 1])), Some(Label::new(1)));
    }

    #[test]
    fn majority_of_nothing_is_none() {
        assert_eq!(majority_label(Vec::new()), None);
    }
}
