//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::dataset::Label;
use crate::error::RfError;

/// Fraction of positions where `actual` and `predicted` agree.
///
/// # Errors
///
/// | Variant                         | When                          |
/// |---------------------------------|-------------------------------|
/// | [`RfError::LabelCountMismatch`] | the slices differ in length   |
/// | [`RfError::EmptyDataset`]       | both slices are empty         |
pub fn accuracy(actual: &[Label], predicted: &[Label]) -> Result<f64, RfError> {
    check_lengths(actual, predicted)?;
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|&(a, p)| a == p)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

fn check_lengths(actual: &[Label], predicted: &[Label]) -> Result<(), RfError> {
    if actual.len() != predicted.len() {
        return Err(RfError::LabelCountMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    Ok(())
}

/// A confusion matrix over an integer label domain.
///
/// Entry `matrix[i][j]` counts samples whose true label is `classes[i]`
/// and whose predicted label is `classes[j]`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConfusionMatrix {
    classes: Vec<Label>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassMetrics {
    /// The class label.
    pub class: Label,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// The domain is `classes` plus any label that appears in either slice,
    /// sorted ascending.
    ///
    /// # Errors
    ///
    /// | Variant                         | When                        |
    /// |---------------------------------|-----------------------------|
    /// | [`RfError::LabelCountMismatch`] | the slices differ in length |
    /// | [`RfError::EmptyDataset`]       | zero labels provided        |
    pub fn from_labels(
        actual: &[Label],
        predicted: &[Label],
        classes: &[Label],
    ) -> Result<Self, RfError> {
        check_lengths(actual, predicted)?;

        let mut domain: Vec<Label> = classes
            .iter()
            .chain(actual)
            .chain(predicted)
            .copied()
            .collect();
        domain.sort_unstable();
        domain.dedup();

        let n = domain.len();
        let mut matrix = vec![vec![0usize; n]; n];
        for (t, p) in actual.iter().zip(predicted) {
            if let (Ok(i), Ok(j)) = (domain.binary_search(t), domain.binary_search(p)) {
                matrix[i][j] += 1;
            }
        }
        Ok(Self {
            classes: domain,
            matrix,
        })
    }

    /// Add the counts of `other` into this matrix, widening the domain as needed.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        let mut domain: Vec<Label> = self.classes.iter().chain(&other.classes).copied().collect();
        domain.sort_unstable();
        domain.dedup();

        let n = domain.len();
        let mut matrix = vec![vec![0usize; n]; n];
        for source in [&*self, other] {
            for (i, row) in source.matrix.iter().enumerate() {
                for (j, &count) in row.iter().enumerate() {
                    if let (Ok(di), Ok(dj)) = (
                        domain.binary_search(&source.classes[i]),
                        domain.binary_search(&source.classes[j]),
                    ) {
                        matrix[di][dj] += count;
                    }
                }
            }
        }
        self.classes = domain;
        self.matrix = matrix;
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.n_classes();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fp: usize = (0..n).filter(|&i| i != c).map(|i| self.matrix[i][c]).sum();
                let fn_: usize = (0..n).filter(|&j| j != c).map(|j| self.matrix[c][j]).sum();
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c],
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the label domain, sorted ascending.
    #[must_use]
    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Return the number of counted samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for label in &self.classes {
            write!(f, " pred_{label:>4}")?;
        }
        writeln!(f)?;

        for (label, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "true_{label:>4} ")?;
            for val in row {
                write!(f, " {val:>9}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
