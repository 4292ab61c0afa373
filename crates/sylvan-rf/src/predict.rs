//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::dataset::{Label, majority_label};
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::DecisionTree;

/// Per-class vote fractions from the trees of a forest.
#[derive(Debug, Clone)]
pub struct VoteDistribution {
    classes: Vec<Label>,
    fractions: Vec<f64>,
}

impl VoteDistribution {
    /// Return the label with the largest vote share (smallest label on ties).
    #[must_use]
    pub fn predicted_label(&self) -> Option<Label> {
        let mut best: Option<(Label, f64)> = None;
        for (&label, &fraction) in self.classes.iter().zip(&self.fractions) {
            if best.is_none_or(|(_, best_fraction)| fraction > best_fraction) {
                best = Some((label, fraction));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Return the vote share of the winning label.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.fractions.iter().copied().fold(0.0, f64::max)
    }

    /// Return the top-k labels sorted by descending vote share.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(Label, f64)> {
        let mut indexed: Vec<(Label, f64)> = self
            .classes
            .iter()
            .copied()
            .zip(self.fractions.iter().copied())
            .collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        indexed.truncate(k);
        indexed
    }

    /// Return the label domain, sorted ascending.
    #[must_use]
    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Return the vote fractions, aligned with [`VoteDistribution::classes`].
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.fractions
    }
}

impl RandomForest {
    /// Predict a label by majority vote over every tree.
    ///
    /// Ties go to the smallest label.
    ///
    /// # Errors
    ///
    /// | Variant                        | When                                               |
    /// |--------------------------------|----------------------------------------------------|
    /// | [`RfError::DimensionMismatch`] | `row` is too short for a feature some tree splits on |
    /// | [`RfError::InvalidTreeCount`]  | the forest holds no trees                          |
    pub fn bagging_predict(&self, row: &[f64]) -> Result<Label, RfError> {
        let votes = self.tree_votes(row)?;
        majority_label(votes).ok_or(RfError::InvalidTreeCount { n_trees: 0 })
    }

    /// Predict a label for each row in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns the first error [`RandomForest::bagging_predict`] reports.
    pub fn random_forest_predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Label>, RfError> {
        rows.into_par_iter()
            .map(|row| self.bagging_predict(row))
            .collect()
    }

    /// Return the share of trees voting for each label of the training domain.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::bagging_predict`].
    pub fn vote_distribution(&self, row: &[f64]) -> Result<VoteDistribution, RfError> {
        let votes = self.tree_votes(row)?;
        if votes.is_empty() {
            return Err(RfError::InvalidTreeCount { n_trees: 0 });
        }

        let mut counts = vec![0usize; self.classes.len()];
        for vote in &votes {
            if let Ok(idx) = self.classes.binary_search(vote) {
                counts[idx] += 1;
            }
        }
        let n = votes.len() as f64;
        let fractions = counts.iter().map(|&c| c as f64 / n).collect();

        Ok(VoteDistribution {
            classes: self.classes.clone(),
            fractions,
        })
    }

    /// Return the vote distribution of each row in parallel, preserving input
    /// order.
    ///
    /// [`VoteDistribution::predicted_label`] of each entry equals what
    /// [`RandomForest::random_forest_predict`] returns for that row, so callers
    /// that need both walk the trees once.
    ///
    /// # Errors
    ///
    /// Returns the first error [`RandomForest::vote_distribution`] reports.
    pub fn vote_distributions(&self, rows: &[Vec<f64>]) -> Result<Vec<VoteDistribution>, RfError> {
        rows.into_par_iter()
            .map(|row| self.vote_distribution(row))
            .collect()
    }

    fn tree_votes(&self, row: &[f64]) -> Result<Vec<Label>, RfError> {
        self.trees.iter().map(|tree| tree.predict(row)).collect()
    }

    /// Return the trees of the ensemble in build order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the sorted label domain seen during training.
    #[must_use]
    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
