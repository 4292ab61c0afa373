//! Stratified k-fold cross-validation for Random Forest.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::config::RandomForestConfig;
use crate::confusion::{ConfusionMatrix, accuracy};
use crate::dataset::{Dataset, Label};
use crate::error::RfError;

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_seed` if desired.
/// The fold shuffle seed defaults to 42.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
}

/// Results of stratified k-fold cross-validation.
#[derive(Debug, serde::Serialize)]
pub struct CrossValidationResult {
    /// Accuracy for each fold.
    pub fold_accuracies: Vec<f64>,
    /// Aggregated confusion matrix (summed across all folds).
    pub confusion_matrix: ConfusionMatrix,
    /// Mean accuracy across folds.
    pub mean_accuracy: f64,
    /// Standard deviation of fold accuracies.
    pub std_accuracy: f64,
    /// Number of folds.
    pub n_folds: usize,
    /// Total number of samples.
    pub n_samples: usize,
    /// Number of features.
    pub n_features: usize,
    /// Number of classes.
    pub n_classes: usize,
}

impl CrossValidation {
    /// Create a new cross-validation config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, RfError> {
        if n_folds < 2 {
            return Err(RfError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 42 })
    }

    /// Set the random seed for fold shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the fold shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run stratified k-fold cross-validation.
    ///
    /// Splits the data into `n_folds` folds with approximately equal class
    /// distribution in each fold. Each fold trains a forest on the remaining
    /// folds and evaluates on the held-out fold.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                 |
    /// |--------------------------------------|--------------------------------------|
    /// | [`RfError::TooFewSamplesForFolds`]   | a class has fewer samples than folds |
    /// | Other [`RfError`] variants           | from training or prediction          |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = dataset.n_samples()))]
    pub fn evaluate(
        &self,
        config: &RandomForestConfig,
        dataset: &Dataset,
    ) -> Result<CrossValidationResult, RfError> {
        let classes = dataset.classes();
        let folds = self.stratified_folds(&dataset.labels())?;

        let mut fold_accuracies = Vec::with_capacity(self.n_folds);
        let mut confusion_matrix: Option<ConfusionMatrix> = None;

        for (fold, test_indices) in folds.iter().enumerate() {
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != fold)
                .flat_map(|(_, indices)| indices.iter().copied())
                .collect();

            let train = dataset.select(&train_indices);
            let test = dataset.select(test_indices);

            // Each fold trains with different randomness.
            let fold_config = config.clone().with_seed(config.seed.wrapping_add(fold as u64));
            let forest = fold_config.fit(&train)?;

            let test_features: Vec<Vec<f64>> =
                test.rows().iter().map(|r| r.features().to_vec()).collect();
            let predictions = forest.random_forest_predict(&test_features)?;
            let truth = test.labels();

            let fold_accuracy = accuracy(&truth, &predictions)?;
            fold_accuracies.push(fold_accuracy);
            info!(fold, accuracy = fold_accuracy, n_test = truth.len(), "fold completed");

            let fold_matrix = ConfusionMatrix::from_labels(&truth, &predictions, &classes)?;
            match confusion_matrix.as_mut() {
                Some(total) => total.merge(&fold_matrix),
                None => confusion_matrix = Some(fold_matrix),
            }
        }

        let mean_accuracy = fold_accuracies.iter().sum::<f64>() / self.n_folds as f64;
        let std_accuracy = {
            let variance = fold_accuracies
                .iter()
                .map(|&a| (a - mean_accuracy).powi(2))
                .sum::<f64>()
                / self.n_folds as f64;
            variance.sqrt()
        };

        let confusion_matrix = confusion_matrix.ok_or(RfError::EmptyDataset)?;

        info!(mean_accuracy, std_accuracy, "cross-validation complete");

        Ok(CrossValidationResult {
            fold_accuracies,
            confusion_matrix,
            mean_accuracy,
            std_accuracy,
            n_folds: self.n_folds,
            n_samples: dataset.n_samples(),
            n_features: dataset.n_features(),
            n_classes: classes.len(),
        })
    }

    /// Assign sample indices to folds.
    ///
    /// Groups samples by class, shuffles within each class, then
    /// round-robins across folds so each fold gets approximately
    /// equal representation of each class.
    fn stratified_folds(&self, labels: &[Label]) -> Result<Vec<Vec<usize>>, RfError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut by_class: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }

        for (class, indices) in &by_class {
            if indices.len() < self.n_folds {
                return Err(RfError::TooFewSamplesForFolds {
                    class: class.value(),
                    count: indices.len(),
                    n_folds: self.n_folds,
                });
            }
        }

        let mut folds = vec![Vec::new(); self.n_folds];
        for indices in by_class.values_mut() {
            indices.shuffle(&mut rng);
            for (j, &idx) in indices.iter().enumerate() {
                folds[j % self.n_folds].push(idx);
            }
        }

        Ok(folds)
    }
}
