//! Configuration builder for Random Forest training.

use crate::dataset::Dataset;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total features.
    Sqrt,
    /// Log base 2 of total features.
    Log2,
    /// A fraction of total features (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter      | Default |
/// |----------------|---------|
/// | `max_features` | `Sqrt`  |
/// | `max_depth`    | 10      |
/// | `min_size`     | 1       |
/// | `sample_ratio` | 1.0     |
/// | `seed`         | 42      |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: usize,
    pub(crate) min_size: usize,
    pub(crate) sample_ratio: f64,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: 10,
            min_size: 1,
            sample_ratio: 1.0,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth (the root split sits at depth 1).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the group size at or below which a branch becomes a leaf.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the bootstrap sample size as a fraction of the training set.
    #[must_use]
    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the leaf size threshold.
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Return the bootstrap sample ratio.
    #[must_use]
    pub fn sample_ratio(&self) -> f64 {
        self.sample_ratio
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest on the provided dataset.
    ///
    /// # Errors
    ///
    /// | Variant                         | When                                              |
    /// |---------------------------------|---------------------------------------------------|
    /// | [`RfError::InvalidMaxDepth`]    | `max_depth` is zero                               |
    /// | [`RfError::InvalidMaxFeatures`] | resolved max_features is outside [1, n_features]  |
    /// | [`RfError::InvalidSampleRatio`] | sample_ratio is not in (0.0, 2.0] or draws no row |
    pub fn fit(&self, dataset: &Dataset) -> Result<RandomForest, RfError> {
        crate::forest::train(self, dataset)
    }
}
