//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::bootstrap::{bootstrap_size, subsample};
use crate::config::{MaxFeatures, RandomForestConfig};
use crate::dataset::{Dataset, Label};
use crate::error::RfError;
use crate::tree::{DecisionTree, TreeBuilder};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) classes: Vec<Label>,
}

/// Resolve `MaxFeatures` to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, RfError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Log2 => (n_features as f64).log2().ceil().max(1.0) as usize,
        MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(RfError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Train a forest with positional parameters.
///
/// Equivalent to
/// `RandomForestConfig::new(n_trees)?.with_max_depth(max_depth).with_min_size(min_size)
/// .with_sample_ratio(sample_ratio).with_max_features(MaxFeatures::Fixed(n_features))
/// .with_seed(seed).fit(train)`.
///
/// # Errors
///
/// Every error of [`RandomForestConfig::new`] and [`RandomForestConfig::fit`].
pub fn build_random_forest(
    train: &Dataset,
    max_depth: usize,
    min_size: usize,
    sample_ratio: f64,
    n_trees: usize,
    n_features: usize,
    seed: u64,
) -> Result<RandomForest, RfError> {
    RandomForestConfig::new(n_trees)?
        .with_max_depth(max_depth)
        .with_min_size(min_size)
        .with_sample_ratio(sample_ratio)
        .with_max_features(MaxFeatures::Fixed(n_features))
        .with_seed(seed)
        .fit(train)
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = dataset.n_samples()))]
pub(crate) fn train(config: &RandomForestConfig, dataset: &Dataset) -> Result<RandomForest, RfError> {
    // --- Validate config before any tree is grown ---
    let n_samples = dataset.n_samples();
    let n_features = dataset.n_features();
    let max_features = resolve_max_features(config.max_features, n_features)?;
    let builder = TreeBuilder::new(config.max_depth, config.min_size, max_features)?;
    let draw_count = bootstrap_size(n_samples, config.sample_ratio)?;
    let classes = dataset.classes();

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes = classes.len(),
        max_features,
        draw_count,
        "training random forest"
    );

    // Generate per-tree seeds from master RNG.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let rows = dataset.rows();
    let sample_ratio = config.sample_ratio;

    // Parallel tree training; each tree owns its RNG stream.
    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample = subsample(rows, sample_ratio, &mut rng)?;
            builder.build(&sample, &mut rng)
        })
        .collect::<Result<_, _>>()?;

    debug!(n_trees_trained = trees.len(), "tree training complete");

    Ok(RandomForest {
        trees,
        n_features,
        classes,
    })
}
