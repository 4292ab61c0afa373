//! Accuracy regression tests for sylvan-rf.
//!
//! These tests verify that algorithmic changes do not degrade Random Forest
//! classification accuracy on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sylvan_rf::{
    CrossValidation, Dataset, Label, RandomForestConfig, accuracy, build_random_forest,
};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic classification dataset
// ---------------------------------------------------------------------------

/// Generate a 300-sample, 10-feature, 3-class classification dataset.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]).
/// Features 3-9 are pure noise in [0, 0.5].
/// Samples are assigned round-robin across classes, labeled 1, 2, 3.
fn make_classification() -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 300;
    let n_features = 10;
    let n_classes = 3;

    let rows: Vec<Vec<f64>> = (0..n_samples)
        .map(|i| {
            let class = i % n_classes;
            let mut row: Vec<f64> = (0..n_features)
                .map(|f| {
                    let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                    base + rng.r#gen::<f64>() * 0.5
                })
                .collect();
            row.push((class + 1) as f64);
            row
        })
        .collect();
    Dataset::from_labeled_rows(&rows).unwrap()
}

fn feature_rows(dataset: &Dataset) -> Vec<Vec<f64>> {
    dataset.rows().iter().map(|r| r.features().to_vec()).collect()
}

// ---------------------------------------------------------------------------
// a) cv_accuracy_above_threshold
// ---------------------------------------------------------------------------

/// 5-fold cross-validation mean accuracy must exceed 0.85 on the synthetic dataset.
#[test]
fn cv_accuracy_above_threshold() {
    let ds = make_classification();
    let rf_config = RandomForestConfig::new(50).unwrap().with_seed(42);
    let cv = CrossValidation::new(5).unwrap().with_seed(42);
    let result = cv.evaluate(&rf_config, &ds).unwrap();

    assert!(
        result.mean_accuracy > 0.85,
        "cv mean_accuracy {} <= 0.85",
        result.mean_accuracy
    );
    assert_eq!(result.confusion_matrix.total(), 300);
}

// ---------------------------------------------------------------------------
// b) deterministic_predictions
// ---------------------------------------------------------------------------

/// Same config and seed must produce identical predictions across two independent runs.
#[test]
fn deterministic_predictions() {
    let ds = make_classification();
    let features = feature_rows(&ds);
    let rf_config = RandomForestConfig::new(50).unwrap().with_seed(42);

    let preds1 = rf_config.fit(&ds).unwrap().random_forest_predict(&features).unwrap();
    let preds2 = rf_config.fit(&ds).unwrap().random_forest_predict(&features).unwrap();

    assert_eq!(
        preds1, preds2,
        "predictions differ across runs with the same seed"
    );
}

// ---------------------------------------------------------------------------
// c) thread_count_does_not_change_the_forest
// ---------------------------------------------------------------------------

/// A single-threaded pool must build the same forest as the global pool.
#[test]
fn thread_count_does_not_change_the_forest() {
    let ds = make_classification();
    let features = feature_rows(&ds);
    let rf_config = RandomForestConfig::new(20).unwrap().with_seed(7);

    let parallel = rf_config.fit(&ds).unwrap();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let sequential = pool.install(|| rf_config.fit(&ds).unwrap());

    for (a, b) in parallel.trees().iter().zip(sequential.trees()) {
        assert_eq!(a.n_nodes(), b.n_nodes());
    }
    assert_eq!(
        parallel.random_forest_predict(&features).unwrap(),
        sequential.random_forest_predict(&features).unwrap()
    );
}

// ---------------------------------------------------------------------------
// d) prediction_accuracy_on_training_data
// ---------------------------------------------------------------------------

/// Training accuracy with 50 trees must exceed 0.95.
#[test]
fn prediction_accuracy_on_training_data() {
    let ds = make_classification();
    let forest = build_random_forest(&ds, 10, 1, 1.0, 50, 4, 42).unwrap();

    let predictions = forest.random_forest_predict(&feature_rows(&ds)).unwrap();
    let acc = accuracy(&ds.labels(), &predictions).unwrap();

    assert!(acc > 0.95, "training accuracy {acc} <= 0.95");
    assert_eq!(forest.classes(), &[Label::new(1), Label::new(2), Label::new(3)]);
}

// ---------------------------------------------------------------------------
// e) small_example_end_to_end
// ---------------------------------------------------------------------------

/// Rows carrying their label column are still predicted; the trailing value is ignored.
#[test]
fn small_example_end_to_end() {
    let rows = vec![
        vec![1.0, 1.0, 0.0],
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0],
    ];
    let ds = Dataset::from_labeled_rows(&rows).unwrap();
    let forest = build_random_forest(&ds, 3, 1, 2.0, 51, 2, 42).unwrap();
    assert_eq!(forest.n_trees(), 51);

    let predictions = forest.random_forest_predict(&rows).unwrap();
    assert_eq!(predictions, ds.labels());
}

// ---------------------------------------------------------------------------
// f) single_tree_end_to_end
// ---------------------------------------------------------------------------

/// One tree on a full-size bootstrap of the four-row example.
///
/// Whether that tree reproduces all four labels depends on its bootstrap
/// draw: a sample holding one class yields a single leaf, and a sample such
/// as `{[1,1], [0,0]}` lets feature 1 tie feature 0 at zero impurity. So each
/// seed must give a deterministic, in-domain single-tree forest, and some
/// seed must reproduce every label.
#[test]
fn single_tree_end_to_end() {
    let rows = vec![
        vec![1.0, 1.0, 0.0],
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0],
    ];
    let ds = Dataset::from_labeled_rows(&rows).unwrap();

    let mut reproduced = 0;
    for seed in 0..64 {
        let forest = build_random_forest(&ds, 3, 1, 1.0, 1, 2, seed).unwrap();
        assert_eq!(forest.n_trees(), 1);
        assert_eq!(forest.trees()[0].nodes()[0].n_samples(), 4);

        let predictions = forest.random_forest_predict(&rows).unwrap();
        let again = build_random_forest(&ds, 3, 1, 1.0, 1, 2, seed)
            .unwrap()
            .random_forest_predict(&rows)
            .unwrap();
        assert_eq!(predictions, again, "seed {seed} is not deterministic");
        assert!(predictions.iter().all(|l| ds.classes().contains(l)));

        if predictions == ds.labels() {
            reproduced += 1;
        }
    }
    assert!(reproduced > 0, "no seed reproduced the four labels");
}
