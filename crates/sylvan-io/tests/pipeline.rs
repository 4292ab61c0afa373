//! End-to-end integration tests: CSV -> train/evaluate -> model/JSON -> read back.

use std::fs;
use std::path::Path;

use sylvan_io::{ExperimentName, FeatureReader, IoError, LabeledReader, ResultWriter};
use sylvan_rf::{CrossValidation, Label, RandomForest, RandomForestConfig, VoteDistribution};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn train_save_load_predict_round_trip() {
    // 1. Read labeled CSV
    let table = LabeledReader::new(&fixture_path("labeled_36x2.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(table.feature_names(), &["length", "width"]);
    assert_eq!(table.label_name(), "species");
    assert_eq!(table.dataset().n_samples(), 36);

    // 2. Train and persist
    let forest = RandomForestConfig::new(25)
        .unwrap()
        .with_max_depth(5)
        .with_seed(42)
        .fit(table.dataset())
        .unwrap();
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.bin");
    forest.save(&model_path).unwrap();

    // 3. Load and predict on unlabeled rows
    let loaded = RandomForest::load(&model_path).unwrap();
    let inputs = FeatureReader::new(&fixture_path("unlabeled_4x2.csv"))
        .read()
        .unwrap();
    let predictions = loaded.random_forest_predict(inputs.features()).unwrap();
    let expected: Vec<Label> = [0, 1, 2, 0].into_iter().map(Label::new).collect();
    assert_eq!(predictions, expected);
    assert_eq!(predictions, forest.random_forest_predict(inputs.features()).unwrap());

    // 4. Write JSON artifact and verify
    let votes: Vec<VoteDistribution> = inputs
        .features()
        .iter()
        .map(|row| loaded.vote_distribution(row).unwrap())
        .collect();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("rt".into()).unwrap()).unwrap();
    let json_path = writer.write_predictions(&predictions, &votes, 3).unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(content["experiment"], "rt");
    assert_eq!(content["n_rows"], 4);
    let entries = content["predictions"].as_array().unwrap();
    for (entry, label) in entries.iter().zip(&expected) {
        assert_eq!(entry["label"], label.value());
        let confidence = entry["confidence"].as_f64().unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0, "confidence {confidence}");
    }
}

#[test]
fn labeled_table_predicts_through_feature_reader() {
    // The label column is read as a trailing feature and ignored at prediction time.
    let table = LabeledReader::new(&fixture_path("labeled_36x2.csv")).read().unwrap();
    let forest = RandomForestConfig::new(15).unwrap().fit(table.dataset()).unwrap();

    let with_labels = FeatureReader::new(&fixture_path("labeled_36x2.csv")).read().unwrap();
    assert_eq!(with_labels.n_features(), 3);
    let predictions = forest.random_forest_predict(with_labels.features()).unwrap();
    assert_eq!(predictions.len(), 36);
}

#[test]
fn evaluate_round_trip() {
    let table = LabeledReader::new(&fixture_path("labeled_36x2.csv")).read().unwrap();
    let config = RandomForestConfig::new(15).unwrap().with_seed(3);
    let result = CrossValidation::new(4)
        .unwrap()
        .with_seed(3)
        .evaluate(&config, table.dataset())
        .unwrap();
    assert!(result.mean_accuracy > 0.8, "mean accuracy {}", result.mean_accuracy);

    let dir = TempDir::new().unwrap();
    let writer =
        ResultWriter::new(dir.path(), ExperimentName::new("cv".into()).unwrap()).unwrap();
    let path = writer.write_evaluation(&config, &result).unwrap();
    assert_eq!(path, dir.path().join("cv_evaluate.json"));

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["n_folds"], 4);
    assert_eq!(content["n_classes"], 3);
    let total: u64 = content["confusion_matrix"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap())
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 36);
}

#[test]
fn reader_fixture_files_match_expected_errors() {
    // empty.csv -> EmptyDataset
    let result = LabeledReader::new(&fixture_path("empty.csv")).read();
    assert!(
        matches!(result, Err(IoError::EmptyDataset { .. })),
        "empty.csv should give EmptyDataset, got: {result:?}"
    );

    // jagged.csv -> InconsistentRowLength
    let result = LabeledReader::new(&fixture_path("jagged.csv")).read();
    assert!(
        matches!(result, Err(IoError::InconsistentRowLength { .. })),
        "jagged.csv should give InconsistentRowLength, got: {result:?}"
    );

    // nan.csv -> NonFiniteValue
    let result = FeatureReader::new(&fixture_path("nan.csv")).read();
    assert!(
        matches!(result, Err(IoError::NonFiniteValue { .. })),
        "nan.csv should give NonFiniteValue, got: {result:?}"
    );

    // bad_label.csv -> InvalidLabel
    let result = LabeledReader::new(&fixture_path("bad_label.csv")).read();
    assert!(
        matches!(result, Err(IoError::InvalidLabel { .. })),
        "bad_label.csv should give InvalidLabel, got: {result:?}"
    );
}
