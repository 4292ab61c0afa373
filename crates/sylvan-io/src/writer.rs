//! JSON result writer for prediction and evaluation outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sylvan_rf::{ClassMetrics, CrossValidationResult, Label, RandomForestConfig, VoteDistribution};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes prediction and evaluation results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_predictions.json` and
/// `{experiment}_evaluate.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write predictions to `{experiment}_predictions.json`.
    ///
    /// `predictions[i]` and `votes[i]` describe the i-th input row; each entry
    /// carries the predicted label and the top `top_k` vote shares.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | file cannot be written |
    #[instrument(skip_all, fields(n_rows = predictions.len()))]
    pub fn write_predictions(
        &self,
        predictions: &[Label],
        votes: &[VoteDistribution],
        top_k: usize,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predictions");

        let entries: Vec<PredictionEntry> = predictions
            .iter()
            .zip(votes)
            .enumerate()
            .map(|(row, (&label, dist))| PredictionEntry {
                row,
                label: label.value(),
                confidence: dist.confidence(),
                votes: dist
                    .top_k(top_k)
                    .into_iter()
                    .map(|(class, share)| VoteEntry {
                        label: class.value(),
                        share,
                    })
                    .collect(),
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: entries.len(),
            predictions: entries,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Write cross-validation results to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | file cannot be written |
    #[instrument(skip_all, fields(n_folds = result.n_folds))]
    pub fn write_evaluation(
        &self,
        config: &RandomForestConfig,
        result: &CrossValidationResult,
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("evaluate");

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            params: ForestParams::from(config),
            n_samples: result.n_samples,
            n_features: result.n_features,
            n_classes: result.n_classes,
            n_folds: result.n_folds,
            cv_accuracy_mean: result.mean_accuracy,
            cv_accuracy_std: result.std_accuracy,
            fold_accuracies: &result.fold_accuracies,
            classes: result
                .confusion_matrix
                .classes()
                .iter()
                .map(|c| c.value())
                .collect(),
            confusion_matrix: result.confusion_matrix.as_rows(),
            class_metrics: result.confusion_matrix.class_metrics(),
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    fn write_json(&self, path: &Path, artifact: &impl Serialize) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeJson {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    predictions: Vec<PredictionEntry>,
}

#[derive(Serialize)]
struct PredictionEntry {
    row: usize,
    label: i64,
    confidence: f64,
    votes: Vec<VoteEntry>,
}

#[derive(Serialize)]
struct VoteEntry {
    label: i64,
    share: f64,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    params: ForestParams,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    n_folds: usize,
    cv_accuracy_mean: f64,
    cv_accuracy_std: f64,
    fold_accuracies: &'a [f64],
    classes: Vec<i64>,
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: Vec<ClassMetrics>,
}

#[derive(Serialize)]
struct ForestParams {
    n_trees: usize,
    max_depth: usize,
    min_size: usize,
    sample_ratio: f64,
    max_features: String,
    seed: u64,
}

impl From<&RandomForestConfig> for ForestParams {
    fn from(config: &RandomForestConfig) -> Self {
        Self {
            n_trees: config.n_trees(),
            max_depth: config.max_depth(),
            min_size: config.min_size(),
            sample_ratio: config.sample_ratio(),
            max_features: format!("{:?}", config.max_features()),
            seed: config.seed(),
        }
    }
}
