use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use sylvan_io::{ExperimentName, FeatureReader, LabeledReader, ResultWriter};
use sylvan_rf::{
    CrossValidation, MaxFeatures, RandomForest, RandomForestConfig, VoteDistribution, accuracy,
};

#[derive(Parser)]
#[command(name = "sylvan")]
#[command(about = "Random Forest classification of tabular feature data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared Random Forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = 10)]
    n_trees: usize,

    /// Maximum tree depth (the root split is depth 1)
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Group size at or below which a branch becomes a leaf
    #[arg(long, default_value_t = 1)]
    min_size: usize,

    /// Bootstrap sample size as a fraction of the training rows, in (0, 2]
    #[arg(long, default_value_t = 1.0)]
    sample_ratio: f64,

    /// Features considered per split (defaults to ceil(sqrt(n_features)))
    #[arg(long)]
    n_features: Option<usize>,
}

impl ForestArgs {
    fn config(&self, seed: u64) -> Result<RandomForestConfig> {
        let max_features = self.n_features.map_or(MaxFeatures::Sqrt, MaxFeatures::Fixed);
        Ok(RandomForestConfig::new(self.n_trees)?
            .with_max_depth(self.max_depth)
            .with_min_size(self.min_size)
            .with_sample_ratio(self.sample_ratio)
            .with_max_features(max_features)
            .with_seed(seed))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest on a labeled CSV and save the model
    Train {
        /// Path to the labeled CSV file (last column is the class label)
        #[arg(long)]
        data: PathBuf,

        /// Path where the trained model binary is written
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Predict class labels for the rows of a CSV file
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file of feature rows
        #[arg(long)]
        data: PathBuf,

        /// Number of top-voted labels to output per row
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Estimate accuracy with stratified k-fold cross-validation
    Evaluate {
        /// Path to the labeled CSV file (last column is the class label)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 5)]
        cv_folds: usize,

        #[command(flatten)]
        forest: ForestArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    model: PathBuf,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    n_trees: usize,
    training_accuracy: f64,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_rows: usize,
    model_n_trees: usize,
    model_n_features: usize,
    model_n_classes: usize,
    output: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    n_trees: usize,
    cv_folds: usize,
    cv_mean_accuracy: f64,
    cv_std_accuracy: f64,
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            model,
            forest,
        } => {
            let config = forest.config(cli.seed)?;

            // 1. Read labeled table
            let table = LabeledReader::new(&data)
                .read()
                .context("failed to read training CSV")?;
            let dataset = table.dataset();

            // 2. Train
            let trained = config.fit(dataset).context("training failed")?;

            // 3. Training accuracy
            let features: Vec<Vec<f64>> =
                dataset.rows().iter().map(|r| r.features().to_vec()).collect();
            let predictions = trained
                .random_forest_predict(&features)
                .context("prediction on training data failed")?;
            let training_accuracy = accuracy(&dataset.labels(), &predictions)?;
            info!(training_accuracy, "forest trained");

            // 4. Save model
            trained.save(&model).context("failed to save model")?;

            let output = TrainOutput {
                model,
                n_samples: dataset.n_samples(),
                n_features: dataset.n_features(),
                n_classes: trained.classes().len(),
                n_trees: trained.n_trees(),
                training_accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            top_k,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.n_features(),
                n_classes = forest.classes().len(),
                "model loaded"
            );

            // 2. Read feature rows
            let table = FeatureReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            info!(n_rows = table.n_samples(), "feature rows loaded");

            // 3. Predict: one pass over the trees yields votes and labels
            let votes = forest
                .vote_distributions(table.features())
                .context("prediction failed")?;
            let predictions = votes
                .iter()
                .map(VoteDistribution::predicted_label)
                .collect::<Option<Vec<_>>>()
                .context("model produced no votes")?;

            // 4. Write predictions JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let path = writer.write_predictions(&predictions, &votes, top_k)?;

            let output = PredictOutput {
                experiment,
                n_rows: table.n_samples(),
                model_n_trees: forest.n_trees(),
                model_n_features: forest.n_features(),
                model_n_classes: forest.classes().len(),
                output: path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            data,
            experiment,
            output_dir,
            cv_folds,
            forest,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let config = forest.config(cli.seed)?;
            let cv = CrossValidation::new(cv_folds)?.with_seed(cli.seed);

            // 1. Read labeled table
            let table = LabeledReader::new(&data)
                .read()
                .context("failed to read evaluation CSV")?;

            // 2. Cross-validate
            let result = cv
                .evaluate(&config, table.dataset())
                .context("cross-validation failed")?;

            // 3. Write evaluation JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let path = writer.write_evaluation(&config, &result)?;

            let output = EvaluateOutput {
                experiment,
                n_samples: result.n_samples,
                n_features: result.n_features,
                n_classes: result.n_classes,
                n_trees: config.n_trees(),
                cv_folds,
                cv_mean_accuracy: result.mean_accuracy,
                cv_std_accuracy: result.std_accuracy,
                output: path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
