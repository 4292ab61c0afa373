//! Random Forest classification: train, evaluate, predict.
//!
//! CART decision trees grown on bootstrap samples with Gini impurity splits,
//! random per-split feature subsets, parallel tree construction via rayon,
//! majority-vote prediction, stratified cross-validation, and model
//! serialization.

mod bootstrap;
mod config;
mod confusion;
mod dataset;
mod error;
mod eval;
mod forest;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use bootstrap::{bootstrap_size, subsample};
pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix, accuracy};
pub use dataset::{Dataset, Label, Row};
pub use error::RfError;
pub use eval::{CrossValidation, CrossValidationResult};
pub use forest::{RandomForest, build_random_forest};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::VoteDistribution;
pub use split::{SplitCandidate, get_split, gini_index, test_split};
pub use tree::{DecisionTree, DecisionTreeConfig, TreeBuilder};
