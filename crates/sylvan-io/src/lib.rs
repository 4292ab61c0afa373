//! CSV table readers and JSON result writers for the sylvan pipeline.

mod domain;
mod error;
mod feature_reader;
mod reader;
mod writer;

pub use domain::{ExperimentName, FeatureTable, LabeledTable};
pub use error::IoError;
pub use feature_reader::FeatureReader;
pub use reader::LabeledReader;
pub use writer::ResultWriter;
