//! CSV readers for labeled training tables, with full input validation.

use std::path::{Path, PathBuf};

use sylvan_rf::{Dataset, Label, Row};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::LabeledTable;

/// Open `path`, read its header, and return every record.
///
/// Rows are checked against the header width; an empty body is an error.
pub(crate) fn read_records(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>), IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    // flexible(true) allows rows with varying column counts so that our own
    // InconsistentRowLength check fires instead of a low-level CsvParse error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let header: Vec<String> = rdr
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(String::from)
        .collect();
    debug!(expected_cols = header.len(), "read CSV header");

    let mut records = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        if record.len() != header.len() {
            return Err(IoError::InconsistentRowLength {
                path: path.to_path_buf(),
                row_index,
                expected: header.len(),
                got: record.len(),
            });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(IoError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    Ok((header, records))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

/// Parse one feature cell, rejecting anything that is not a finite float.
pub(crate) fn parse_feature(
    path: &Path,
    row_index: usize,
    col_index: usize,
    raw: &str,
) -> Result<f64, IoError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(IoError::NonFiniteValue {
            path: path.to_path_buf(),
            row_index,
            col_index,
            raw: raw.to_string(),
        }),
    }
}

/// Parse a label cell: an integer, or a float with no fractional part that
/// fits in `i64`.
fn parse_label(path: &Path, row_index: usize, raw: &str) -> Result<Label, IoError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Label::new(value));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Label::from_whole)
        .ok_or_else(|| IoError::InvalidLabel {
            path: path.to_path_buf(),
            row_index,
            raw: raw.to_string(),
        })
}

/// Reads a labeled training table from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `feature1,feature2,...,featureN,label`
/// - Every column but the last is a feature; the last is an integer class label
/// - All rows must have the same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Header has fewer than two columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Label cell is not an integer |
pub struct LabeledReader {
    path: PathBuf,
}

impl LabeledReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`LabeledTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledTable, IoError> {
        let (mut header, records) = read_records(&self.path)?;
        let Some(label_name) = header.pop().filter(|_| !header.is_empty()) else {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        };
        let n_features = header.len();

        let mut rows = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            let mut features = Vec::with_capacity(n_features);
            for (col_index, raw) in record.iter().take(n_features).enumerate() {
                features.push(parse_feature(&self.path, row_index, col_index, raw)?);
            }
            let raw_label = record.get(n_features).unwrap_or("");
            let label = parse_label(&self.path, row_index, raw_label)?;
            rows.push(Row::new(features, label));
        }

        let dataset = Dataset::new(rows).map_err(|e| IoError::InvalidDataset {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_samples = dataset.n_samples(),
            n_features,
            n_classes = dataset.classes().len(),
            "labeled dataset loaded"
        );

        Ok(LabeledTable::new(header, label_name, dataset))
    }
}
