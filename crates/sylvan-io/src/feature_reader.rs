//! CSV feature reader for unlabeled prediction inputs.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::IoError;
use crate::domain::FeatureTable;
use crate::reader::{parse_feature, read_records};

/// Reads unlabeled feature rows from a CSV file.
///
/// Expected CSV format:
/// - Header row required, one name per feature column
/// - `feature1,feature2,...,featureN`
/// - All rows must have the same number of columns
///
/// A labeled table can be read this way too; its label column is then just
/// one more numeric column, which prediction ignores past the trained width.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Header has no columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct FeatureReader {
    path: PathBuf,
}

impl FeatureReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`FeatureTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<FeatureTable, IoError> {
        let (feature_names, records) = read_records(&self.path)?;
        if feature_names.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }

        let mut features = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            let row = record
                .iter()
                .enumerate()
                .map(|(col_index, raw)| parse_feature(&self.path, row_index, col_index, raw))
                .collect::<Result<Vec<f64>, IoError>>()?;
            features.push(row);
        }

        info!(
            n_samples = features.len(),
            n_features = feature_names.len(),
            "feature table loaded"
        );

        Ok(FeatureTable::new(feature_names, features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_features() {
        let csv = "area,slope,elevation\n100.0,0.05,500.0\n200.0,0.10,600.0\n150.0,0.08,550.0\n";
        let f = write_csv(csv);
        let table = FeatureReader::new(f.path()).read().unwrap();
        assert_eq!(table.n_samples(), 3);
        assert_eq!(table.n_features(), 3);
        assert_eq!(table.feature_names(), &["area", "slope", "elevation"]);
        assert!((table.features()[0][0] - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn row_order_preserved() {
        let f = write_csv("x\n3.0\n1.0\n2.0\n");
        let table = FeatureReader::new(f.path()).read().unwrap();
        assert_eq!(table.features(), &[vec![3.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("area,slope\n");
        let err = FeatureReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("area,slope\n100.0,0.05\n200.0\n");
        let err = FeatureReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let f = write_csv("area,slope\n1.0,inf\n");
        let err = FeatureReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::NonFiniteValue { row_index: 0, col_index: 1, .. }
        ));
    }
}
