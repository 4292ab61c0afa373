//! Model files: a bincode-encoded forest behind a small checked header.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::dataset::Label;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Binary layout revision written by [`RandomForest::save`].
const FORMAT_VERSION: u32 = 1;

/// On-disk layout: a header that summarizes the forest, then the forest.
///
/// `load` cross-checks the header against the decoded trees.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelFile {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    classes: Vec<Label>,
    forest: RandomForest,
}

impl ModelFile {
    fn wrap(forest: &RandomForest) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            n_trees: forest.trees.len(),
            n_features: forest.n_features,
            classes: forest.classes.clone(),
            forest: forest.clone(),
        }
    }

    /// Return the first inconsistency between the header and the forest.
    fn inconsistency(&self) -> Option<String> {
        let forest = &self.forest;
        if forest.trees.is_empty() {
            return Some("forest holds no trees".to_string());
        }
        if self.n_trees != forest.trees.len() {
            return Some(format!(
                "header lists {} trees, forest holds {}",
                self.n_trees,
                forest.trees.len()
            ));
        }
        if self.n_features != forest.n_features {
            return Some(format!(
                "header lists {} features, forest was trained on {}",
                self.n_features, forest.n_features
            ));
        }
        if self.classes != forest.classes {
            return Some("header label domain differs from the forest's".to_string());
        }
        if forest.classes.is_empty() {
            return Some("forest has an empty label domain".to_string());
        }

        forest.trees.iter().enumerate().find_map(|(t, tree)| {
            if tree.n_features != forest.n_features {
                return Some(format!(
                    "tree {t} was trained on {} features, forest on {}",
                    tree.n_features, forest.n_features
                ));
            }
            tree.check_arena(&forest.classes)
                .err()
                .map(|reason| format!("tree {t}: {reason}"))
        })
    }
}

impl RandomForest {
    /// Write the forest to `path`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let bytes = bincode::serialize(&ModelFile::wrap(self))
            .map_err(|source| RfError::SerializeModel { source })?;

        std::fs::write(path, &bytes).map_err(|source| RfError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;

        info!(size_bytes = bytes.len(), n_trees = self.n_trees(), "model saved");
        Ok(())
    }

    /// Read a forest written by [`RandomForest::save`].
    ///
    /// Besides the format version, every tree is checked so that a loaded
    /// forest can always be walked by `predict`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`RfError::CorruptModel`] | header and trees disagree, or a tree arena is malformed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RfError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;

        let file: ModelFile =
            bincode::deserialize(&bytes).map_err(|source| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;

        if file.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: file.format_version,
                path: path.to_path_buf(),
            });
        }

        if let Some(reason) = file.inconsistency() {
            warn!(%reason, "rejecting model");
            return Err(RfError::CorruptModel {
                path: path.to_path_buf(),
                reason,
            });
        }

        debug!(
            n_trees = file.n_trees,
            n_features = file.n_features,
            n_classes = file.classes.len(),
            "model loaded"
        );
        Ok(file.forest)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::config::RandomForestConfig;
    use crate::dataset::Dataset;
    use crate::node::{FeatureIndex, Impurity, Node, NodeIndex};
    use crate::tree::DecisionTree;

    fn train_simple_model() -> RandomForest {
        let ds = Dataset::from_labeled_rows(&[
            vec![1.0, 0.0, 0.0],
            vec![2.0, 0.0, 0.0],
            vec![3.0, 0.0, 0.0],
            vec![10.0, 0.0, 1.0],
            vec![11.0, 0.0, 1.0],
            vec![12.0, 0.0, 1.0],
        ])
        .unwrap();
        RandomForestConfig::new(5)
            .unwrap()
            .with_seed(42)
            .fit(&ds)
            .unwrap()
    }

    fn one_tree_forest(nodes: Vec<Node>) -> RandomForest {
        RandomForest {
            trees: vec![DecisionTree { nodes, n_features: 2 }],
            n_features: 2,
            classes: vec![Label::new(0), Label::new(1)],
        }
    }

    fn write_file(dir: &TempDir, file: &ModelFile) -> PathBuf {
        let path = dir.path().join("model.bin");
        std::fs::write(&path, bincode::serialize(file).unwrap()).unwrap();
        path
    }

    fn corrupt_reason(path: &Path) -> String {
        match RandomForest::load(path) {
            Err(RfError::CorruptModel { reason, .. }) => reason,
            other => panic!("expected CorruptModel, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("test_model.bin");

        let forest = train_simple_model();
        forest.save(&model_path).unwrap();
        let loaded = RandomForest::load(&model_path).unwrap();

        assert_eq!(loaded.n_trees(), forest.n_trees());
        assert_eq!(loaded.classes(), forest.classes());

        for sample in [vec![1.5, 0.0], vec![11.0, 0.0], vec![5.0, 0.0]] {
            assert_eq!(
                forest.bagging_predict(&sample).unwrap(),
                loaded.bagging_predict(&sample).unwrap(),
                "predictions differ for sample {sample:?}"
            );
            assert_eq!(
                forest.vote_distribution(&sample).unwrap().as_slice(),
                loaded.vote_distribution(&sample).unwrap().as_slice()
            );
        }
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, RfError::ReadModel { .. }));
    }

    #[test]
    fn load_undecodable_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a model file").unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, RfError::DeserializeModel { .. }));
    }

    #[test]
    fn load_wrong_version_error() {
        let dir = TempDir::new().unwrap();
        let mut file = ModelFile::wrap(&train_simple_model());
        file.format_version = 99;
        let path = write_file(&dir, &file);

        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            RfError::IncompatibleModelVersion { expected: 1, found: 99, .. }
        ));
    }

    #[test]
    fn load_rejects_empty_tree() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, &ModelFile::wrap(&one_tree_forest(vec![])));
        assert!(corrupt_reason(&path).contains("no nodes"));
    }

    #[test]
    fn load_rejects_dangling_child() {
        let dir = TempDir::new().unwrap();
        let split = Node::Split {
            feature: FeatureIndex::new(0),
            threshold: 0.5,
            left: NodeIndex::new(7),
            right: NodeIndex::new(8),
            impurity: Impurity::new(0.0),
            n_samples: 2,
        };
        let path = write_file(&dir, &ModelFile::wrap(&one_tree_forest(vec![split])));
        assert!(corrupt_reason(&path).contains("child 7"));
    }

    #[test]
    fn load_rejects_unknown_leaf_label() {
        let dir = TempDir::new().unwrap();
        let leaf = Node::Leaf {
            label: Label::new(9),
            n_samples: 1,
        };
        let path = write_file(&dir, &ModelFile::wrap(&one_tree_forest(vec![leaf])));
        assert!(corrupt_reason(&path).contains("label 9"));
    }

    #[test]
    fn load_rejects_forest_without_trees() {
        let dir = TempDir::new().unwrap();
        let mut forest = train_simple_model();
        forest.trees.clear();
        let path = write_file(&dir, &ModelFile::wrap(&forest));
        assert!(corrupt_reason(&path).contains("no trees"));
    }

    #[test]
    fn load_rejects_header_mismatch() {
        let dir = TempDir::new().unwrap();
        let forest = train_simple_model();

        let mut file = ModelFile::wrap(&forest);
        file.n_trees += 1;
        let path = write_file(&dir, &file);
        assert!(corrupt_reason(&path).contains("trees"));

        let mut file = ModelFile::wrap(&forest);
        file.n_features = 7;
        let path = write_file(&dir, &file);
        assert!(corrupt_reason(&path).contains("features"));

        let mut file = ModelFile::wrap(&forest);
        file.classes.push(Label::new(4));
        let path = write_file(&dir, &file);
        assert!(corrupt_reason(&path).contains("label domain"));
    }

    #[test]
    fn load_rejects_tree_width_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut forest = train_simple_model();
        forest.trees[0].n_features = 1;
        let path = write_file(&dir, &ModelFile::wrap(&forest));
        assert!(corrupt_reason(&path).contains("tree 0"));
    }
}
