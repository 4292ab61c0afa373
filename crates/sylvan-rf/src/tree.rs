use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    dataset::{Dataset, Label, Row, majority_label},
    node::{Node, NodeIndex},
    split::{SplitCandidate, get_split},
};

/// Configuration for a single CART decision tree trained on a whole dataset.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter      | Default               |
/// |----------------|-----------------------|
/// | `max_depth`    | 10                    |
/// | `min_size`     | 1                     |
/// | `max_features` | `None` (all features) |
/// | `seed`         | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_size: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 10,
            min_size: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the maximum tree depth (the root split sits at depth 1).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the group size at or below which a branch becomes a leaf.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the number of features to consider at each split.
    ///
    /// `None` means consider all features.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the leaf size threshold.
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Return the maximum features to consider per split, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a decision tree on every row of `dataset` (no bootstrap).
    ///
    /// # Errors
    ///
    /// | Variant                         | When                                            |
    /// |---------------------------------|-------------------------------------------------|
    /// | [`RfError::InvalidMaxDepth`]    | `max_depth` is 0                                |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` resolves outside [1, n_features] |
    #[instrument(skip_all, fields(n_samples = dataset.n_samples()))]
    pub fn fit(&self, dataset: &Dataset) -> Result<DecisionTree, RfError> {
        let max_features = self.max_features.unwrap_or(dataset.n_features());
        let builder = TreeBuilder::new(self.max_depth, self.min_size, max_features)?;
        let rows: Vec<&Row> = dataset.rows().iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        builder.build(&rows, &mut rng)
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Grows one tree from a set of rows with recursive greedy splitting.
///
/// Stopping rules, checked per node:
/// 1. a split that leaves one side empty turns the node into a leaf holding
///    the majority label of all its rows;
/// 2. at `max_depth` both children become leaves;
/// 3. otherwise each side becomes a leaf when it holds at most `min_size`
///    rows or a single label, and is split again when it does not.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    max_depth: usize,
    min_size: usize,
    max_features: usize,
}

impl TreeBuilder {
    /// Create a builder.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxDepth`] when `max_depth` is zero.
    pub fn new(max_depth: usize, min_size: usize, max_features: usize) -> Result<Self, RfError> {
        if max_depth == 0 {
            return Err(RfError::InvalidMaxDepth { max_depth });
        }
        Ok(Self {
            max_depth,
            min_size,
            max_features,
        })
    }

    /// Build a tree from `rows`, drawing split features from `rng`.
    ///
    /// A sample holding a single label yields a one-leaf tree.
    ///
    /// # Errors
    ///
    /// | Variant                         | When                                          |
    /// |---------------------------------|-----------------------------------------------|
    /// | [`RfError::EmptyGroup`]         | `rows` is empty                               |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` is 0 or exceeds the row width  |
    pub fn build(&self, rows: &[&Row], rng: &mut impl Rng) -> Result<DecisionTree, RfError> {
        let first = rows.first().ok_or(RfError::EmptyGroup)?;
        let n_features = first.features().len();
        if self.max_features == 0 || self.max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: self.max_features,
                n_features,
            });
        }

        let mut arena: Vec<Node> = Vec::new();
        if is_single_label(rows) {
            push_leaf(&mut arena, rows)?;
        } else {
            let root = get_split(rows, self.max_features, rng)?;
            self.grow(root, 1, rng, &mut arena)?;
        }

        debug!(
            n_samples = rows.len(),
            n_nodes = arena.len(),
            "decision tree built"
        );

        Ok(DecisionTree {
            nodes: arena,
            n_features,
        })
    }

    /// Turn a split found at `depth` into a node, growing its children.
    ///
    /// Returns the [`NodeIndex`] of the node just created in `arena`.
    fn grow(
        &self,
        split: SplitCandidate<'_>,
        depth: usize,
        rng: &mut impl Rng,
        arena: &mut Vec<Node>,
    ) -> Result<NodeIndex, RfError> {
        if split.left.is_empty() || split.right.is_empty() {
            let mut all = split.left;
            all.extend(split.right);
            return push_leaf(arena, &all);
        }

        // Arena pattern: reserve index, build children, then overwrite with the split.
        let node_idx = arena.len();
        arena.push(Node::Leaf {
            label: split.left[0].label(),
            n_samples: 0,
        });

        let (left, right) = if depth >= self.max_depth {
            (
                push_leaf(arena, &split.left)?,
                push_leaf(arena, &split.right)?,
            )
        } else {
            (
                self.grow_child(&split.left, depth, rng, arena)?,
                self.grow_child(&split.right, depth, rng, arena)?,
            )
        };

        arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity: split.impurity,
            n_samples: split.left.len() + split.right.len(),
        };

        Ok(NodeIndex::new(node_idx))
    }

    fn grow_child(
        &self,
        group: &[&Row],
        depth: usize,
        rng: &mut impl Rng,
        arena: &mut Vec<Node>,
    ) -> Result<NodeIndex, RfError> {
        if group.len() <= self.min_size || is_single_label(group) {
            return push_leaf(arena, group);
        }
        let split = get_split(group, self.max_features, rng)?;
        self.grow(split, depth + 1, rng, arena)
    }
}

fn is_single_label(rows: &[&Row]) -> bool {
    rows.windows(2).all(|w| w[0].label() == w[1].label())
}

fn push_leaf(arena: &mut Vec<Node>, group: &[&Row]) -> Result<NodeIndex, RfError> {
    let label = majority_label(group.iter().map(|r| r.label())).ok_or(RfError::EmptyGroup)?;
    let idx = arena.len();
    arena.push(Node::Leaf {
        label,
        n_samples: group.len(),
    });
    Ok(NodeIndex::new(idx))
}

/// A fitted CART decision tree.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] < threshold`, right otherwise. Values past the
    /// trained feature width are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] when the path reaches a split on
    /// a feature the sample does not have.
    pub fn predict(&self, sample: &[f64]) -> Result<Label, RfError> {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label, .. } => return Ok(*label),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = sample.get(feature.index()).ok_or(RfError::DimensionMismatch {
                        feature: feature.index(),
                        got: sample.len(),
                    })?;
                    idx = if *value < *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Return the node arena; the root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    /// Uses an iterative BFS approach.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        // BFS: (node_index, current_depth)
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Check that the arena describes a tree `predict` can walk.
    ///
    /// Every child sits after its parent and inside the arena, every split
    /// feature is below the trained width, and every leaf label is one of
    /// `classes`. Returns a description of the first violation.
    pub(crate) fn check_arena(&self, classes: &[Label]) -> Result<(), String> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if feature.index() >= self.n_features {
                        return Err(format!(
                            "node {idx} splits on feature {feature} of {}",
                            self.n_features
                        ));
                    }
                    for child in [left, right] {
                        if child.index() <= idx || child.index() >= n_nodes {
                            return Err(format!(
                                "node {idx} links to child {child} in an arena of {n_nodes}"
                            ));
                        }
                    }
                }
                Node::Leaf { label, .. } => {
                    if !classes.contains(label) {
                        return Err(format!("leaf {idx} holds unknown label {label}"));
                    }
                }
            }
        }
        Ok(())
    }
}
