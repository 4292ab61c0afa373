use std::collections::HashSet;

use rand::Rng;

use crate::dataset::{Label, Row};
use crate::error::RfError;
use crate::node::{FeatureIndex, Impurity};

/// Weighted Gini impurity of a partition of rows.
///
/// `cost = Σ_g (|g| / total) · (1 − Σ_c p_c²)`, where `p_c` is the fraction
/// of rows in group `g` labeled `c` and `c` ranges over `classes`. Empty
/// groups contribute nothing; a partition with no rows at all scores 0.
#[must_use]
pub fn gini_index(groups: &[&[&Row]], classes: &[Label]) -> f64 {
    let counts: Vec<(Vec<usize>, usize)> = groups
        .iter()
        .map(|group| {
            let mut counts = vec![0usize; classes.len()];
            for row in group.iter() {
                if let Ok(class) = classes.binary_search(&row.label()) {
                    counts[class] += 1;
                }
            }
            (counts, group.len())
        })
        .collect();
    let views: Vec<(&[usize], usize)> = counts.iter().map(|(c, n)| (c.as_slice(), *n)).collect();
    weighted_gini(&views)
}

/// Gini impurity `1 − Σ p_c²` of one group given its class counts.
pub(crate) fn group_impurity(class_counts: &[usize], size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    let n = size as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Size-weighted Gini impurity over `(class_counts, group_size)` pairs.
pub(crate) fn weighted_gini(groups: &[(&[usize], usize)]) -> f64 {
    let total: usize = groups.iter().map(|&(_, n)| n).sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    groups
        .iter()
        .filter(|&&(_, n)| n > 0)
        .map(|&(counts, n)| group_impurity(counts, n) * (n as f64 / total))
        .sum()
}

/// Partition rows on one feature: `value < threshold` goes left, the rest right.
///
/// Row order is preserved within each side.
///
/// # Panics
///
/// Panics if `index` is not a valid feature column for every row.
#[must_use]
pub fn test_split<'a>(index: usize, threshold: f64, rows: &[&'a Row]) -> (Vec<&'a Row>, Vec<&'a Row>) {
    rows.iter().copied().partition(|row| row.feature(index) < threshold)
}

/// The winning split of a group of rows.
#[derive(Debug, Clone)]
pub struct SplitCandidate<'a> {
    /// Feature the split tests.
    pub feature: FeatureIndex,
    /// Threshold value: rows with feature < threshold go left.
    pub threshold: f64,
    /// Weighted Gini impurity of the partition.
    pub impurity: Impurity,
    /// Rows going to the left child.
    pub left: Vec<&'a Row>,
    /// Rows going to the right child.
    pub right: Vec<&'a Row>,
}

/// Find the best split among `n_features` randomly chosen features.
///
/// Features are drawn without replacement on every call. For each chosen
/// feature (in draw order), every row's value (in row order) is tried as a
/// threshold. The candidate with the lowest weighted Gini wins; a later
/// candidate replaces the current best only when it scores strictly lower.
///
/// # Errors
///
/// | Variant                         | When                                         |
/// |---------------------------------|----------------------------------------------|
/// | [`RfError::EmptyGroup`]         | `rows` is empty                              |
/// | [`RfError::InvalidMaxFeatures`] | `n_features` is 0 or exceeds the row width   |
pub fn get_split<'a>(
    rows: &[&'a Row],
    n_features: usize,
    rng: &mut impl Rng,
) -> Result<SplitCandidate<'a>, RfError> {
    let first = rows.first().ok_or(RfError::EmptyGroup)?;
    let width = first.features().len();
    if n_features == 0 || n_features > width {
        return Err(RfError::InvalidMaxFeatures {
            max_features: n_features,
            n_features: width,
        });
    }

    // Dense class ids for this group.
    let mut classes: Vec<Label> = rows.iter().map(|r| r.label()).collect();
    classes.sort_unstable();
    classes.dedup();
    let class_ids: Vec<usize> = rows
        .iter()
        .map(|r| classes.binary_search(&r.label()).unwrap_or_default())
        .collect();

    let selected = sample_features(width, n_features, rng);
    let n_rows = rows.len();
    let mut left_counts = vec![0usize; classes.len()];
    let mut right_counts = vec![0usize; classes.len()];
    let mut best: Option<(usize, f64, f64)> = None;

    for &feature in &selected {
        // A repeated threshold yields an identical partition, which can never
        // score strictly lower than its first occurrence.
        let mut seen: HashSet<u64> = HashSet::with_capacity(n_rows);
        for candidate in rows {
            let threshold = candidate.feature(feature);
            if !seen.insert(threshold.to_bits()) {
                continue;
            }

            left_counts.fill(0);
            right_counts.fill(0);
            let mut n_left = 0usize;
            for (row, &class) in rows.iter().zip(&class_ids) {
                if row.feature(feature) < threshold {
                    left_counts[class] += 1;
                    n_left += 1;
                } else {
                    right_counts[class] += 1;
                }
            }

            let score = weighted_gini(&[
                (left_counts.as_slice(), n_left),
                (right_counts.as_slice(), n_rows - n_left),
            ]);
            if best.is_none_or(|(_, _, best_score)| score < best_score) {
                best = Some((feature, threshold, score));
            }
        }
    }

    let Some((feature, threshold, score)) = best else {
        return Err(RfError::EmptyGroup);
    };
    let (left, right) = test_split(feature, threshold, rows);

    Ok(SplitCandidate {
        feature: FeatureIndex::new(feature),
        threshold,
        impurity: Impurity::new(score),
        left,
        right,
    })
}

/// Draw `take` distinct feature indices from `0..n_features`, in draw order.
fn sample_features(n_features: usize, take: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    // Partial Fisher-Yates: shuffle only the first `take` positions.
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}
