//! Helper functions for tree building.
//!
//! Trees are grown over row indices into the original feature table, so no
//! intermediate matrices are copied while recursing.

use super::{Leaf, Node, TreeNode};
use crate::primitives::Matrix;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

/// Gains at or below this are treated as "no improvement".
const MIN_GAIN: f64 = 1e-12;

/// Candidate split of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Split {
    pub feature_idx: usize,
    pub threshold: f64,
    pub gain: f64,
}

/// Number of rows of each class among `rows`.
pub(super) fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &r in rows {
        counts[y[r]] += 1;
    }
    counts
}

/// Gini impurity `1 - Σ p_i²` of a class histogram.
pub(super) fn gini_impurity(counts: &[usize]) -> f64 {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class of a histogram. Ties go to the lowest class index.
pub(super) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Best threshold on a single feature, scanning midpoints between
/// consecutive distinct values.
fn best_split_for_feature(
    x: &Matrix<f64>,
    y: &[usize],
    rows: &[usize],
    feature_idx: usize,
    parent_counts: &[usize],
    parent_impurity: f64,
) -> Option<Split> {
    let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&r| (x.get(r, feature_idx), y[r])).collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n_total = sorted.len() as f64;
    let mut left = vec![0usize; parent_counts.len()];
    let mut right = parent_counts.to_vec();
    let mut best: Option<Split> = None;

    for i in 0..sorted.len() - 1 {
        let (value, class) = sorted[i];
        left[class] += 1;
        right[class] -= 1;

        let next = sorted[i + 1].0;
        if next <= value {
            continue;
        }

        let n_left = (i + 1) as f64;
        let n_right = n_total - n_left;
        let weighted =
            (n_left * gini_impurity(&left) + n_right * gini_impurity(&right)) / n_total;
        let gain = parent_impurity - weighted;

        if gain > MIN_GAIN && best.map_or(true, |b| gain > b.gain) {
            best = Some(Split {
                feature_idx,
                threshold: (value + next) / 2.0,
                gain,
            });
        }
    }
    best
}

/// Best split of `rows` over the allowed `features`.
///
/// Features are scanned in the given order and a later candidate replaces
/// the current best only on a strictly larger gain.
pub(super) fn find_best_split(
    x: &Matrix<f64>,
    y: &[usize],
    rows: &[usize],
    features: &[usize],
    counts: &[usize],
) -> Option<Split> {
    if rows.len() < 2 {
        return None;
    }
    let impurity = gini_impurity(counts);

    let mut best: Option<Split> = None;
    for &feature_idx in features {
        if let Some(candidate) = best_split_for_feature(x, y, rows, feature_idx, counts, impurity) {
            if best.map_or(true, |b| candidate.gain > b.gain) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Parameters shared by every recursive call of [`build_tree`].
pub(super) struct GrowContext<'a> {
    pub x: &'a Matrix<f64>,
    pub y: &'a [usize],
    pub features: &'a [usize],
    pub n_classes: usize,
    pub max_depth: Option<usize>,
}

/// Grows a CART tree over `rows`.
pub(super) fn build_tree(ctx: &GrowContext<'_>, rows: &[usize], depth: usize) -> TreeNode {
    let counts = class_counts(ctx.y, rows, ctx.n_classes);
    let leaf = || {
        TreeNode::Leaf(Leaf {
            class_label: majority_class(&counts),
            n_samples: rows.len(),
        })
    };

    let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    let at_max_depth = ctx.max_depth.is_some_and(|d| depth >= d);
    if is_pure || at_max_depth {
        return leaf();
    }

    let Some(split) = find_best_split(ctx.x, ctx.y, rows, ctx.features, &counts) else {
        return leaf();
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .partition(|&&r| ctx.x.get(r, split.feature_idx) <= split.threshold);

    TreeNode::Node(Node {
        feature_idx: split.feature_idx,
        threshold: split.threshold,
        impurity_decrease: split.gain * rows.len() as f64,
        left: Box::new(build_tree(ctx, &left_rows, depth + 1)),
        right: Box::new(build_tree(ctx, &right_rows, depth + 1)),
    })
}

/// Draws `n_samples` row indices with replacement.
pub(super) fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    (0..n_samples).map(|_| dist.sample(&mut *rng)).collect()
}

/// Draws `k` distinct feature indices out of `n_features`, in ascending order.
pub(super) fn feature_subspace(n_features: usize, k: usize, rng: &mut StdRng) -> Vec<usize> {
    if k >= n_features {
        return (0..n_features).collect();
    }
    let mut features = rand::seq::index::sample(rng, n_features, k).into_vec();
    features.sort_unstable();
    features
}

/// Adds the weighted impurity decrease of every split to its feature.
pub(super) fn accumulate_importances(node: &TreeNode, importances: &mut [f64]) {
    if let TreeNode::Node(n) = node {
        importances[n.feature_idx] += n.impurity_decrease;
        accumulate_importances(&n.left, importances);
        accumulate_importances(&n.right, importances);
    }
}
