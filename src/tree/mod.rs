//! Decision trees and bagged random forests.
//!
//! This module implements:
//! - CART classification trees split on Gini impurity
//! - A random forest that trains each tree on a bootstrap resample and a
//!   random subset of the features, then combines them by majority vote
//!
//! Every random draw comes from a [`StdRng`] seeded from the forest seed, so
//! fitting twice on the same data with the same seed yields the same forest.
//! Votes are tallied per class index, and a tie goes to the lowest index.
//!
//! # Example
//!
//! ```
//! use vitalis::primitives::Matrix;
//! use vitalis::tree::RandomForestClassifier;
//!
//! let x = Matrix::from_vec(6, 1, vec![0.0, 0.1, 0.2, 0.8, 0.9, 1.0])
//!     .expect("valid matrix");
//! let y = vec![0, 0, 0, 1, 1, 1];
//!
//! let mut rf = RandomForestClassifier::new(10).with_seed(42);
//! rf.fit(&x, &y).expect("fit should succeed");
//!
//! let probe = Matrix::from_vec(2, 1, vec![0.05, 0.95]).expect("valid matrix");
//! assert_eq!(rf.predict(&probe).expect("fitted"), vec![0, 1]);
//! ```

mod helpers;

use crate::error::{Result, VitalisError};
use crate::primitives::Matrix;
use helpers::{
    accumulate_importances, bootstrap_sample, build_tree, feature_subspace, majority_class,
    GrowContext,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Internal node in a decision tree.
///
/// Contains a split condition (feature and threshold) and pointers to
/// left and right subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on, in the column order of the
    /// training table
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f64,
    /// Gini decrease of the split weighted by the rows reaching the node
    pub impurity_decrease: f64,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Predicted class index for this leaf
    pub class_label: usize,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class prediction
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves below this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    fn classify(&self, row: &[f64]) -> usize {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.class_label,
                TreeNode::Node(internal) => {
                    node = if row[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

/// How many features each tree of a forest may split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// `floor(sqrt(n_features))`, so two features give one per tree
    #[default]
    Sqrt,
    /// A fixed number, capped at `n_features`
    Count(usize),
}

impl MaxFeatures {
    /// Number of features to draw out of `n_features` (at least 1).
    #[must_use]
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxFeatures::All => f.write_str("all"),
            MaxFeatures::Sqrt => f.write_str("sqrt"),
            MaxFeatures::Count(k) => write!(f, "{k}"),
        }
    }
}

/// Decision tree classifier using the CART algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    /// Number of features the model was trained on (for validation)
    n_features: Option<usize>,
}

impl DecisionTreeClassifier {
    /// Creates a new decision tree classifier with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Fits the tree on every row and every feature of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is empty or `y` has a different length.
    pub fn fit(&mut self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        validate_training_input(x, y)?;
        let rows: Vec<usize> = (0..x.n_rows()).collect();
        let features: Vec<usize> = (0..x.n_cols()).collect();
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        self.fit_subset(x, y, &rows, &features, n_classes);
        Ok(())
    }

    /// Fits the tree on the given rows (duplicates allowed) restricted to
    /// the given features.
    fn fit_subset(
        &mut self,
        x: &Matrix<f64>,
        y: &[usize],
        rows: &[usize],
        features: &[usize],
        n_classes: usize,
    ) {
        let ctx = GrowContext {
            x,
            y,
            features,
            n_classes,
            max_depth: self.max_depth,
        };
        self.n_features = Some(x.n_cols());
        self.tree = Some(build_tree(&ctx, rows, 0));
    }

    /// Predicted class index for one feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is unfitted or the row has the wrong width.
    pub fn predict_row(&self, row: &[f64]) -> Result<usize> {
        let tree = self.tree.as_ref().ok_or_else(not_fitted)?;
        check_width(self.n_features, row.len())?;
        Ok(tree.classify(row))
    }

    /// Predicted class index for each row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is unfitted or `x` has the wrong width.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<usize>> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Root of the fitted tree.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Depth of the fitted tree.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(TreeNode::depth)
    }
}

/// Random Forest classifier - an ensemble of decision trees.
///
/// Tree `i` draws its bootstrap resample and its feature subset from a
/// [`StdRng`] seeded with `seed + i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: MaxFeatures,
    seed: u64,
    n_classes: usize,
    n_features: usize,
}

impl RandomForestClassifier {
    /// Creates a new Random Forest classifier.
    ///
    /// # Arguments
    ///
    /// * `n_estimators` - Number of trees in the forest
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::default(),
            seed: 0,
            n_classes: 0,
            n_features: 0,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the per-tree feature subset size.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Sets the seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Declares the number of classes, so that probability rows cover
    /// classes absent from the training subset.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// Fits the random forest to training data.
    ///
    /// # Errors
    ///
    /// - [`VitalisError::InvalidHyperparameter`] for zero trees or a zero depth
    /// - [`VitalisError::InsufficientData`] for an empty table
    /// - [`VitalisError::DimensionMismatch`] if `x` and `y` disagree in length
    pub fn fit(&mut self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(VitalisError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(VitalisError::InvalidHyperparameter {
                param: "max_depth".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        validate_training_input(x, y)?;

        let (n_samples, n_features) = x.shape();
        let n_classes = y.iter().max().map_or(0, |m| m + 1).max(self.n_classes);
        let k = self.max_features.resolve(n_features);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
            let rows = bootstrap_sample(n_samples, &mut rng);
            let features = feature_subspace(n_features, k, &mut rng);

            let mut tree = DecisionTreeClassifier {
                max_depth: self.max_depth,
                ..DecisionTreeClassifier::default()
            };
            tree.fit_subset(x, y, &rows, &features, n_classes);
            trees.push(tree);
        }

        debug!(
            n_trees = trees.len(),
            n_samples,
            n_features,
            features_per_tree = k,
            "fitted random forest"
        );
        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = n_features;
        Ok(())
    }

    /// Vote count of each class for one feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or the row has the wrong width.
    pub fn votes(&self, row: &[f64]) -> Result<Vec<usize>> {
        if self.trees.is_empty() {
            return Err(not_fitted());
        }
        let mut votes = vec![0; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict_row(row)?] += 1;
        }
        Ok(votes)
    }

    /// Majority-vote class index for one feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or the row has the wrong width.
    pub fn predict_row(&self, row: &[f64]) -> Result<usize> {
        Ok(majority_class(&self.votes(row)?))
    }

    /// Makes predictions for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or `x` has the wrong width.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<usize>> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Share of trees voting for each class, for one feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or the row has the wrong width.
    pub fn predict_proba_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        let n_trees = self.trees.len() as f64;
        Ok(self
            .votes(row)?
            .into_iter()
            .map(|v| v as f64 / n_trees)
            .collect())
    }

    /// Predict class probabilities for input features.
    ///
    /// # Returns
    ///
    /// `Matrix<f64>` with shape `(n_samples, n_classes)` where each row
    /// sums to 1.0.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or `x` has the wrong width.
    pub fn predict_proba(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let mut data = Vec::with_capacity(x.n_rows() * self.n_classes);
        for row in x.rows() {
            data.extend(self.predict_proba_row(row)?);
        }
        Matrix::from_vec(x.n_rows(), self.n_classes, data)
    }

    /// Returns feature importances based on mean decrease in impurity.
    ///
    /// Each split credits its feature with the Gini decrease it achieved,
    /// weighted by the rows reaching it. Totals are normalized to sum to 1.0.
    ///
    /// # Returns
    ///
    /// `None` if the forest is unfitted. All zeros if no tree ever split.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }

        let mut totals = vec![0.0; self.n_features];
        for root in self.trees.iter().filter_map(DecisionTreeClassifier::root) {
            accumulate_importances(root, &mut totals);
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for importance in &mut totals {
                *importance /= sum;
            }
        }
        Some(totals)
    }

    /// The fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    /// Number of trees requested.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Number of classes the forest votes over.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Width of the training table.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// True once [`fit`](Self::fit) has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

fn validate_training_input(x: &Matrix<f64>, y: &[usize]) -> Result<()> {
    if x.n_rows() == 0 || x.n_cols() == 0 {
        return Err(VitalisError::insufficient("cannot fit on an empty table"));
    }
    if x.n_rows() != y.len() {
        return Err(VitalisError::DimensionMismatch {
            expected: format!("{} labels", x.n_rows()),
            actual: format!("{} labels", y.len()),
        });
    }
    Ok(())
}

fn check_width(expected: Option<usize>, actual: usize) -> Result<()> {
    match expected {
        Some(n) if n != actual => Err(VitalisError::DimensionMismatch {
            expected: format!("{n} features"),
            actual: format!("{actual} features"),
        }),
        _ => Ok(()),
    }
}

fn not_fitted() -> VitalisError {
    VitalisError::insufficient("model has not been fitted")
}
