use std::fs;
use std::path::Path;

use log::{error, info};
use serde::{Deserialize, Serialize};

use super::ClassifierBackend;
use crate::error::{ModelLoadError, PredictionError};

const LEAF: i64 = -1;

/// One exported decision tree in scikit-learn's `tree_` array layout.
///
/// Node `i` is a leaf when `children_left[i] == -1`. `value[i]` holds the
/// per-class training counts (or fractions) reaching node `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeExport {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

/// The on-disk forest format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ForestExport {
    n_features: usize,
    n_classes: usize,
    trees: Vec<TreeExport>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Converts an export into a tree, validating its structure.
    ///
    /// Children must come after their parent, which rules out cycles and
    /// guarantees every walk ends at a leaf. Leaf rows are normalized here so
    /// evaluation only has to average.
    fn from_export(
        export: &TreeExport,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, String> {
        let n = export.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if export.children_right.len() != n
            || export.feature.len() != n
            || export.threshold.len() != n
            || export.value.len() != n
        {
            return Err("node arrays have different lengths".into());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (export.children_left[i], export.children_right[i]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", i));
                }
                let leaf = normalize_leaf(&export.value[i], n_classes)
                    .map_err(|e| format!("node {}: {}", i, e))?;
                nodes.push(Node::Leaf(leaf));
                continue;
            }

            let child = |c: i64| -> Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {} has invalid child {}", i, c))
            };
            let feature = usize::try_from(export.feature[i])
                .ok()
                .filter(|&f| f < n_features)
                .ok_or_else(|| {
                    format!("node {} splits on feature {} of {}", i, export.feature[i], n_features)
                })?;
            let threshold = export.threshold[i];
            if !threshold.is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }
        Ok(Self { nodes })
    }

    fn leaf(&self, features: &[f32]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(distribution) => return distribution,
                Node::Split { feature, threshold, left, right } => {
                    idx = if f64::from(features[*feature]) <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn normalize_leaf(row: &[f64], n_classes: usize) -> Result<Vec<f64>, String> {
    if row.len() != n_classes {
        return Err(format!("leaf has {} class values, expected {}", row.len(), n_classes));
    }
    if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err("leaf values must be finite and non-negative".into());
    }
    let total: f64 = row.iter().sum();
    if total <= 0.0 {
        return Err("leaf values sum to zero".into());
    }
    Ok(row.iter().map(|v| v / total).collect())
}

/// A random forest classifier evaluated natively.
///
/// Probabilities are the mean of the per-tree leaf distributions, the same
/// soft voting scikit-learn's `RandomForestClassifier.predict_proba` uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestModel {
    n_features: usize,
    n_classes: usize,
    trees: Vec<Tree>,
}

impl ForestModel {
    /// Builds a forest from exported trees.
    pub fn from_trees(
        n_features: usize,
        n_classes: usize,
        trees: &[TreeExport],
    ) -> Result<Self, ModelLoadError> {
        if n_classes == 0 {
            return Err(ModelLoadError::NoClasses(n_classes));
        }
        if trees.is_empty() {
            return Err(ModelLoadError::NoTrees);
        }
        let trees = trees
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Tree::from_export(t, n_features, n_classes)
                    .map_err(|reason| ModelLoadError::InvalidTree { tree: i, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { n_features, n_classes, trees })
    }

    /// Loads a forest from its JSON export.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| {
            error!("Failed to read model at {:?}: {}", path, source);
            ModelLoadError::Io { path: path.to_path_buf(), source }
        })?;
        let export: ForestExport = serde_json::from_slice(&bytes)
            .map_err(|source| ModelLoadError::Parse { path: path.to_path_buf(), source })?;

        let model = Self::from_trees(export.n_features, export.n_classes, &export.trees)?;
        info!(
            "Loaded random forest from {:?}: {} trees, {} features, {} classes",
            path,
            model.trees.len(),
            model.n_features,
            model.n_classes
        );
        Ok(model)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ClassifierBackend for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn describe(&self) -> String {
        format!("random forest ({} trees)", self.trees.len())
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }
        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probabilities.iter_mut().zip(tree.leaf(features)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n_trees);
        Ok(probabilities)
    }
}
