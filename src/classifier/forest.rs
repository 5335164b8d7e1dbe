use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

/// Averaged ensemble of decision trees, exported from the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

/// Flattened tree; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Go `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions) at this leaf.
    Leaf { value: Vec<f64> },
}

impl RandomForest {
    pub fn validate(&self, n_features: usize, n_classes: usize) -> PredictResult<()> {
        if self.trees.is_empty() {
            return Err(PredictError::Model("random forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(PredictError::Model(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= n_features {
                            return Err(PredictError::Model(format!(
                                "tree {t} node {i} splits on feature {feature} of {n_features}"
                            )));
                        }
                        // Children must come after their parent so traversal terminates.
                        if *left <= i || *right <= i || *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(PredictError::Model(format!(
                                "tree {t} node {i} has invalid children ({left}, {right})"
                            )));
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != n_classes {
                            return Err(PredictError::Model(format!(
                                "tree {t} leaf {i} has {} values for {n_classes} classes",
                                value.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Mean over trees of each tree's normalized leaf distribution.
    pub fn predict_proba(&self, x: &[f64], n_classes: usize) -> Vec<f64> {
        let mut acc = vec![0.0; n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x);
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                // Empty leaf votes uniformly.
                acc.iter_mut().for_each(|a| *a += 1.0 / n_classes as f64);
                continue;
            }
            for (a, v) in acc.iter_mut().zip(leaf) {
                *a += v / total;
            }
        }
        let n = self.trees.len() as f64;
        acc.into_iter().map(|a| a / n).collect()
    }
}

impl DecisionTree {
    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}
