//! Tree-ensemble and linear regressors
//!
//! Trees are stored as flat node lists in the layout produced by the
//! exporter: node 0 is the root and children always follow their parent.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// A node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Route to `left` when `x[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Check the tree is well formed for inputs of `width` features
    pub fn validate(&self, width: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");

        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(
                        feature < width,
                        "node {} splits on feature {} but the input has {} features",
                        index,
                        feature,
                        width
                    );
                    ensure!(!threshold.is_nan(), "node {} has a NaN threshold", index);
                    for child in [left, right] {
                        ensure!(
                            child > index && child < self.nodes.len(),
                            "node {} points to invalid child {}",
                            index,
                            child
                        );
                    }
                }
                Node::Leaf { value } => {
                    ensure!(value.is_finite(), "leaf {} has a non-finite value", index);
                }
            }
        }
        Ok(())
    }

    /// Walk the tree from the root. Assumes [`DecisionTree::validate`] passed.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Random-forest regressor: the mean of its trees
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(trees: Vec<DecisionTree>, width: usize) -> Result<Self> {
        ensure!(!trees.is_empty(), "forest has no trees");
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(width)
                .map_err(|e| e.context(format!("tree {} is malformed", i)))?;
        }
        Ok(Self { trees })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }
}

/// Linear regressor `w·x + b`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, width: usize) -> Result<Self> {
        ensure!(
            coefficients.len() == width,
            "linear model has {} coefficients, expected {}",
            coefficients.len(),
            width
        );
        ensure!(
            coefficients.iter().all(|c| c.is_finite()) && intercept.is_finite(),
            "linear model has non-finite weights"
        );
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: low },
                Node::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let tree = stump(0, 4000.0, 1.0, 2.0);
        assert_eq!(tree.predict(&[4000.0]), 1.0);
        assert_eq!(tree.predict(&[4000.5]), 2.0);
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest::new(
            vec![stump(0, 10.0, 100.0, 200.0), stump(1, 0.5, 300.0, 600.0)],
            2,
        )
        .unwrap();
        assert_eq!(forest.n_estimators(), 2);
        assert_eq!(forest.predict(&[20.0, 0.0]), 250.0);
        assert_eq!(forest.predict(&[5.0, 1.0]), 350.0);
    }

    #[test]
    fn test_malformed_trees_rejected() {
        assert!(RandomForest::new(vec![], 1).is_err());
        assert!(RandomForest::new(vec![DecisionTree { nodes: vec![] }], 1).is_err());
        // Feature out of range
        assert!(RandomForest::new(vec![stump(3, 1.0, 0.0, 1.0)], 2).is_err());

        // Child pointing backwards would loop forever
        let cyclic = DecisionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(RandomForest::new(vec![cyclic], 1).is_err());

        let dangling = DecisionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 1.0,
                left: 1,
                right: 2,
            }],
        };
        let err = RandomForest::new(vec![dangling], 1).unwrap_err();
        assert!(format!("{:#}", err).contains("tree 0"));
    }

    #[test]
    fn test_node_deserialization() {
        let tree: DecisionTree = serde_json::from_str(
            r#"{"nodes": [
                {"feature": 0, "threshold": 2.5, "left": 1, "right": 2},
                {"value": 10.0},
                {"value": 20.0}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tree, stump(0, 2.5, 10.0, 20.0));
    }

    #[test]
    fn test_linear_model() {
        let model = LinearModel::new(vec![2.0, -1.0], 10.0, 2).unwrap();
        assert_eq!(model.predict(&[3.0, 4.0]), 12.0);
        assert!(LinearModel::new(vec![1.0], 0.0, 2).is_err());
        assert!(LinearModel::new(vec![f64::NAN], 0.0, 1).is_err());
    }
}
