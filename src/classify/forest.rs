//! JSON-serialized decision forest scoring.
//!
//! The artifact is produced offline; this module only evaluates it. Each
//! tree is a binary split structure whose leaves carry per-class sample
//! counts; class probabilities are leaf counts normalized per tree, then
//! averaged across the forest.

use serde::Deserialize;

pub const FEATURE_COUNT: usize = 4;
const CLASS_COUNT: usize = 2;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        counts: [f64; CLASS_COUNT],
    },
}

#[derive(Debug, Deserialize)]
pub struct ForestModel {
    trees: Vec<Node>,
}

impl ForestModel {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Averaged per-class probabilities, `[p_safe, p_unsafe]`.
    pub fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> [f64; CLASS_COUNT] {
        let mut totals = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            let leaf_counts = walk(tree, features);
            let sum: f64 = leaf_counts.iter().sum();
            if sum > 0.0 {
                for (total, count) in totals.iter_mut().zip(leaf_counts) {
                    *total += count / sum;
                }
            } else {
                for total in totals.iter_mut() {
                    *total += 1.0 / CLASS_COUNT as f64;
                }
            }
        }

        let tree_count = self.trees.len().max(1) as f64;
        totals.map(|total| total / tree_count)
    }

    /// Argmax class label: 0 = safe, 1 = unsafe.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> usize {
        let probabilities = self.predict_proba(features);
        if probabilities[1] > probabilities[0] {
            1
        } else {
            0
        }
    }
}

fn walk<'a>(node: &'a Node, features: &[f64; FEATURE_COUNT]) -> &'a [f64; CLASS_COUNT] {
    match node {
        Node::Leaf { counts } => counts,
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            // Out-of-range feature indices fall to the left branch rather
            // than panicking; the loader validates indices up front.
            let value = features.get(*feature).copied().unwrap_or(f64::MIN);
            if value <= *threshold {
                walk(left, features)
            } else {
                walk(right, features)
            }
        }
    }
}

impl ForestModel {
    /// Check every split references a valid feature index.
    pub fn validate(&self) -> Result<(), String> {
        fn check(node: &Node) -> Result<(), String> {
            match node {
                Node::Leaf { .. } => Ok(()),
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!(
                            "split references feature {feature}, expected < {FEATURE_COUNT}"
                        ));
                    }
                    check(left)?;
                    check(right)
                }
            }
        }

        for tree in &self.trees {
            check(tree)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURE_FOREST: &str = r#"{
        "trees": [
            {
                "feature": 3,
                "threshold": 500.0,
                "left": {"counts": [9.0, 1.0]},
                "right": {"counts": [1.0, 9.0]}
            },
            {
                "feature": 3,
                "threshold": 400.0,
                "left": {"counts": [8.0, 2.0]},
                "right": {"counts": [0.0, 10.0]}
            }
        ]
    }"#;

    #[test]
    fn forest_predicts_majority_class() {
        let forest = ForestModel::from_json(TEXTURE_FOREST).unwrap();
        assert_eq!(forest.predict(&[90.0, 40.0, 200.0, 100.0]), 0);
        assert_eq!(forest.predict(&[90.0, 40.0, 200.0, 900.0]), 1);
    }

    #[test]
    fn probabilities_average_across_trees() {
        let forest = ForestModel::from_json(TEXTURE_FOREST).unwrap();
        let probabilities = forest.predict_proba(&[0.0, 0.0, 0.0, 900.0]);
        // (0.1 + 0.0) / 2 safe, (0.9 + 1.0) / 2 unsafe.
        assert!((probabilities[0] - 0.05).abs() < 1e-9);
        assert!((probabilities[1] - 0.95).abs() < 1e-9);
    }

    #[test]
    fn empty_leaf_counts_fall_back_to_uniform() {
        let forest =
            ForestModel::from_json(r#"{"trees": [{"counts": [0.0, 0.0]}]}"#).unwrap();
        let probabilities = forest.predict_proba(&[0.0; 4]);
        assert_eq!(probabilities, [0.5, 0.5]);
    }

    #[test]
    fn validate_rejects_bad_feature_index() {
        let forest = ForestModel::from_json(
            r#"{"trees": [{"feature": 9, "threshold": 1.0,
                "left": {"counts": [1.0, 0.0]}, "right": {"counts": [0.0, 1.0]}}]}"#,
        )
        .unwrap();
        assert!(forest.validate().is_err());
    }

    #[test]
    fn wrong_shape_is_an_error() {
        assert!(ForestModel::from_json("{\"trees\": [{}]}").is_err());
    }
}
