//! Decision-forest classifier inference
//!
//! Loads a pre-trained, JSON-serialized forest together with its feature
//! schema and ranks classes by predicted probability. Training happens
//! offline; this module only scores.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Serialized crop classifier artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct CropModel {
    pub classes: Vec<String>,
    pub features: FeatureSchema,
    pub trees: Vec<Tree>,
}

/// Feature layout the forest was trained on: one-hot encoded categorical
/// features followed by the numeric features, in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSchema {
    pub categorical: Vec<CategoricalFeature>,
    pub numeric: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub categories: Vec<String>,
}

impl FeatureSchema {
    /// Total width of an encoded feature vector.
    pub fn width(&self) -> usize {
        self.categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.numeric.len()
    }

    /// Encode a feature vector from per-feature lookups.
    ///
    /// Categorical values not seen at training time encode as all zeros,
    /// mirroring the training encoder's unknown-handling. A lookup returning
    /// `None` means the input cannot satisfy the schema and is reported as a
    /// schema mismatch.
    pub fn encode(
        &self,
        mut categorical: impl FnMut(&str) -> Option<String>,
        mut numeric: impl FnMut(&str) -> Option<f64>,
    ) -> AppResult<Vec<f64>> {
        let mut vector = Vec::with_capacity(self.width());

        for feature in &self.categorical {
            let value = categorical(&feature.name).ok_or_else(|| {
                AppError::SchemaMismatch(format!("no value for categorical feature '{}'", feature.name))
            })?;
            for category in &feature.categories {
                vector.push(if *category == value { 1.0 } else { 0.0 });
            }
        }

        for name in &self.numeric {
            let value = numeric(name).ok_or_else(|| {
                AppError::SchemaMismatch(format!("no value for numeric feature '{name}'"))
            })?;
            vector.push(value);
        }

        Ok(vector)
    }
}

/// One tree of the forest, nodes stored in a flat arena; node 0 is the root.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probability distribution at this leaf.
        leaf: Vec<f64>,
    },
}

impl CropModel {
    /// Load and structurally validate a serialized model.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        let model: CropModel = serde_json::from_str(&raw)
            .with_context(|| format!("parsing model artifact {}", path.display()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.classes.is_empty(), "model has no classes");
        anyhow::ensure!(!self.trees.is_empty(), "model has no trees");

        let width = self.features.width();
        for (t, tree) in self.trees.iter().enumerate() {
            anyhow::ensure!(!tree.nodes.is_empty(), "tree {t} is empty");
            for node in &tree.nodes {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        anyhow::ensure!(*feature < width, "tree {t}: split feature out of schema");
                        anyhow::ensure!(
                            *left < tree.nodes.len() && *right < tree.nodes.len(),
                            "tree {t}: child index out of bounds"
                        );
                    }
                    TreeNode::Leaf { leaf } => {
                        anyhow::ensure!(
                            leaf.len() == self.classes.len(),
                            "tree {t}: leaf distribution width != class count"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Average the class distributions of all trees for one feature vector.
    pub fn predict_proba(&self, features: &[f64]) -> AppResult<Vec<f64>> {
        let width = self.features.width();
        if features.len() != width {
            return Err(AppError::SchemaMismatch(format!(
                "expected {width} features, got {}",
                features.len()
            )));
        }

        let mut probs = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = walk_tree(tree, features)?;
            for (acc, p) in probs.iter_mut().zip(leaf) {
                *acc += p;
            }
        }

        // Renormalize so the output is a distribution even if leaf
        // distributions drifted from unit sum during export.
        let total: f64 = probs.iter().sum();
        if total > 0.0 {
            for p in &mut probs {
                *p /= total;
            }
        }

        Ok(probs)
    }

    /// Classes ranked by descending predicted probability.
    pub fn ranked_classes(&self, features: &[f64]) -> AppResult<Vec<(String, f64)>> {
        let probs = self.predict_proba(features)?;
        let mut ranked: Vec<(String, f64)> = self
            .classes
            .iter()
            .cloned()
            .zip(probs)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }
}

fn walk_tree<'a>(tree: &'a Tree, features: &[f64]) -> AppResult<&'a [f64]> {
    let mut index = 0;
    // A well-formed tree terminates well before visiting every node once.
    for _ in 0..=tree.nodes.len() {
        match &tree.nodes[index] {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                index = if features[*feature] <= *threshold {
                    *left
                } else {
                    *right
                };
            }
            TreeNode::Leaf { leaf } => return Ok(leaf),
        }
    }
    Err(AppError::Internal("model tree contains a cycle".to_string()))
}

/// Metrics report exported alongside the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub train_samples: u64,
    pub cv_folds: u32,
}

impl ModelMetrics {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading metrics report {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing metrics report {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn tiny_model() -> CropModel {
        let model: CropModel = serde_json::from_str(
            r#"{
                "classes": ["rice", "wheat", "maize"],
                "features": {
                    "categorical": [
                        {"name": "soil_type", "categories": ["alluvial", "black"]}
                    ],
                    "numeric": ["avg_temperature_c"]
                },
                "trees": [
                    {"nodes": [
                        {"feature": 2, "threshold": 20.0, "left": 1, "right": 2},
                        {"leaf": [0.1, 0.8, 0.1]},
                        {"leaf": [0.7, 0.1, 0.2]}
                    ]},
                    {"nodes": [
                        {"feature": 1, "threshold": 0.5, "left": 1, "right": 2},
                        {"leaf": [0.5, 0.3, 0.2]},
                        {"leaf": [0.2, 0.2, 0.6]}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        model.validate().unwrap();
        model
    }

    #[test]
    fn schema_width_counts_one_hot_plus_numeric() {
        assert_eq!(tiny_model().features.width(), 3);
    }

    #[test]
    fn probabilities_form_a_distribution() {
        let model = tiny_model();
        let probs = model.predict_proba(&[1.0, 0.0, 25.0]).unwrap();
        assert_eq!(probs.len(), 3);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn ranking_is_by_descending_probability() {
        let model = tiny_model();
        // Warm alluvial: tree 1 leans rice, tree 2 leans rice too.
        let ranked = model.ranked_classes(&[1.0, 0.0, 25.0]).unwrap();
        assert_eq!(ranked[0].0, "rice");
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn cool_readings_shift_the_ranking() {
        let model = tiny_model();
        let ranked = model.ranked_classes(&[1.0, 0.0, 15.0]).unwrap();
        assert_eq!(ranked[0].0, "wheat");
    }

    #[test]
    fn wrong_vector_width_is_a_schema_mismatch() {
        let model = tiny_model();
        assert!(matches!(
            model.predict_proba(&[1.0, 0.0]),
            Err(AppError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn unknown_category_encodes_as_all_zeros() {
        let model = tiny_model();
        let vector = model
            .features
            .encode(
                |_| Some("laterite".to_string()),
                |_| Some(22.0),
            )
            .unwrap();
        assert_eq!(vector, vec![0.0, 0.0, 22.0]);
    }

    #[test]
    fn missing_feature_value_is_a_schema_mismatch() {
        let model = tiny_model();
        let result = model.features.encode(|_| Some("alluvial".to_string()), |_| None);
        assert!(matches!(result, Err(AppError::SchemaMismatch(_))));
    }

    #[test]
    fn validation_rejects_malformed_trees() {
        let raw = r#"{
            "classes": ["rice"],
            "features": {"categorical": [], "numeric": ["x"]},
            "trees": [{"nodes": [{"feature": 5, "threshold": 1.0, "left": 0, "right": 0}]}]
        }"#;
        let model: CropModel = serde_json::from_str(raw).unwrap();
        assert!(model.validate().is_err());
    }
}
