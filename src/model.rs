//! Model orchestration: fit, batched prediction, text rendering.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::config::RandomizedTreeConfig;
use crate::error::TreeError;
use crate::node::Node;
use crate::tree::{BuildParams, Tree, build_tree};

/// State produced by a successful fit, replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub(crate) struct FittedState {
    pub(crate) tree: Tree,
    /// The fixed, ordered class set; leaf class indices point into it.
    pub(crate) classes: Vec<i64>,
    pub(crate) feature_names: Option<Vec<String>>,
}

/// A randomized decision tree classifier.
///
/// At each split only a random subset of the features is inspected, and
/// candidate thresholds are compared by weighted Gini impurity. This is the
/// single-tree primitive an ensemble builder calls repeatedly; training is
/// deterministic given the configured seed and inputs.
///
/// `fit` constructs (or replaces) the tree; `predict` runs the batched,
/// mask-driven traversal over the fitted tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomizedTree {
    pub(crate) config: RandomizedTreeConfig,
    pub(crate) fitted: Option<FittedState>,
}

impl RandomizedTree {
    /// Create an unfitted model from a configuration.
    #[must_use]
    pub fn new(config: RandomizedTreeConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomizedTreeConfig {
        &self.config
    }

    /// Return `true` once a fit has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the fitted tree, if any.
    #[must_use]
    pub fn tree(&self) -> Option<&Tree> {
        self.fitted.as_ref().map(|f| &f.tree)
    }

    /// Return the fixed class set, if fitted.
    #[must_use]
    pub fn classes(&self) -> Option<&[i64]> {
        self.fitted.as_ref().map(|f| f.classes.as_slice())
    }

    /// Train the tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `labels[sample_idx]` — categorical class codes.
    /// `feature_names` — optional column names, kept for display only.
    ///
    /// Any previously fitted tree is replaced wholesale.
    ///
    /// # Errors
    ///
    /// | Variant                                 | When                                            |
    /// |-----------------------------------------|-------------------------------------------------|
    /// | [`TreeError::EmptyDataset`]             | `features` is empty                             |
    /// | [`TreeError::ZeroFeatures`]             | rows have zero feature columns                  |
    /// | [`TreeError::FeatureCountMismatch`]     | rows have inconsistent lengths                  |
    /// | [`TreeError::NonFiniteValue`]           | any value is NaN or infinite                    |
    /// | [`TreeError::LabelCountMismatch`]       | label count differs from row count              |
    /// | [`TreeError::FeatureNameCountMismatch`] | feature name count differs from column count    |
    /// | [`TreeError::InvalidMinLeafSize`]       | `min_leaf_size` is 0                            |
    /// | [`TreeError::InvalidMaxHeight`]         | `max_height` is 0                               |
    /// | [`TreeError::InvalidMaxThresholds`]     | `max_thresholds` is `Some(0)`                   |
    /// | [`TreeError::InvalidFeaturesPerNode`]   | resolved `m` is outside `[1, n_features]`       |
    /// | [`TreeError::EmptyClasses`]             | explicit class set is empty                     |
    /// | [`TreeError::DuplicateClass`]           | explicit class set repeats a code               |
    /// | [`TreeError::UnknownLabel`]             | a label is absent from the explicit class set   |
    #[instrument(skip(self, features, labels, feature_names), fields(n_samples = features.len()))]
    pub fn fit(
        &mut self,
        features: &[Vec<f64>],
        labels: &[i64],
        feature_names: Option<&[String]>,
    ) -> Result<(), TreeError> {
        // --- Validate inputs ---
        if features.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        let n_samples = features.len();
        let n_features = features[0].len();

        if n_features == 0 {
            return Err(TreeError::ZeroFeatures);
        }

        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(TreeError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(TreeError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
            }
        }

        if labels.len() != n_samples {
            return Err(TreeError::LabelCountMismatch {
                n_samples,
                n_labels: labels.len(),
            });
        }

        if let Some(names) = feature_names
            && names.len() != n_features
        {
            return Err(TreeError::FeatureNameCountMismatch {
                expected: n_features,
                got: names.len(),
            });
        }

        // --- Validate config ---
        if self.config.min_leaf_size == 0 {
            return Err(TreeError::InvalidMinLeafSize { min_leaf_size: 0 });
        }
        if self.config.max_height == 0 {
            return Err(TreeError::InvalidMaxHeight { max_height: 0 });
        }
        if let Some(k) = self.config.max_thresholds
            && k == 0
        {
            return Err(TreeError::InvalidMaxThresholds { max_thresholds: 0 });
        }

        // --- Fix the class set for the lifetime of this fit ---
        let classes: Vec<i64> = match &self.config.classes {
            Some(classes) => {
                if classes.is_empty() {
                    return Err(TreeError::EmptyClasses);
                }
                let mut sorted = classes.clone();
                sorted.sort_unstable();
                if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
                    return Err(TreeError::DuplicateClass { class: w[0] });
                }
                classes.clone()
            }
            None => {
                let mut unique = labels.to_vec();
                unique.sort_unstable();
                unique.dedup();
                unique
            }
        };

        // Encode labels once as indices into the fixed class ordering; all
        // counting during induction works on indices.
        let class_index: HashMap<i64, usize> = classes
            .iter()
            .enumerate()
            .map(|(idx, &c)| (c, idx))
            .collect();
        let mut encoded = Vec::with_capacity(n_samples);
        for (sample_index, &label) in labels.iter().enumerate() {
            match class_index.get(&label) {
                Some(&idx) => encoded.push(idx),
                None => {
                    return Err(TreeError::UnknownLabel {
                        label,
                        sample_index,
                    });
                }
            }
        }

        // --- Derived values ---
        let m = match self.config.num_features_per_node {
            Some(m) => m,
            None => ((n_features as f64).log2().round() as usize).max(1),
        };
        if m == 0 || m > n_features {
            return Err(TreeError::InvalidFeaturesPerNode {
                num_features_per_node: m,
                n_features,
            });
        }

        debug!(
            n_samples,
            n_features,
            n_classes = classes.len(),
            m,
            "fitting randomized tree"
        );

        // Column-major so threshold search reads contiguous columns.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let sample_indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut arena: Vec<Node> = Vec::new();
        let params = BuildParams {
            m,
            min_leaf_size: self.config.min_leaf_size,
            max_height: self.config.max_height,
            max_thresholds: self.config.max_thresholds,
            n_classes: classes.len(),
        };

        build_tree(
            &col_features,
            &encoded,
            &sample_indices,
            &params,
            1,
            &mut rng,
            &mut arena,
        );

        let tree = Tree {
            nodes: arena,
            n_features,
        };

        debug!(
            n_nodes = tree.n_nodes(),
            n_leaves = tree.n_leaves(),
            height = tree.height(),
            "tree built"
        );

        self.fitted = Some(FittedState {
            tree,
            classes,
            feature_names: feature_names.map(<[String]>::to_vec),
        });

        Ok(())
    }

    /// Predict class codes for a batch of rows.
    ///
    /// Allocates one output buffer and an all-true mask, then lets the tree
    /// fill the buffer recursively; rows are never copied into per-node
    /// subsets.
    ///
    /// Unlike `fit`, values are not checked for finiteness: a NaN fails the
    /// strict `<` test at every split it reaches and routes right.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFitted`] before a successful fit, and
    /// [`TreeError::PredictionFeatureMismatch`] when any row's length
    /// differs from the training feature count.
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<i64>, TreeError> {
        let fitted = self.fitted.as_ref().ok_or(TreeError::NotFitted)?;

        for row in features {
            if row.len() != fitted.tree.n_features {
                return Err(TreeError::PredictionFeatureMismatch {
                    expected: fitted.tree.n_features,
                    got: row.len(),
                });
            }
        }

        let rows: Vec<&[f64]> = features.iter().map(Vec::as_slice).collect();
        let mut outputs = vec![0usize; rows.len()];
        let mask = vec![true; rows.len()];
        fitted.tree.fill_predict(&rows, &mut outputs, mask);

        Ok(outputs.into_iter().map(|idx| fitted.classes[idx]).collect())
    }

    /// Predict the class code for a single row.
    ///
    /// This is the one-row, one-hot-mask special case of [`predict`], not a
    /// separate traversal; NaN values route right the same way.
    ///
    /// [`predict`]: RandomizedTree::predict
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFitted`] before a successful fit, and
    /// [`TreeError::PredictionFeatureMismatch`] on a wrong row length.
    pub fn predict_row(&self, row: &[f64]) -> Result<i64, TreeError> {
        let fitted = self.fitted.as_ref().ok_or(TreeError::NotFitted)?;

        if row.len() != fitted.tree.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: fitted.tree.n_features,
                got: row.len(),
            });
        }

        let mut outputs = [0usize];
        fitted.tree.fill_predict(&[row], &mut outputs, vec![true]);
        Ok(fitted.classes[outputs[0]])
    }

    /// Render the fitted tree as indented `if column < threshold:` text.
    ///
    /// Uses the feature names given to `fit` when present, synthetic `x[i]`
    /// labels otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFitted`] before a successful fit.
    pub fn to_text(&self) -> Result<String, TreeError> {
        let fitted = self.fitted.as_ref().ok_or(TreeError::NotFitted)?;
        Ok(fitted
            .tree
            .render(&fitted.classes, fitted.feature_names.as_deref()))
    }
}

impl Default for RandomizedTree {
    fn default() -> Self {
        Self::new(RandomizedTreeConfig::new())
    }
}

#[cfg(test)]
mod tests {
    use super::RandomizedTree;
    use crate::config::RandomizedTreeConfig;
    use crate::error::TreeError;

    fn separable() -> (Vec<Vec<f64>>, Vec<i64>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        (features, labels)
    }

    fn overfit_config() -> RandomizedTreeConfig {
        RandomizedTreeConfig::new()
            .with_min_leaf_size(1)
            .with_num_features_per_node(Some(2))
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = RandomizedTree::default();
        let err = model.predict(&[vec![1.0]]).unwrap_err();
        assert!(matches!(err, TreeError::NotFitted));
    }

    #[test]
    fn empty_dataset_error() {
        let mut model = RandomizedTree::default();
        let err = model.fit(&[], &[], None).unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));
    }

    #[test]
    fn label_count_mismatch_error() {
        let mut model = RandomizedTree::default();
        let err = model
            .fit(&[vec![1.0], vec![2.0]], &[0], None)
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::LabelCountMismatch { n_samples: 2, n_labels: 1 }
        ));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let mut model = RandomizedTree::default();
        let err = model
            .fit(&[vec![1.0, 2.0], vec![3.0]], &[0, 1], None)
            .unwrap_err();
        assert!(matches!(err, TreeError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let mut model = RandomizedTree::default();
        let err = model
            .fit(&[vec![1.0, f64::NAN], vec![3.0, 4.0]], &[0, 1], None)
            .unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteValue { .. }));
    }

    #[test]
    fn feature_name_count_mismatch_error() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        let names = vec!["age".to_string()];
        let err = model.fit(&features, &labels, Some(&names)).unwrap_err();
        assert!(matches!(
            err,
            TreeError::FeatureNameCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn too_many_features_per_node_error() {
        let config = RandomizedTreeConfig::new().with_num_features_per_node(Some(5));
        let mut model = RandomizedTree::new(config);
        let (features, labels) = separable();
        let err = model.fit(&features, &labels, None).unwrap_err();
        assert!(matches!(
            err,
            TreeError::InvalidFeaturesPerNode { num_features_per_node: 5, n_features: 2 }
        ));
    }

    #[test]
    fn unknown_label_with_explicit_classes_error() {
        let config = RandomizedTreeConfig::new().with_classes(Some(vec![0, 1]));
        let mut model = RandomizedTree::new(config);
        let err = model
            .fit(&[vec![1.0], vec![2.0]], &[0, 9], None)
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::UnknownLabel { label: 9, sample_index: 1 }
        ));
    }

    #[test]
    fn duplicate_class_error() {
        let config = RandomizedTreeConfig::new().with_classes(Some(vec![0, 1, 0]));
        let mut model = RandomizedTree::new(config);
        let err = model.fit(&[vec![1.0]], &[0], None).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateClass { class: 0 }));
    }

    #[test]
    fn fit_then_predict_separable() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        model.fit(&features, &labels, None).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.predict(&features).unwrap(), labels);
    }

    #[test]
    fn class_codes_survive_round_trip() {
        // Non-contiguous codes exercise the encode/decode path.
        let mut model = RandomizedTree::new(overfit_config());
        let (features, _) = separable();
        let labels = vec![-5, -5, -5, 99, 99, 99];
        model.fit(&features, &labels, None).unwrap();
        assert_eq!(model.classes().unwrap(), &[-5, 99]);
        assert_eq!(model.predict(&features).unwrap(), labels);
        assert_eq!(model.predict_row(&[2.5, 0.0]).unwrap(), -5);
    }

    #[test]
    fn prediction_feature_mismatch_error() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        model.fit(&features, &labels, None).unwrap();
        let err = model.predict(&[vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn predict_empty_batch_is_empty() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        model.fit(&features, &labels, None).unwrap();
        assert_eq!(model.predict(&[]).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn refit_replaces_the_tree() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        model.fit(&features, &labels, None).unwrap();
        let first = model.tree().unwrap().clone();

        let flipped: Vec<i64> = labels.iter().map(|&l| 1 - l).collect();
        model.fit(&features, &flipped, None).unwrap();
        assert_ne!(model.tree().unwrap(), &first);
        assert_eq!(model.predict(&features).unwrap(), flipped);
    }

    #[test]
    fn nan_prediction_values_route_right() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        model.fit(&features, &labels, None).unwrap();

        // The fitted tree splits feature 0 between 3.0 and 10.0; a NaN
        // fails the strict `<` test and lands in the right (class 1) leaf.
        assert_eq!(model.predict_row(&[f64::NAN, 0.0]).unwrap(), 1);
        assert_eq!(
            model.predict(&[vec![f64::NAN, 0.0], vec![1.0, 0.0]]).unwrap(),
            vec![1, 0]
        );
    }

    #[test]
    fn to_text_uses_feature_names() {
        let mut model = RandomizedTree::new(overfit_config());
        let (features, labels) = separable();
        let names = vec!["age".to_string(), "height".to_string()];
        model.fit(&features, &labels, Some(&names)).unwrap();
        let text = model.to_text().unwrap();
        assert!(text.contains("if age < "), "unexpected render: {text}");
    }
}
