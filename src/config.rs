//! Configuration builder for randomized tree training.

/// Configuration for a randomized decision tree.
///
/// Construct via [`RandomizedTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter               | Default                          |
/// |-------------------------|----------------------------------|
/// | `num_features_per_node` | `None` (`round(log2(f))`, min 1) |
/// | `min_leaf_size`         | 10                               |
/// | `max_height`            | 200                              |
/// | `max_thresholds`        | `None` (all midpoints)           |
/// | `classes`               | `None` (inferred from labels)    |
/// | `seed`                  | 42                               |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomizedTreeConfig {
    pub(crate) num_features_per_node: Option<usize>,
    pub(crate) min_leaf_size: usize,
    pub(crate) max_height: usize,
    pub(crate) max_thresholds: Option<usize>,
    pub(crate) classes: Option<Vec<i64>>,
    pub(crate) seed: u64,
}

impl RandomizedTreeConfig {
    /// Create a new config with default values.
    ///
    /// All parameters use the defaults shown in the struct-level documentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            num_features_per_node: None,
            min_leaf_size: 10,
            max_height: 200,
            max_thresholds: None,
            classes: None,
            seed: 42,
        }
    }

    // --- Setters ---

    /// Set the number of features sampled at each split.
    ///
    /// `None` means `round(log2(total feature count))`, clamped to at least 1.
    #[must_use]
    pub fn with_num_features_per_node(mut self, num_features_per_node: Option<usize>) -> Self {
        self.num_features_per_node = num_features_per_node;
        self
    }

    /// Set the partition size at or below which a node becomes a leaf.
    #[must_use]
    pub fn with_min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    /// Set the maximum tree height (root = height 1).
    #[must_use]
    pub fn with_max_height(mut self, max_height: usize) -> Self {
        self.max_height = max_height;
        self
    }

    /// Set the per-feature candidate-threshold bound.
    ///
    /// `None` considers every midpoint between unique feature values.
    #[must_use]
    pub fn with_max_thresholds(mut self, max_thresholds: Option<usize>) -> Self {
        self.max_thresholds = max_thresholds;
        self
    }

    /// Set the class set explicitly, fixing its ordering.
    ///
    /// `None` infers the class set as the sorted unique fit-time labels.
    #[must_use]
    pub fn with_classes(mut self, classes: Option<Vec<i64>>) -> Self {
        self.classes = classes;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the configured per-split feature sample size, if set.
    #[must_use]
    pub fn num_features_per_node(&self) -> Option<usize> {
        self.num_features_per_node
    }

    /// Return the minimum leaf size.
    #[must_use]
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }

    /// Return the maximum tree height.
    #[must_use]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Return the candidate-threshold bound, if set.
    #[must_use]
    pub fn max_thresholds(&self) -> Option<usize> {
        self.max_thresholds
    }

    /// Return the explicit class set, if set.
    #[must_use]
    pub fn classes(&self) -> Option<&[i64]> {
        self.classes.as_deref()
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for RandomizedTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
