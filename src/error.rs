use std::path::PathBuf;

/// Errors from randomized tree operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the feature name list length differs from the feature count.
    #[error("feature name list has {got} entries for {expected} features")]
    FeatureNameCountMismatch {
        /// The number of feature columns in the dataset.
        expected: usize,
        /// The number of feature names provided.
        got: usize,
    },

    /// Returned when the label vector length differs from the sample count.
    #[error("label vector has {n_labels} entries for {n_samples} samples")]
    LabelCountMismatch {
        /// The number of samples in the dataset.
        n_samples: usize,
        /// The number of labels provided.
        n_labels: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when num_features_per_node resolves to 0 or exceeds n_features.
    #[error("num_features_per_node resolved to {num_features_per_node}, but must be in [1, {n_features}]")]
    InvalidFeaturesPerNode {
        /// The resolved per-split feature sample size.
        num_features_per_node: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when min_leaf_size is zero.
    #[error("min_leaf_size must be at least 1, got {min_leaf_size}")]
    InvalidMinLeafSize {
        /// The invalid min_leaf_size value provided.
        min_leaf_size: usize,
    },

    /// Returned when max_height is zero.
    #[error("max_height must be at least 1, got {max_height}")]
    InvalidMaxHeight {
        /// The invalid max_height value provided.
        max_height: usize,
    },

    /// Returned when max_thresholds is set to zero.
    #[error("max_thresholds must be at least 1 when set, got {max_thresholds}")]
    InvalidMaxThresholds {
        /// The invalid max_thresholds value provided.
        max_thresholds: usize,
    },

    /// Returned when an explicitly supplied class set is empty.
    #[error("explicit class set is empty")]
    EmptyClasses,

    /// Returned when an explicitly supplied class set contains a duplicate code.
    #[error("class {class} appears more than once in the class set")]
    DuplicateClass {
        /// The duplicated class code.
        class: i64,
    },

    /// Returned when a training label is absent from the explicit class set.
    #[error("label {label} at sample {sample_index} is not in the class set")]
    UnknownLabel {
        /// The offending label code.
        label: i64,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the model is used before a successful fit.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when a prediction input row has the wrong number of features.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
