//! Randomized decision tree classification.
//!
//! Provides a single binary decision tree classifier that inspects only a
//! random subset of the features at each split and compares candidate
//! thresholds by Gini impurity. Prediction is batched: the fitted tree fills
//! a shared output buffer guided by boolean row masks instead of copying row
//! subsets at every interior node.
//!
//! This crate is the single-tree primitive an ensemble builder would call
//! repeatedly; it deliberately does not implement forest aggregation,
//! feature importance, pruning, or regression targets.

mod config;
mod error;
mod impurity;
mod model;
mod node;
mod serialize;
mod split;
mod threshold;
mod tree;

pub use config::RandomizedTreeConfig;
pub use error::TreeError;
pub use impurity::{gini, weighted_split_score};
pub use model::RandomizedTree;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use tree::Tree;
