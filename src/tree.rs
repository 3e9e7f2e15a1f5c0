use rand::Rng;

use crate::node::{Node, NodeIndex};
use crate::split::find_best_split;

/// Induction parameters threaded through the recursion, fixed once per fit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BuildParams {
    /// Number of features sampled per split.
    pub(crate) m: usize,
    /// Partitions at or below this size become leaves.
    pub(crate) min_leaf_size: usize,
    /// Maximum leaf height (root = height 1).
    pub(crate) max_height: usize,
    /// Candidate-threshold bound per feature; `None` uses all midpoints.
    pub(crate) max_thresholds: Option<usize>,
    /// Size of the fixed class set.
    pub(crate) n_classes: usize,
}

/// Majority class index of a partition; ties resolve to the lowest class
/// index in the fixed class ordering.
pub(crate) fn majority_class(labels: &[usize], sample_indices: &[usize], n_classes: usize) -> usize {
    let mut votes = vec![0usize; n_classes];
    for &si in sample_indices {
        votes[labels[si]] += 1;
    }
    let mut best = 0usize;
    for (class, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = class;
        }
    }
    best
}

/// Recursively build the arena-based tree for one partition.
///
/// Emits a leaf when the partition is small enough, the height budget is
/// spent, or the labels are pure; otherwise selects a split over a random
/// feature subset and recurses into the strict-`<` left partition and its
/// complement. When no sampled feature admits a valid split the node falls
/// back to a majority leaf.
///
/// Returns the [`NodeIndex`] of the node just created in `arena`.
pub(crate) fn build_tree(
    col_features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    params: &BuildParams,
    height: usize,
    rng: &mut impl Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    debug_assert!(!sample_indices.is_empty(), "empty partitions are rejected upstream");
    let n_samples = sample_indices.len();

    let first = labels[sample_indices[0]];
    let pure = sample_indices.iter().all(|&si| labels[si] == first);

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let class = if pure {
            first
        } else {
            majority_class(labels, sample_indices, params.n_classes)
        };
        let idx = arena.len();
        arena.push(Node::Leaf { class, n_samples });
        NodeIndex::new(idx)
    };

    // Splitting at max_height would place children beyond it, so stop here.
    if n_samples <= params.min_leaf_size || height >= params.max_height || pure {
        return make_leaf(arena);
    }

    let Some(split) = find_best_split(
        col_features,
        labels,
        sample_indices,
        params.n_classes,
        params.m,
        params.max_thresholds,
        rng,
    ) else {
        // Every sampled feature was degenerate for this partition.
        return make_leaf(arena);
    };

    // Arena pattern: reserve the slot, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf { class: 0, n_samples });

    let left = build_tree(
        col_features,
        labels,
        &split.left_indices,
        params,
        height + 1,
        rng,
        arena,
    );
    let right = build_tree(
        col_features,
        labels,
        &split.right_indices,
        params,
        height + 1,
        rng,
        arena,
    );

    arena[node_idx] = Node::Interior {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };

    NodeIndex::new(node_idx)
}

/// A fitted randomized decision tree.
///
/// Stored as an arena `Vec<Node>` with the root at index 0. Prediction is
/// batched: interior nodes derive left/right masks from their parent's mask
/// and write through one shared output buffer, so a batch costs one pass
/// over the active rows per tree level rather than rows × depth copying.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl Tree {
    /// Return the arena. The root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes (both interior and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the tree height: the maximum leaf height with the root at
    /// height 1. A single-leaf tree has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_height = 1usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 1usize));
        while let Some((node_idx, h)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => {
                    if h > max_height {
                        max_height = h;
                    }
                }
                Node::Interior { left, right, .. } => {
                    queue.push_back((left.index(), h + 1));
                    queue.push_back((right.index(), h + 1));
                }
            }
        }
        max_height
    }

    /// Fill `outputs` with class indices at every position where `mask` is
    /// true, leaving the other positions untouched.
    ///
    /// Interior nodes compute `left_mask = mask AND (column < threshold)`
    /// and `right_mask = mask AND NOT (column < threshold)` and delegate to
    /// each child over the same shared buffer; leaves write their constant
    /// class into the masked positions. No row subsets are materialized.
    pub(crate) fn fill_predict(&self, rows: &[&[f64]], outputs: &mut [usize], mask: Vec<bool>) {
        if self.nodes.is_empty() {
            return;
        }
        self.fill_node(NodeIndex::new(0), rows, outputs, mask);
    }

    fn fill_node(&self, node: NodeIndex, rows: &[&[f64]], outputs: &mut [usize], mask: Vec<bool>) {
        match &self.nodes[node.index()] {
            Node::Leaf { class, .. } => {
                for (out, active) in outputs.iter_mut().zip(&mask) {
                    if *active {
                        *out = *class;
                    }
                }
            }
            Node::Interior {
                feature,
                threshold,
                left,
                right,
            } => {
                let feat = feature.index();
                let mut left_mask = vec![false; mask.len()];
                let mut right_mask = vec![false; mask.len()];
                for (i, &active) in mask.iter().enumerate() {
                    if !active {
                        continue;
                    }
                    if rows[i][feat] < *threshold {
                        left_mask[i] = true;
                    } else {
                        right_mask[i] = true;
                    }
                }
                self.fill_node(*left, rows, outputs, left_mask);
                self.fill_node(*right, rows, outputs, right_mask);
            }
        }
    }

    /// Render the tree as indented `if column < threshold:` pseudo-code.
    ///
    /// Display only; uses `feature_names` when given and synthetic `x[i]`
    /// labels otherwise. Leaves render as `predict <code>`.
    pub(crate) fn render(&self, classes: &[i64], feature_names: Option<&[String]>) -> String {
        if self.nodes.is_empty() {
            return String::new();
        }
        self.render_node(NodeIndex::new(0), "", classes, feature_names)
    }

    fn render_node(
        &self,
        node: NodeIndex,
        indent: &str,
        classes: &[i64],
        feature_names: Option<&[String]>,
    ) -> String {
        match &self.nodes[node.index()] {
            Node::Leaf { class, .. } => format!("{indent}predict {}", classes[*class]),
            Node::Interior {
                feature,
                threshold,
                left,
                right,
            } => {
                let name = match feature_names {
                    Some(names) => names[feature.index()].clone(),
                    None => format!("x[{}]", feature.index()),
                };
                let deeper = format!("{indent}  ");
                let left_str = self.render_node(*left, &deeper, classes, feature_names);
                let right_str = self.render_node(*right, &deeper, classes, feature_names);
                format!("{indent}if {name} < {threshold}:\n{left_str}\n{indent}else:\n{right_str}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{BuildParams, Tree, build_tree, majority_class};
    use crate::node::Node;

    fn params(m: usize, min_leaf_size: usize, max_height: usize) -> BuildParams {
        BuildParams {
            m,
            min_leaf_size,
            max_height,
            max_thresholds: None,
            n_classes: 2,
        }
    }

    fn grow(
        col_features: &[Vec<f64>],
        labels: &[usize],
        params: &BuildParams,
        seed: u64,
    ) -> Tree {
        let sample_indices: Vec<usize> = (0..labels.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena = Vec::new();
        build_tree(col_features, labels, &sample_indices, params, 1, &mut rng, &mut arena);
        Tree {
            nodes: arena,
            n_features: col_features.len(),
        }
    }

    #[test]
    fn majority_prefers_plurality_class() {
        let labels = vec![1, 1, 0, 1, 0];
        let indices: Vec<usize> = (0..5).collect();
        assert_eq!(majority_class(&labels, &indices, 2), 1);
    }

    #[test]
    fn majority_tie_resolves_to_lowest_class_index() {
        let labels = vec![1, 0, 1, 0];
        let indices: Vec<usize> = (0..4).collect();
        assert_eq!(majority_class(&labels, &indices, 2), 0);
    }

    #[test]
    fn pure_partition_is_a_single_leaf() {
        let col_features = vec![vec![1.0, 2.0, 3.0]];
        let labels = vec![1, 1, 1];
        let tree = grow(&col_features, &labels, &params(1, 1, 200), 42);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.nodes()[0], Node::Leaf { class: 1, n_samples: 3 });
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn small_partition_becomes_majority_leaf() {
        let col_features = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]];
        let labels = vec![0, 1, 1, 1, 0];
        let tree = grow(&col_features, &labels, &params(1, 10, 200), 42);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.nodes()[0], Node::Leaf { class: 1, n_samples: 5 });
    }

    #[test]
    fn separable_partition_splits_once() {
        let col_features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(&col_features, &labels, &params(1, 1, 200), 42);
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        match &tree.nodes()[0] {
            Node::Interior { feature, threshold, .. } => {
                assert_eq!(feature.index(), 0);
                assert!(*threshold > 3.0 && *threshold < 10.0);
            }
            other => panic!("root should be interior, got {other:?}"),
        }
    }

    #[test]
    fn height_budget_forces_leaves() {
        // Alternating labels force repeated splitting; max_height = 2 leaves
        // room for exactly one split.
        let col_features = vec![(0..16).map(f64::from).collect::<Vec<_>>()];
        let labels: Vec<usize> = (0..16).map(|i| i % 2).collect();
        let tree = grow(&col_features, &labels, &params(1, 1, 2), 42);
        assert!(tree.height() <= 2, "height = {}", tree.height());
    }

    #[test]
    fn degenerate_features_fall_back_to_majority_leaf() {
        // Mixed labels, but every column is constant: no split exists.
        let col_features = vec![vec![5.0; 4], vec![9.0; 4]];
        let labels = vec![0, 1, 1, 1];
        let tree = grow(&col_features, &labels, &params(2, 1, 200), 42);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.nodes()[0], Node::Leaf { class: 1, n_samples: 4 });
    }

    #[test]
    fn fill_predict_writes_every_masked_row_exactly_once() {
        let col_features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(&col_features, &labels, &params(1, 1, 200), 42);

        let rows_owned: Vec<Vec<f64>> =
            vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0], vec![12.0]];
        let rows: Vec<&[f64]> = rows_owned.iter().map(Vec::as_slice).collect();

        // Sentinel: every active position must be overwritten by exactly one leaf.
        let sentinel = usize::MAX;
        let mut outputs = vec![sentinel; rows.len()];
        tree.fill_predict(&rows, &mut outputs, vec![true; rows.len()]);
        assert_eq!(outputs, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn fill_predict_leaves_unmasked_rows_untouched() {
        let col_features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(&col_features, &labels, &params(1, 1, 200), 42);

        let rows_owned: Vec<Vec<f64>> = vec![vec![1.0], vec![12.0], vec![2.0]];
        let rows: Vec<&[f64]> = rows_owned.iter().map(Vec::as_slice).collect();

        let sentinel = usize::MAX;
        let mut outputs = vec![sentinel; 3];
        tree.fill_predict(&rows, &mut outputs, vec![true, false, true]);
        assert_eq!(outputs[0], 0);
        assert_eq!(outputs[1], sentinel, "masked-out row must not be written");
        assert_eq!(outputs[2], 0);
    }

    #[test]
    fn render_uses_synthetic_names_and_class_codes() {
        let col_features = vec![vec![1.0, 2.0, 10.0, 11.0]];
        let labels = vec![0, 0, 1, 1];
        let tree = grow(&col_features, &labels, &params(1, 1, 200), 42);

        let text = tree.render(&[-1, 7], None);
        assert!(text.starts_with("if x[0] < "), "unexpected render: {text}");
        assert!(text.contains("predict -1"), "unexpected render: {text}");
        assert!(text.contains("predict 7"), "unexpected render: {text}");
        assert!(text.contains("else:"), "unexpected render: {text}");
    }
}
