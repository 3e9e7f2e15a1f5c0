use rand::Rng;

use crate::impurity::weighted_split_score;
use crate::node::FeatureIndex;
use crate::threshold::{all_thresholds, bounded_thresholds};

/// Result of selecting the best split for a node's partition.
#[derive(Debug, Clone)]
pub(crate) struct BestSplit {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Cutoff value; strict `<` goes left.
    pub(crate) threshold: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Draw `m` distinct feature indices uniformly without replacement.
///
/// Partial Fisher-Yates: shuffles only the first `m` positions instead of
/// permuting all `n_features` and truncating. The result is sorted ascending
/// so that equal split scores resolve to the lowest feature index.
pub(crate) fn sample_features(n_features: usize, m: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = m.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order.sort_unstable();
    order
}

/// Find the best `(feature, threshold)` over a random feature subset.
///
/// For each of `m` sampled features, candidate thresholds come from the
/// threshold generator (all midpoints, or a bounded subset when
/// `max_thresholds` is set). The active rows are sorted by value once per
/// feature and candidates are scored ascending with an incremental class
/// count scan, so the weighted Gini of each partition costs O(classes)
/// after the sort.
///
/// Candidates whose strict `<` partition leaves a side empty are rejected;
/// a feature with no surviving candidate is skipped. Ties break to the
/// lowest feature index, then the lowest threshold, because features and
/// thresholds are visited ascending under a strict `<` score comparison.
///
/// `col_features` is column-major: `col_features[feature_idx][sample_idx]`.
/// `labels` are class indices into the model's fixed class set. Returns
/// `None` when no sampled feature admits a valid split.
pub(crate) fn find_best_split(
    col_features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    m: usize,
    max_thresholds: Option<usize>,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let n_samples = sample_indices.len();
    if n_samples == 0 || col_features.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }

    let selected = sample_features(col_features.len(), m, rng);

    let mut best_score = f64::INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for &feat_idx in &selected {
        let col = &col_features[feat_idx];

        let active: Vec<f64> = sample_indices.iter().map(|&si| col[si]).collect();
        let thresholds = match max_thresholds {
            Some(k) => bounded_thresholds(&active, k),
            None => all_thresholds(&active),
        };
        if thresholds.is_empty() {
            continue;
        }

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (col[si], labels[si]))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // Thresholds are ascending, so one cursor over the sorted values
        // maintains the left-side class counts incrementally.
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();
        let mut cursor = 0usize;

        for &threshold in &thresholds {
            while cursor < n_samples && sorted[cursor].0 < threshold {
                let class = sorted[cursor].1;
                left_counts[class] += 1;
                right_counts[class] -= 1;
                cursor += 1;
            }
            let n_left = cursor;
            let n_right = n_samples - n_left;

            // Reject candidates with an empty child outright.
            if n_left == 0 || n_right == 0 {
                continue;
            }

            let score = weighted_split_score(&left_counts, n_left, &right_counts, n_right);
            if score < best_score {
                best_score = score;
                best = Some((FeatureIndex::new(feat_idx), threshold));
            }
        }
    }

    let (feature, threshold) = best?;

    let col = &col_features[feature.index()];
    let mut left_indices = Vec::with_capacity(n_samples / 2);
    let mut right_indices = Vec::with_capacity(n_samples / 2);
    for &si in sample_indices {
        if col[si] < threshold {
            left_indices.push(si);
        } else {
            right_indices.push(si);
        }
    }

    Some(BestSplit {
        feature,
        threshold,
        left_indices,
        right_indices,
    })
}
