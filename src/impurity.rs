//! Gini impurity scoring for candidate partitions.

/// Gini impurity from class counts: `1 - Σ (count_c / n)²`.
///
/// Ranges over `[0, 1 - 1/k]` for `k` classes; 0 iff all labels are
/// identical. Defined as 0.0 when `n_samples` is zero so empty partitions
/// never produce a division by zero.
#[must_use]
pub fn gini(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Weighted Gini score of a candidate partition; lower is better.
///
/// `(n_left/n) * gini(left) + (n_right/n) * gini(right)`. An empty side
/// contributes weight 0 and gini 0, so degenerate partitions score as if
/// the side did not exist.
#[must_use]
pub fn weighted_split_score(
    left_counts: &[usize],
    n_left: usize,
    right_counts: &[usize],
    n_right: usize,
) -> f64 {
    let total = n_left + n_right;
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    (n_left as f64 / n) * gini(left_counts, n_left)
        + (n_right as f64 / n) * gini(right_counts, n_right)
}
