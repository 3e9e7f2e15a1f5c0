//! Candidate split thresholds for a single feature column.

/// Sorted, deduplicated values of a column.
fn unique_sorted(column: &[f64]) -> Vec<f64> {
    let mut vals = column.to_vec();
    vals.sort_unstable_by(|a, b| a.total_cmp(b));
    vals.dedup();
    vals
}

/// Evenly spaced points from `start` to `stop`.
///
/// With `include_end` this matches inclusive linear spacing (`num == 1`
/// yields `[start]`); without it the spacing is `(stop - start) / num` and
/// `stop` is never emitted.
fn linspace(start: f64, stop: f64, num: usize, include_end: bool) -> Vec<f64> {
    if num == 0 {
        return Vec::new();
    }
    if num == 1 {
        return vec![start];
    }
    let div = if include_end { (num - 1) as f64 } else { num as f64 };
    let step = (stop - start) / div;
    (0..num).map(|i| start + step * i as f64).collect()
}

/// All midpoints between consecutive unique values of `column`.
///
/// A column with at most one unique value has no usable cutoff; its unique
/// values are returned unchanged and the split selector rejects them via the
/// empty-child check.
pub(crate) fn all_thresholds(column: &[f64]) -> Vec<f64> {
    let unique = unique_sorted(column);
    if unique.len() <= 1 {
        return unique;
    }
    unique.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// At most `k` candidate thresholds for a high-cardinality column.
///
/// Delegates to [`all_thresholds`] when the column has at most `k` unique
/// values. Otherwise generates `ceil(k/2)` evenly spaced points on
/// `[min, median)` — dropping the first so the minimum never becomes a
/// cutoff — concatenated with `ceil(k/2)` points on `[median, max]`.
/// Output is ascending.
pub(crate) fn bounded_thresholds(column: &[f64], k: usize) -> Vec<f64> {
    let unique = unique_sorted(column);
    if unique.len() <= k {
        return all_thresholds(&unique);
    }
    let mid = unique[unique.len() / 2];
    let half_k = k.div_ceil(2);
    let lower = linspace(unique[0], mid, half_k, false);
    let upper = linspace(mid, unique[unique.len() - 1], half_k, true);
    lower.into_iter().skip(1).chain(upper).collect()
}
