//! Order statistics shared by the collators

/// Median of a sample; mean of the two middle values for even lengths.
///
/// Returns `None` for an empty sample. The input order does not matter.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean; `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the `k` lowest values.
///
/// With fewer than `k` values every value is used. Returns `None` when there
/// is nothing to take the median of (empty input or `k == 0`).
pub fn lowest_k_median(values: &[f64], k: usize) -> Option<f64> {
    if k == 0 {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.truncate(k);
    median(&sorted)
}
