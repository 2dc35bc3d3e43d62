//! Descriptive statistics for one metric.

use crate::models::{DescriptiveStats, Histogram, Metric};

use super::backend::StatsBackend;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (divisor n - 1).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Median of an already sorted slice.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Floor-index quartiles: `sorted[n/4]` and `sorted[3n/4]`.
///
/// Not interpolated. Kept for compatibility with previously published
/// snapshots.
pub fn quartiles_sorted(sorted: &[f64]) -> Option<(f64, f64)> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    Some((sorted[n / 4], sorted[(3 * n) / 4]))
}

/// Bucket lower bound for `value`.
pub fn bucket_key(value: f64, width: f64) -> i64 {
    ((value / width).floor() * width) as i64
}

/// Fixed-width histogram, ascending by bucket.
pub fn histogram(values: &[f64], width: f64) -> Histogram {
    let mut hist = Histogram::new();
    for &v in values {
        *hist.entry(bucket_key(v, width)).or_insert(0) += 1;
    }
    hist
}

/// Describe `values` using `width` histogram buckets.
///
/// Values are used as given; filter invalid entries first.
pub fn describe(values: &[f64], width: f64, backend: &dyn StatsBackend) -> DescriptiveStats {
    let count = values.len();
    let histogram = histogram(values, width);

    if count < 2 {
        return DescriptiveStats {
            count,
            histogram,
            ..DescriptiveStats::empty()
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let (q1, q3) = match quartiles_sorted(&sorted) {
        Some((q1, q3)) => (Some(q1), Some(q3)),
        None => (None, None),
    };

    DescriptiveStats {
        count,
        mean: mean(values),
        std_dev: sample_std_dev(values),
        median: median_sorted(&sorted),
        q1,
        q3,
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        skewness: backend.skewness(values),
        kurtosis: backend.kurtosis(values),
        histogram,
    }
}

/// Filter to valid (> 0) values and describe with the metric's bucket width.
pub fn describe_metric(
    values: &[f64],
    metric: Metric,
    backend: &dyn StatsBackend,
) -> DescriptiveStats {
    let valid: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    describe(&valid, metric.bucket_width(), backend)
}
