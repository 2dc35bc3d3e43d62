//! A player's standing relative to the population.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erf;

use crate::models::{DescriptiveStats, Metric, MetricPosition, PlayerPosition, Snapshot};

use super::metrics::PlayerMetrics;

/// `(value - mean) / std_dev`, or 0 when either statistic is missing or the
/// spread is zero.
pub fn z_score(value: f64, mean: Option<f64>, std_dev: Option<f64>) -> f64 {
    match (mean, std_dev) {
        (Some(mean), Some(sd)) if sd != 0.0 && sd.is_finite() => (value - mean) / sd,
        _ => 0.0,
    }
}

/// Standard normal CDF as a percentage.
pub fn percentile(z: f64) -> f64 {
    50.0 * (1.0 + erf(z / SQRT_2))
}

/// Position on one metric against its population stats.
pub fn metric_position(value: f64, stats: &DescriptiveStats) -> MetricPosition {
    let z = z_score(value, stats.mean, stats.std_dev);
    let pct = percentile(z);
    MetricPosition {
        value,
        z_score: z,
        percentile: pct,
        top_percent: 100.0 - pct,
    }
}

/// Position on all three metrics. `None` when the player has no record.
pub fn position(metrics: Option<&PlayerMetrics>, snapshot: &Snapshot) -> Option<PlayerPosition> {
    let m = metrics?;
    let at = |metric: Metric| metric_position(m.value(metric), snapshot.stats_for(metric));

    Some(PlayerPosition {
        player_id: m.player_id.clone(),
        power_level: at(Metric::PowerLevel),
        triumph_score: at(Metric::TriumphScore),
        play_time: at(Metric::PlayTime),
    })
}

/// Percentile clamped to the display range.
pub fn display_percentile(pct: f64) -> f64 {
    pct.clamp(0.0, 100.0)
}
