//! Radar chart normalization.

use crate::models::{RadarChart, Snapshot};

use super::metrics::PlayerMetrics;
use super::position::{display_percentile, position};

const CLASS_COUNT: f64 = 3.0;

/// Share of the three character slots, as 0-100.
fn slot_score(count: usize) -> f64 {
    (count as f64 / CLASS_COUNT * 100.0).min(100.0)
}

/// Normalize a player's metrics onto five 0-100 axes.
pub fn radar(metrics: &PlayerMetrics, snapshot: &Snapshot) -> RadarChart {
    if !metrics.has_characters() {
        return RadarChart::default();
    }
    let Some(pos) = position(Some(metrics), snapshot) else {
        return RadarChart::default();
    };

    RadarChart {
        power_level: display_percentile(pos.power_level.percentile),
        triumph_score: display_percentile(pos.triumph_score.percentile),
        play_time: display_percentile(pos.play_time.percentile),
        character_count: slot_score(metrics.character_count()),
        class_diversity: slot_score(metrics.class_set.len()),
    }
}
