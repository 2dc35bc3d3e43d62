//! Badge derivation.

use crate::models::{
    Badge, BadgeDefinition, Snapshot, BALANCED, BRIGHTEST, COLLECTOR, DEDICATED, RISING_STAR,
    TRINITY, VETERAN,
};

use super::metrics::PlayerMetrics;
use super::position::position;

const TOP_TIER: f64 = 90.0;
const UPPER_TIER: f64 = 75.0;
const MEDIAN_TIER: f64 = 50.0;
const BALANCED_SPREAD: u32 = 50;

/// Exclusive power-level rank badge, highest threshold first.
fn power_rank(percentile: f64) -> Option<&'static BadgeDefinition> {
    if percentile >= TOP_TIER {
        Some(&BRIGHTEST)
    } else if percentile >= UPPER_TIER {
        Some(&VETERAN)
    } else if percentile >= MEDIAN_TIER {
        Some(&RISING_STAR)
    } else {
        None
    }
}

/// Two or more characters with a power level, all within 50 of each other.
fn is_balanced(power_levels: &[u32]) -> bool {
    let valid: Vec<u32> = power_levels.iter().copied().filter(|p| *p > 0).collect();
    if valid.len() < 2 {
        return false;
    }
    let (min, max) = valid
        .iter()
        .fold((u32::MAX, 0), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    max - min <= BALANCED_SPREAD
}

/// Badges earned by one player.
pub fn compute_badges(
    metrics: &PlayerMetrics,
    snapshot: &Snapshot,
    power_cap: Option<u32>,
) -> Vec<Badge> {
    if !metrics.has_characters() {
        return Vec::new();
    }
    let Some(pos) = position(Some(metrics), snapshot) else {
        return Vec::new();
    };

    let mut earned: Vec<&BadgeDefinition> = Vec::new();

    if let Some(rank) = power_rank(pos.power_level.percentile) {
        earned.push(rank);
    }
    if pos.triumph_score.percentile >= TOP_TIER {
        earned.push(&COLLECTOR);
    }
    if pos.play_time.percentile >= TOP_TIER {
        earned.push(&DEDICATED);
    }
    if metrics.class_set.len() == 3 {
        earned.push(&TRINITY);
    }
    if is_balanced(&metrics.power_levels) {
        earned.push(&BALANCED);
    }

    earned.into_iter().map(|b| b.render(power_cap)).collect()
}
