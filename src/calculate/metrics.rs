//! Per-player metric extraction.
//!
//! Derives the three scalar metrics for each player from the raw player and
//! character records. Nothing here is cached; callers recompute on every
//! request from current store contents.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Character, ClassType, Metric, PerClass, Player, PlayerId};

/// Metric tuple for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMetrics {
    pub player_id: PlayerId,
    pub display_name: String,
    pub platform: String,
    pub max_power_level: u32,
    pub triumph_score: u32,
    pub play_time_hours: f64,
    pub class_set: BTreeSet<ClassType>,
    /// Power level of every character, in record order
    pub power_levels: Vec<u32>,
}

impl PlayerMetrics {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PowerLevel => self.max_power_level as f64,
            Metric::TriumphScore => self.triumph_score as f64,
            Metric::PlayTime => self.play_time_hours,
        }
    }

    pub fn character_count(&self) -> usize {
        self.power_levels.len()
    }

    pub fn has_characters(&self) -> bool {
        !self.power_levels.is_empty()
    }
}

/// Build a metric tuple for every player, preserving player order.
pub fn extract_metrics(players: &[Player], characters: &[Character]) -> Vec<PlayerMetrics> {
    let mut by_player: HashMap<&PlayerId, Vec<&Character>> = HashMap::new();
    for c in characters {
        by_player.entry(&c.player_id).or_default().push(c);
    }

    players
        .iter()
        .map(|p| {
            let chars = by_player.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            metrics_for(p, chars)
        })
        .collect()
}

/// Metric tuple for a single player.
pub fn metrics_for(player: &Player, characters: &[&Character]) -> PlayerMetrics {
    let max_power_level = characters.iter().map(|c| c.power_level).max().unwrap_or(0);
    let total_minutes: u64 = characters.iter().map(|c| c.minutes_played_total).sum();

    PlayerMetrics {
        player_id: player.id.clone(),
        display_name: player.full_display_name(),
        platform: player.platform().to_string(),
        max_power_level,
        triumph_score: player.triumph_score,
        play_time_hours: total_minutes as f64 / 60.0,
        class_set: characters.iter().map(|c| c.class_type).collect(),
        power_levels: characters.iter().map(|c| c.power_level).collect(),
    }
}

/// Population values for one metric, keeping only valid (> 0) entries.
pub fn metric_values(metrics: &[PlayerMetrics], metric: Metric) -> Vec<f64> {
    metrics
        .iter()
        .map(|m| m.value(metric))
        .filter(|v| *v > 0.0)
        .collect()
}

/// Valid character power levels partitioned by class.
pub fn class_power_levels(characters: &[Character]) -> PerClass<Vec<f64>> {
    let mut groups: PerClass<Vec<f64>> = PerClass::default();
    for c in characters.iter().filter(|c| c.power_level > 0) {
        groups.get_mut(c.class_type).push(c.power_level as f64);
    }
    groups
}

/// Characters per class, regardless of power level.
pub fn class_counts(characters: &[Character]) -> PerClass<u64> {
    let mut counts: PerClass<u64> = PerClass::default();
    for c in characters {
        *counts.get_mut(c.class_type) += 1;
    }
    counts
}
