//! Per-player standing: positions, leaderboard rows and radar values.

use serde::{Deserialize, Serialize};

use super::{Metric, PlayerId};

/// Standing on a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPosition {
    pub value: f64,
    pub z_score: f64,
    pub percentile: f64,
    pub top_percent: f64,
}

/// Standing on all three metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub player_id: PlayerId,
    pub power_level: MetricPosition,
    pub triumph_score: MetricPosition,
    pub play_time: MetricPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub display_name: String,
    pub platform: String,
    pub value: f64,
}

/// Where one player sits in the full, unbounded ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserRank {
    pub rank: u32,
    pub total: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub category: Metric,
    pub entries: Vec<LeaderboardEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rank: Option<UserRank>,
}

/// Five radar axes on a 0-100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub power_level: f64,
    pub triumph_score: f64,
    pub play_time: f64,
    pub character_count: f64,
    pub class_diversity: f64,
}

impl RadarChart {
    pub fn values(&self) -> [f64; 5] {
        [
            self.power_level,
            self.triumph_score,
            self.play_time,
            self.character_count,
            self.class_diversity,
        ]
    }
}
