//! Leaderboard ranking.

use std::cmp::Ordering;

use crate::models::{LeaderboardEntry, Metric, PlayerId, UserRank};

use super::metrics::PlayerMetrics;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Clamp a requested limit into `[1, max]`.
pub fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, max.max(1))
}

/// Players with a positive value for `category`, best first.
///
/// The sort is stable; equal values keep record order.
fn ordered(metrics: &[PlayerMetrics], category: Metric) -> Vec<(&PlayerMetrics, f64)> {
    let mut rows: Vec<(&PlayerMetrics, f64)> = metrics
        .iter()
        .map(|m| (m, m.value(category)))
        .filter(|(_, v)| *v > 0.0)
        .collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    rows
}

/// Top `limit` players for `category`, ranked from 1.
pub fn leaderboard(metrics: &[PlayerMetrics], category: Metric, limit: u32) -> Vec<LeaderboardEntry> {
    ordered(metrics, category)
        .into_iter()
        .take(limit as usize)
        .enumerate()
        .map(|(i, (m, value))| LeaderboardEntry {
            rank: i as u32 + 1,
            player_id: m.player_id.clone(),
            display_name: m.display_name.clone(),
            platform: m.platform.clone(),
            value,
        })
        .collect()
}

/// Rank of one player in the full ordering.
///
/// Linear scan over the unbounded ranking.
// TODO: keep a sorted index per category if the tracked population grows
// past what a per-request sort can handle.
pub fn user_rank(metrics: &[PlayerMetrics], player_id: &PlayerId, category: Metric) -> Option<UserRank> {
    let rows = ordered(metrics, category);
    let total = rows.len() as u32;
    rows.iter()
        .position(|(m, _)| &m.player_id == player_id)
        .map(|idx| UserRank {
            rank: idx as u32 + 1,
            total,
            value: rows[idx].1,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn metrics(id: &str, power: u32, triumph: u32, hours: f64) -> PlayerMetrics {
        PlayerMetrics {
            player_id: PlayerId::from(id),
            display_name: id.to_uppercase(),
            platform: "Steam".to_string(),
            max_power_level: power,
            triumph_score: triumph,
            play_time_hours: hours,
            class_set: BTreeSet::new(),
            power_levels: vec![power],
        }
    }

    fn population() -> Vec<PlayerMetrics> {
        vec![
            metrics("a", 1800, 0, 120.0),
            metrics("b", 1850, 40000, 0.0),
            metrics("c", 0, 90000, 300.5),
            metrics("d", 1825, 65000, 80.0),
            metrics("e", 1850, 12000, 10.0),
        ]
    }

    #[test]
    fn test_ranks_start_at_one_and_increase() {
        let board = leaderboard(&population(), Metric::PowerLevel, 10);
        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(board.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_ties_keep_record_order() {
        let board = leaderboard(&population(), Metric::PowerLevel, 10);
        assert_eq!(board[0].player_id.as_str(), "b");
        assert_eq!(board[1].player_id.as_str(), "e");
    }

    #[test]
    fn test_non_positive_values_excluded() {
        let power = leaderboard(&population(), Metric::PowerLevel, 10);
        assert!(power.iter().all(|e| e.player_id.as_str() != "c"));

        let triumph = leaderboard(&population(), Metric::TriumphScore, 10);
        assert_eq!(triumph.len(), 4);
        assert_eq!(triumph[0].player_id.as_str(), "c");

        let play = leaderboard(&population(), Metric::PlayTime, 10);
        assert_eq!(play.len(), 4);
        assert_eq!(play[0].value, 300.5);
    }

    #[test]
    fn test_limit_respected() {
        let board = leaderboard(&population(), Metric::TriumphScore, 2);
        assert_eq!(board.len(), 2);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_user_rank_uses_full_ordering() {
        let pop = population();
        let rank = user_rank(&pop, &PlayerId::from("a"), Metric::PowerLevel).unwrap();
        assert_eq!(rank.rank, 4);
        assert_eq!(rank.total, 4);
        assert_eq!(rank.value, 1800.0);

        // Outside a limit of 2 but still ranked
        assert_eq!(leaderboard(&pop, Metric::PowerLevel, 2).len(), 2);
    }

    #[test]
    fn test_user_rank_missing() {
        let pop = population();
        assert!(user_rank(&pop, &PlayerId::from("zzz"), Metric::PowerLevel).is_none());
        // Present, but no value in this category
        assert!(user_rank(&pop, &PlayerId::from("c"), Metric::PowerLevel).is_none());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, DEFAULT_LIMIT, MAX_LIMIT), 10);
        assert_eq!(clamp_limit(Some(0), DEFAULT_LIMIT, MAX_LIMIT), 1);
        assert_eq!(clamp_limit(Some(500), DEFAULT_LIMIT, MAX_LIMIT), 100);
        assert_eq!(clamp_limit(Some(25), DEFAULT_LIMIT, MAX_LIMIT), 25);
    }
}
