//! Statistics calculation engine.
//!
//! Computes derived metrics from stored player data:
//! - Per-player metric extraction
//! - Descriptive statistics and histograms, overall and per class
//! - Z-scores and percentiles against the population
//! - ANOVA and Pearson correlation
//! - Leaderboards, badges and radar normalization

pub mod backend;
pub mod badges;
pub mod class_stats;
pub mod descriptive;
pub mod hypothesis;
pub mod leaderboard;
pub mod metrics;
pub mod position;
pub mod radar;

pub use backend::{backend_from_name, DisabledBackend, StatrsBackend, StatsBackend};
pub use metrics::{extract_metrics, PlayerMetrics};

/// Round to `places` decimal places for display.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.0000049, 6), 0.000005);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(27.0, 4), 27.0);
    }
}
