//! Derived statistics models.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::PerClass;

/// Histogram keyed by bucket lower bound.
pub type Histogram = BTreeMap<i64, u64>;

/// One of the three tracked player metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PowerLevel,
    TriumphScore,
    PlayTime,
}

impl Metric {
    /// Fixed histogram bucket width.
    pub fn bucket_width(&self) -> f64 {
        match self {
            Metric::PowerLevel => 10.0,
            Metric::TriumphScore => 5000.0,
            Metric::PlayTime => 100.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::PowerLevel => "power_level",
            Metric::TriumphScore => "triumph_score",
            Metric::PlayTime => "play_time",
        }
    }

    /// Axis label for charts.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::PowerLevel => "Power Level",
            Metric::TriumphScore => "Triumph Score",
            Metric::PlayTime => "Play Time (hours)",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power_level" | "light_level" | "power" => Ok(Metric::PowerLevel),
            "triumph_score" | "triumph" => Ok(Metric::TriumphScore),
            "play_time" | "playtime" => Ok(Metric::PlayTime),
            other => Err(format!(
                "unknown category '{}' (expected power_level, triumph_score or play_time)",
                other
            )),
        }
    }
}

/// Descriptive statistics for one metric.
///
/// Scalar fields are `None` below two samples. The histogram is always
/// populated so its counts sum to `count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub median: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    #[serde(default)]
    pub histogram: Histogram,
}

impl DescriptiveStats {
    /// Record with no data (count 0, every scalar null).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn histogram_total(&self) -> u64 {
        self.histogram.values().sum()
    }
}

/// Cached population-wide aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub power_level: DescriptiveStats,
    pub triumph_score: DescriptiveStats,
    pub play_time: DescriptiveStats,

    /// Character power level per class
    pub class_stats: PerClass<DescriptiveStats>,

    /// Characters per class
    pub class_counts: PerClass<u64>,

    pub total_players: u64,
    pub total_characters: u64,
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    pub fn stats_for(&self, metric: Metric) -> &DescriptiveStats {
        match metric {
            Metric::PowerLevel => &self.power_level,
            Metric::TriumphScore => &self.triumph_score,
            Metric::PlayTime => &self.play_time,
        }
    }

    /// True once the snapshot is older than `ttl`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_updated > ttl
    }
}
