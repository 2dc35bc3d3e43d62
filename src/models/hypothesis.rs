//! Hypothesis test result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PerClass;

/// Significance level used by every test.
pub const ALPHA: f64 = 0.05;

/// Outcome of a hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HypothesisTest<T> {
    Completed(T),
    InsufficientData(InsufficientData),
    Unavailable(Unavailable),
}

impl<T> HypothesisTest<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, HypothesisTest::Completed(_))
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            HypothesisTest::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// Human-readable reason when the test did not run.
    pub fn reason(&self) -> Option<&str> {
        match self {
            HypothesisTest::Completed(_) => None,
            HypothesisTest::InsufficientData(d) => Some(&d.reason),
            HypothesisTest::Unavailable(u) => Some(&u.reason),
        }
    }
}

/// Not enough (or not varied enough) data to run the test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientData {
    pub test_name: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_sizes: Option<PerClass<usize>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deficient_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
}

/// The numeric backend is not available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unavailable {
    pub test_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub null: String,
    pub alternative: String,
}

/// n / mean / std / min / max for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub significant: bool,
    pub interpretation: String,
    pub conclusion: String,
}

impl Verdict {
    pub fn conclusion_for(significant: bool) -> &'static str {
        if significant {
            "Reject H0"
        } else {
            "Fail to reject H0"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaStatistics {
    pub f_statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub df_between: usize,
    pub df_within: usize,
}

/// One-way ANOVA of power level across classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub test_name: String,
    pub hypothesis: Hypothesis,
    pub groups: PerClass<GroupSummary>,
    pub statistics: AnovaStatistics,
    pub result: Verdict,
    pub generated_at: DateTime<Utc>,
}

/// Strength band of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
    Negligible,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        let abs_r = r.abs();
        if abs_r >= 0.7 {
            Strength::Strong
        } else if abs_r >= 0.4 {
            Strength::Moderate
        } else if abs_r >= 0.2 {
            Strength::Weak
        } else {
            Strength::Negligible
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Strong => write!(f, "strong"),
            Strength::Moderate => write!(f, "moderate"),
            Strength::Weak => write!(f, "weak"),
            Strength::Negligible => write!(f, "negligible"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Positive => write!(f, "positive"),
            Direction::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationStatistics {
    pub correlation_coefficient: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub alpha: f64,
}

/// Ordinary least squares fit of triumph score on power level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub std_error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationDescriptive {
    pub light_level: GroupSummary,
    pub triumph_score: GroupSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationVerdict {
    pub significant: bool,
    pub strength: Strength,
    pub direction: Direction,
    pub interpretation: String,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    pub x: Vec<u32>,
    pub y: Vec<u32>,
    pub x_label: String,
    pub y_label: String,
}

/// Pearson correlation between max power level and triumph score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub test_name: String,
    pub hypothesis: Hypothesis,
    pub sample_size: usize,
    pub statistics: CorrelationStatistics,
    pub regression: Regression,
    pub descriptive: CorrelationDescriptive,
    pub result: CorrelationVerdict,
    pub scatter_data: ScatterData,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_bands() {
        assert_eq!(Strength::from_r(0.95), Strength::Strong);
        assert_eq!(Strength::from_r(-0.7), Strength::Strong);
        assert_eq!(Strength::from_r(0.4), Strength::Moderate);
        assert_eq!(Strength::from_r(-0.25), Strength::Weak);
        assert_eq!(Strength::from_r(0.19), Strength::Negligible);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::from_r(0.3), Direction::Positive);
        assert_eq!(Direction::from_r(-0.3), Direction::Negative);
        assert_eq!(Direction::from_r(0.0), Direction::Negative);
    }

    #[test]
    fn test_outcome_tagging() {
        let outcome: HypothesisTest<AnovaResult> = HypothesisTest::Unavailable(Unavailable {
            test_name: "One-way ANOVA".to_string(),
            reason: "statistics backend disabled".to_string(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["test_name"], "One-way ANOVA");
        assert_eq!(outcome.reason(), Some("statistics backend disabled"));
        assert!(!outcome.is_completed());
    }

    #[test]
    fn test_insufficient_data_omits_empty_fields() {
        let outcome: HypothesisTest<CorrelationResult> =
            HypothesisTest::InsufficientData(InsufficientData {
                test_name: "Pearson Correlation".to_string(),
                reason: "need at least 3 pairs".to_string(),
                group_sizes: None,
                deficient_groups: vec![],
                sample_size: Some(2),
            });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["sample_size"], 2);
        assert!(json.get("group_sizes").is_none());
        assert!(json.get("deficient_groups").is_none());
    }
}
