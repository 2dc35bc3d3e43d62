//! Inferential tests over the raw records.
//!
//! - One-way ANOVA of character power level across the three classes
//! - Pearson correlation (with OLS regression) between a player's max power
//!   level and triumph score

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{
    AnovaResult, AnovaStatistics, ClassType, CorrelationDescriptive, CorrelationResult,
    CorrelationStatistics, CorrelationVerdict, Direction, GroupSummary, Hypothesis,
    HypothesisTest, InsufficientData, PerClass, Regression, ScatterData, Strength, Unavailable,
    Verdict, ALPHA,
};

use super::backend::StatsBackend;
use super::descriptive::{mean, sample_std_dev};
use super::round_to;

pub const ANOVA_TEST_NAME: &str = "One-way ANOVA";
pub const CORRELATION_TEST_NAME: &str = "Pearson Correlation";

const MIN_GROUP_SIZE: usize = 2;
const MIN_PAIRS: usize = 3;

fn unavailable<T>(test_name: &str, backend: &dyn StatsBackend) -> HypothesisTest<T> {
    HypothesisTest::Unavailable(Unavailable {
        test_name: test_name.to_string(),
        reason: format!(
            "statistics backend '{}' is not available; p-values cannot be computed",
            backend.name()
        ),
    })
}

/// Summary of one sample, rounded for display.
pub fn group_summary(values: &[f64]) -> GroupSummary {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    GroupSummary {
        n: values.len(),
        mean: round_to(mean(values).unwrap_or(0.0), 2),
        std: round_to(sample_std_dev(values).unwrap_or(0.0), 2),
        min: if values.is_empty() { 0.0 } else { min },
        max: if values.is_empty() { 0.0 } else { max },
    }
}

/// One-way ANOVA across class partitions of power level.
///
/// Every class needs at least two values. When all groups are constant and
/// share the same mean the result is F = 0, p = 1. Constant groups with
/// different means have no within-group variance and are reported as
/// insufficient data.
pub fn class_anova(
    groups: &PerClass<Vec<f64>>,
    backend: &dyn StatsBackend,
    now: DateTime<Utc>,
) -> HypothesisTest<AnovaResult> {
    if !backend.is_available() {
        return unavailable(ANOVA_TEST_NAME, backend);
    }

    let sizes = groups.map(|_, g| g.len());
    let deficient: Vec<String> = groups
        .iter()
        .filter(|(_, g)| g.len() < MIN_GROUP_SIZE)
        .map(|(class, _)| class.key().to_string())
        .collect();

    if !deficient.is_empty() {
        return HypothesisTest::InsufficientData(InsufficientData {
            test_name: ANOVA_TEST_NAME.to_string(),
            reason: format!(
                "each class needs at least {} characters with a power level (short: {})",
                MIN_GROUP_SIZE,
                deficient.join(", ")
            ),
            group_sizes: Some(sizes),
            deficient_groups: deficient,
            sample_size: None,
        });
    }

    let k = ClassType::ALL.len();
    let n_total: usize = groups.iter().map(|(_, g)| g.len()).sum();
    let grand_mean = groups.iter().flat_map(|(_, g)| g.iter()).sum::<f64>() / n_total as f64;

    let mut ssb = 0.0;
    let mut ssw = 0.0;
    for (_, g) in groups.iter() {
        let gm = g.iter().sum::<f64>() / g.len() as f64;
        ssb += g.len() as f64 * (gm - grand_mean).powi(2);
        ssw += g.iter().map(|x| (x - gm).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n_total - k;
    let scale = grand_mean.abs().max(1.0);
    let negligible = |ss: f64| ss <= 1e-12 * scale * scale * n_total as f64;

    let (f_stat, p_value) = if negligible(ssw) {
        if negligible(ssb) {
            (0.0, 1.0)
        } else {
            return HypothesisTest::InsufficientData(InsufficientData {
                test_name: ANOVA_TEST_NAME.to_string(),
                reason: "no within-group variance; every class is constant".to_string(),
                group_sizes: Some(sizes),
                deficient_groups: vec![],
                sample_size: None,
            });
        }
    } else {
        let msb = ssb / df_between as f64;
        let msw = ssw / df_within as f64;
        let f = msb / msw;
        match backend.f_sf(f, df_between as f64, df_within as f64) {
            Some(p) => (f, p),
            None => return unavailable(ANOVA_TEST_NAME, backend),
        }
    };

    let significant = p_value < ALPHA;
    debug!(f_stat, p_value, n_total, "class power level ANOVA");

    let interpretation = if significant {
        "The difference in power level between classes is statistically significant."
    } else {
        "The difference in power level between classes is not statistically significant."
    };

    HypothesisTest::Completed(AnovaResult {
        test_name: ANOVA_TEST_NAME.to_string(),
        hypothesis: Hypothesis {
            null: "Mean power level is the same for every class (H0)".to_string(),
            alternative: "At least one class has a different mean power level (H1)".to_string(),
        },
        groups: groups.map(|_, g| group_summary(g)),
        statistics: AnovaStatistics {
            f_statistic: round_to(f_stat, 4),
            p_value: round_to(p_value, 6),
            alpha: ALPHA,
            df_between,
            df_within,
        },
        result: Verdict {
            significant,
            interpretation: interpretation.to_string(),
            conclusion: Verdict::conclusion_for(significant).to_string(),
        },
        generated_at: now,
    })
}

/// Pearson correlation and OLS regression of triumph score on power level.
///
/// Pairs are `(max_power_level, triumph_score)`; callers pass only players
/// with both values above zero.
pub fn light_triumph_correlation(
    pairs: &[(u32, u32)],
    backend: &dyn StatsBackend,
    now: DateTime<Utc>,
) -> HypothesisTest<CorrelationResult> {
    if !backend.is_available() {
        return unavailable(CORRELATION_TEST_NAME, backend);
    }

    let n = pairs.len();
    let insufficient = |reason: String| -> HypothesisTest<CorrelationResult> {
        HypothesisTest::InsufficientData(InsufficientData {
            test_name: CORRELATION_TEST_NAME.to_string(),
            reason,
            group_sizes: None,
            deficient_groups: vec![],
            sample_size: Some(n),
        })
    };

    if n < MIN_PAIRS {
        return insufficient(format!(
            "correlation needs at least {} players with both power level and triumph score",
            MIN_PAIRS
        ));
    }

    let xs: Vec<f64> = pairs.iter().map(|(x, _)| *x as f64).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, y)| *y as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return insufficient("correlation is undefined for constant input".to_string());
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let r_squared = r * r;
    let df = (n - 2) as f64;

    let p_value = if 1.0 - r_squared <= 0.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r_squared)).sqrt();
        match backend.t_two_tailed(t, df) {
            Some(p) => p,
            None => return unavailable(CORRELATION_TEST_NAME, backend),
        }
    };

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let std_error = ((1.0 - r_squared) * syy / sxx / df).max(0.0).sqrt();

    let significant = p_value < ALPHA;
    let strength = Strength::from_r(r);
    let direction = Direction::from_r(r);
    debug!(r, p_value, n, "power/triumph correlation");

    let interpretation = if significant {
        format!(
            "There is a statistically significant {} {} correlation between power level and triumph score. (r = {:.3}, p = {:.4})",
            strength, direction, r, p_value
        )
    } else {
        format!(
            "There is no statistically significant correlation between power level and triumph score. (r = {:.3}, p = {:.4})",
            r, p_value
        )
    };

    HypothesisTest::Completed(CorrelationResult {
        test_name: CORRELATION_TEST_NAME.to_string(),
        hypothesis: Hypothesis {
            null: "Power level and triumph score are uncorrelated (rho = 0)".to_string(),
            alternative: "Power level and triumph score are correlated (rho != 0)".to_string(),
        },
        sample_size: n,
        statistics: CorrelationStatistics {
            correlation_coefficient: round_to(r, 4),
            r_squared: round_to(r_squared, 4),
            p_value: round_to(p_value, 6),
            alpha: ALPHA,
        },
        regression: Regression {
            slope: round_to(slope, 4),
            intercept: round_to(intercept, 2),
            std_error: round_to(std_error, 4),
        },
        descriptive: CorrelationDescriptive {
            light_level: group_summary(&xs),
            triumph_score: group_summary(&ys),
        },
        result: CorrelationVerdict {
            significant,
            strength,
            direction,
            interpretation,
            conclusion: Verdict::conclusion_for(significant).to_string(),
        },
        scatter_data: ScatterData {
            x: pairs.iter().map(|(x, _)| *x).collect(),
            y: pairs.iter().map(|(_, y)| *y).collect(),
            x_label: "Power Level".to_string(),
            y_label: "Triumph Score".to_string(),
        },
        generated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::backend::{DisabledBackend, StatrsBackend};

    fn groups(t: &[f64], h: &[f64], w: &[f64]) -> PerClass<Vec<f64>> {
        PerClass {
            titan: t.to_vec(),
            hunter: h.to_vec(),
            warlock: w.to_vec(),
        }
    }

    #[test]
    fn test_anova_identical_constant_groups() {
        let g = groups(&[100.0; 3], &[100.0; 3], &[100.0; 3]);
        let outcome = class_anova(&g, &StatrsBackend, Utc::now());
        let result = outcome.completed().expect("constant groups should complete");
        assert_eq!(result.statistics.f_statistic, 0.0);
        assert_eq!(result.statistics.p_value, 1.0);
        assert!(!result.result.significant);
        assert_eq!(result.result.conclusion, "Fail to reject H0");
    }

    #[test]
    fn test_anova_similar_groups_not_significant() {
        let g = groups(
            &[1800.0, 1810.0, 1820.0, 1805.0],
            &[1801.0, 1811.0, 1819.0, 1806.0],
            &[1799.0, 1809.0, 1821.0, 1804.0],
        );
        let result = class_anova(&g, &StatrsBackend, Utc::now());
        let result = result.completed().unwrap();
        assert!(result.statistics.p_value > 0.9);
        assert!(!result.result.significant);
        assert_eq!(result.statistics.df_between, 2);
        assert_eq!(result.statistics.df_within, 9);
    }

    #[test]
    fn test_anova_separated_groups_significant() {
        let g = groups(
            &[1500.0, 1502.0, 1498.0, 1501.0],
            &[1700.0, 1703.0, 1699.0, 1701.0],
            &[1900.0, 1898.0, 1902.0, 1900.0],
        );
        let result = class_anova(&g, &StatrsBackend, Utc::now());
        let result = result.completed().unwrap();
        assert!(result.statistics.f_statistic > 100.0);
        assert!(result.statistics.p_value < 0.05);
        assert!(result.result.significant);
        assert_eq!(result.result.conclusion, "Reject H0");
        assert_eq!(result.groups.hunter.n, 4);
        assert_eq!(result.groups.warlock.min, 1898.0);
    }

    #[test]
    fn test_anova_known_f_statistic() {
        // Group means 2, 5, 8; each group has SS = 2
        let g = groups(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]);
        let result = class_anova(&g, &StatrsBackend, Utc::now());
        let result = result.completed().unwrap();
        // SSB = 54, MSB = 27, SSW = 6, MSW = 1
        assert_eq!(result.statistics.f_statistic, 27.0);
        assert!(result.statistics.p_value < 0.01);
    }

    #[test]
    fn test_anova_names_deficient_groups() {
        let g = groups(&[1800.0, 1810.0], &[1800.0], &[]);
        match class_anova(&g, &StatrsBackend, Utc::now()) {
            HypothesisTest::InsufficientData(d) => {
                assert_eq!(d.deficient_groups, vec!["hunter", "warlock"]);
                let sizes = d.group_sizes.unwrap();
                assert_eq!(sizes.titan, 2);
                assert_eq!(sizes.hunter, 1);
                assert_eq!(sizes.warlock, 0);
            }
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_anova_constant_but_different_groups() {
        let g = groups(&[100.0; 2], &[200.0; 2], &[300.0; 2]);
        let outcome = class_anova(&g, &StatrsBackend, Utc::now());
        assert!(matches!(outcome, HypothesisTest::InsufficientData(_)));
    }

    #[test]
    fn test_anova_without_backend() {
        let g = groups(&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]);
        let outcome = class_anova(&g, &DisabledBackend, Utc::now());
        assert!(matches!(outcome, HypothesisTest::Unavailable(_)));
    }

    #[test]
    fn test_correlation_perfect_positive() {
        let pairs = vec![(1800, 10000), (1810, 20000), (1820, 30000), (1830, 40000)];
        let outcome = light_triumph_correlation(&pairs, &StatrsBackend, Utc::now());
        let result = outcome.completed().unwrap();
        assert_eq!(result.statistics.correlation_coefficient, 1.0);
        assert_eq!(result.statistics.r_squared, 1.0);
        assert_eq!(result.statistics.p_value, 0.0);
        assert_eq!(result.regression.slope, 1000.0);
        assert_eq!(result.regression.intercept, -1_790_000.0);
        assert_eq!(result.regression.std_error, 0.0);
        assert_eq!(result.result.strength, Strength::Strong);
        assert_eq!(result.result.direction, Direction::Positive);
        assert_eq!(result.scatter_data.x, vec![1800, 1810, 1820, 1830]);
    }

    #[test]
    fn test_correlation_negative() {
        let pairs = vec![(1500, 90000), (1600, 70000), (1700, 72000), (1800, 40000), (1900, 30000)];
        let result = light_triumph_correlation(&pairs, &StatrsBackend, Utc::now());
        let result = result.completed().unwrap();
        let r = result.statistics.correlation_coefficient;
        assert!(r < -0.9 && r >= -1.0);
        assert_eq!(result.result.direction, Direction::Negative);
        assert!((result.statistics.r_squared - round_to(r * r, 4)).abs() < 1e-3);
        assert!(result.regression.slope < 0.0);
    }

    #[test]
    fn test_correlation_r_bounds_and_r_squared() {
        let pairs = vec![(1750, 31000), (1760, 25000), (1790, 45000), (1801, 38000), (1830, 60000), (1842, 41000)];
        let result = light_triumph_correlation(&pairs, &StatrsBackend, Utc::now());
        let s = &result.completed().unwrap().statistics;
        assert!((-1.0..=1.0).contains(&s.correlation_coefficient));
        let r = s.correlation_coefficient;
        assert!((s.r_squared - r * r).abs() < 1e-3);
        assert!((0.0..=1.0).contains(&s.p_value));
    }

    #[test]
    fn test_correlation_needs_three_pairs() {
        let outcome = light_triumph_correlation(&[(1800, 1), (1810, 2)], &StatrsBackend, Utc::now());
        match outcome {
            HypothesisTest::InsufficientData(d) => assert_eq!(d.sample_size, Some(2)),
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_correlation_constant_input() {
        let pairs = vec![(1800, 100), (1800, 200), (1800, 300)];
        let outcome = light_triumph_correlation(&pairs, &StatrsBackend, Utc::now());
        assert!(matches!(outcome, HypothesisTest::InsufficientData(_)));
    }

    #[test]
    fn test_correlation_without_backend() {
        let pairs = vec![(1800, 100), (1810, 200), (1820, 300)];
        let outcome = light_triumph_correlation(&pairs, &DisabledBackend, Utc::now());
        assert!(matches!(outcome, HypothesisTest::Unavailable(_)));
        assert!(outcome.reason().unwrap().contains("none"));
    }

    #[test]
    fn test_group_summary_rounding() {
        let s = group_summary(&[1.0, 2.0, 4.0]);
        assert_eq!(s.n, 3);
        assert_eq!(s.mean, 2.33);
        assert_eq!(s.std, 1.53);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
    }
}
