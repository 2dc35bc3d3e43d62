//! Optional numeric backend.
//!
//! Core statistics (mean, median, quartiles, histograms, z-scores) never go
//! through this trait. Higher moments and the sampling distributions used
//! for p-values do, so the engine degrades to null fields or "unavailable"
//! test results when the backend is switched off.

use std::sync::Arc;

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Capability interface for the statistics that need a numeric library.
pub trait StatsBackend: Send + Sync {
    /// Backend name for logs and responses.
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Fisher-Pearson skewness (biased). `None` below 3 samples or for
    /// constant input.
    fn skewness(&self, values: &[f64]) -> Option<f64>;

    /// Excess kurtosis (Fisher, biased). Same preconditions as skewness.
    fn kurtosis(&self, values: &[f64]) -> Option<f64>;

    /// Upper-tail probability of the F distribution.
    fn f_sf(&self, f: f64, df1: f64, df2: f64) -> Option<f64>;

    /// Two-tailed p-value for a Student's t statistic.
    fn t_two_tailed(&self, t: f64, df: f64) -> Option<f64>;
}

/// Backend built on `statrs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatrsBackend;

/// Stand-in for a missing numeric library.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

/// Second and `k`th central moments (population divisor).
fn central_moments(values: &[f64], k: i32) -> Option<(f64, f64)> {
    if values.len() < 3 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return None;
    }
    let mk = values.iter().map(|x| (x - mean).powi(k)).sum::<f64>() / n;
    Some((m2, mk))
}

impl StatsBackend for StatrsBackend {
    fn name(&self) -> &'static str {
        "statrs"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn skewness(&self, values: &[f64]) -> Option<f64> {
        let (m2, m3) = central_moments(values, 3)?;
        Some(m3 / m2.powf(1.5))
    }

    fn kurtosis(&self, values: &[f64]) -> Option<f64> {
        let (m2, m4) = central_moments(values, 4)?;
        Some(m4 / (m2 * m2) - 3.0)
    }

    fn f_sf(&self, f: f64, df1: f64, df2: f64) -> Option<f64> {
        if !f.is_finite() || f < 0.0 {
            return None;
        }
        let dist = FisherSnedecor::new(df1, df2).ok()?;
        Some((1.0 - dist.cdf(f)).clamp(0.0, 1.0))
    }

    fn t_two_tailed(&self, t: f64, df: f64) -> Option<f64> {
        if t.is_nan() {
            return None;
        }
        if t.is_infinite() {
            return Some(0.0);
        }
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
    }
}

impl StatsBackend for DisabledBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn skewness(&self, _values: &[f64]) -> Option<f64> {
        None
    }

    fn kurtosis(&self, _values: &[f64]) -> Option<f64> {
        None
    }

    fn f_sf(&self, _f: f64, _df1: f64, _df2: f64) -> Option<f64> {
        None
    }

    fn t_two_tailed(&self, _t: f64, _df: f64) -> Option<f64> {
        None
    }
}

/// Select a backend by its configured name.
pub fn backend_from_name(name: &str) -> Option<Arc<dyn StatsBackend>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "statrs" => Some(Arc::new(StatrsBackend)),
        "none" | "disabled" => Some(Arc::new(DisabledBackend)),
        _ => None,
    }
}
