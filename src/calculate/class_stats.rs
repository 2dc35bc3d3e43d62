//! Power level statistics per class.

use crate::models::{Character, DescriptiveStats, Metric, PerClass};

use super::backend::StatsBackend;
use super::descriptive::describe_metric;
use super::metrics::class_power_levels;

/// Describe character power levels for each class.
///
/// Classes without any valid character still get an entry with count 0.
pub fn class_statistics(
    characters: &[Character],
    backend: &dyn StatsBackend,
) -> PerClass<DescriptiveStats> {
    class_power_levels(characters)
        .map(|_, values| describe_metric(values, Metric::PowerLevel, backend))
}
