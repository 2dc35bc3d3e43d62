//! Query facade over the record store, the snapshot cache and the
//! calculators.
//!
//! Snapshot-derived queries go through the TTL cache. Hypothesis tests,
//! leaderboards and per-player metrics always read the current records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calculate::badges::compute_badges;
use crate::calculate::hypothesis::{class_anova, light_triumph_correlation};
use crate::calculate::leaderboard::{self, clamp_limit, user_rank};
use crate::calculate::metrics::class_power_levels;
use crate::calculate::position::position;
use crate::calculate::radar::radar;
use crate::calculate::{extract_metrics, PlayerMetrics, StatsBackend};
use crate::models::{
    badge_catalog, AnovaResult, Badge, Character, ClassType, CorrelationResult, DescriptiveStats,
    Histogram, HypothesisTest, Leaderboard, Metric, PerClass, Player, PlayerId, PlayerPosition,
    RadarChart, Snapshot, UserRank,
};
use crate::snapshot::{build_snapshot, SnapshotCache};
use crate::storage::{RecordSource, StorageError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Tunables read from the `[stats]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub current_power_cap: Option<u32>,
    pub leaderboard_default_limit: u32,
    pub leaderboard_max_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            current_power_cap: None,
            leaderboard_default_limit: leaderboard::DEFAULT_LIMIT,
            leaderboard_max_limit: leaderboard::MAX_LIMIT,
        }
    }
}

/// Raw power levels per class, for box plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotData {
    pub data: PerClass<Vec<u32>>,
    pub labels: PerClass<String>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassComparison {
    pub class_statistics: PerClass<DescriptiveStats>,
    pub hypothesis_test: HypothesisTest<AnovaResult>,
    pub boxplot_data: BoxplotData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDistribution {
    pub label: String,
    pub bucket_width: f64,
    pub count: usize,
    pub histogram: Histogram,
}

impl MetricDistribution {
    fn from_stats(metric: Metric, stats: &DescriptiveStats) -> Self {
        Self {
            label: metric.label().to_string(),
            bucket_width: metric.bucket_width(),
            count: stats.count,
            histogram: stats.histogram.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub power_level: MetricDistribution,
    pub triumph_score: MetricDistribution,
    pub play_time: MetricDistribution,
    pub class_counts: PerClass<u64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTests {
    pub class_anova: HypothesisTest<AnovaResult>,
    pub light_triumph_correlation: HypothesisTest<CorrelationResult>,
    pub backend: String,
    pub backend_available: bool,
    pub generated_at: DateTime<Utc>,
}

/// Rank in every leaderboard category; `None` where the player has no value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryRanks {
    pub power_level: Option<UserRank>,
    pub triumph_score: Option<UserRank>,
    pub play_time: Option<UserRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub display_name: String,
    pub platform: String,
    pub character_count: usize,
    pub classes: Vec<ClassType>,
    pub position: PlayerPosition,
    pub badges: Vec<Badge>,
    pub radar: RadarChart,
    pub ranks: CategoryRanks,
    pub snapshot_updated: DateTime<Utc>,
}

/// Statistics engine shared by the HTTP handlers and the CLI.
pub struct StatsEngine {
    source: Arc<dyn RecordSource>,
    cache: SnapshotCache,
    backend: Arc<dyn StatsBackend>,
    settings: EngineSettings,
}

impl StatsEngine {
    pub fn new(
        source: Arc<dyn RecordSource>,
        cache: SnapshotCache,
        backend: Arc<dyn StatsBackend>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            source,
            cache,
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn load_records(&self) -> Result<(Vec<Player>, Vec<Character>), EngineError> {
        let players = self.source.players()?;
        let characters = self.source.characters()?;
        debug!(
            "Loaded {} players and {} characters",
            players.len(),
            characters.len()
        );
        Ok((players, characters))
    }

    fn compute_snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot, EngineError> {
        let (players, characters) = self.load_records()?;
        Ok(build_snapshot(&players, &characters, self.backend.as_ref(), now))
    }

    fn all_metrics(&self) -> Result<Vec<PlayerMetrics>, EngineError> {
        let (players, characters) = self.load_records()?;
        Ok(extract_metrics(&players, &characters))
    }

    fn find_metrics(&self, player_id: &PlayerId) -> Result<Option<PlayerMetrics>, EngineError> {
        Ok(self
            .all_metrics()?
            .into_iter()
            .find(|m| &m.player_id == player_id))
    }

    /// Current snapshot, recomputed first if stale.
    pub async fn get_snapshot(&self, now: DateTime<Utc>) -> Result<Arc<Snapshot>, EngineError> {
        self.cache
            .get_or_refresh(now, |now| self.compute_snapshot(now))
            .await
    }

    /// Recompute the snapshot regardless of its age.
    pub async fn refresh_snapshot(&self, now: DateTime<Utc>) -> Result<Arc<Snapshot>, EngineError> {
        info!("Forcing snapshot refresh");
        self.cache
            .refresh(now, |now| self.compute_snapshot(now))
            .await
    }

    pub async fn get_class_comparison(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ClassComparison, EngineError> {
        let snapshot = self.get_snapshot(now).await?;
        let characters = self.source.characters()?;
        let groups = class_power_levels(&characters);

        Ok(ClassComparison {
            class_statistics: snapshot.class_stats.clone(),
            hypothesis_test: class_anova(&groups, self.backend.as_ref(), now),
            boxplot_data: boxplot(&groups),
        })
    }

    /// Pearson correlation of power level and triumph score.
    pub fn get_correlation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HypothesisTest<CorrelationResult>, EngineError> {
        let pairs = correlation_pairs(&self.all_metrics()?);
        Ok(light_triumph_correlation(&pairs, self.backend.as_ref(), now))
    }

    pub async fn get_distribution(&self, now: DateTime<Utc>) -> Result<Distribution, EngineError> {
        let snapshot = self.get_snapshot(now).await?;
        let dist = |metric: Metric| MetricDistribution::from_stats(metric, snapshot.stats_for(metric));

        Ok(Distribution {
            power_level: dist(Metric::PowerLevel),
            triumph_score: dist(Metric::TriumphScore),
            play_time: dist(Metric::PlayTime),
            class_counts: snapshot.class_counts.clone(),
            last_updated: snapshot.last_updated,
        })
    }

    /// Both tests, each read from the current records.
    pub fn get_all_hypothesis_tests(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HypothesisTests, EngineError> {
        let (players, characters) = self.load_records()?;
        let metrics = extract_metrics(&players, &characters);
        let backend = self.backend.as_ref();

        Ok(HypothesisTests {
            class_anova: class_anova(&class_power_levels(&characters), backend, now),
            light_triumph_correlation: light_triumph_correlation(
                &correlation_pairs(&metrics),
                backend,
                now,
            ),
            backend: backend.name().to_string(),
            backend_available: backend.is_available(),
            generated_at: now,
        })
    }

    pub fn get_leaderboard(
        &self,
        category: Metric,
        limit: Option<u32>,
        player_id: Option<&PlayerId>,
    ) -> Result<Leaderboard, EngineError> {
        let limit = clamp_limit(
            limit,
            self.settings.leaderboard_default_limit,
            self.settings.leaderboard_max_limit,
        );
        let metrics = self.all_metrics()?;

        Ok(Leaderboard {
            category,
            entries: leaderboard::leaderboard(&metrics, category, limit),
            user_rank: player_id.and_then(|id| user_rank(&metrics, id, category)),
        })
    }

    pub fn badge_catalog(&self) -> Vec<Badge> {
        badge_catalog(self.settings.current_power_cap)
    }

    /// Badges earned by one player; `None` when the player is unknown.
    pub async fn compute_badges(
        &self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Badge>>, EngineError> {
        let Some(metrics) = self.find_metrics(player_id)? else {
            return Ok(None);
        };
        let snapshot = self.get_snapshot(now).await?;
        Ok(Some(compute_badges(
            &metrics,
            &snapshot,
            self.settings.current_power_cap,
        )))
    }

    pub async fn player_position(
        &self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Option<PlayerPosition>, EngineError> {
        let metrics = self.find_metrics(player_id)?;
        if metrics.is_none() {
            return Ok(None);
        }
        let snapshot = self.get_snapshot(now).await?;
        Ok(position(metrics.as_ref(), &snapshot))
    }

    pub async fn player_radar(
        &self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Option<RadarChart>, EngineError> {
        let Some(metrics) = self.find_metrics(player_id)? else {
            return Ok(None);
        };
        let snapshot = self.get_snapshot(now).await?;
        Ok(Some(radar(&metrics, &snapshot)))
    }

    /// Position, badges, radar and ranks for one player.
    pub async fn player_profile(
        &self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Option<PlayerProfile>, EngineError> {
        let all = self.all_metrics()?;
        let Some(metrics) = all.iter().find(|m| &m.player_id == player_id) else {
            return Ok(None);
        };
        let snapshot = self.get_snapshot(now).await?;
        let Some(pos) = position(Some(metrics), &snapshot) else {
            return Ok(None);
        };

        Ok(Some(PlayerProfile {
            player_id: metrics.player_id.clone(),
            display_name: metrics.display_name.clone(),
            platform: metrics.platform.clone(),
            character_count: metrics.character_count(),
            classes: metrics.class_set.iter().copied().collect(),
            position: pos,
            badges: compute_badges(metrics, &snapshot, self.settings.current_power_cap),
            radar: radar(metrics, &snapshot),
            ranks: CategoryRanks {
                power_level: user_rank(&all, player_id, Metric::PowerLevel),
                triumph_score: user_rank(&all, player_id, Metric::TriumphScore),
                play_time: user_rank(&all, player_id, Metric::PlayTime),
            },
            snapshot_updated: snapshot.last_updated,
        }))
    }
}

/// `(max_power_level, triumph_score)` for players with both above zero.
fn correlation_pairs(metrics: &[PlayerMetrics]) -> Vec<(u32, u32)> {
    metrics
        .iter()
        .filter(|m| m.max_power_level > 0 && m.triumph_score > 0)
        .map(|m| (m.max_power_level, m.triumph_score))
        .collect()
}

fn boxplot(groups: &PerClass<Vec<f64>>) -> BoxplotData {
    BoxplotData {
        data: groups.map(|_, values| values.iter().map(|v| *v as u32).collect()),
        labels: PerClass::from_fn(|class| class.to_string()),
        title: "Power level by class".to_string(),
        x_label: "Class".to_string(),
        y_label: "Power Level".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::{DisabledBackend, StatrsBackend};
    use crate::storage::MemoryRecordStore;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn player(id: &str, triumph: u32) -> Player {
        let mut p = Player::new(2, id, format!("Guardian {}", id), triumph);
        p.id = PlayerId::from(id);
        p
    }

    fn character(id: &str, class: ClassType, power: u32, minutes: u64) -> Character {
        Character::new(PlayerId::from(id), class, power, minutes)
    }

    fn population() -> (Vec<Player>, Vec<Character>) {
        let players = vec![
            player("a", 10000),
            player("b", 25000),
            player("c", 40000),
            player("d", 60000),
            player("e", 0),
        ];
        let characters = vec![
            character("a", ClassType::Titan, 1790, 600),
            character("a", ClassType::Hunter, 1780, 600),
            character("b", ClassType::Titan, 1800, 1800),
            character("b", ClassType::Warlock, 1805, 600),
            character("c", ClassType::Hunter, 1815, 3000),
            character("c", ClassType::Warlock, 1810, 1200),
            character("d", ClassType::Titan, 1830, 6000),
            character("d", ClassType::Hunter, 1825, 3000),
            character("d", ClassType::Warlock, 1828, 3000),
        ];
        (players, characters)
    }

    fn engine_with(backend: Arc<dyn StatsBackend>) -> (Arc<MemoryRecordStore>, StatsEngine) {
        let (players, characters) = population();
        let store = Arc::new(MemoryRecordStore::new(players, characters));
        let engine = StatsEngine::new(
            store.clone(),
            SnapshotCache::new(Duration::hours(1)),
            backend,
            EngineSettings {
                current_power_cap: Some(2010),
                ..EngineSettings::default()
            },
        );
        (store, engine)
    }

    fn engine() -> StatsEngine {
        engine_with(Arc::new(StatrsBackend)).1
    }

    #[tokio::test]
    async fn test_snapshot_cached_until_stale() {
        let (store, engine) = engine_with(Arc::new(StatrsBackend));
        let first = engine.get_snapshot(t0()).await.unwrap();
        assert_eq!(first.total_players, 5);
        assert_eq!(first.power_level.count, 4);

        store.replace(vec![player("z", 1)], vec![]).unwrap();

        let cached = engine.get_snapshot(t0() + Duration::minutes(10)).await.unwrap();
        assert_eq!(cached.total_players, 5);

        let refreshed = engine.get_snapshot(t0() + Duration::hours(2)).await.unwrap();
        assert_eq!(refreshed.total_players, 1);
    }

    #[tokio::test]
    async fn test_forced_refresh_ignores_ttl() {
        let (store, engine) = engine_with(Arc::new(StatrsBackend));
        engine.get_snapshot(t0()).await.unwrap();
        store.replace(vec![], vec![]).unwrap();

        let refreshed = engine.refresh_snapshot(t0()).await.unwrap();
        assert_eq!(refreshed.total_players, 0);
    }

    #[tokio::test]
    async fn test_class_comparison() {
        let comparison = engine().get_class_comparison(t0()).await.unwrap();
        assert_eq!(comparison.class_statistics.titan.count, 3);
        assert_eq!(comparison.boxplot_data.data.titan, vec![1790, 1800, 1830]);
        assert_eq!(comparison.boxplot_data.labels.warlock, "Warlock");

        let anova = comparison.hypothesis_test.completed().unwrap();
        assert_eq!(anova.statistics.df_between, 2);
        assert_eq!(anova.statistics.df_within, 6);
    }

    #[tokio::test]
    async fn test_class_comparison_insufficient_data() {
        let (store, engine) = engine_with(Arc::new(StatrsBackend));
        store.replace(
            vec![player("a", 1)],
            vec![
                character("a", ClassType::Titan, 1800, 0),
                character("a", ClassType::Titan, 1810, 0),
                character("a", ClassType::Hunter, 1800, 0),
            ],
        )
        .unwrap();
        let comparison = engine.get_class_comparison(t0()).await.unwrap();
        match comparison.hypothesis_test {
            HypothesisTest::InsufficientData(d) => {
                assert_eq!(d.deficient_groups, vec!["hunter", "warlock"]);
            }
            other => panic!("expected insufficient data, got {:?}", other),
        }
    }

    #[test]
    fn test_correlation_uses_players_with_both_metrics() {
        let result = engine().get_correlation(t0()).unwrap();
        let corr = result.completed().unwrap();
        assert_eq!(corr.generated_at, t0());
        // e has no characters and no triumph
        assert_eq!(corr.sample_size, 4);
        assert_eq!(corr.scatter_data.x.len(), 4);
        assert!(corr.statistics.correlation_coefficient > 0.0);
    }

    #[tokio::test]
    async fn test_distribution() {
        let dist = engine().get_distribution(t0()).await.unwrap();
        assert_eq!(dist.power_level.bucket_width, 10.0);
        assert_eq!(dist.power_level.histogram.values().sum::<u64>(), 4);
        assert_eq!(dist.triumph_score.count, 4);
        assert_eq!(dist.class_counts.titan, 3);
        assert_eq!(dist.class_counts.hunter, 3);
        assert_eq!(dist.class_counts.warlock, 3);
    }

    #[test]
    fn test_hypothesis_tests_backend_unavailable() {
        let (_, engine) = engine_with(Arc::new(DisabledBackend));
        let tests = engine.get_all_hypothesis_tests(t0()).unwrap();
        assert!(!tests.backend_available);
        assert_eq!(tests.backend, "none");
        assert!(matches!(tests.class_anova, HypothesisTest::Unavailable(_)));
        assert!(matches!(
            tests.light_triumph_correlation,
            HypothesisTest::Unavailable(_)
        ));
    }

    #[test]
    fn test_hypothesis_tests_stamped_with_caller_clock() {
        let tests = engine().get_all_hypothesis_tests(t0()).unwrap();
        assert_eq!(tests.generated_at, t0());
        assert_eq!(tests.light_triumph_correlation.completed().unwrap().generated_at, t0());
    }

    #[test]
    fn test_leaderboard_with_user_rank() {
        let board = engine()
            .get_leaderboard(Metric::TriumphScore, Some(2), Some(&PlayerId::from("a")))
            .unwrap();
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].player_id, PlayerId::from("d"));
        assert_eq!(board.entries[0].platform, "PlayStation");
        let rank = board.user_rank.unwrap();
        assert_eq!(rank.rank, 4);
        assert_eq!(rank.total, 4);
    }

    #[test]
    fn test_leaderboard_limit_clamped() {
        let board = engine()
            .get_leaderboard(Metric::PowerLevel, Some(0), None)
            .unwrap();
        assert_eq!(board.entries.len(), 1);
        assert!(board.user_rank.is_none());
    }

    #[test]
    fn test_badge_catalog_renders_power_cap() {
        let catalog = engine().badge_catalog();
        assert_eq!(catalog.len(), 7);
        assert!(catalog[0].description.contains("2010"));
    }

    #[tokio::test]
    async fn test_badges_for_unknown_player() {
        let engine = engine();
        assert!(engine
            .compute_badges(&PlayerId::from("nobody"), t0())
            .await
            .unwrap()
            .is_none());
        assert!(engine
            .player_profile(&PlayerId::from("nobody"), t0())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_player_without_characters_gets_no_badges() {
        let badges = engine()
            .compute_badges(&PlayerId::from("e"), t0())
            .await
            .unwrap()
            .unwrap();
        assert!(badges.is_empty());
    }

    #[tokio::test]
    async fn test_player_profile() {
        let engine = engine();
        let profile = engine
            .player_profile(&PlayerId::from("d"), t0())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.character_count, 3);
        assert_eq!(profile.classes.len(), 3);
        assert!(profile.position.power_level.z_score > 0.0);
        assert_eq!(profile.ranks.power_level.unwrap().rank, 1);
        assert_eq!(profile.ranks.triumph_score.unwrap().rank, 1);
        assert_eq!(profile.radar.class_diversity, 100.0);

        let ids: Vec<&str> = profile.badges.iter().map(|b| b.id.as_str()).collect();
        assert!(ids.contains(&"trinity"));
        assert!(ids.contains(&"balanced"));

        let position = engine
            .player_position(&PlayerId::from("d"), t0())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position, profile.position);

        let radar = engine
            .player_radar(&PlayerId::from("d"), t0())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(radar, profile.radar);
    }
}
