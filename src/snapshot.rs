//! Population snapshot: computation, caching and persistence.
//!
//! The snapshot is replaced as a whole behind an `Arc`, so readers never
//! observe a half-updated aggregate. Refreshes are single-flight: callers that
//! find the snapshot stale queue on one mutex and re-check staleness once they
//! hold it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::calculate::class_stats::class_statistics;
use crate::calculate::descriptive::describe_metric;
use crate::calculate::metrics::{class_counts, extract_metrics, metric_values};
use crate::calculate::StatsBackend;
use crate::models::{Character, Metric, Player, Snapshot};
use crate::storage::StorageError;

/// Compute a fresh snapshot from raw records.
pub fn build_snapshot(
    players: &[Player],
    characters: &[Character],
    backend: &dyn StatsBackend,
    now: DateTime<Utc>,
) -> Snapshot {
    let metrics = extract_metrics(players, characters);
    let describe = |metric: Metric| describe_metric(&metric_values(&metrics, metric), metric, backend);

    Snapshot {
        power_level: describe(Metric::PowerLevel),
        triumph_score: describe(Metric::TriumphScore),
        play_time: describe(Metric::PlayTime),
        class_stats: class_statistics(characters, backend),
        class_counts: class_counts(characters),
        total_players: players.len() as u64,
        total_characters: characters.len() as u64,
        last_updated: now,
    }
}

/// Read a persisted snapshot. A missing file is not an error.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write a snapshot through a temp file and rename it into place.
pub fn persist_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
    fs::rename(&tmp, path)?;
    debug!("Persisted snapshot to {:?}", path);
    Ok(())
}

/// TTL-bound holder for the current snapshot.
pub struct SnapshotCache {
    ttl: Duration,
    current: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
    persist_path: Option<PathBuf>,
}

impl SnapshotCache {
    /// In-memory cache, starting empty.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            persist_path: None,
        }
    }

    /// Cache backed by a snapshot file, seeded from it when present.
    ///
    /// An unreadable file is logged and ignored.
    pub fn with_persistence(ttl: Duration, path: PathBuf) -> Self {
        let initial = match load_snapshot(&path) {
            Ok(Some(snapshot)) => {
                info!(
                    "Loaded snapshot from {:?} (last updated {})",
                    path, snapshot.last_updated
                );
                Some(Arc::new(snapshot))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable snapshot {:?}: {}", path, e);
                None
            }
        };

        Self {
            ttl,
            current: RwLock::new(initial),
            refresh_lock: Mutex::new(()),
            persist_path: Some(path),
        }
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    /// True when no snapshot exists or it is older than the TTL.
    pub async fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.current.read().await.as_ref() {
            Some(snapshot) => snapshot.is_stale(now, self.ttl),
            None => true,
        }
    }

    /// Recompute unconditionally and swap the result in.
    pub async fn refresh<F, E>(&self, now: DateTime<Utc>, compute: F) -> Result<Arc<Snapshot>, E>
    where
        F: FnOnce(DateTime<Utc>) -> Result<Snapshot, E>,
    {
        let _guard = self.refresh_lock.lock().await;
        self.recompute(now, compute).await
    }

    /// Return the current snapshot, recomputing it first when stale.
    pub async fn get_or_refresh<F, E>(
        &self,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<Arc<Snapshot>, E>
    where
        F: FnOnce(DateTime<Utc>) -> Result<Snapshot, E>,
    {
        if let Some(snapshot) = self.fresh(now).await {
            return Ok(snapshot);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh(now).await {
            debug!("Snapshot refreshed by a concurrent caller");
            return Ok(snapshot);
        }

        self.recompute(now, compute).await
    }

    async fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_stale(now, self.ttl))
            .cloned()
    }

    /// Caller must hold `refresh_lock`.
    async fn recompute<F, E>(&self, now: DateTime<Utc>, compute: F) -> Result<Arc<Snapshot>, E>
    where
        F: FnOnce(DateTime<Utc>) -> Result<Snapshot, E>,
    {
        let snapshot = Arc::new(compute(now)?);

        if let Some(path) = &self.persist_path {
            if let Err(e) = persist_snapshot(path, &snapshot) {
                warn!("Failed to persist snapshot to {:?}: {}", path, e);
            }
        }

        *self.current.write().await = Some(Arc::clone(&snapshot));
        info!(
            "Snapshot refreshed: {} players, {} characters",
            snapshot.total_players, snapshot.total_characters
        );
        Ok(snapshot)
    }
}
