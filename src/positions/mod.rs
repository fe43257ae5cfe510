//! Durable per-video playback bookmarks backing resume-on-reopen.

use chrono::{TimeDelta, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PARTIAL_WATCH_THRESHOLD_SECS;
use crate::errors::AppError;
use crate::storage::{keys, KeyValueStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub video_id: String,
    /// Seconds into the video.
    pub position: f64,
    /// Total seconds; 0 means the player has not reported a duration yet.
    pub duration: f64,
    /// Unix seconds of the last save.
    pub last_updated: i64,
}

impl PlaybackPosition {
    /// At least the threshold in, and not within the threshold of the end.
    pub fn is_partially_watched(&self) -> bool {
        self.position > PARTIAL_WATCH_THRESHOLD_SECS
            && self.position < self.duration - PARTIAL_WATCH_THRESHOLD_SECS
    }

    pub fn watch_progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn formatted_position(&self) -> String {
        format_time(self.position)
    }

    pub fn formatted_duration(&self) -> String {
        format_time(self.duration)
    }
}

/// `h:mm:ss`, or `m:ss` under an hour.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Keyed map of the last known playback offset per video. One record per
/// identifier; writes overwrite in place, last-write-wins.
pub struct PlaybackPositionStore {
    positions: Arc<RwLock<HashMap<String, PlaybackPosition>>>,
    kv: Arc<dyn KeyValueStore>,
}

impl PlaybackPositionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            positions: Arc::new(RwLock::new(HashMap::new())),
            kv,
        }
    }

    pub async fn load(&self) {
        match self.kv.load(keys::POSITIONS).await {
            Ok(Some(blob)) => match Self::decode(&blob) {
                Ok(positions) => {
                    log::info!("Loaded {} playback positions", positions.len());
                    *self.positions.write() = positions;
                }
                Err(e) => log::warn!("Discarding undecodable playback positions: {}", e),
            },
            Ok(None) => log::debug!("No saved playback positions found"),
            Err(e) => log::warn!("Failed to load playback positions: {}", e),
        }
    }

    /// Overwrite-in-place upsert. Non-finite or negative reports (an unready
    /// player, for example) are ignored rather than corrupting the record.
    pub async fn save_position(&self, video_id: &str, position: f64, duration: f64) {
        if !position.is_finite() || !duration.is_finite() || position < 0.0 || duration < 0.0 {
            log::warn!(
                "Ignoring invalid position report for {}: {}/{}",
                video_id,
                position,
                duration
            );
            return;
        }

        log::debug!(
            "Saving playback position for {}: {:.1}/{:.1}s",
            video_id,
            position,
            duration
        );

        self.positions.write().insert(
            video_id.to_string(),
            PlaybackPosition {
                video_id: video_id.to_string(),
                position,
                duration,
                last_updated: Utc::now().timestamp(),
            },
        );

        self.persist().await;
    }

    pub fn get_position(&self, video_id: &str) -> Option<PlaybackPosition> {
        self.positions.read().get(video_id).cloned()
    }

    pub fn has_position(&self, video_id: &str) -> bool {
        self.positions.read().contains_key(video_id)
    }

    pub fn is_partially_watched(&self, video_id: &str) -> bool {
        self.positions
            .read()
            .get(video_id)
            .map_or(false, |p| p.is_partially_watched())
    }

    pub fn watch_progress(&self, video_id: &str) -> f64 {
        self.positions
            .read()
            .get(video_id)
            .map_or(0.0, |p| p.watch_progress())
    }

    /// Explicit deletion, used by "restart from beginning".
    pub async fn clear_position(&self, video_id: &str) {
        let removed = self.positions.write().remove(video_id).is_some();
        if removed {
            log::info!("Cleared playback position for {}", video_id);
            self.persist().await;
        }
    }

    /// Batch-delete records whose last save predates the cutoff. Runs
    /// opportunistically (app startup), not on a schedule. Returns the
    /// number of pruned records.
    pub async fn prune_older_than(&self, days: i64) -> usize {
        let cutoff = (Utc::now() - TimeDelta::days(days)).timestamp();

        let pruned = {
            let mut positions = self.positions.write();
            let before = positions.len();
            positions.retain(|_, p| p.last_updated > cutoff);
            before - positions.len()
        };

        if pruned > 0 {
            log::info!("Pruned {} stale playback positions", pruned);
            self.persist().await;
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }

    fn encode(&self) -> Result<String, AppError> {
        let positions = self.positions.read();
        serde_json::to_string(&*positions).map_err(Into::into)
    }

    fn decode(blob: &str) -> Result<HashMap<String, PlaybackPosition>, AppError> {
        serde_json::from_str(blob).map_err(Into::into)
    }

    // Persistence failures degrade to in-memory-only state; they never block
    // the caller.
    async fn persist(&self) {
        let blob = match self.encode() {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("Failed to encode playback positions: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.save(keys::POSITIONS, &blob).await {
            log::warn!("Failed to persist playback positions: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn store() -> (PlaybackPositionStore, Arc<dyn KeyValueStore>) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        (PlaybackPositionStore::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let (store, _) = store();
        store.save_position("abc123", 42.5, 300.0).await;

        let record = store.get_position("abc123").expect("record saved");
        assert!((record.position - 42.5).abs() < f64::EPSILON);
        assert!((record.duration - 300.0).abs() < f64::EPSILON);
        assert!((record.watch_progress() - 0.1417).abs() < 0.001);
        assert!(store.has_position("abc123"));
    }

    #[tokio::test]
    async fn overwrites_in_place_without_duplicates() {
        let (store, _) = store();
        store.save_position("abc123", 10.0, 300.0).await;
        store.save_position("abc123", 99.0, 300.0).await;

        assert_eq!(store.len(), 1);
        let record = store.get_position("abc123").unwrap();
        assert!((record.position - 99.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn rejects_invalid_reports() {
        let (store, _) = store();
        store.save_position("abc123", f64::NAN, 300.0).await;
        store.save_position("abc123", -1.0, 300.0).await;
        store.save_position("abc123", 5.0, f64::INFINITY).await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let (store, _) = store();
        store.save_position("abc123", 42.5, 300.0).await;
        store.clear_position("abc123").await;

        assert!(store.get_position("abc123").is_none());
        assert!(!store.has_position("abc123"));
    }

    #[tokio::test]
    async fn prunes_only_stale_records() {
        let (store, _) = store();
        store.save_position("fresh", 10.0, 100.0).await;
        store.save_position("stale", 20.0, 100.0).await;
        store
            .positions
            .write()
            .get_mut("stale")
            .unwrap()
            .last_updated = (Utc::now() - TimeDelta::days(45)).timestamp();

        let pruned = store.prune_older_than(30).await;

        assert_eq!(pruned, 1);
        assert!(store.has_position("fresh"));
        assert!(!store.has_position("stale"));
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let (store, kv) = store();
        store.save_position("abc123", 42.5, 300.0).await;

        let reopened = PlaybackPositionStore::new(kv);
        reopened.load().await;

        let record = reopened.get_position("abc123").expect("persisted record");
        assert!((record.position - 42.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn undecodable_blob_is_treated_as_absent() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        kv.save(keys::POSITIONS, "not json").await.unwrap();

        let store = PlaybackPositionStore::new(kv);
        store.load().await;

        assert!(store.is_empty());
    }

    #[test]
    fn partial_watch_thresholds_apply_at_both_ends() {
        let record = |position: f64, duration: f64| PlaybackPosition {
            video_id: "v".to_string(),
            position,
            duration,
            last_updated: 0,
        };

        assert!(record(120.0, 600.0).is_partially_watched());
        assert!(!record(10.0, 600.0).is_partially_watched());
        assert!(!record(590.0, 600.0).is_partially_watched());
        assert!(!record(42.5, 0.0).is_partially_watched());
    }

    #[test]
    fn formats_times_with_and_without_hours() {
        assert_eq!(format_time(42.5), "0:42");
        assert_eq!(format_time(253.0), "4:13");
        assert_eq!(format_time(3723.0), "1:02:03");
        assert_eq!(format_time(-5.0), "0:00");
    }
}
