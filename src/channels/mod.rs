pub mod models;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::errors::AppError;
use crate::storage::{keys, KeyValueStore};
use crate::youtube::YouTubeClient;
use models::{Channel, ChannelVideo, MAX_LOOKBACK_DAYS, MIN_LOOKBACK_DAYS};

/// Subscribed channels plus their per-channel video partitions. The two
/// collections persist under separate keys; cross-references are by id only.
pub struct ChannelsStore {
    channels: Arc<RwLock<Vec<Channel>>>,
    channel_videos: Arc<RwLock<HashMap<String, Vec<ChannelVideo>>>>,
    kv: Arc<dyn KeyValueStore>,
    youtube: Arc<YouTubeClient>,
    max_videos_per_channel: u32,
}

impl ChannelsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, youtube: Arc<YouTubeClient>) -> Self {
        Self {
            channels: Arc::new(RwLock::new(Vec::new())),
            channel_videos: Arc::new(RwLock::new(HashMap::new())),
            kv,
            youtube,
            max_videos_per_channel: crate::config::MAX_VIDEOS_PER_CHANNEL,
        }
    }

    pub async fn load(&self) {
        *self.channels.write() = Self::load_blob(&self.kv, keys::CHANNELS).await;
        *self.channel_videos.write() = Self::load_blob(&self.kv, keys::CHANNEL_VIDEOS).await;
        log::info!("Loaded {} subscribed channels", self.channels.read().len());
    }

    async fn load_blob<T: serde::de::DeserializeOwned + Default>(
        kv: &Arc<dyn KeyValueStore>,
        key: &str,
    ) -> T {
        match kv.load(key).await {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Discarding undecodable '{}' blob: {}", key, e);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                log::warn!("Failed to load '{}': {}", key, e);
                T::default()
            }
        }
    }

    // Channel management

    /// Subscribe a channel. A duplicate id is rejected as a channel error.
    pub async fn add_channel(&self, channel: Channel) -> Result<(), AppError> {
        {
            let mut channels = self.channels.write();
            if channels.iter().any(|c| c.id == channel.id) {
                return Err(AppError::Channel(format!(
                    "Channel '{}' is already added",
                    channel.name
                )));
            }
            log::info!("Adding channel: {} ({})", channel.name, channel.id);
            channels.insert(0, channel);
        }
        self.persist_channels().await;
        Ok(())
    }

    /// Unsubscribe, dropping the channel's video partition with it.
    pub async fn remove_channel(&self, channel_id: &str) {
        {
            let mut channels = self.channels.write();
            channels.retain(|c| c.id != channel_id);
        }
        self.channel_videos.write().remove(channel_id);
        self.persist_channels().await;
        self.persist_videos().await;
        log::info!("Removed channel {}", channel_id);
    }

    pub async fn update_channel(&self, channel: Channel) {
        let updated = {
            let mut channels = self.channels.write();
            match channels.iter_mut().find(|c| c.id == channel.id) {
                Some(slot) => {
                    *slot = channel;
                    slot.last_updated = Utc::now().timestamp();
                    true
                }
                None => false,
            }
        };
        if updated {
            self.persist_channels().await;
        }
    }

    pub async fn toggle_channel_active(&self, channel_id: &str) {
        let toggled = {
            let mut channels = self.channels.write();
            match channels.iter_mut().find(|c| c.id == channel_id) {
                Some(channel) => {
                    channel.is_active = !channel.is_active;
                    true
                }
                None => false,
            }
        };
        if toggled {
            self.persist_channels().await;
        }
    }

    /// Change a channel's lookback window, clamped to the supported range.
    /// Returns the updated channel so the caller can refresh its videos.
    pub async fn update_channel_lookback(&self, channel_id: &str, days: u32) -> Option<Channel> {
        let days = days.clamp(MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS);
        let updated = {
            let mut channels = self.channels.write();
            match channels.iter_mut().find(|c| c.id == channel_id) {
                Some(channel) => {
                    channel.lookback_days = days;
                    channel.last_updated = Utc::now().timestamp();
                    Some(channel.clone())
                }
                None => None,
            }
        };
        if updated.is_some() {
            self.persist_channels().await;
        }
        updated
    }

    // Video management

    /// Idempotent: a second mark leaves the original watched-at timestamp.
    pub async fn mark_video_watched(&self, video_id: &str) {
        let newly_marked = {
            let mut partitions = self.channel_videos.write();
            let mut marked = false;
            for videos in partitions.values_mut() {
                if let Some(video) = videos.iter_mut().find(|v| v.id == video_id) {
                    if !video.is_watched {
                        video.is_watched = true;
                        video.watched_at = Some(Utc::now().timestamp());
                        marked = true;
                    }
                    break;
                }
            }
            marked
        };

        if newly_marked {
            log::info!("Marked video as watched: {}", video_id);
            self.persist_videos().await;
        }
    }

    pub fn unwatched_count(&self, channel_id: &str) -> usize {
        self.channel_videos
            .read()
            .get(channel_id)
            .map_or(0, |videos| videos.iter().filter(|v| !v.is_watched).count())
    }

    pub fn total_unwatched_count(&self) -> usize {
        self.channel_videos
            .read()
            .values()
            .flatten()
            .filter(|v| !v.is_watched)
            .count()
    }

    /// Every unwatched video across all channels, newest first.
    pub fn all_unwatched_videos(&self) -> Vec<ChannelVideo> {
        let mut unwatched: Vec<ChannelVideo> = self
            .channel_videos
            .read()
            .values()
            .flatten()
            .filter(|v| !v.is_watched)
            .cloned()
            .collect();
        unwatched.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        unwatched
    }

    pub fn videos_for_channel(&self, channel_id: &str) -> Vec<ChannelVideo> {
        self.channel_videos
            .read()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn channel_by_id(&self, channel_id: &str) -> Option<Channel> {
        self.channels
            .read()
            .iter()
            .find(|c| c.id == channel_id)
            .cloned()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.channels.read().clone()
    }

    pub async fn clear_all_channels(&self) {
        self.channels.write().clear();
        self.channel_videos.write().clear();
        self.persist_channels().await;
        self.persist_videos().await;
        log::info!("All channels cleared");
    }

    pub async fn clear_all_channel_videos(&self) {
        self.channel_videos.write().clear();
        self.persist_videos().await;
        log::info!("All channel videos cleared");
    }

    // Data fetching

    /// Fetch recent videos for one channel through the YouTube client,
    /// honoring its lookback window. The fetched list replaces the stored
    /// partition; watched flags carry over for video ids seen before.
    /// Network failures propagate to the caller; there is no retry.
    pub async fn refresh_channel(&self, channel_id: &str) -> Result<usize, AppError> {
        let channel = self
            .channel_by_id(channel_id)
            .ok_or_else(|| AppError::Channel(format!("Unknown channel: {}", channel_id)))?;

        log::info!("Refreshing videos for channel: {}", channel.name);

        let mut videos = self
            .youtube
            .channel_videos(
                &channel.id,
                channel.lookback_days,
                self.max_videos_per_channel,
            )
            .await?;

        {
            let mut partitions = self.channel_videos.write();
            if let Some(previous) = partitions.get(&channel.id) {
                for video in videos.iter_mut() {
                    if let Some(old) = previous.iter().find(|v| v.id == video.id) {
                        video.is_watched = old.is_watched;
                        video.watched_at = old.watched_at;
                    }
                }
            }
            partitions.insert(channel.id.clone(), videos);
        }
        self.persist_videos().await;

        let count = self.videos_for_channel(&channel.id).len();
        log::info!("Stored {} videos for channel {}", count, channel.name);
        Ok(count)
    }

    /// Refresh every active channel, in order. The first failure ends the
    /// run. Returns the total video count fetched.
    pub async fn refresh_all_channels(&self) -> Result<usize, AppError> {
        let active: Vec<Channel> = self
            .channels
            .read()
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();

        log::info!("Refreshing {} active channels", active.len());

        let mut total = 0;
        for channel in active {
            total += self.refresh_channel(&channel.id).await?;
        }
        Ok(total)
    }

    // Persistence; failures degrade to in-memory-only state.

    async fn persist_channels(&self) {
        let blob = {
            let channels = self.channels.read();
            match serde_json::to_string(&*channels) {
                Ok(blob) => blob,
                Err(e) => {
                    log::warn!("Failed to encode channels: {}", e);
                    return;
                }
            }
        };
        if let Err(e) = self.kv.save(keys::CHANNELS, &blob).await {
            log::warn!("Failed to persist channels: {}", e);
        }
    }

    async fn persist_videos(&self) {
        let blob = {
            let partitions = self.channel_videos.read();
            match serde_json::to_string(&*partitions) {
                Ok(blob) => blob,
                Err(e) => {
                    log::warn!("Failed to encode channel videos: {}", e);
                    return;
                }
            }
        };
        if let Err(e) = self.kv.save(keys::CHANNEL_VIDEOS, &blob).await {
            log::warn!("Failed to persist channel videos: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::MemoryKeyValueStore;

    fn store() -> (ChannelsStore, Arc<dyn KeyValueStore>) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let youtube = Arc::new(YouTubeClient::new(&AppConfig::default()).unwrap());
        (ChannelsStore::new(kv.clone(), youtube), kv)
    }

    fn video(id: &str, channel_id: &str, published_at: i64) -> ChannelVideo {
        ChannelVideo {
            id: id.to_string(),
            title: format!("Video {}", id),
            channel_id: channel_id.to_string(),
            channel_name: "Test Channel".to_string(),
            published_at,
            thumbnail_url: None,
            duration: None,
            view_count: None,
            is_watched: false,
            watched_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_channels_are_rejected() {
        let (store, _) = store();
        store.add_channel(Channel::new("UC1", "First")).await.unwrap();

        let err = store
            .add_channel(Channel::new("UC1", "First"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Channel(_)));
        assert_eq!(store.channels().len(), 1);
    }

    #[tokio::test]
    async fn removing_a_channel_drops_its_videos() {
        let (store, _) = store();
        store.add_channel(Channel::new("UC1", "First")).await.unwrap();
        store
            .channel_videos
            .write()
            .insert("UC1".to_string(), vec![video("v1", "UC1", 100)]);

        store.remove_channel("UC1").await;

        assert!(store.channel_by_id("UC1").is_none());
        assert!(store.videos_for_channel("UC1").is_empty());
    }

    #[tokio::test]
    async fn lookback_updates_are_clamped() {
        let (store, _) = store();
        store.add_channel(Channel::new("UC1", "First")).await.unwrap();

        let updated = store.update_channel_lookback("UC1", 90).await.unwrap();
        assert_eq!(updated.lookback_days, MAX_LOOKBACK_DAYS);

        let updated = store.update_channel_lookback("UC1", 0).await.unwrap();
        assert_eq!(updated.lookback_days, MIN_LOOKBACK_DAYS);

        assert!(store.update_channel_lookback("ghost", 7).await.is_none());
    }

    #[tokio::test]
    async fn marking_watched_is_idempotent() {
        let (store, _) = store();
        store
            .channel_videos
            .write()
            .insert("UC1".to_string(), vec![video("v1", "UC1", 100)]);

        store.mark_video_watched("v1").await;
        let first_watched_at = store.videos_for_channel("UC1")[0].watched_at;
        assert!(first_watched_at.is_some());

        store.mark_video_watched("v1").await;
        assert_eq!(store.videos_for_channel("UC1")[0].watched_at, first_watched_at);
    }

    #[tokio::test]
    async fn unwatched_queries_span_channels_newest_first() {
        let (store, _) = store();
        {
            let mut partitions = store.channel_videos.write();
            partitions.insert(
                "UC1".to_string(),
                vec![video("v1", "UC1", 100), video("v2", "UC1", 300)],
            );
            partitions.insert("UC2".to_string(), vec![video("v3", "UC2", 200)]);
        }
        store.mark_video_watched("v1").await;

        assert_eq!(store.unwatched_count("UC1"), 1);
        assert_eq!(store.total_unwatched_count(), 2);

        let unwatched = store.all_unwatched_videos();
        let ids: Vec<&str> = unwatched.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v3"]);
    }

    #[tokio::test]
    async fn toggling_active_flips_the_flag() {
        let (store, _) = store();
        store.add_channel(Channel::new("UC1", "First")).await.unwrap();

        store.toggle_channel_active("UC1").await;
        assert!(!store.channel_by_id("UC1").unwrap().is_active);

        store.toggle_channel_active("UC1").await;
        assert!(store.channel_by_id("UC1").unwrap().is_active);
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let (store, kv) = store();
        store.add_channel(Channel::new("UC1", "First")).await.unwrap();
        store
            .channel_videos
            .write()
            .insert("UC1".to_string(), vec![video("v1", "UC1", 100)]);
        store.persist_videos().await;

        let youtube = Arc::new(YouTubeClient::new(&AppConfig::default()).unwrap());
        let reopened = ChannelsStore::new(kv, youtube);
        reopened.load().await;

        assert_eq!(reopened.channels().len(), 1);
        assert_eq!(reopened.videos_for_channel("UC1").len(), 1);
    }
}
