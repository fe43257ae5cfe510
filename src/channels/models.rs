use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_LOOKBACK_DAYS;

/// Bounds for a channel's trailing fetch window, in days.
pub const MIN_LOOKBACK_DAYS: u32 = 1;
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// A subscribed channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// `@channelhandle`, when known.
    pub handle: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Display form, K/M-suffixed.
    pub subscriber_count: Option<String>,
    pub description: Option<String>,
    /// Unix seconds.
    pub date_added: i64,
    pub last_updated: i64,
    /// Trailing day window for video fetches, clamped to 1..=30.
    pub lookback_days: u32,
    /// Inactive channels are skipped by refreshes.
    pub is_active: bool,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: id.into(),
            name: name.into(),
            handle: None,
            thumbnail_url: None,
            subscriber_count: None,
            description: None,
            date_added: now,
            last_updated: now,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            is_active: true,
        }
    }
}

/// One video in a channel's recent-uploads partition. Video ids are globally
/// unique (they are YouTube video ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelVideo {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_name: String,
    /// Unix seconds.
    pub published_at: i64,
    pub thumbnail_url: Option<String>,
    /// Display form, `h:mm:ss`.
    pub duration: Option<String>,
    /// Display form, K/M-suffixed.
    pub view_count: Option<String>,
    pub is_watched: bool,
    /// Unix seconds of the first watch, once marked.
    pub watched_at: Option<i64>,
}
