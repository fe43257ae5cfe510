use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const OEMBED_URL: &str = "https://www.youtube.com/oembed";

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
pub const MAX_VIDEOS_PER_CHANNEL: u32 = 50;
pub const MAX_CHANNEL_SEARCH_RESULTS: u32 = 10;

pub const CLIPBOARD_POLL_INTERVAL_MS: u64 = 1000;
/// Position reports are persisted at most this often during playback.
pub const POSITION_SAVE_INTERVAL_SECS: u64 = 5;
/// Positions untouched for this long are pruned on startup.
pub const POSITION_RETENTION_DAYS: i64 = 30;
/// Seconds a video must be into playback (and short of the end) to count as
/// partially watched.
pub const PARTIAL_WATCH_THRESHOLD_SECS: f64 = 30.0;

pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const OEMBED_TIMEOUT_SECONDS: u64 = 5;

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubedeck")
}

pub fn database_path() -> PathBuf {
    data_dir().join("tubedeck.db")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: String,
    pub lookback_days: u32,
    pub max_videos_per_channel: u32,
    pub max_channel_search_results: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TUBEDECK_YOUTUBE_API_KEY").unwrap_or_default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_videos_per_channel: MAX_VIDEOS_PER_CHANNEL,
            max_channel_search_results: MAX_CHANNEL_SEARCH_RESULTS,
        }
    }
}

impl AppConfig {
    pub fn is_api_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
