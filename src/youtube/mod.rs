//! YouTube Data API v3 client. The wire contract is fixed and external;
//! failures propagate as typed errors with no automatic retry.

pub mod error;
pub mod format;
pub mod models;

pub use error::YouTubeError;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::channels::models::{Channel, ChannelVideo};
use crate::config::{AppConfig, REQUEST_TIMEOUT_SECONDS, YOUTUBE_API_BASE_URL};
use models::*;

pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_search_results: u32,
}

impl YouTubeClient {
    pub fn new(config: &AppConfig) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            client,
            base_url: YOUTUBE_API_BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            max_search_results: config.max_channel_search_results,
        })
    }

    fn ensure_api_key(&self) -> Result<(), YouTubeError> {
        if self.api_key.is_empty() {
            return Err(YouTubeError::ApiKeyMissing);
        }
        Ok(())
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, YouTubeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(YouTubeError::QuotaExceeded);
        }
        log::warn!("YouTube API request failed: HTTP {}", status);
        Err(YouTubeError::InvalidResponse(format!("HTTP {}", status)))
    }

    // Channel methods

    pub async fn search_channels(&self, name: &str) -> Result<Vec<Channel>, YouTubeError> {
        self.ensure_api_key()?;

        log::info!("Searching channels matching '{}'", name);

        let url = format!("{}/search", self.base_url);
        let max_results = self.max_search_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "channel"),
                ("q", name),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response)?;

        let parsed: ChannelSearchResponse = response
            .json()
            .await
            .map_err(|e| YouTubeError::InvalidResponse(e.to_string()))?;

        log::info!("Found {} channels for '{}'", parsed.items.len(), name);

        Ok(parsed
            .items
            .into_iter()
            .map(|item| channel_from_snippet(item.id.channel_id, item.snippet, None))
            .collect())
    }

    pub async fn channel_by_id(&self, channel_id: &str) -> Result<Channel, YouTubeError> {
        self.ensure_api_key()?;

        let url = format!("{}/channels", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet,statistics"),
                ("id", channel_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response)?;

        let parsed: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| YouTubeError::InvalidResponse(e.to_string()))?;

        let item = parsed
            .items
            .into_iter()
            .next()
            .ok_or(YouTubeError::ChannelNotFound)?;

        Ok(channel_from_snippet(item.id, item.snippet, item.statistics))
    }

    /// Resolve any channel URL: `/channel/UC...` carries the id directly;
    /// handle, custom and legacy user URLs go through search, taking the
    /// most relevant hit.
    pub async fn channel_from_url(&self, url: &str) -> Result<Channel, YouTubeError> {
        if let Some(channel_id) = extract_channel_id(url) {
            return self.channel_by_id(&channel_id).await;
        }

        let query = extract_channel_query(url).ok_or(YouTubeError::UnsupportedUrlFormat)?;
        log::info!("Resolving channel URL via search: '{}'", query);

        self.search_channels(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(YouTubeError::ChannelNotFound)
    }

    // Video methods

    /// Recent uploads for a channel within the trailing lookback window,
    /// enriched with durations and view counts from a batch details lookup.
    pub async fn channel_videos(
        &self,
        channel_id: &str,
        lookback_days: u32,
        max_results: u32,
    ) -> Result<Vec<ChannelVideo>, YouTubeError> {
        self.ensure_api_key()?;

        let published_after = (Utc::now() - TimeDelta::days(lookback_days as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        log::info!(
            "Fetching videos for channel {} published after {}",
            channel_id,
            published_after
        );

        let url = format!("{}/search", self.base_url);
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("type", "video"),
                ("order", "date"),
                ("publishedAfter", published_after.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response)?;

        let parsed: VideoSearchResponse = response
            .json()
            .await
            .map_err(|e| YouTubeError::InvalidResponse(e.to_string()))?;

        let video_ids: Vec<String> = parsed
            .items
            .iter()
            .map(|item| item.id.video_id.clone())
            .collect();
        let details = self.video_details(&video_ids).await?;

        let videos = parsed
            .items
            .into_iter()
            .map(|item| {
                let detail = details.iter().find(|d| d.id == item.id.video_id);

                let duration = detail
                    .and_then(|d| d.content_details.as_ref())
                    .map(|c| format::format_duration(&c.duration));
                let view_count = detail
                    .and_then(|d| d.statistics.as_ref())
                    .and_then(|s| s.view_count.as_deref())
                    .map(format::format_view_count);

                ChannelVideo {
                    id: item.id.video_id,
                    title: item.snippet.title,
                    channel_id: item.snippet.channel_id,
                    channel_name: item.snippet.channel_title,
                    published_at: parse_published_at(&item.snippet.published_at),
                    thumbnail_url: item.snippet.thumbnails.medium.map(|t| t.url),
                    duration,
                    view_count,
                    is_watched: false,
                    watched_at: None,
                }
            })
            .collect();

        Ok(videos)
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoItem>, YouTubeError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/videos", self.base_url);
        let ids = video_ids.join(",");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "contentDetails,statistics"),
                ("id", ids.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response)?;

        let parsed: VideoListResponse = response
            .json()
            .await
            .map_err(|e| YouTubeError::InvalidResponse(e.to_string()))?;

        Ok(parsed.items)
    }
}

fn channel_from_snippet(
    id: String,
    snippet: ChannelSnippet,
    statistics: Option<ChannelStatistics>,
) -> Channel {
    let mut channel = Channel::new(id, snippet.title);
    channel.handle = snippet
        .custom_url
        .map(|url| format!("@{}", url.trim_start_matches('@')));
    channel.thumbnail_url = snippet.thumbnails.medium.map(|t| t.url);
    channel.subscriber_count = statistics
        .and_then(|s| s.subscriber_count)
        .map(|count| format::format_subscriber_count(&count));
    channel.description = Some(snippet.description);
    channel
}

fn parse_published_at(raw: &str) -> i64 {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.timestamp())
        .unwrap_or_else(|_| Utc::now().timestamp())
}

/// `/channel/UC...` URLs carry the channel id directly.
fn extract_channel_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/channel/")?;
    let id = rest
        .split(['/', '?'])
        .next()
        .unwrap_or_default()
        .to_string();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Extract the search query from handle (`/@name`), custom (`/c/Name`) and
/// legacy (`/user/Name`) channel URLs.
fn extract_channel_query(url: &str) -> Option<String> {
    let clean = url.split('?').next().unwrap_or(url);
    for marker in ["/@", "/c/", "/user/"] {
        if let Some((_, rest)) = clean.split_once(marker) {
            let name = rest.split('/').next().unwrap_or_default();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_direct_channel_ids() {
        assert_eq!(
            extract_channel_id("https://youtube.com/channel/UCabc123/videos"),
            Some("UCabc123".to_string())
        );
        assert_eq!(
            extract_channel_id("https://youtube.com/channel/UCabc123?view=0"),
            Some("UCabc123".to_string())
        );
        assert_eq!(extract_channel_id("https://youtube.com/@handle"), None);
        assert_eq!(extract_channel_id("https://youtube.com/channel/"), None);
    }

    #[test]
    fn extracts_resolvable_channel_queries() {
        assert_eq!(
            extract_channel_query("https://youtube.com/@somecreator"),
            Some("somecreator".to_string())
        );
        assert_eq!(
            extract_channel_query("https://youtube.com/c/SomeCreator/videos"),
            Some("SomeCreator".to_string())
        );
        assert_eq!(
            extract_channel_query("https://youtube.com/user/legacyname?tab=videos"),
            Some("legacyname".to_string())
        );
        assert_eq!(extract_channel_query("https://youtube.com/watch?v=abc"), None);
    }

    #[test]
    fn missing_api_key_is_rejected_before_any_request() {
        let config = AppConfig {
            api_key: String::new(),
            ..AppConfig::default()
        };
        let client = YouTubeClient::new(&config).unwrap();
        assert!(matches!(
            client.ensure_api_key(),
            Err(YouTubeError::ApiKeyMissing)
        ));
    }

    #[test]
    fn decodes_search_and_details_payloads() {
        let search: VideoSearchResponse = serde_json::from_str(
            r#"{
                "items": [{
                    "id": {"videoId": "dQw4w9WgXcQ"},
                    "snippet": {
                        "title": "Never Gonna Give You Up",
                        "publishedAt": "2009-10-25T06:57:33Z",
                        "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
                        "channelTitle": "Rick Astley",
                        "thumbnails": {"medium": {"url": "https://i.ytimg.com/vi/x/mq.jpg"}}
                    }
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(search.items[0].id.video_id, "dQw4w9WgXcQ");

        let details: VideoListResponse = serde_json::from_str(
            r#"{
                "items": [{
                    "id": "dQw4w9WgXcQ",
                    "contentDetails": {"duration": "PT3M33S"},
                    "statistics": {"viewCount": "1500000000"}
                }]
            }"#,
        )
        .unwrap();
        let item = &details.items[0];
        assert_eq!(
            item.content_details.as_ref().unwrap().duration,
            "PT3M33S"
        );
        assert_eq!(
            format::format_view_count(item.statistics.as_ref().unwrap().view_count.as_deref().unwrap()),
            "1500.0M views"
        );
    }
}
