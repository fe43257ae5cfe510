use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::clipboard::extractor::watch_url;
use crate::config::{OEMBED_TIMEOUT_SECONDS, OEMBED_URL};
use crate::errors::AppError;

/// Title lookup by video identifier. Behind a trait so ledgers can be tested
/// without the network.
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn fetch_title(&self, video_id: &str) -> Result<String, AppError>;
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
}

/// oEmbed-backed title client; used only to backfill placeholder titles in
/// the history and favorites ledgers.
pub struct MetadataClient {
    client: Client,
}

impl MetadataClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(OEMBED_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TitleSource for MetadataClient {
    async fn fetch_title(&self, video_id: &str) -> Result<String, AppError> {
        let url = format!(
            "{}?url={}&format=json",
            OEMBED_URL,
            urlencoding::encode(&watch_url(video_id))
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "oEmbed lookup for {} failed: HTTP {}",
                video_id,
                response.status()
            )));
        }

        let parsed: OembedResponse = response.json().await?;
        Ok(parsed.title)
    }
}
