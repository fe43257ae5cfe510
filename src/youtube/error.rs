use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Invalid response from YouTube API: {0}")]
    InvalidResponse(String),

    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Unsupported YouTube URL format")]
    UnsupportedUrlFormat,

    #[error("YouTube API key is missing")]
    ApiKeyMissing,

    #[error("YouTube API quota exceeded")]
    QuotaExceeded,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<YouTubeError> for AppError {
    fn from(e: YouTubeError) -> Self {
        match e {
            YouTubeError::Network(inner) => AppError::Network(inner.to_string()),
            other => AppError::Channel(other.to_string()),
        }
    }
}
