//! Top-level wiring: every service is constructed here and injected by
//! reference; nothing in the crate reaches for a global.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::channels::ChannelsStore;
use crate::clipboard::{ClipboardWatcher, Pasteboard};
use crate::config::{AppConfig, CLIPBOARD_POLL_INTERVAL_MS, POSITION_RETENTION_DAYS};
use crate::errors::ErrorReporter;
use crate::favorites::FavoritesLedger;
use crate::history::HistoryLedger;
use crate::intake::{IntakeOutcome, VideoIntakeController};
use crate::metadata::{MetadataClient, TitleSource};
use crate::positions::{format_time, PlaybackPositionStore};
use crate::session::{PlaybackSession, ResumeTarget};
use crate::storage::KeyValueStore;
use crate::youtube::YouTubeClient;

pub struct App {
    pub config: AppConfig,
    pub errors: Arc<ErrorReporter>,
    pub history: Arc<HistoryLedger>,
    pub favorites: Arc<FavoritesLedger>,
    pub positions: Arc<PlaybackPositionStore>,
    pub channels: Arc<ChannelsStore>,
    pub intake: Arc<VideoIntakeController>,
    pub youtube: Arc<YouTubeClient>,
}

impl App {
    /// Construct every service against the given key-value store and load
    /// persisted state. Stale playback positions are pruned on the way up.
    pub async fn bootstrap(config: AppConfig, kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let titles: Arc<dyn TitleSource> = Arc::new(MetadataClient::new()?);
        let youtube = Arc::new(YouTubeClient::new(&config)?);

        let errors = Arc::new(ErrorReporter::new());
        let history = Arc::new(HistoryLedger::new(kv.clone(), titles.clone()));
        let favorites = Arc::new(FavoritesLedger::new(kv.clone(), titles));
        let positions = Arc::new(PlaybackPositionStore::new(kv.clone()));
        let channels = Arc::new(ChannelsStore::new(kv, youtube.clone()));
        let intake = Arc::new(VideoIntakeController::new(
            history.clone(),
            favorites.clone(),
        ));

        history.load().await;
        favorites.load().await;
        positions.load().await;
        channels.load().await;
        positions.prune_older_than(POSITION_RETENTION_DAYS).await;

        if !config.is_api_configured() {
            log::warn!("No YouTube API key configured; channel features are unavailable");
        }

        Ok(Self {
            config,
            errors,
            history,
            favorites,
            positions,
            channels,
            intake,
            youtube,
        })
    }

    /// Begin a playback session for a video. The session consults the
    /// position store for its resume target once the player is ready.
    pub fn open_session(&self, video_id: &str, start_from_beginning: bool) -> PlaybackSession {
        PlaybackSession::new(video_id, self.positions.clone(), start_from_beginning)
    }

    /// Refresh all active channel subscriptions, funneling failures into the
    /// error reporter instead of propagating.
    pub async fn refresh_channels(&self) -> usize {
        match self.channels.refresh_all_channels().await {
            Ok(count) => count,
            Err(e) => {
                self.errors.report(e, Some("channel refresh"));
                0
            }
        }
    }

    /// Drive the clipboard watcher on a fixed tick, routing detections
    /// through the intake controller. Runs until the owning task is dropped.
    pub async fn run_watch_loop(&self, pasteboard: Box<dyn Pasteboard>) {
        let mut watcher = ClipboardWatcher::new(pasteboard);
        let mut tick =
            tokio::time::interval(Duration::from_millis(CLIPBOARD_POLL_INTERVAL_MS));

        loop {
            tick.tick().await;
            watcher.poll();

            let Some(video_id) = watcher.take_detected() else {
                continue;
            };

            if self.intake.set_active(&video_id).await == IntakeOutcome::Switched {
                let session = self.open_session(&video_id, false);
                match session.resume_target() {
                    ResumeTarget::Saved(seconds) => {
                        log::info!("Now playing {} (resume at {})", video_id, format_time(seconds))
                    }
                    ResumeTarget::FromBeginning => {
                        log::info!("Now playing {} from the beginning", video_id)
                    }
                }
            }
        }
    }
}
