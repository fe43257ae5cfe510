//! Runtime binding between the active video and the player surface.

use parking_lot::Mutex;
use std::sync::Arc;

use chrono::Utc;

use crate::config::POSITION_SAVE_INTERVAL_SECS;
use crate::positions::PlaybackPositionStore;

/// Where playback should begin once the player reports itself ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeTarget {
    FromBeginning,
    /// Seek to the saved offset, in seconds.
    Saved(f64),
}

/// One playback session for one video. The player surface calls
/// [`PlaybackSession::resume_target`] when ready, feeds position reports
/// through [`PlaybackSession::report_position`], and can wipe the bookmark
/// with [`PlaybackSession::restart_from_beginning`].
pub struct PlaybackSession {
    video_id: String,
    start_from_beginning: bool,
    positions: Arc<PlaybackPositionStore>,
    /// Unix seconds of the last persisted report.
    last_saved_at: Mutex<Option<i64>>,
}

impl PlaybackSession {
    pub fn new(
        video_id: &str,
        positions: Arc<PlaybackPositionStore>,
        start_from_beginning: bool,
    ) -> Self {
        Self {
            video_id: video_id.to_string(),
            start_from_beginning,
            positions,
            last_saved_at: Mutex::new(None),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Consulted once the underlying player reports itself ready.
    pub fn resume_target(&self) -> ResumeTarget {
        if self.start_from_beginning {
            return ResumeTarget::FromBeginning;
        }
        match self.positions.get_position(&self.video_id) {
            Some(record) => {
                log::info!(
                    "Resuming {} from saved position {}",
                    self.video_id,
                    record.formatted_position()
                );
                ResumeTarget::Saved(record.position)
            }
            None => ResumeTarget::FromBeginning,
        }
    }

    /// Seeking is best-effort: a failed seek falls back to the start and is
    /// never surfaced to the user.
    pub fn on_seek_failed(&self) -> ResumeTarget {
        log::warn!(
            "Seek failed for {}, continuing from the beginning",
            self.video_id
        );
        ResumeTarget::FromBeginning
    }

    /// Periodic position report from the player. Persisted at most once per
    /// save interval to avoid write amplification; returns whether this
    /// report was forwarded to the store.
    pub async fn report_position(&self, position: f64, duration: f64) -> bool {
        let now = Utc::now().timestamp();
        {
            let mut last_saved = self.last_saved_at.lock();
            if let Some(previous) = *last_saved {
                if now - previous < POSITION_SAVE_INTERVAL_SECS as i64 {
                    return false;
                }
            }
            *last_saved = Some(now);
        }

        self.positions
            .save_position(&self.video_id, position, duration)
            .await;
        true
    }

    /// Wipe the bookmark so the next session starts at zero.
    pub async fn restart_from_beginning(&self) {
        self.positions.clear_position(&self.video_id).await;
        *self.last_saved_at.lock() = None;
    }
}
