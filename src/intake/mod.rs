use parking_lot::RwLock;
use std::sync::Arc;

use crate::favorites::FavoritesLedger;
use crate::history::HistoryLedger;
use crate::models::PLACEHOLDER_TITLE;

/// Outcome of an intake decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// The active video changed; history and favorites were updated.
    Switched,
    /// The candidate was already active; nothing happened.
    AlreadyActive,
}

/// Decides, for each candidate video identifier, whether the active video
/// changes. This is the single authoritative entry point for every trigger
/// source (clipboard, history tap, favorite tap, channel tap); nothing else
/// mutates the active id, so history bookkeeping can never be bypassed.
pub struct VideoIntakeController {
    current_active: RwLock<Option<String>>,
    history: Arc<HistoryLedger>,
    favorites: Arc<FavoritesLedger>,
}

impl VideoIntakeController {
    pub fn new(history: Arc<HistoryLedger>, favorites: Arc<FavoritesLedger>) -> Self {
        Self {
            current_active: RwLock::new(None),
            history,
            favorites,
        }
    }

    pub fn current_active(&self) -> Option<String> {
        self.current_active.read().clone()
    }

    /// Re-selecting the active video is a no-op; otherwise the candidate
    /// becomes active, history is appended/promoted, and an existing favorite
    /// bubbles to the top of the favorites list — in that order. Candidates
    /// are pre-validated upstream (the clipboard extractor never publishes an
    /// empty identifier).
    pub async fn set_active(&self, candidate: &str) -> IntakeOutcome {
        {
            let mut current = self.current_active.write();
            if current.as_deref() == Some(candidate) {
                log::debug!("{} is already active, ignoring", candidate);
                return IntakeOutcome::AlreadyActive;
            }
            *current = Some(candidate.to_string());
        }

        log::info!("Active video -> {}", candidate);

        self.history.add(candidate).await;

        let known_title = self
            .history
            .title_of(candidate)
            .filter(|title| title != PLACEHOLDER_TITLE);
        self.favorites
            .promote_to_top(candidate, known_title.as_deref())
            .await;

        IntakeOutcome::Switched
    }
}
