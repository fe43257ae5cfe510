use parking_lot::RwLock;
use std::sync::Arc;

use chrono::Utc;

use crate::ledger::{self, EntryList};
use crate::metadata::TitleSource;
use crate::models::VideoEntry;
use crate::storage::{keys, KeyValueStore};

/// Ordered, deduplicated-by-id list of watched videos, most recent first.
pub struct HistoryLedger {
    entries: EntryList,
    kv: Arc<dyn KeyValueStore>,
    titles: Arc<dyn TitleSource>,
}

impl HistoryLedger {
    pub fn new(kv: Arc<dyn KeyValueStore>, titles: Arc<dyn TitleSource>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            kv,
            titles,
        }
    }

    pub async fn load(&self) {
        let loaded = ledger::load_entries(&self.kv, keys::HISTORY).await;
        // Titles that never resolved get another attempt each launch.
        let pending: Vec<String> = loaded
            .iter()
            .filter(|entry| entry.has_placeholder_title())
            .map(|entry| entry.id.clone())
            .collect();

        log::info!("Loaded {} history entries", loaded.len());
        *self.entries.write() = loaded;

        for video_id in pending {
            ledger::spawn_title_backfill(
                self.entries.clone(),
                self.kv.clone(),
                keys::HISTORY,
                self.titles.clone(),
                video_id,
            );
        }
    }

    /// Record a watch. An existing entry moves to the head with a fresh
    /// timestamp; a new entry starts with the placeholder title and a
    /// fire-and-forget title backfill.
    pub async fn add(&self, video_id: &str) {
        let is_new = {
            let mut entries = self.entries.write();
            match entries.iter().position(|entry| entry.id == video_id) {
                Some(index) => {
                    let mut entry = entries.remove(index);
                    entry.timestamp = Utc::now().timestamp();
                    entries.insert(0, entry);
                    false
                }
                None => {
                    entries.insert(0, VideoEntry::placeholder(video_id));
                    true
                }
            }
        };

        ledger::persist_entries(&self.entries, &self.kv, keys::HISTORY).await;

        if is_new {
            ledger::spawn_title_backfill(
                self.entries.clone(),
                self.kv.clone(),
                keys::HISTORY,
                self.titles.clone(),
                video_id.to_string(),
            );
        }
    }

    pub async fn remove(&self, video_id: &str) {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|entry| entry.id != video_id);
            before != entries.len()
        };
        if removed {
            ledger::persist_entries(&self.entries, &self.kv, keys::HISTORY).await;
        }
    }

    pub async fn remove_at(&self, index: usize) {
        let removed = {
            let mut entries = self.entries.write();
            if index < entries.len() {
                entries.remove(index);
                true
            } else {
                false
            }
        };
        if removed {
            ledger::persist_entries(&self.entries, &self.kv, keys::HISTORY).await;
        }
    }

    pub async fn clear_all(&self) {
        self.entries.write().clear();
        ledger::persist_entries(&self.entries, &self.kv, keys::HISTORY).await;
        log::info!("History cleared");
    }

    pub fn is_member(&self, video_id: &str) -> bool {
        self.entries.read().iter().any(|entry| entry.id == video_id)
    }

    pub fn title_of(&self, video_id: &str) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.id == video_id)
            .map(|entry| entry.title.clone())
    }

    pub fn entries(&self) -> Vec<VideoEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
