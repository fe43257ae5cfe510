use parking_lot::RwLock;
use std::sync::Arc;

use chrono::Utc;

use crate::ledger::{self, EntryList};
use crate::metadata::TitleSource;
use crate::models::VideoEntry;
use crate::storage::{keys, KeyValueStore};

/// Ordered, deduplicated-by-id list of starred videos. Recently replayed
/// favorites bubble to the top via [`FavoritesLedger::promote_to_top`].
pub struct FavoritesLedger {
    entries: EntryList,
    kv: Arc<dyn KeyValueStore>,
    titles: Arc<dyn TitleSource>,
}

impl FavoritesLedger {
    pub fn new(kv: Arc<dyn KeyValueStore>, titles: Arc<dyn TitleSource>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            kv,
            titles,
        }
    }

    pub async fn load(&self) {
        let loaded = ledger::load_entries(&self.kv, keys::FAVORITES).await;
        let pending: Vec<String> = loaded
            .iter()
            .filter(|entry| entry.has_placeholder_title())
            .map(|entry| entry.id.clone())
            .collect();

        log::info!("Loaded {} favorites", loaded.len());
        *self.entries.write() = loaded;

        for video_id in pending {
            ledger::spawn_title_backfill(
                self.entries.clone(),
                self.kv.clone(),
                keys::FAVORITES,
                self.titles.clone(),
                video_id,
            );
        }
    }

    /// Star a video. An existing favorite moves to the head (keeping its
    /// title); a new one lands at the head with the given title, or the
    /// placeholder plus a backfill when no title is known.
    pub async fn add(&self, video_id: &str, title: Option<&str>) {
        let needs_backfill = {
            let mut entries = self.entries.write();
            match entries.iter().position(|entry| entry.id == video_id) {
                Some(index) => {
                    let mut entry = entries.remove(index);
                    entry.timestamp = Utc::now().timestamp();
                    if entry.has_placeholder_title() {
                        if let Some(title) = title {
                            entry.title = title.to_string();
                        }
                    }
                    entries.insert(0, entry);
                    false
                }
                None => {
                    let mut entry = VideoEntry::placeholder(video_id);
                    if let Some(title) = title {
                        entry.title = title.to_string();
                    }
                    let needs = entry.has_placeholder_title();
                    entries.insert(0, entry);
                    needs
                }
            }
        };

        ledger::persist_entries(&self.entries, &self.kv, keys::FAVORITES).await;

        if needs_backfill {
            ledger::spawn_title_backfill(
                self.entries.clone(),
                self.kv.clone(),
                keys::FAVORITES,
                self.titles.clone(),
                video_id.to_string(),
            );
        }
    }

    /// Recency promotion on replay: a member moves to the head (refreshing a
    /// still-placeholder title); a non-member is left alone — promotion never
    /// implicitly favorites.
    pub async fn promote_to_top(&self, video_id: &str, title: Option<&str>) {
        let promoted = {
            let mut entries = self.entries.write();
            match entries.iter().position(|entry| entry.id == video_id) {
                Some(index) => {
                    let mut entry = entries.remove(index);
                    entry.timestamp = Utc::now().timestamp();
                    if entry.has_placeholder_title() {
                        if let Some(title) = title {
                            entry.title = title.to_string();
                        }
                    }
                    entries.insert(0, entry);
                    true
                }
                None => false,
            }
        };

        if promoted {
            log::debug!("Promoted favorite {} to the top", video_id);
            ledger::persist_entries(&self.entries, &self.kv, keys::FAVORITES).await;
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
            ledger::persist_entries(&self.entries, &self.kv, keys::FAVORITES).await;
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
            ledger::persist_entries(&self.entries, &self.kv, keys::FAVORITES).await;
        }
    }

    pub async fn clear_all(&self) {
        self.entries.write().clear();
        ledger::persist_entries(&self.entries, &self.kv, keys::FAVORITES).await;
        log::info!("All favorites cleared");
    }

    pub fn is_favorite(&self, video_id: &str) -> bool {
        self.entries.read().iter().any(|entry| entry.id == video_id)
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
