//! Shared plumbing for the ordered video ledgers (history, favorites).

use parking_lot::RwLock;
use std::sync::Arc;

use crate::metadata::TitleSource;
use crate::models::VideoEntry;
use crate::storage::KeyValueStore;

pub(crate) type EntryList = Arc<RwLock<Vec<VideoEntry>>>;

pub(crate) async fn load_entries(kv: &Arc<dyn KeyValueStore>, key: &str) -> Vec<VideoEntry> {
    match kv.load(key).await {
        Ok(Some(blob)) => match serde_json::from_str(&blob) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Discarding undecodable '{}' blob: {}", key, e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!("Failed to load '{}': {}", key, e);
            Vec::new()
        }
    }
}

// Persistence failures degrade to in-memory-only state; they never block the
// caller.
pub(crate) async fn persist_entries(entries: &EntryList, kv: &Arc<dyn KeyValueStore>, key: &str) {
    let blob = {
        let entries = entries.read();
        match serde_json::to_string(&*entries) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("Failed to encode '{}': {}", key, e);
                return;
            }
        }
    };
    if let Err(e) = kv.save(key, &blob).await {
        log::warn!("Failed to persist '{}': {}", key, e);
    }
}

/// One title lookup for one entry. Patches the entry in place only if it
/// still exists when the response arrives; an entry deleted in the interim
/// is silently dropped. Failure leaves the placeholder permanently.
pub(crate) async fn backfill_title(
    entries: EntryList,
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    titles: Arc<dyn TitleSource>,
    video_id: String,
) {
    let title = match titles.fetch_title(&video_id).await {
        Ok(title) => title,
        Err(e) => {
            log::debug!("Title backfill for {} failed: {}", video_id, e);
            return;
        }
    };

    let patched = {
        let mut entries = entries.write();
        match entries.iter_mut().find(|entry| entry.id == video_id) {
            Some(entry) => {
                entry.title = title;
                true
            }
            None => false,
        }
    };

    if patched {
        persist_entries(&entries, &kv, key).await;
    }
}

/// Fire-and-forget variant of [`backfill_title`]; the task's lifetime is not
/// tracked, deletion races are handled by the existence check.
pub(crate) fn spawn_title_backfill(
    entries: EntryList,
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    titles: Arc<dyn TitleSource>,
    video_id: String,
) {
    tokio::spawn(backfill_title(entries, kv, key, titles, video_id));
}
