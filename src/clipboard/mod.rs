//! Pasteboard polling and video-link detection.
//!
//! The OS pasteboard sits behind the [`Pasteboard`] seam; the watcher only
//! reads content after the change count moves, so an idle poll never touches
//! the text (and never trips per-read OS permission prompts).

pub mod extractor;

use chrono::{DateTime, Utc};

/// Read-side seam over the system pasteboard.
pub trait Pasteboard: Send {
    /// Monotonic counter bumped on every pasteboard write.
    fn change_count(&self) -> u64;
    /// Current text content. Absence of text is not an error.
    fn contents(&self) -> Option<String>;
}

/// Transient record of one detected pasteboard change. Never persisted.
#[derive(Debug, Clone)]
pub struct ClipboardObservation {
    pub raw_text: String,
    pub extracted_id: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Polls the pasteboard on a fixed tick and publishes extracted video
/// identifiers into a single slot; a later detection silently supersedes an
/// earlier unconsumed one.
pub struct ClipboardWatcher {
    pasteboard: Box<dyn Pasteboard>,
    last_change_count: Option<u64>,
    last_contents: Option<String>,
    detected: Option<String>,
}

impl ClipboardWatcher {
    pub fn new(pasteboard: Box<dyn Pasteboard>) -> Self {
        Self {
            pasteboard,
            last_change_count: None,
            last_contents: None,
            detected: None,
        }
    }

    /// One poll tick. Returns the observation when the pasteboard changed,
    /// `None` otherwise. Never fails; unusable content degrades to silence.
    pub fn poll(&mut self) -> Option<ClipboardObservation> {
        let count = self.pasteboard.change_count();
        if self.last_change_count == Some(count) {
            return None;
        }
        self.last_change_count = Some(count);

        let Some(text) = self.pasteboard.contents() else {
            self.last_contents = None;
            return None;
        };

        // The change counter can fire without the content actually changing;
        // identical text must not be re-processed.
        if self.last_contents.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_contents = Some(text.clone());

        let extracted = extractor::extract_video_id(&text);
        if let Some(id) = &extracted {
            log::info!("Clipboard detection: {}", id);
            self.detected = Some(id.clone());
        }

        Some(ClipboardObservation {
            raw_text: text,
            extracted_id: extracted,
            observed_at: Utc::now(),
        })
    }

    /// Consume the current detection, emptying the slot.
    pub fn take_detected(&mut self) -> Option<String> {
        self.detected.take()
    }

    pub fn detected(&self) -> Option<&str> {
        self.detected.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct FakePasteboard {
        state: Arc<Mutex<(u64, Option<String>)>>,
    }

    impl FakePasteboard {
        fn set(&self, text: &str) {
            let mut state = self.state.lock();
            state.0 += 1;
            state.1 = Some(text.to_string());
        }

        fn bump_counter_only(&self) {
            self.state.lock().0 += 1;
        }

        fn clear(&self) {
            let mut state = self.state.lock();
            state.0 += 1;
            state.1 = None;
        }
    }

    impl Pasteboard for FakePasteboard {
        fn change_count(&self) -> u64 {
            self.state.lock().0
        }

        fn contents(&self) -> Option<String> {
            self.state.lock().1.clone()
        }
    }

    #[test]
    fn unchanged_counter_is_a_no_op() {
        let board = FakePasteboard::default();
        board.set("hello");
        let mut watcher = ClipboardWatcher::new(Box::new(board));

        assert!(watcher.poll().is_some());
        assert!(watcher.poll().is_none());
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn detects_video_links_and_fills_the_slot() {
        let board = FakePasteboard::default();
        let mut watcher = ClipboardWatcher::new(Box::new(board.clone()));

        board.set("check this out https://youtu.be/dQw4w9WgXcQ please");
        let observation = watcher.poll().expect("changed pasteboard");
        assert_eq!(observation.extracted_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(watcher.detected(), Some("dQw4w9WgXcQ"));

        assert_eq!(watcher.take_detected().as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(watcher.take_detected(), None);
    }

    #[test]
    fn later_detection_supersedes_an_unconsumed_one() {
        let board = FakePasteboard::default();
        let mut watcher = ClipboardWatcher::new(Box::new(board.clone()));

        board.set("https://youtu.be/aaaaaaaaaaa");
        watcher.poll();
        board.set("https://youtu.be/bbbbbbbbbbb");
        watcher.poll();

        assert_eq!(watcher.take_detected().as_deref(), Some("bbbbbbbbbbb"));
    }

    #[test]
    fn spurious_counter_fires_do_not_reprocess_identical_content() {
        let board = FakePasteboard::default();
        let mut watcher = ClipboardWatcher::new(Box::new(board.clone()));

        board.set("https://youtu.be/dQw4w9WgXcQ");
        watcher.poll();
        watcher.take_detected();

        board.bump_counter_only();
        assert!(watcher.poll().is_none());
        assert_eq!(watcher.detected(), None);
    }

    #[test]
    fn absent_text_degrades_to_silence() {
        let board = FakePasteboard::default();
        let mut watcher = ClipboardWatcher::new(Box::new(board.clone()));

        board.clear();
        assert!(watcher.poll().is_none());
        assert_eq!(watcher.detected(), None);

        board.set("plain text, no link");
        let observation = watcher.poll().expect("changed pasteboard");
        assert_eq!(observation.extracted_id, None);
        assert_eq!(watcher.detected(), None);
    }
}
