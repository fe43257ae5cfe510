use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Provisional display title shown until the oEmbed backfill lands.
pub const PLACEHOLDER_TITLE: &str = "Loading...";

/// One row in an ordered video ledger (history or favorites).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
    /// Unix seconds of the insertion or latest promotion.
    pub timestamp: i64,
}

impl VideoEntry {
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }
}
