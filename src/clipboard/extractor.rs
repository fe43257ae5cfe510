use regex::Regex;
use std::sync::OnceLock;

/// Supported URL forms, in match order: standard watch URLs, short URLs,
/// embed URLs. The capture is the video identifier; no fixed length is
/// assumed beyond the URL-safe charset.
const ID_PATTERNS: &[&str] = &[
    r"(?:https?://)?(?:www\.|m\.)?youtube\.com/watch\?(?:[^\s]*&)?v=([A-Za-z0-9_-]+)",
    r"(?:https?://)?(?:www\.)?youtu\.be/([A-Za-z0-9_-]+)",
    r"(?:https?://)?(?:www\.|m\.)?youtube\.com/embed/([A-Za-z0-9_-]+)",
];

fn patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ID_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("extractor pattern must compile"))
            .collect()
    })
}

/// Pull a video identifier out of arbitrary text. First matching pattern
/// wins; text with no recognizable URL yields `None`, never an error.
pub fn extract_video_id(text: &str) -> Option<String> {
    for pattern in patterns() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(id) = captures.get(1) {
                return Some(id.as_str().to_string());
            }
        }
    }
    None
}

/// Canonical watch URL for an identifier.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_watch_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("youtube.com/watch?v=abc_-123XYZ"),
            Some("abc_-123XYZ".to_string())
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?t=42&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_from_short_urls_embedded_in_text() {
        assert_eq!(
            extract_video_id("check this out https://youtu.be/dQw4w9WgXcQ please"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_from_embed_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/9bZkp7q19f0"),
            Some("9bZkp7q19f0".to_string())
        );
    }

    #[test]
    fn ignores_text_without_a_video_url() {
        assert_eq!(extract_video_id("just some text"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=nope"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn builds_canonical_watch_urls() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
