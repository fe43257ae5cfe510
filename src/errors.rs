use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Video loading error: {0}")]
    VideoLoad(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl AppError {
    /// Governs presentation only (transient toast vs. persistent alert),
    /// never program logic.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Network(_)
            | AppError::VideoLoad(_)
            | AppError::Channel(_)
            | AppError::Playback(_) => ErrorSeverity::Warning,
            AppError::Data(_) | AppError::Unknown(_) => ErrorSeverity::Error,
            AppError::Clipboard(_) => ErrorSeverity::Info,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::Network(_) => "Please check your internet connection and try again.",
            AppError::VideoLoad(_) => {
                "The video may be unavailable. Try a different video or check the URL."
            }
            AppError::Data(_) => "There was a problem with your data. Try restarting the app.",
            AppError::Clipboard(_) => "Please copy a valid YouTube URL to your clipboard.",
            AppError::Channel(_) => "Unable to load channel information. Please try again later.",
            AppError::Playback(_) => "There was a problem playing the video. Please try again.",
            AppError::Unknown(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

// Implement From traits for common error types to simplify conversion

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Data(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Data(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Data(format!("Serialization error: {}", e))
    }
}

/// Errors older than the newest 50 are evicted.
const MAX_ERROR_HISTORY: usize = 50;

#[derive(Debug, Clone)]
pub struct ErrorLogEntry {
    pub id: String,
    pub error: AppError,
    pub context: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Funnel for user-visible failures: a single "current error" slot (at most
/// one shown at a time) plus a bounded, newest-first history log.
#[derive(Default)]
pub struct ErrorReporter {
    current: Mutex<Option<AppError>>,
    history: Mutex<Vec<ErrorLogEntry>>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, error: AppError, context: Option<&str>) {
        let line = match context {
            Some(context) => format!("{} [{}]", error, context),
            None => error.to_string(),
        };
        match error.severity() {
            ErrorSeverity::Error => log::error!("{}", line),
            ErrorSeverity::Warning => log::warn!("{}", line),
            ErrorSeverity::Info => log::info!("{}", line),
        }

        *self.current.lock() = Some(error.clone());

        let mut history = self.history.lock();
        history.insert(
            0,
            ErrorLogEntry {
                id: Uuid::new_v4().to_string(),
                error,
                context: context.map(String::from),
                timestamp: Utc::now(),
            },
        );
        history.truncate(MAX_ERROR_HISTORY);
    }

    pub fn current_error(&self) -> Option<AppError> {
        self.current.lock().clone()
    }

    pub fn clear_current(&self) {
        *self.current.lock() = None;
    }

    pub fn history(&self) -> Vec<ErrorLogEntry> {
        self.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    // Convenience reporters per category

    pub fn report_network(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::Network(message.into()), context);
    }

    pub fn report_video_load(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::VideoLoad(message.into()), context);
    }

    pub fn report_data(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::Data(message.into()), context);
    }

    pub fn report_clipboard(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::Clipboard(message.into()), context);
    }

    pub fn report_channel(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::Channel(message.into()), context);
    }

    pub fn report_playback(&self, message: impl Into<String>, context: Option<&str>) {
        self.report(AppError::Playback(message.into()), context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_error_is_replaced_by_newer_reports() {
        let reporter = ErrorReporter::new();
        reporter.report_network("first", None);
        reporter.report_playback("second", Some("player"));

        match reporter.current_error() {
            Some(AppError::Playback(message)) => assert_eq!(message, "second"),
            other => panic!("unexpected current error: {:?}", other),
        }

        reporter.clear_current();
        assert!(reporter.current_error().is_none());
    }

    #[test]
    fn history_is_newest_first_and_bounded() {
        let reporter = ErrorReporter::new();
        for i in 0..60 {
            reporter.report_data(format!("failure {}", i), None);
        }

        let history = reporter.history();
        assert_eq!(history.len(), MAX_ERROR_HISTORY);
        match &history[0].error {
            AppError::Data(message) => assert_eq!(message, "failure 59"),
            other => panic!("unexpected head entry: {:?}", other),
        }
    }

    #[test]
    fn severity_tiers_match_the_taxonomy() {
        assert_eq!(
            AppError::Clipboard("x".into()).severity(),
            ErrorSeverity::Info
        );
        assert_eq!(
            AppError::Network("x".into()).severity(),
            ErrorSeverity::Warning
        );
        assert_eq!(
            AppError::Unknown("x".into()).severity(),
            ErrorSeverity::Error
        );
    }
}
