// Error taxonomy and user-facing messages
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("No audio loaded to download.")]
    NoSourceLoaded,

    #[error("Audio source does not point at any audio: {0}")]
    DegenerateSourceReference(String),

    #[error("Error downloading audio: {0}")]
    FetchFailure(String),

    #[error("Could not parse audio source URL: {0}")]
    UnparsableSourceUrl(String),

    #[error("Unsupported audio source: {0}")]
    UnsupportedSource(String),

    #[error("Server returned non-audio data ({content_type}). It might be an error message: {snippet}")]
    NotAudio { content_type: String, snippet: String },

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Failed to save audio: {0}")]
    Save(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Banner severity for this error
    pub fn severity(&self) -> Severity {
        match self {
            PlayerError::NoSourceLoaded | PlayerError::DegenerateSourceReference(_) => {
                Severity::Warning
            }
            PlayerError::UnparsableSourceUrl(_) => Severity::Info,
            _ => Severity::Danger,
        }
    }
}

/// Alert levels, mirroring the banner styles of the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

/// A non-blocking, user-visible notification
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserMessage {
    pub text: String,
    pub severity: Severity,
    /// Auto-dismiss delay in milliseconds; `None` keeps the message until dismissed
    pub dismiss_after_ms: Option<u64>,
    pub shown_at: DateTime<Utc>,
}

impl UserMessage {
    pub fn new(text: impl Into<String>, severity: Severity, dismiss_after_ms: Option<u64>) -> Self {
        Self {
            text: text.into(),
            severity,
            dismiss_after_ms,
            shown_at: Utc::now(),
        }
    }

    pub fn from_error(err: &PlayerError, dismiss_after_ms: Option<u64>) -> Self {
        Self::new(err.to_string(), err.severity(), dismiss_after_ms)
    }

    /// Whether the auto-dismiss delay has elapsed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.dismiss_after_ms {
            Some(ms) => now - self.shown_at >= Duration::milliseconds(ms as i64),
            None => false,
        }
    }
}

/// Sink for user-visible messages
pub trait Notifier {
    fn notify(&mut self, message: UserMessage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_expire_after_their_duration() {
        let msg = UserMessage::new("saved", Severity::Success, Some(7000));
        assert!(!msg.is_expired(msg.shown_at + Duration::milliseconds(6999)));
        assert!(msg.is_expired(msg.shown_at + Duration::milliseconds(7000)));

        let sticky = UserMessage::new("sticky", Severity::Info, None);
        assert!(!sticky.is_expired(sticky.shown_at + Duration::days(1)));
    }

    #[test]
    fn missing_source_is_a_warning() {
        let msg = UserMessage::from_error(&PlayerError::NoSourceLoaded, Some(7000));
        assert_eq!(msg.severity, Severity::Warning);
        assert_eq!(msg.text, "No audio loaded to download.");
    }

    #[test]
    fn messages_serialize_for_hosts() {
        let msg = UserMessage::from_error(&PlayerError::FetchFailure("gone".into()), Some(10000));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["severity"], "danger");
        assert_eq!(json["text"], "Error downloading audio: gone");
        assert_eq!(json["dismiss_after_ms"], 10000);
        assert!(json["shown_at"].is_string());
    }
}
