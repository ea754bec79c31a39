// Events delivered to the player's event loop
use std::fmt;

use crate::error::UserMessage;
use crate::media::{MediaEvent, MediaSource};

/// User gestures on the player's controls
#[derive(Clone, PartialEq)]
pub enum Gesture {
    PlayPauseClicked,
    /// Seek bar dragged to a tentative position
    SeekInput(f64),
    /// Seek bar released at a committed position
    SeekCommit(f64),
    VolumeClicked,
    VolumeInput(f64),
    DownloadClicked,
    DismissBanner,

    // Source management
    AttachAudio { bytes: Vec<u8>, content_type: String },
    AttachSource(MediaSource),
    ClearSource,
}

impl fmt::Debug for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Audio payloads are too large to log
        match self {
            Gesture::PlayPauseClicked => write!(f, "PlayPauseClicked"),
            Gesture::SeekInput(v) => write!(f, "SeekInput({})", v),
            Gesture::SeekCommit(v) => write!(f, "SeekCommit({})", v),
            Gesture::VolumeClicked => write!(f, "VolumeClicked"),
            Gesture::VolumeInput(v) => write!(f, "VolumeInput({})", v),
            Gesture::DownloadClicked => write!(f, "DownloadClicked"),
            Gesture::DismissBanner => write!(f, "DismissBanner"),
            Gesture::AttachAudio {
                bytes,
                content_type,
            } => write!(f, "AttachAudio({} bytes, {})", bytes.len(), content_type),
            Gesture::AttachSource(source) => write!(f, "AttachSource({})", source),
            Gesture::ClearSource => write!(f, "ClearSource"),
        }
    }
}

/// Everything the host's event queue carries
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Media(MediaEvent),
    Gesture(Gesture),
    /// Result of work that finished off the dispatching task
    Notice(UserMessage),
    Shutdown,
}

impl From<MediaEvent> for HostEvent {
    fn from(event: MediaEvent) -> Self {
        HostEvent::Media(event)
    }
}

impl From<Gesture> for HostEvent {
    fn from(gesture: Gesture) -> Self {
        HostEvent::Gesture(gesture)
    }
}
