// Playback view state
// A projection of the media element recomputed on every notification; never stored.

use serde::Serialize;

use crate::media::MediaElement;

/// Where the player is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerStatus {
    NoSource,
    Loading,
    /// Source failed to load; stays here until a new source is assigned
    Failed,
    /// Metadata loaded, paused at the start
    Ready,
    Playing,
    Paused,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackViewState {
    pub is_playing: bool,
    pub current_position: f64,
    /// `None` until metadata loads
    pub duration: Option<f64>,
    pub is_seek_drag_active: bool,
    pub volume_level: f64,
    pub is_muted: bool,
    pub has_source: bool,
    pub status: PlayerStatus,
}

impl PlaybackViewState {
    pub fn capture(media: &dyn MediaElement, is_seek_drag_active: bool, load_failed: bool) -> Self {
        let has_source = media.src().is_some();
        let duration = media.duration().filter(|d| d.is_finite() && *d >= 0.0);
        let is_playing = has_source && !media.paused();

        let current_position = match duration {
            Some(d) => media.current_time().clamp(0.0, d),
            None => 0.0,
        };

        let status = if !has_source {
            PlayerStatus::NoSource
        } else if duration.is_none() {
            if load_failed {
                PlayerStatus::Failed
            } else {
                PlayerStatus::Loading
            }
        } else if media.ended() {
            PlayerStatus::Finished
        } else if is_playing {
            PlayerStatus::Playing
        } else if current_position > 0.0 {
            PlayerStatus::Paused
        } else {
            PlayerStatus::Ready
        };

        Self {
            is_playing,
            current_position,
            duration,
            is_seek_drag_active,
            volume_level: media.volume(),
            is_muted: is_muted(media.volume(), media.muted()),
            has_source,
            status,
        }
    }

    /// Seek-bar fill for the current position
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current_position, self.duration)
    }

    pub fn download_enabled(&self) -> bool {
        self.has_source && self.duration.is_some()
    }
}

/// Effective mute: explicitly muted or silent
pub fn is_muted(volume: f64, muted: bool) -> bool {
    muted || volume == 0.0
}

/// `100 * position / duration`, clamped to [0, 100]; 0 when duration is unknown or zero
pub fn progress_percent(position: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() && position.is_finite() => {
            (100.0 * position / d).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}
