// Widget projection of the player
// Everything a host needs to paint the controls, and nothing it could get out of sync with.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Notifier, Severity, UserMessage};
use crate::settings::ProgressColors;

/// Format seconds as `m:ss`; unknown or negative values read `0:00`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Which glyph the play/pause toggle shows. Exactly one is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayPauseIcon {
    Play,
    Pause,
}

impl PlayPauseIcon {
    pub fn play_visible(self) -> bool {
        self == PlayPauseIcon::Play
    }

    pub fn pause_visible(self) -> bool {
        self == PlayPauseIcon::Pause
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolumeIcon {
    Volume,
    Muted,
}

/// A draggable range control (seek bar or volume slider)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeControl {
    pub min: f64,
    pub max: f64,
    pub value: f64,
    /// Filled portion, 0-100
    pub progress: f64,
}

impl RangeControl {
    pub fn new(max: f64, value: f64, progress: f64) -> Self {
        let mut control = Self {
            min: 0.0,
            max,
            value,
            progress: 0.0,
        };
        control.set_progress(progress);
        control
    }

    pub fn set_range(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
    }

    /// CSS background painting the filled portion
    pub fn fill_style(&self, colors: &ProgressColors) -> String {
        format!(
            "linear-gradient(to right, {fill} {p}%, {track} {p}%)",
            fill = colors.fill,
            track = colors.track,
            p = self.progress
        )
    }
}

/// Single-slot alert area; a new message replaces the old one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Banner {
    current: Option<UserMessage>,
}

impl Banner {
    pub fn current(&self) -> Option<&UserMessage> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Drop the message once its auto-dismiss delay has passed
    pub fn expire(&mut self, now: DateTime<Utc>) {
        if self.current.as_ref().is_some_and(|m| m.is_expired(now)) {
            self.current = None;
        }
    }
}

impl Notifier for Banner {
    fn notify(&mut self, message: UserMessage) {
        match message.severity {
            Severity::Danger => log::error!("[Banner] {}", message.text),
            Severity::Warning => log::warn!("[Banner] {}", message.text),
            _ => log::info!("[Banner] {}", message.text),
        }
        self.current = Some(message);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub container_visible: bool,
    pub play_pause: PlayPauseIcon,
    pub seek: RangeControl,
    pub position_label: String,
    pub duration_label: String,
    pub volume_icon: VolumeIcon,
    pub volume: RangeControl,
    pub download_enabled: bool,
    pub banner: Banner,
}

impl Default for PlayerView {
    fn default() -> Self {
        Self {
            container_visible: false,
            play_pause: PlayPauseIcon::Play,
            seek: RangeControl::new(0.0, 0.0, 0.0),
            position_label: format_time(0.0),
            duration_label: format_time(0.0),
            volume_icon: VolumeIcon::Volume,
            volume: RangeControl::new(1.0, 1.0, 100.0),
            download_enabled: false,
            banner: Banner::default(),
        }
    }
}

impl PlayerView {
    /// Back to the start of a track: play glyph, empty seek bar, `0:00`
    pub fn rewind(&mut self) {
        self.play_pause = PlayPauseIcon::Play;
        self.seek.set_value(0.0);
        self.seek.set_progress(0.0);
        self.position_label = format_time(0.0);
    }

    /// One-line rendering for logs and terminals
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} / {} ({:.0}%) vol {}{:.0}% {}",
            match self.play_pause {
                PlayPauseIcon::Play => ">",
                PlayPauseIcon::Pause => "||",
            },
            self.position_label,
            self.duration_label,
            self.seek.progress,
            match self.volume_icon {
                VolumeIcon::Volume => "",
                VolumeIcon::Muted => "(muted) ",
            },
            self.volume.progress,
            if self.download_enabled { "[download]" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.99), "0:09");
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(3671.0), "61:11");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-4.0), "0:00");
    }

    #[test]
    fn fill_style_uses_clamped_progress() {
        let mut bar = RangeControl::new(10.0, 0.0, 0.0);
        bar.set_progress(150.0);
        assert_eq!(
            bar.fill_style(&ProgressColors::default()),
            "linear-gradient(to right, #007bff 100%, #ddd 100%)"
        );
        bar.set_progress(37.5);
        assert_eq!(
            bar.fill_style(&ProgressColors::default()),
            "linear-gradient(to right, #007bff 37.5%, #ddd 37.5%)"
        );
    }

    #[test]
    fn exactly_one_play_pause_glyph() {
        for icon in [PlayPauseIcon::Play, PlayPauseIcon::Pause] {
            assert_ne!(icon.play_visible(), icon.pause_visible());
        }
    }

    #[test]
    fn banner_keeps_only_the_latest_message() {
        let mut banner = Banner::default();
        banner.notify(UserMessage::new("first", Severity::Info, Some(10)));
        banner.notify(UserMessage::new("second", Severity::Danger, None));
        assert_eq!(banner.current().map(|m| m.text.as_str()), Some("second"));

        banner.expire(Utc::now() + chrono::Duration::days(1));
        assert!(banner.current().is_some());
        banner.dismiss();
        assert!(banner.current().is_none());
    }
}
