// Audio player controller
// Keeps the control widgets consistent with the media element and turns
// gestures on those widgets into element commands. Widgets change only in
// response to element notifications, never optimistically.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::download::{download_filename, save_source};
use super::messages::{Gesture, HostEvent};
use super::state::{is_muted, progress_percent, PlaybackViewState};
use super::view::{format_time, PlayPauseIcon, PlayerView, VolumeIcon};
use crate::error::{Notifier, PlayerError, Severity, UserMessage};
use crate::media::{MediaElement, MediaEvent, MediaListener, MediaSource};
use crate::runtime::HostSender;
use crate::state::AppState;

pub struct AudioPlayerController<M: MediaElement> {
    media: M,
    view: PlayerView,
    /// Set while the user drags the seek bar; clock ticks leave the bar alone
    seek_drag_active: bool,
    load_failed: bool,
    app: AppState,
    host: HostSender,
}

impl<M: MediaElement> AudioPlayerController<M> {
    /// Mount the controller on `media`
    pub fn new(media: M, app: AppState, host: HostSender) -> Self {
        let mut controller = Self {
            media,
            view: PlayerView::default(),
            seek_drag_active: false,
            load_failed: false,
            app,
            host,
        };
        controller.mount();
        controller
    }

    fn mount(&mut self) {
        self.view.download_enabled = false;
        self.view.seek.set_progress(0.0);

        if self.media.src().is_some() {
            self.view.container_visible = true;
            if let Some(duration) = self.known_duration() {
                self.on_loaded_metadata(duration);
            }
            let (volume, muted) = (self.media.volume(), self.media.muted());
            self.on_volume_change(volume, muted);
        } else {
            self.view.volume.set_value(1.0);
            self.view.volume.set_progress(100.0);
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    /// Current projection of the element
    pub fn state(&self) -> PlaybackViewState {
        PlaybackViewState::capture(&self.media, self.seek_drag_active, self.load_failed)
    }

    pub fn is_seek_drag_active(&self) -> bool {
        self.seek_drag_active
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) {
        log::debug!("[Player] gesture {:?}", gesture);
        match gesture {
            Gesture::PlayPauseClicked => self.toggle_play_pause(),
            Gesture::SeekInput(value) => self.seek_input(value),
            Gesture::SeekCommit(value) => self.seek_commit(value),
            Gesture::VolumeClicked => self.toggle_mute(),
            Gesture::VolumeInput(value) => self.set_volume(value),
            Gesture::DownloadClicked => {
                // Completion is reported back through the event queue
                let _ = self.download();
            }
            Gesture::DismissBanner => self.view.banner.dismiss(),
            Gesture::AttachAudio {
                bytes,
                content_type,
            } => self.attach_audio(bytes, &content_type),
            Gesture::AttachSource(source) => self.attach_source(source),
            Gesture::ClearSource => self.clear_source(),
        }
    }

    // ===== Gestures =====

    pub fn toggle_play_pause(&mut self) {
        if self.media.src().is_none() {
            return;
        }
        if self.media.paused() || self.media.ended() {
            self.media.play();
        } else {
            self.media.pause();
        }
    }

    /// Seek bar dragged: preview the tentative position without touching the element
    pub fn seek_input(&mut self, tentative: f64) {
        if self.media.src().is_none() {
            return;
        }
        self.view.seek.set_value(tentative);
        self.view.position_label = format_time(tentative);

        // No drag before metadata: ticks have nothing to overwrite yet
        match self.known_duration() {
            Some(duration) => {
                self.seek_drag_active = true;
                self.view
                    .seek
                    .set_progress(progress_percent(tentative, Some(duration)));
            }
            None => self.view.seek.set_progress(0.0),
        }
    }

    /// Seek bar released: move the element and resume if it was playing
    pub fn seek_commit(&mut self, committed: f64) {
        if self.media.src().is_none() {
            return;
        }
        self.media.set_current_time(committed);
        self.seek_drag_active = false;
        if !self.media.paused() {
            self.media.play();
        }
    }

    pub fn toggle_mute(&mut self) {
        if self.media.src().is_none() {
            return;
        }
        let muted = self.media.muted();
        self.media.set_muted(!muted);
    }

    pub fn set_volume(&mut self, value: f64) {
        if self.media.src().is_none() {
            self.view.volume.set_value(1.0);
            self.view.volume.set_progress(100.0);
            return;
        }
        self.media.set_muted(false);
        self.media.set_volume(value);
    }

    /// Save the current audio. Returns the spawned save task, if one was started.
    pub fn download(&mut self) -> Option<JoinHandle<()>> {
        let Some(source) = self.media.src().cloned() else {
            self.report(PlayerError::NoSourceLoaded);
            return None;
        };
        if source.is_degenerate(&self.app.settings.page_address) {
            self.report(PlayerError::DegenerateSourceReference(source.to_string()));
            return None;
        }
        if !self.view.download_enabled {
            log::debug!("[Player] Download of {} ignored until metadata loads", source);
            return None;
        }

        let filename = download_filename(&source, &self.app.settings.default_filename);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                self.report(PlayerError::FetchFailure(e.to_string()));
                return None;
            }
        };

        log::info!("[Player] Downloading {} as {}", source, filename);
        let blobs = self.app.blobs.clone();
        let trigger = self.app.downloader.clone();
        let host = self.host.clone();
        let dismiss_after = self.app.settings.alerts.error_duration_ms;

        Some(runtime.spawn(async move {
            match save_source(&blobs, trigger.as_ref(), &source, filename).await {
                Ok(path) => log::info!("[Player] Saved {} to {:?}", source, path),
                Err(e) => {
                    log::error!("[Player] Download of {} failed: {}", source, e);
                    host.post(HostEvent::Notice(UserMessage::from_error(
                        &e,
                        Some(dismiss_after),
                    )));
                }
            }
        }))
    }

    /// Attach freshly synthesized audio returned by a speech service
    pub fn attach_audio(&mut self, bytes: Vec<u8>, content_type: &str) {
        if !content_type.starts_with(&self.app.settings.accepted_content_type) {
            let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            self.report(PlayerError::NotAudio {
                content_type: content_type.to_string(),
                snippet,
            });
            return;
        }
        let source = self.app.blobs.create(bytes, content_type);
        self.replace_source(Some(source));
    }

    pub fn attach_source(&mut self, source: MediaSource) {
        self.replace_source(Some(source));
    }

    /// Unload the element and hide the player
    pub fn clear_source(&mut self) {
        self.replace_source(None);
    }

    pub fn expire_messages(&mut self, now: DateTime<Utc>) {
        self.view.banner.expire(now);
    }

    /// A message produced off the dispatching task
    pub fn on_notice(&mut self, message: UserMessage) {
        self.view.banner.notify(message);
    }

    fn replace_source(&mut self, next: Option<MediaSource>) {
        let previous = self.media.src().cloned();
        self.seek_drag_active = false;
        self.load_failed = false;
        self.view.container_visible = next.is_some();
        self.media.load(next.clone());

        if let Some(previous) = previous {
            if previous.is_blob() && next.as_ref() != Some(&previous) {
                self.app.blobs.revoke(&previous);
            }
        }

        if next.is_none() {
            self.reset_track_widgets();
        }
    }

    // ===== Notifications =====

    fn on_load_start(&mut self) {
        self.seek_drag_active = false;
        self.load_failed = false;
        self.reset_track_widgets();
    }

    fn on_loaded_metadata(&mut self, duration: f64) {
        self.load_failed = false;
        self.view.duration_label = format_time(duration);
        self.view.seek.set_range(0.0, duration);
        self.view.seek.set_value(0.0);
        self.view.seek.set_progress(0.0);
        self.view.position_label = format_time(0.0);
        self.view.download_enabled = true;
    }

    fn on_time_update(&mut self, current_time: f64) {
        match self.known_duration() {
            Some(duration) => {
                if self.seek_drag_active {
                    return;
                }
                let position = current_time.clamp(0.0, duration);
                self.view.position_label = format_time(position);
                self.view.seek.set_value(position);
                self.view
                    .seek
                    .set_progress(progress_percent(position, Some(duration)));
            }
            None => self.view.seek.set_progress(0.0),
        }
    }

    fn on_ended(&mut self) {
        // Duration label keeps showing the track length
        self.view.rewind();
    }

    fn on_volume_change(&mut self, volume: f64, muted: bool) {
        let muted = is_muted(volume, muted);
        self.view.volume_icon = if muted {
            VolumeIcon::Muted
        } else {
            VolumeIcon::Volume
        };
        if muted {
            self.view.volume.set_value(0.0);
            self.view.volume.set_progress(0.0);
        } else {
            self.view.volume.set_value(volume);
            self.view.volume.set_progress(volume * 100.0);
        }
    }

    fn on_error(&mut self, message: &str) {
        self.load_failed = true;
        self.view.download_enabled = false;
        let dismiss_after = self.app.settings.alerts.error_duration_ms;
        self.view.banner.notify(UserMessage::new(
            format!("Error loading audio: {}", message),
            Severity::Danger,
            Some(dismiss_after),
        ));
    }

    // ===== Helpers =====

    fn reset_track_widgets(&mut self) {
        self.view.rewind();
        self.view.seek.set_range(0.0, 0.0);
        self.view.duration_label = format_time(0.0);
        self.view.download_enabled = false;
    }

    /// Duration usable for progress math
    fn known_duration(&self) -> Option<f64> {
        self.media
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    fn report(&mut self, err: PlayerError) {
        let alerts = &self.app.settings.alerts;
        let dismiss_after = match err.severity() {
            Severity::Danger => alerts.error_duration_ms,
            _ => alerts.duration_ms,
        };
        self.view
            .banner
            .notify(UserMessage::from_error(&err, Some(dismiss_after)));
    }
}

impl<M: MediaElement> MediaListener for AudioPlayerController<M> {
    fn on_media_event(&mut self, event: &MediaEvent) {
        log::debug!("[Player] media {:?}", event);
        match event {
            MediaEvent::LoadStart => self.on_load_start(),
            MediaEvent::LoadedMetadata { duration } => self.on_loaded_metadata(*duration),
            MediaEvent::TimeUpdate { current_time } => self.on_time_update(*current_time),
            MediaEvent::Play => self.view.play_pause = PlayPauseIcon::Pause,
            MediaEvent::Pause => self.view.play_pause = PlayPauseIcon::Play,
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::VolumeChange { volume, muted } => self.on_volume_change(*volume, *muted),
            MediaEvent::Error { message } => self.on_error(message),
        }
    }
}
