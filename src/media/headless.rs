// Software-clocked media element
// Follows the HTML media element's observable behaviour without an audio device:
// sources are probed for their duration and the clock advances on `tick`.

use std::time::Duration;

use super::{BlobStore, MediaElement, MediaEvent, MediaEventSink, MediaSource};
use crate::audio::decoder::AudioDecoder;
use crate::error::PlayerError;

#[derive(Debug)]
pub struct HeadlessMediaElement {
    sink: MediaEventSink,
    blobs: BlobStore,
    src: Option<MediaSource>,
    paused: bool,
    ended: bool,
    duration: Option<f64>,
    current_time: f64,
    volume: f64,
    muted: bool,
    time_update_interval: Duration,
    since_time_update: Duration,
}

impl HeadlessMediaElement {
    pub fn new(sink: MediaEventSink, blobs: BlobStore) -> Self {
        Self {
            sink,
            blobs,
            src: None,
            paused: true,
            ended: false,
            duration: None,
            current_time: 0.0,
            volume: 1.0,
            muted: false,
            time_update_interval: Duration::from_millis(250),
            since_time_update: Duration::ZERO,
        }
    }

    pub fn with_time_update_interval(mut self, interval: Duration) -> Self {
        self.time_update_interval = interval;
        self
    }

    /// Advance the playback clock by `elapsed` of wall time
    pub fn tick(&mut self, elapsed: Duration) {
        let Some(duration) = self.duration else {
            return;
        };
        if self.paused {
            return;
        }

        self.current_time = (self.current_time + elapsed.as_secs_f64()).min(duration);
        self.since_time_update += elapsed;

        if self.current_time >= duration {
            self.paused = true;
            self.ended = true;
            self.since_time_update = Duration::ZERO;
            self.sink.emit(MediaEvent::TimeUpdate {
                current_time: self.current_time,
            });
            self.sink.emit(MediaEvent::Pause);
            self.sink.emit(MediaEvent::Ended);
        } else if self.since_time_update >= self.time_update_interval {
            self.since_time_update = Duration::ZERO;
            self.sink.emit(MediaEvent::TimeUpdate {
                current_time: self.current_time,
            });
        }
    }

    fn probe_duration(&self, source: &MediaSource) -> Result<Option<f64>, PlayerError> {
        let decoder = if source.is_blob() {
            let blob = self
                .blobs
                .get(source)
                .ok_or_else(|| PlayerError::UnsupportedSource(format!("{} was revoked", source)))?;
            AudioDecoder::from_bytes((*blob.bytes).clone(), Some(&blob.content_type))?
        } else if let Some(path) = source.file_path() {
            AudioDecoder::open(&path)?
        } else {
            return Err(PlayerError::UnsupportedSource(source.to_string()));
        };
        Ok(decoder.duration_secs())
    }

    fn emit_volume_change(&self) {
        self.sink.emit(MediaEvent::VolumeChange {
            volume: self.volume,
            muted: self.muted,
        });
    }
}

impl MediaElement for HeadlessMediaElement {
    fn src(&self) -> Option<&MediaSource> {
        self.src.as_ref()
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn ended(&self) -> bool {
        self.ended
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn play(&mut self) {
        if self.src.is_none() {
            return;
        }
        if self.ended {
            self.ended = false;
            self.current_time = 0.0;
            self.sink.emit(MediaEvent::TimeUpdate { current_time: 0.0 });
        }
        if self.paused {
            self.paused = false;
            self.sink.emit(MediaEvent::Play);
        }
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.sink.emit(MediaEvent::Pause);
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        if self.src.is_none() || !seconds.is_finite() {
            return;
        }
        let mut target = seconds.max(0.0);
        if let Some(duration) = self.duration {
            target = target.min(duration);
            self.ended = self.ended && target >= duration;
        }
        self.current_time = target;
        self.since_time_update = Duration::ZERO;
        self.sink.emit(MediaEvent::TimeUpdate {
            current_time: target,
        });
    }

    fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.volume
        };
        if volume != self.volume {
            self.volume = volume;
            self.emit_volume_change();
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if muted != self.muted {
            self.muted = muted;
            self.emit_volume_change();
        }
    }

    fn load(&mut self, source: Option<MediaSource>) {
        if !self.paused {
            self.paused = true;
            self.sink.emit(MediaEvent::Pause);
        }
        self.ended = false;
        self.duration = None;
        self.current_time = 0.0;
        self.since_time_update = Duration::ZERO;
        self.src = source;

        let Some(source) = self.src.clone() else {
            return;
        };

        log::info!("Loading {}", source);
        self.sink.emit(MediaEvent::LoadStart);

        match self.probe_duration(&source) {
            Ok(Some(duration)) => {
                self.duration = Some(duration);
                self.sink.emit(MediaEvent::LoadedMetadata { duration });
            }
            Ok(None) => {
                self.sink.emit(MediaEvent::Error {
                    message: format!("Could not determine the length of {}", source),
                });
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", source, e);
                self.sink.emit(MediaEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::tests::wav_bytes;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn element() -> (HeadlessMediaElement, Arc<Mutex<Vec<MediaEvent>>>, BlobStore) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        let sink = MediaEventSink::new(move |e| captured.lock().push(e));
        let blobs = BlobStore::new();
        (HeadlessMediaElement::new(sink, blobs.clone()), events, blobs)
    }

    #[test]
    fn loading_a_blob_reports_metadata() {
        let (mut media, events, blobs) = element();
        let source = blobs.create(wav_bytes(8000, 2.0), "audio/wav");
        media.load(Some(source));

        assert_eq!(
            *events.lock(),
            vec![MediaEvent::LoadStart, MediaEvent::LoadedMetadata { duration: 2.0 }]
        );
        assert_eq!(media.duration(), Some(2.0));
    }

    #[test]
    fn unsupported_sources_raise_errors() {
        let (mut media, events, _) = element();
        media.load(Some(MediaSource::new("http://example.com/clip.wav")));
        assert!(matches!(events.lock().last(), Some(MediaEvent::Error { .. })));
        assert_eq!(media.duration(), None);
        assert!(media.src().is_some());
    }

    #[test]
    fn clock_runs_to_the_end() {
        let (mut media, events, blobs) = element();
        media.load(Some(blobs.create(wav_bytes(8000, 1.0), "audio/wav")));
        media.play();
        events.lock().clear();

        media.tick(Duration::from_millis(300));
        assert_eq!(
            events.lock().pop(),
            Some(MediaEvent::TimeUpdate { current_time: 0.3 })
        );

        media.tick(Duration::from_secs(5));
        let tail: Vec<_> = events.lock().drain(..).collect();
        assert_eq!(
            tail,
            vec![
                MediaEvent::TimeUpdate { current_time: 1.0 },
                MediaEvent::Pause,
                MediaEvent::Ended
            ]
        );
        assert!(media.ended() && media.paused());

        // Playing a finished element restarts from zero
        media.play();
        assert_eq!(media.current_time(), 0.0);
        assert!(!media.paused());
    }

    #[test]
    fn volume_events_fire_only_on_change() {
        let (mut media, events, _) = element();
        media.set_volume(1.0);
        media.set_muted(false);
        assert!(events.lock().is_empty());

        media.set_volume(0.6);
        media.set_muted(true);
        assert_eq!(
            *events.lock(),
            vec![
                MediaEvent::VolumeChange { volume: 0.6, muted: false },
                MediaEvent::VolumeChange { volume: 0.6, muted: true },
            ]
        );
    }
}
