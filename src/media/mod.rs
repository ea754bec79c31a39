// Media element seam
// The controller drives playback only through this trait and reacts only to
// the notifications an element emits.

pub mod headless;
pub mod source;

use std::fmt;
use std::sync::Arc;

pub use headless::HeadlessMediaElement;
pub use source::{Blob, BlobStore, MediaSource};

/// Notifications emitted by a media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// A new source began loading
    LoadStart,
    /// Duration is known; `NaN` never reaches this event
    LoadedMetadata { duration: f64 },
    /// Playback clock advanced or was moved
    TimeUpdate { current_time: f64 },
    Play,
    Pause,
    /// Playback reached the end of the source
    Ended,
    VolumeChange { volume: f64, muted: bool },
    /// The source could not be loaded or decoded
    Error { message: String },
}

/// Host-provided playback unit.
///
/// Commands never report state changes directly; the element emits a
/// [`MediaEvent`] for every change it actually makes.
pub trait MediaElement {
    fn src(&self) -> Option<&MediaSource>;
    fn paused(&self) -> bool;
    fn ended(&self) -> bool;
    /// `None` until metadata has loaded
    fn duration(&self) -> Option<f64>;
    fn current_time(&self) -> f64;
    fn volume(&self) -> f64;
    fn muted(&self) -> bool;

    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    /// Replace the source; `None` unloads the element
    fn load(&mut self, source: Option<MediaSource>);
}

/// Anything that reacts to an element's notifications
pub trait MediaListener {
    fn on_media_event(&mut self, event: &MediaEvent);
}

/// Where an element posts its notifications
#[derive(Clone)]
pub struct MediaEventSink(Arc<dyn Fn(MediaEvent) + Send + Sync>);

impl MediaEventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(MediaEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(emit))
    }

    pub fn emit(&self, event: MediaEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MediaEventSink")
    }
}
