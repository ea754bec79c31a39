// Shared fixtures for player integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ttsplayer_lib::player::download::{DownloadTrigger, SaveRequest};
use ttsplayer_lib::{
    AppState, EventLoop, EventQueue, Gesture, HeadlessMediaElement, PlayerError, PlayerSettings,
    AudioPlayerController,
};

/// Mono 16-bit WAV of `secs` seconds of a quiet ramp, same as the decoder's unit fixture
pub fn wav_bytes(sample_rate: u32, secs: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (sample_rate as f64 * secs) as u32;
        for i in 0..frames {
            writer.write_sample(((i % 200) as i16 - 100) * 10).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Download trigger that remembers requests instead of writing files
#[derive(Default)]
pub struct RecordingTrigger {
    pub saved: Mutex<Vec<SaveRequest>>,
}

#[async_trait]
impl DownloadTrigger for RecordingTrigger {
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, PlayerError> {
        let name = match &request {
            SaveRequest::Bytes { filename, .. } => filename.clone(),
            SaveRequest::Url { filename_hint, .. } => filename_hint.clone(),
        };
        self.saved.lock().push(request);
        Ok(PathBuf::from(name))
    }
}

pub struct Harness {
    pub event_loop: EventLoop<HeadlessMediaElement>,
    pub app: AppState,
    pub trigger: Arc<RecordingTrigger>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(PlayerSettings::default())
    }

    pub fn with_settings(settings: PlayerSettings) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let trigger = Arc::new(RecordingTrigger::default());
        let app = AppState::new(settings, trigger.clone(), std::env::temp_dir());
        let queue = EventQueue::new();
        let host = queue.sender();
        let media = HeadlessMediaElement::new(host.media_sink(), app.blobs.clone());
        let controller = AudioPlayerController::new(media, app.clone(), host);

        Self {
            event_loop: EventLoop::new(controller, queue),
            app,
            trigger,
        }
    }

    pub fn controller(&self) -> &AudioPlayerController<HeadlessMediaElement> {
        self.event_loop.controller()
    }

    /// Queue a gesture and drain everything it causes
    pub fn gesture(&mut self, gesture: Gesture) {
        self.event_loop.gesture(gesture);
        self.event_loop.run_until_idle();
    }

    /// Attach a WAV clip of `secs` seconds and let it load
    pub fn load_clip(&mut self, secs: f64) {
        self.gesture(Gesture::AttachAudio {
            bytes: wav_bytes(1000, secs),
            content_type: "audio/wav".to_string(),
        });
    }

    /// Advance the element's clock and drain the notifications
    pub fn tick(&mut self, secs: f64) {
        self.event_loop
            .controller_mut()
            .media_mut()
            .tick(Duration::from_secs_f64(secs));
        self.event_loop.run_until_idle();
    }

    pub fn saved(&self) -> Vec<SaveRequest> {
        self.trigger.saved.lock().clone()
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
