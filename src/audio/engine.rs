// Native media element
// Decodes with Symphonia on a worker thread and plays through cpal. Element
// state lives behind one lock so the controller always reads what the worker
// last published.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::decoder::AudioDecoder;
use super::output::AudioOutput;
use super::resample::{remix, StreamResampler};
use crate::error::PlayerError;
use crate::media::{BlobStore, MediaElement, MediaEvent, MediaEventSink, MediaSource};

const IDLE_POLL: Duration = Duration::from_millis(50);
const FULL_BUFFER_BACKOFF: Duration = Duration::from_millis(5);

enum Command {
    Load { generation: u64, source: MediaSource },
    Unload,
    Seek(f64),
    Gain(f32),
    Shutdown,
}

#[derive(Debug)]
struct Shared {
    paused: bool,
    ended: bool,
    duration: Option<f64>,
    current_time: f64,
    volume: f64,
    muted: bool,
    /// Bumped on every load so late worker results for old sources are dropped
    generation: u64,
}

impl Shared {
    fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume as f32
        }
    }
}

pub struct NativeMediaElement {
    src: Option<MediaSource>,
    shared: Arc<Mutex<Shared>>,
    commands: Sender<Command>,
    sink: MediaEventSink,
    worker: Option<JoinHandle<()>>,
}

impl NativeMediaElement {
    /// Open the default output device and start the playback thread
    pub fn new(
        sink: MediaEventSink,
        blobs: BlobStore,
        time_update_interval: Duration,
    ) -> Result<Self, PlayerError> {
        let shared = Arc::new(Mutex::new(Shared {
            paused: true,
            ended: false,
            duration: None,
            current_time: 0.0,
            volume: 1.0,
            muted: false,
            generation: 0,
        }));
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = Worker {
            shared: shared.clone(),
            sink: sink.clone(),
            blobs,
            commands: rx,
            time_update_interval,
        };

        let handle = thread::Builder::new()
            .name("ttsplayer-audio".to_string())
            .spawn(move || {
                // The cpal stream has to stay on the thread that opened it
                let output = match AudioOutput::new() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                worker.run(output);
            })
            .map_err(|e| PlayerError::Output(format!("Failed to spawn audio thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| PlayerError::Output("Audio thread exited during startup".to_string()))??;

        Ok(Self {
            src: None,
            shared,
            commands,
            sink,
            worker: Some(handle),
        })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::error!("Audio thread is gone");
        }
    }

    fn emit_volume_change(&self, volume: f64, muted: bool) {
        self.sink.emit(MediaEvent::VolumeChange { volume, muted });
    }
}

impl MediaElement for NativeMediaElement {
    fn src(&self) -> Option<&MediaSource> {
        self.src.as_ref()
    }

    fn paused(&self) -> bool {
        self.shared.lock().paused
    }

    fn ended(&self) -> bool {
        self.shared.lock().ended
    }

    fn duration(&self) -> Option<f64> {
        self.shared.lock().duration
    }

    fn current_time(&self) -> f64 {
        self.shared.lock().current_time
    }

    fn volume(&self) -> f64 {
        self.shared.lock().volume
    }

    fn muted(&self) -> bool {
        self.shared.lock().muted
    }

    fn play(&mut self) {
        if self.src.is_none() {
            return;
        }
        let (restart, started) = {
            let mut shared = self.shared.lock();
            let restart = shared.ended;
            if restart {
                shared.ended = false;
                shared.current_time = 0.0;
            }
            let started = shared.paused;
            shared.paused = false;
            (restart, started)
        };
        if restart {
            self.send(Command::Seek(0.0));
            self.sink.emit(MediaEvent::TimeUpdate { current_time: 0.0 });
        }
        if started {
            self.sink.emit(MediaEvent::Play);
        }
    }

    fn pause(&mut self) {
        let stopped = {
            let mut shared = self.shared.lock();
            let stopped = !shared.paused;
            shared.paused = true;
            stopped
        };
        if stopped {
            self.sink.emit(MediaEvent::Pause);
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        if self.src.is_none() || !seconds.is_finite() {
            return;
        }
        let target = {
            let mut shared = self.shared.lock();
            let mut target = seconds.max(0.0);
            if let Some(duration) = shared.duration {
                target = target.min(duration);
                shared.ended = shared.ended && target >= duration;
            }
            shared.current_time = target;
            target
        };
        self.send(Command::Seek(target));
        self.sink.emit(MediaEvent::TimeUpdate {
            current_time: target,
        });
    }

    fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        let (changed, muted, gain) = {
            let mut shared = self.shared.lock();
            let changed = shared.volume != volume;
            shared.volume = volume;
            (changed, shared.muted, shared.gain())
        };
        if changed {
            self.send(Command::Gain(gain));
            self.emit_volume_change(volume, muted);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        let (changed, volume, gain) = {
            let mut shared = self.shared.lock();
            let changed = shared.muted != muted;
            shared.muted = muted;
            (changed, shared.volume, shared.gain())
        };
        if changed {
            self.send(Command::Gain(gain));
            self.emit_volume_change(volume, muted);
        }
    }

    fn load(&mut self, source: Option<MediaSource>) {
        let (was_playing, generation) = {
            let mut shared = self.shared.lock();
            let was_playing = !shared.paused;
            shared.paused = true;
            shared.ended = false;
            shared.duration = None;
            shared.current_time = 0.0;
            shared.generation += 1;
            (was_playing, shared.generation)
        };
        if was_playing {
            self.sink.emit(MediaEvent::Pause);
        }

        self.src = source.clone();
        match source {
            Some(source) => {
                log::info!("Loading {}", source);
                self.sink.emit(MediaEvent::LoadStart);
                self.send(Command::Load { generation, source });
            }
            None => self.send(Command::Unload),
        }
    }
}

impl Drop for NativeMediaElement {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// A loaded source on the playback thread
struct Track {
    decoder: AudioDecoder,
    resampler: StreamResampler,
    /// Source frames handed to the resampler since the last seek target
    frames_decoded: u64,
    pending: Vec<f32>,
    exhausted: bool,
}

struct Worker {
    shared: Arc<Mutex<Shared>>,
    sink: MediaEventSink,
    blobs: BlobStore,
    commands: Receiver<Command>,
    time_update_interval: Duration,
}

impl Worker {
    fn run(self, mut output: AudioOutput) {
        let mut track: Option<Track> = None;
        let mut last_time_update = Instant::now();

        loop {
            let playing = track.is_some() && !self.shared.lock().paused;

            let command = if playing {
                match self.commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => return,
                }
            } else {
                match self.commands.recv_timeout(IDLE_POLL) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            };

            if let Some(command) = command {
                match command {
                    Command::Load { generation, source } => {
                        output.clear();
                        track = self.open(generation, &source, &output);
                    }
                    Command::Unload => {
                        output.clear();
                        track = None;
                    }
                    Command::Seek(position) => {
                        if let Some(track) = track.as_mut() {
                            output.clear();
                            Self::seek(track, position);
                        }
                    }
                    Command::Gain(gain) => output.set_gain(gain),
                    Command::Shutdown => return,
                }
                continue;
            }

            if !playing {
                continue;
            }
            let Some(current) = track.as_mut() else {
                continue;
            };

            if current.pending.is_empty() && !current.exhausted {
                if let Err(e) = Self::refill(current, &output) {
                    log::error!("Playback failed: {}", e);
                    track = None;
                    self.shared.lock().paused = true;
                    self.sink.emit(MediaEvent::Pause);
                    self.sink.emit(MediaEvent::Error {
                        message: e.to_string(),
                    });
                    continue;
                }
            }

            let written = output.write(&current.pending);
            current.pending.drain(..written);

            if current.exhausted && current.pending.is_empty() && output.buffered() == 0 {
                self.finish();
                continue;
            }

            let position = Self::position(current, &output);
            self.shared.lock().current_time = position;
            if last_time_update.elapsed() >= self.time_update_interval {
                last_time_update = Instant::now();
                self.sink.emit(MediaEvent::TimeUpdate {
                    current_time: position,
                });
            }

            if written == 0 {
                thread::sleep(FULL_BUFFER_BACKOFF);
            }
        }
    }

    fn open(&self, generation: u64, source: &MediaSource, output: &AudioOutput) -> Option<Track> {
        let opened = Self::decoder_for(&self.blobs, source).and_then(|decoder| {
            let duration = decoder.duration_secs().ok_or_else(|| {
                PlayerError::Decode(format!("Could not determine the length of {}", source))
            })?;
            let resampler = StreamResampler::new(
                decoder.sample_rate(),
                output.sample_rate(),
                output.channels() as usize,
            )?;
            Ok((decoder, resampler, duration))
        });

        let mut shared = self.shared.lock();
        if shared.generation != generation {
            // A newer load superseded this one
            return None;
        }

        match opened {
            Ok((decoder, resampler, duration)) => {
                shared.duration = Some(duration);
                drop(shared);
                self.sink.emit(MediaEvent::LoadedMetadata { duration });
                Some(Track {
                    decoder,
                    resampler,
                    frames_decoded: 0,
                    pending: Vec::new(),
                    exhausted: false,
                })
            }
            Err(e) => {
                drop(shared);
                log::warn!("Failed to load {}: {}", source, e);
                self.sink.emit(MediaEvent::Error {
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn decoder_for(blobs: &BlobStore, source: &MediaSource) -> Result<AudioDecoder, PlayerError> {
        if source.is_blob() {
            let blob = blobs
                .get(source)
                .ok_or_else(|| PlayerError::UnsupportedSource(format!("{} was revoked", source)))?;
            AudioDecoder::from_bytes((*blob.bytes).clone(), Some(&blob.content_type))
        } else if let Some(path) = source.file_path() {
            AudioDecoder::open(&path)
        } else {
            Err(PlayerError::UnsupportedSource(source.to_string()))
        }
    }

    fn refill(track: &mut Track, output: &AudioOutput) -> Result<(), PlayerError> {
        match track.decoder.decode_next()? {
            Some(samples) => {
                let channels = track.decoder.channels().max(1);
                track.frames_decoded += (samples.len() / channels) as u64;
                let remixed = remix(&samples, channels, output.channels() as usize);
                track.pending = track.resampler.process(&remixed)?;
            }
            None => {
                track.exhausted = true;
                track.pending = track.resampler.flush()?;
            }
        }
        Ok(())
    }

    fn seek(track: &mut Track, position: f64) {
        match track.decoder.seek(position) {
            Ok(actual) => {
                track.frames_decoded = (actual * track.decoder.sample_rate() as f64) as u64;
            }
            Err(e) => log::warn!("{}", e),
        }
        track.pending.clear();
        track.resampler.reset();
        track.exhausted = false;
    }

    /// Playback position: decoded time minus what is still queued for the device
    fn position(track: &Track, output: &AudioOutput) -> f64 {
        let decoded = track.frames_decoded as f64 / track.decoder.sample_rate() as f64;
        let out_frames = (track.pending.len() + output.buffered()) / (output.channels() as usize).max(1);
        let queued = out_frames as f64 / output.sample_rate() as f64;
        let position = (decoded - queued).max(0.0);
        match track.decoder.duration_secs() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn finish(&self) {
        let position = {
            let mut shared = self.shared.lock();
            shared.paused = true;
            shared.ended = true;
            if let Some(duration) = shared.duration {
                shared.current_time = duration;
            }
            shared.current_time
        };
        self.sink.emit(MediaEvent::TimeUpdate {
            current_time: position,
        });
        self.sink.emit(MediaEvent::Pause);
        self.sink.emit(MediaEvent::Ended);
    }
}
