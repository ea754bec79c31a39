// Audio decoder using Symphonia
// Decodes audio sources to interleaved f32 PCM and reports their duration

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use crate::error::PlayerError;

pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    duration_secs: Option<f64>,
}

impl AudioDecoder {
    /// Open an audio file and prepare for decoding
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        let file = File::open(path)
            .map_err(|e| PlayerError::Decode(format!("Failed to open file {:?}: {}", path, e)))?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        Self::from_source(Box::new(file), hint)
    }

    /// Open in-memory audio bytes, optionally hinted by a MIME type
    pub fn from_bytes(bytes: Vec<u8>, mime_type: Option<&str>) -> Result<Self, PlayerError> {
        let mut hint = Hint::new();
        if let Some(mime) = mime_type {
            hint.mime_type(mime);
        }

        Self::from_source(Box::new(Cursor::new(bytes)), hint)
    }

    fn from_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<Self, PlayerError> {
        let mss = MediaSourceStream::new(source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| PlayerError::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;

        // First track with a real codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlayerError::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let params = &track.codec_params;
        let sample_rate = params.sample_rate.unwrap_or(44100);
        let channels = params.channels.map(|c| c.count()).unwrap_or(2);

        let duration_secs = match (params.time_base, params.n_frames) {
            (Some(tb), Some(frames)) => {
                let time = tb.calc_time(frames);
                Some(time.seconds as f64 + time.frac)
            }
            (None, Some(frames)) => Some(frames as f64 / sample_rate as f64),
            _ => None,
        };

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| PlayerError::Decode(format!("Failed to create decoder: {}", e)))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration_secs,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Total length in seconds, if the container reports it
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Decode the next packet of this track into interleaved f32 samples.
    /// Returns `None` at end of stream.
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, PlayerError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(PlayerError::Decode(format!("Failed to read packet: {}", e))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buf.copy_interleaved_ref(decoded);
                    return Ok(Some(buf.samples().to_vec()));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(PlayerError::Decode(format!("Decode failed: {}", e))),
            }
        }
    }

    /// Seek to a position in seconds, returning where the stream actually landed
    pub fn seek(&mut self, position_secs: f64) -> Result<f64, PlayerError> {
        let position_secs = position_secs.max(0.0);
        let time = Time::new(position_secs.trunc() as u64, position_secs.fract());

        let seeked_to = self
            .format
            .seek(
                SeekMode::Coarse,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| PlayerError::Decode(format!("Seek failed: {}", e)))?;

        self.decoder.reset();

        Ok(seeked_to.actual_ts as f64 / self.sample_rate as f64)
    }
}
