// Sample rate and channel conversion between a decoded source and the device
use rubato::{FftFixedIn, Resampler};

use crate::error::PlayerError;

const CHUNK_FRAMES: usize = 1024;

/// Map interleaved frames from `from` channels onto `to` channels.
/// Extra output channels repeat the last source channel.
pub fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 {
        return samples.to_vec();
    }
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        for ch in 0..to {
            out.push(frame[ch.min(from - 1)]);
        }
    }
    out
}

/// Streaming converter fed with arbitrarily sized interleaved blocks
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    channels: usize,
    pending: Vec<Vec<f32>>,
    from_rate: u32,
    to_rate: u32,
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32, channels: usize) -> Result<Self, PlayerError> {
        let inner = if from_rate == to_rate {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    from_rate as usize,
                    to_rate as usize,
                    CHUNK_FRAMES,
                    2,
                    channels,
                )
                .map_err(|e| PlayerError::Output(format!("Failed to create resampler: {}", e)))?,
            )
        };
        Ok(Self {
            inner,
            channels,
            pending: vec![Vec::new(); channels],
            from_rate,
            to_rate,
        })
    }

    /// Convert a block; output may lag input by up to one chunk
    pub fn process(&mut self, interleaved: &[f32]) -> Result<Vec<f32>, PlayerError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(interleaved.to_vec());
        };

        for frame in interleaved.chunks_exact(self.channels) {
            for (ch, sample) in frame.iter().enumerate() {
                self.pending[ch].push(*sample);
            }
        }

        let mut out = Vec::new();
        while self.pending[0].len() >= resampler.input_frames_next() {
            let needed = resampler.input_frames_next();
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|ch| ch.drain(..needed).collect())
                .collect();
            let converted = resampler
                .process(&chunk, None)
                .map_err(|e| PlayerError::Output(format!("Resampling failed: {}", e)))?;

            let frames = converted.first().map(Vec::len).unwrap_or(0);
            out.reserve(frames * self.channels);
            for i in 0..frames {
                for ch in &converted {
                    out.push(ch[i]);
                }
            }
        }
        Ok(out)
    }

    /// Convert whatever is left of a partial chunk at end of stream
    pub fn flush(&mut self) -> Result<Vec<f32>, PlayerError> {
        let Some(resampler) = self.inner.as_ref() else {
            return Ok(Vec::new());
        };
        let remaining = self.pending[0].len();
        if remaining == 0 {
            return Ok(Vec::new());
        }

        let needed = resampler.input_frames_next();
        for ch in &mut self.pending {
            ch.resize(needed, 0.0);
        }
        let mut out = self.process(&[])?;

        // Drop the converted zero padding
        let frames = (remaining as u64 * self.to_rate as u64).div_ceil(self.from_rate as u64) as usize;
        out.truncate(frames * self.channels);
        Ok(out)
    }

    /// Forget buffered input, e.g. after a seek
    pub fn reset(&mut self) {
        for ch in &mut self.pending {
            ch.clear();
        }
        if let Some(resampler) = self.inner.as_mut() {
            resampler.reset();
        }
    }
}
