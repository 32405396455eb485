//! decoded (or skipped) audio frames

use super::types::{AudioFrameHeader, ChannelMode};

/// One frame handed out by a pull on the stream decoder.
///
/// Owned by the caller once returned. `samples` is interleaved f32 when the
/// frame was decoded and `None` when it was skipped; `sample_count` is the
/// per-channel count either way.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    channel_mode: ChannelMode,
    sample_rate: u32,
    samples: Option<Vec<f32>>,
    sample_count: usize,
}

impl AudioFrame {
    /// frame carrying decoded interleaved samples
    pub fn decoded(header: &AudioFrameHeader, samples: Vec<f32>) -> Self {
        let sample_count = samples.len() / header.channels();
        AudioFrame {
            channel_mode: header.channel_mode(),
            sample_rate: header.sample_rate(),
            samples: Some(samples),
            sample_count,
        }
    }

    /// frame that was skipped, only the count is known
    pub fn skipped(header: &AudioFrameHeader, sample_count: usize) -> Self {
        AudioFrame {
            channel_mode: header.channel_mode(),
            sample_rate: header.sample_rate(),
            samples: None,
            sample_count,
        }
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    pub fn channels(&self) -> usize {
        self.channel_mode.channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// interleaved samples, `None` for skipped frames
    pub fn samples(&self) -> Option<&[f32]> {
        self.samples.as_deref()
    }

    pub fn into_samples(self) -> Option<Vec<f32>> {
        self.samples
    }

    /// samples per channel
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn is_skipped(&self) -> bool {
        self.samples.is_none()
    }

    /// duration of this frame in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.sample_rate as f64
    }
}
