use std::collections::VecDeque;

use crate::{DumpWaveError, Result};

/// Block of interleaved signed 16-bit PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    channels: u16,
    samples: Vec<i16>,
}

impl AudioFrame {
    /// Wraps interleaved samples. The sample count must be a multiple of the
    /// channel count.
    pub fn new(channels: u16, samples: Vec<i16>) -> Result<Self> {
        if channels == 0 {
            return Err(DumpWaveError::InvalidInput(
                "audio frames require at least one channel",
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(DumpWaveError::InvalidInput(
                "sample count is not a multiple of the channel count",
            ));
        }

        Ok(Self { channels, samples })
    }

    pub fn mono(samples: Vec<i16>) -> Self {
        Self {
            channels: 1,
            samples,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of samples per channel.
    pub fn nb_samples(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn first_channel(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .step_by(self.channels as usize)
            .copied()
    }
}

/// Upstream collaborator delivering frames one at a time. `Ok(None)` marks
/// the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>>;
}

/// Downstream collaborator receiving every forwarded frame.
pub trait FrameSink {
    fn push_frame(&mut self, frame: AudioFrame) -> Result<()>;
}

impl FrameSource for VecDeque<AudioFrame> {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        Ok(self.pop_front())
    }
}

impl FrameSink for Vec<AudioFrame> {
    fn push_frame(&mut self, frame: AudioFrame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}

/// Sink that drops every frame, for callers that only want the waveform.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn push_frame(&mut self, _frame: AudioFrame) -> Result<()> {
        Ok(())
    }
}
