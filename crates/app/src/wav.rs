use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use dumpwave_core::{AudioFrame, DumpWaveError, FrameSink, FrameSource, Result};
use hound::{SampleFormat, WavIntoSamples, WavReader, WavSpec, WavWriter};

/// Frames per channel handed to the filter at a time.
const FRAMES_PER_CHUNK: usize = 1024;

/// Streams a 16-bit integer WAV file as interleaved [`AudioFrame`]s.
pub struct WavFrameSource {
    spec: WavSpec,
    total_frames: u32,
    samples: WavIntoSamples<BufReader<File>, i16>,
}

impl WavFrameSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path).map_err(|err| {
            DumpWaveError::msg(format!("failed to open `{}`: {err}", path.display()))
        })?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(DumpWaveError::msg(format!(
                "`{}` is not 16-bit integer PCM ({} bits, {:?})",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            )));
        }

        Ok(Self {
            spec,
            total_frames: reader.duration(),
            samples: reader.into_samples::<i16>(),
        })
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Number of samples per channel declared by the header.
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }
}

impl FrameSource for WavFrameSource {
    fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        let wanted = FRAMES_PER_CHUNK * self.spec.channels as usize;
        let mut chunk = Vec::with_capacity(wanted);

        for sample in self.samples.by_ref().take(wanted) {
            let sample = sample
                .map_err(|err| DumpWaveError::msg(format!("failed to decode sample: {err}")))?;
            chunk.push(sample);
        }

        if chunk.is_empty() {
            return Ok(None);
        }

        AudioFrame::new(self.spec.channels, chunk).map(Some)
    }
}

/// Writes forwarded frames into a WAV file using the input's layout.
pub struct WavFrameSink {
    writer: WavWriter<BufWriter<File>>,
}

impl WavFrameSink {
    pub fn create(path: &Path, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(path, spec).map_err(|err| {
            DumpWaveError::msg(format!("failed to create `{}`: {err}", path.display()))
        })?;
        Ok(Self { writer })
    }

    /// Flushes the header; must be called once the pipeline is done.
    pub fn finish(self) -> Result<()> {
        self.writer
            .finalize()
            .map_err(|err| DumpWaveError::msg(format!("failed to finalize output: {err}")))
    }
}

impl FrameSink for WavFrameSink {
    fn push_frame(&mut self, frame: AudioFrame) -> Result<()> {
        for &sample in frame.samples() {
            self.writer
                .write_sample(sample)
                .map_err(|err| DumpWaveError::msg(format!("failed to write sample: {err}")))?;
        }
        Ok(())
    }
}
