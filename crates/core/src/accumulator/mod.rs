use std::fmt;

use crate::{AudioFrame, DumpWaveError, Result, WaveformConfig, WindowBoundary};

/// Divisor used to bring 16-bit samples into the `[-1, 1]` range.
const FULL_SCALE: f64 = i16::MAX as f64;
/// Levels quieter than this collapse to silence.
const DB_FLOOR: f64 = -60.0;

/// Maps a raw sample onto the perceptual scale: `(dB + 60) / 60`, clamped
/// at zero. Digital silence stays exactly zero and never reaches the log.
pub fn perceptual_level(sample: i16) -> f64 {
    let normalised = f64::from(sample) / FULL_SCALE;
    if normalised == 0.0 {
        return 0.0;
    }

    let db = 20.0 * normalised.abs().log10();
    ((db - DB_FLOOR) / -DB_FLOOR).max(0.0)
}

/// Fixed-width column storage. Each slot is written at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformValues {
    slots: Vec<Option<f64>>,
}

impl WaveformValues {
    pub fn with_width(width: usize) -> Self {
        Self {
            slots: vec![None; width],
        }
    }

    #[cfg(test)]
    pub(crate) fn from_committed(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, column: usize) -> Option<f64> {
        self.slots.get(column).copied().flatten()
    }

    /// Number of committed slots.
    pub fn committed(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.slots.iter().copied()
    }

    fn commit(&mut self, column: usize, value: f64) {
        debug_assert!(self.slots[column].is_none(), "column {column} written twice");
        self.slots[column] = Some(value);
    }
}

/// Running counters of the accumulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatorState {
    pub sum_of_squares: f64,
    pub samples_in_window: usize,
    /// Next column to be written. Never decremented.
    pub column: usize,
    /// Loudest committed RMS value so far.
    pub peak: f64,
}

/// Folds a sample stream into one RMS value per window of
/// `samples_per_column` samples.
pub struct Accumulator {
    samples_per_column: usize,
    boundary: WindowBoundary,
    state: AccumulatorState,
    values: WaveformValues,
    samples_ingested: u64,
}

impl Accumulator {
    pub fn new(config: &WaveformConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            samples_per_column: config.samples_per_column,
            boundary: config.boundary,
            state: AccumulatorState::default(),
            values: WaveformValues::with_width(config.width),
            samples_ingested: 0,
        })
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    pub fn values(&self) -> &WaveformValues {
        &self.values
    }

    pub fn column(&self) -> usize {
        self.state.column
    }

    pub fn peak(&self) -> f64 {
        self.state.peak
    }

    pub fn width(&self) -> usize {
        self.values.width()
    }

    pub fn samples_ingested(&self) -> u64 {
        self.samples_ingested
    }

    /// Samples sitting in the unfinished window. They are dropped if the
    /// stream ends now.
    pub fn pending_samples(&self) -> usize {
        self.state.samples_in_window
    }

    /// Consumes one sample. Returns [`DumpWaveError::ColumnOverflow`] when the
    /// sample completes a window but every column is already committed; the
    /// offending window is discarded.
    pub fn ingest(&mut self, sample: i16) -> Result<()> {
        let level = perceptual_level(sample);
        self.state.sum_of_squares += level * level;
        self.samples_ingested += 1;

        if self.window_complete() {
            self.commit()?;
        }

        Ok(())
    }

    /// Feeds the first channel of an interleaved frame. Other channels are
    /// ignored.
    pub fn ingest_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        for sample in frame.first_channel() {
            self.ingest(sample)?;
        }
        Ok(())
    }

    fn window_complete(&mut self) -> bool {
        match self.boundary {
            WindowBoundary::Exact => {
                self.state.samples_in_window += 1;
                self.state.samples_in_window >= self.samples_per_column
            }
            WindowBoundary::Legacy => {
                let complete = self.state.samples_in_window == self.samples_per_column;
                self.state.samples_in_window += 1;
                complete
            }
        }
    }

    fn commit(&mut self) -> Result<()> {
        let rms = (self.state.sum_of_squares / self.samples_per_column as f64).sqrt();
        self.state.sum_of_squares = 0.0;
        self.state.samples_in_window = 0;

        let width = self.values.width();
        if self.state.column >= width {
            return Err(DumpWaveError::ColumnOverflow { width });
        }

        self.values.commit(self.state.column, rms);
        self.state.peak = self.state.peak.max(rms);
        self.state.column += 1;
        Ok(())
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("samples_per_column", &self.samples_per_column)
            .field("boundary", &self.boundary)
            .field("state", &self.state)
            .field("width", &self.values.width())
            .field("samples_ingested", &self.samples_ingested)
            .finish()
    }
}
