use std::{f64::consts::E, fmt, fmt::Write as _};

use serde::{Deserialize, Serialize};

use crate::WaveformValues;

/// Maps a committed RMS value onto `[0, height]`.
///
/// The curve is `exp(ratio * e - e)`: the peak column reaches full height and
/// a column at ratio zero keeps a small floor of about 6.6 %. A zero peak
/// (all-silence stream) renders as zero instead of dividing by it.
pub fn scale_column(value: f64, peak: f64, height: u32) -> u32 {
    if peak <= 0.0 || !peak.is_finite() {
        return 0;
    }

    let ratio = value / peak;
    let scaled = (ratio * E - E).exp();
    let pixels = (f64::from(height) * scaled).floor();
    pixels.clamp(0.0, f64::from(height)) as u32
}

/// Final per-column heights, produced once at end of stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWaveform {
    height: u32,
    samples: Vec<u32>,
}

impl RenderedWaveform {
    pub fn width(&self) -> usize {
        self.samples.len()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    /// Comma-joined decimal heights with no trailing separator.
    pub fn to_text(&self) -> String {
        let digits = self.height.to_string().len();
        let mut text = String::with_capacity(self.samples.len() * (digits + 1));
        for (index, sample) in self.samples.iter().enumerate() {
            if index > 0 {
                text.push(',');
            }
            let _ = write!(text, "{sample}");
        }
        text
    }

    pub fn document(&self) -> WaveformDocument {
        WaveformDocument {
            width: self.samples.len(),
            height: self.height,
            samples: self.samples.clone(),
        }
    }
}

impl fmt::Display for RenderedWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// JSON shape of a persisted waveform:
/// `{"width":W,"height":H,"samples":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformDocument {
    pub width: usize,
    pub height: u32,
    pub samples: Vec<u32>,
}

/// Turns committed RMS values into pixel heights.
#[derive(Debug, Clone, Copy)]
pub struct Finalizer {
    height: u32,
}

impl Finalizer {
    pub fn new(height: u32) -> Self {
        Self { height }
    }

    /// Pure function of `values`, `peak` and the height: calling it again
    /// on the same inputs yields the same waveform. Columns that never
    /// received a full window render as zero.
    pub fn finalize(&self, values: &WaveformValues, peak: f64) -> RenderedWaveform {
        let samples = values
            .iter()
            .map(|value| match value {
                Some(value) => scale_column(value, peak, self.height),
                None => 0,
            })
            .collect();

        RenderedWaveform {
            height: self.height,
            samples,
        }
    }
}
