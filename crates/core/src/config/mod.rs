use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DumpWaveError, Result};

pub const DEFAULT_WIDTH: usize = 600;
pub const DEFAULT_HEIGHT: u32 = 240;

/// Decides when a window of samples is considered complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBoundary {
    /// A window closes after exactly `samples_per_column` samples.
    #[default]
    Exact,
    /// Historical behaviour: the counter is compared before it is
    /// incremented, so each window absorbs `samples_per_column + 1` samples
    /// while the RMS is still divided by `samples_per_column`. Only useful to
    /// reproduce thumbnails rendered by older tooling.
    Legacy,
}

/// Output geometry in the `WxH` notation, e.g. `600x240`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpSize {
    pub width: usize,
    pub height: u32,
}

impl Default for DumpSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl FromStr for DumpSize {
    type Err = DumpWaveError;

    fn from_str(value: &str) -> Result<Self> {
        let (width, height) = value
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| DumpWaveError::config(format!("size `{value}` is not WxH")))?;

        let width = width
            .trim()
            .parse()
            .map_err(|_| DumpWaveError::config(format!("invalid width in size `{value}`")))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| DumpWaveError::config(format!("invalid height in size `{value}`")))?;

        Ok(Self { width, height })
    }
}

impl fmt::Display for DumpSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Geometry and output options for a single waveform dump. Set once before
/// any sample is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Number of output columns.
    pub width: usize,
    /// Pixel height that the loudest column is scaled to.
    pub height: u32,
    /// Samples folded into one column. Zero means "not chosen yet" and is
    /// rejected by [`WaveformConfig::validate`].
    pub samples_per_column: usize,
    /// Where the JSON document is written at teardown, if anywhere.
    pub json: Option<PathBuf>,
    pub boundary: WindowBoundary,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            samples_per_column: 0,
            json: None,
            boundary: WindowBoundary::default(),
        }
    }
}

impl WaveformConfig {
    pub fn new(width: usize, height: u32, samples_per_column: usize) -> Self {
        Self {
            width,
            height,
            samples_per_column,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields fall back to
    /// their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn size(&self) -> DumpSize {
        DumpSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn set_size(&mut self, size: DumpSize) {
        self.width = size.width;
        self.height = size.height;
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(DumpWaveError::config("width must be greater than zero"));
        }
        if self.height == 0 {
            return Err(DumpWaveError::config("height must be greater than zero"));
        }
        if self.samples_per_column == 0 {
            return Err(DumpWaveError::config(
                "samples per column must be greater than zero",
            ));
        }
        Ok(())
    }
}
