//! Core library of the dumpwave tool.
//!
//! A [`DumpWaveFilter`] sits in an audio pipeline, forwards every frame it
//! receives and, as a side channel, folds the first channel into one RMS
//! value per column. Once the stream ends the columns are scaled against
//! the loudest one and rendered as pixel heights, ready to be drawn as a
//! waveform thumbnail or persisted as a small JSON document.

pub mod accumulator;
pub mod config;
pub mod error;
pub mod filter;
pub mod finalize;
pub mod frame;
pub mod persist;

pub use accumulator::{perceptual_level, Accumulator, AccumulatorState, WaveformValues};
pub use config::{DumpSize, WaveformConfig, WindowBoundary};
pub use error::{DumpWaveError, Result};
pub use filter::{run_pipeline, DumpWaveFilter, StreamState};
pub use finalize::{scale_column, Finalizer, RenderedWaveform, WaveformDocument};
pub use frame::{AudioFrame, FrameSink, FrameSource, NullSink};
