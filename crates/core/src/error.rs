/// Result alias that carries the custom [`DumpWaveError`] type.
pub type Result<T> = std::result::Result<T, DumpWaveError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum DumpWaveError {
    /// Free-form message, mostly raised by the binary while talking to
    /// decoders and encoders that have their own error types.
    #[error("{0}")]
    Message(String),
    /// The waveform geometry cannot be processed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An audio frame does not match its declared layout.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A window completed after every column was already committed. The
    /// caller supplied more than `width * samples_per_column` samples.
    #[error("waveform overflow: all {width} columns are already committed")]
    ColumnOverflow { width: usize },
    /// The filter was driven out of order (frames after end of stream, a
    /// second end of stream, ...).
    #[error("lifecycle violation: {0}")]
    Lifecycle(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl DumpWaveError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for DumpWaveError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for DumpWaveError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
