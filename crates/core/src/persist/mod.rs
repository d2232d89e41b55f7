use std::{fs, path::Path};

use crate::{RenderedWaveform, Result, WaveformDocument};

/// Writes the JSON document of `rendered` to `path`, replacing any previous
/// file.
pub fn persist(rendered: &RenderedWaveform, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string(&rendered.document())?;
    fs::write(path, json)?;
    tracing::debug!(?path, width = rendered.width(), "persisted waveform document");
    Ok(())
}

/// Same as [`persist`], but failures only produce a warning. Returns whether
/// the document was written.
pub fn persist_or_warn(rendered: &RenderedWaveform, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match persist(rendered, path) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(?path, %err, "dumping waveform failed");
            false
        }
    }
}

/// Reads back a document written by [`persist`].
pub fn load_document(path: impl AsRef<Path>) -> Result<WaveformDocument> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
