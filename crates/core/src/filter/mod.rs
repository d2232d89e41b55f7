use crate::{
    persist, Accumulator, AudioFrame, DumpWaveError, Finalizer, FrameSink, FrameSource,
    RenderedWaveform, Result, WaveformConfig,
};

/// Lifecycle of a [`DumpWaveFilter`]. There is no way back from
/// [`StreamState::Finalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Configured,
    Accumulating,
    Finalized,
}

/// Pass-through audio filter that computes a waveform thumbnail as a side
/// channel. Frames go out exactly as they came in.
#[derive(Debug)]
pub struct DumpWaveFilter {
    config: WaveformConfig,
    state: StreamState,
    accumulator: Accumulator,
    finalizer: Finalizer,
    rendered: Option<RenderedWaveform>,
}

impl DumpWaveFilter {
    /// Validates the configuration and allocates the column storage.
    pub fn new(config: WaveformConfig) -> Result<Self> {
        let accumulator = Accumulator::new(&config)?;
        tracing::debug!(
            width = config.width,
            height = config.height,
            samples_per_column = config.samples_per_column,
            boundary = ?config.boundary,
            "dumpwave filter configured"
        );

        Ok(Self {
            finalizer: Finalizer::new(config.height),
            config,
            state: StreamState::Configured,
            accumulator,
            rendered: None,
        })
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// The rendered waveform, once the stream has ended.
    pub fn rendered(&self) -> Option<&RenderedWaveform> {
        self.rendered.as_ref()
    }

    /// Feeds the first channel of `frame` into the accumulator and hands the
    /// frame back unmodified for forwarding.
    ///
    /// Errors are fatal for the stream: a frame that overflows the columns or
    /// arrives after end of stream is not handed back, so nothing from it
    /// reaches the sink and the caller is expected to stop pumping.
    pub fn filter_frame(&mut self, frame: AudioFrame) -> Result<AudioFrame> {
        match self.state {
            StreamState::Finalized => {
                return Err(DumpWaveError::Lifecycle(
                    "frame received after end of stream",
                ))
            }
            StreamState::Configured => {
                tracing::debug!("dumpwave filter accumulating");
                self.state = StreamState::Accumulating;
            }
            StreamState::Accumulating => {}
        }

        self.accumulator.ingest_frame(&frame)?;
        Ok(frame)
    }

    /// Called once the upstream source is exhausted. Renders the waveform and
    /// keeps it for [`DumpWaveFilter::rendered`] and teardown.
    pub fn end_of_stream(&mut self) -> Result<&RenderedWaveform> {
        if self.state == StreamState::Finalized {
            return Err(DumpWaveError::Lifecycle("end of stream reported twice"));
        }

        let rendered = self
            .finalizer
            .finalize(self.accumulator.values(), self.accumulator.peak());
        tracing::debug!(
            columns = self.accumulator.column(),
            width = self.config.width,
            dropped_samples = self.accumulator.pending_samples(),
            peak = self.accumulator.peak(),
            "dumpwave filter finalized"
        );

        self.state = StreamState::Finalized;
        Ok(&*self.rendered.insert(rendered))
    }

    /// Tears the filter down, persisting the JSON document when a path is
    /// configured. A failed write is logged and otherwise ignored.
    pub fn teardown(self) -> Option<RenderedWaveform> {
        match (&self.rendered, &self.config.json) {
            (Some(rendered), Some(path)) => {
                persist::persist_or_warn(rendered, path);
            }
            (None, Some(path)) => {
                tracing::warn!(?path, "stream never ended, no waveform to dump");
            }
            _ => {}
        }

        self.rendered
    }
}

/// Drives `filter` until `source` is exhausted, forwarding every frame to
/// `sink`, then finalizes and returns the rendered waveform.
pub fn run_pipeline<S, K>(
    source: &mut S,
    filter: &mut DumpWaveFilter,
    sink: &mut K,
) -> Result<RenderedWaveform>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    while let Some(frame) = source.next_frame()? {
        let frame = filter.filter_frame(frame)?;
        sink.push_frame(frame)?;
    }

    filter.end_of_stream().cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{perceptual_level, NullSink};

    fn config(width: usize, height: u32, samples_per_column: usize) -> WaveformConfig {
        WaveformConfig::new(width, height, samples_per_column)
    }

    #[test]
    fn walks_through_the_lifecycle() {
        let mut filter = DumpWaveFilter::new(config(2, 10, 2)).unwrap();
        assert_eq!(filter.state(), StreamState::Configured);

        filter.filter_frame(AudioFrame::mono(vec![100, 200])).unwrap();
        assert_eq!(filter.state(), StreamState::Accumulating);
        assert!(filter.rendered().is_none());

        filter.end_of_stream().unwrap();
        assert_eq!(filter.state(), StreamState::Finalized);
        assert!(filter.rendered().is_some());

        let err = filter.filter_frame(AudioFrame::mono(vec![1])).unwrap_err();
        assert!(matches!(err, DumpWaveError::Lifecycle(_)));
        let err = filter.end_of_stream().unwrap_err();
        assert!(matches!(err, DumpWaveError::Lifecycle(_)));
    }

    #[test]
    fn rejects_invalid_configuration_up_front() {
        let err = DumpWaveFilter::new(config(600, 240, 0)).unwrap_err();
        assert!(matches!(err, DumpWaveError::InvalidConfig(_)));
    }

    #[test]
    fn forwards_every_frame_unchanged_and_in_order() {
        let frames = vec![
            AudioFrame::new(2, vec![1, -1, 2, -2]).unwrap(),
            AudioFrame::new(2, vec![3, -3]).unwrap(),
            AudioFrame::new(2, vec![]).unwrap(),
            AudioFrame::new(2, vec![i16::MIN, i16::MAX, 0, 0]).unwrap(),
        ];
        let mut source: VecDeque<AudioFrame> = frames.clone().into();
        let mut sink: Vec<AudioFrame> = Vec::new();
        // Five first-channel samples, one column each.
        let mut filter = DumpWaveFilter::new(config(5, 100, 1)).unwrap();

        run_pipeline(&mut source, &mut filter, &mut sink).unwrap();
        assert_eq!(sink, frames);
        assert_eq!(filter.accumulator().column(), 5);
    }

    #[test]
    fn renders_reference_envelope_from_samples() {
        // Pairs of equal samples, so each window's RMS is the sample's
        // perceptual level: roughly 0.1, 0.5, 1.0 and 0.3.
        let levels = [65_i16, 1036, i16::MAX, 260];
        let samples: Vec<i16> = levels.iter().flat_map(|&s| [s, s]).collect();
        let mut source: VecDeque<AudioFrame> = vec![AudioFrame::mono(samples)].into();
        let mut filter = DumpWaveFilter::new(config(4, 100, 2)).unwrap();

        let rendered = run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap();

        let values = filter.accumulator().values();
        for (column, (&sample, expected)) in levels.iter().zip([0.1, 0.5, 1.0, 0.3]).enumerate() {
            let committed = values.get(column).unwrap();
            assert!((committed - perceptual_level(sample)).abs() < 1e-12);
            assert!((committed - expected).abs() < 1e-3, "column {column}: {committed}");
        }
        assert!((filter.accumulator().peak() - 1.0).abs() < 1e-12);
        assert_eq!(rendered.to_text(), "8,25,100,14");
    }

    #[test]
    fn overflowing_frame_is_not_forwarded() {
        let first = AudioFrame::mono(vec![100, 200]);
        let mut source: VecDeque<AudioFrame> =
            vec![first.clone(), AudioFrame::mono(vec![300, 400])].into();
        let mut sink: Vec<AudioFrame> = Vec::new();
        let mut filter = DumpWaveFilter::new(config(1, 100, 2)).unwrap();

        let err = run_pipeline(&mut source, &mut filter, &mut sink).unwrap_err();
        assert!(matches!(err, DumpWaveError::ColumnOverflow { width: 1 }));
        assert_eq!(sink, vec![first]);
        assert_eq!(filter.state(), StreamState::Accumulating);
    }

    #[test]
    fn silent_stream_renders_flat_zero_line() {
        let mut source: VecDeque<AudioFrame> =
            vec![AudioFrame::mono(vec![0; 16]), AudioFrame::mono(vec![0; 16])].into();
        let mut filter = DumpWaveFilter::new(config(8, 240, 4)).unwrap();

        let rendered = run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap();
        assert_eq!(filter.accumulator().column(), 8);
        assert_eq!(rendered.to_text(), "0,0,0,0,0,0,0,0");
    }

    #[test]
    fn stereo_stream_uses_left_channel() {
        // Left channel: loud window, silent window. Right is the opposite.
        let frame = AudioFrame::new(2, vec![i16::MAX, 0, i16::MAX, 0, 0, i16::MAX, 0, i16::MAX])
            .unwrap();
        let mut source: VecDeque<AudioFrame> = vec![frame].into();
        let mut filter = DumpWaveFilter::new(config(2, 100, 2)).unwrap();

        let rendered = run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap();
        // floor(100 * exp(-e)) = 6
        assert_eq!(rendered.samples(), &[100, 6]);
    }

    #[test]
    fn overflow_aborts_the_pipeline() {
        let mut source: VecDeque<AudioFrame> = vec![AudioFrame::mono(vec![500; 12])].into();
        let mut filter = DumpWaveFilter::new(config(2, 100, 4)).unwrap();

        let err = run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap_err();
        assert!(matches!(err, DumpWaveError::ColumnOverflow { width: 2 }));
        assert!(filter.rendered().is_none());
        assert!(filter.teardown().is_none());
    }

    #[test]
    fn rendered_heights_stay_within_bounds() {
        let samples: Vec<i16> = (0..600)
            .map(|i| ((i as f64 * 0.05).sin() * 20_000.0 * (i as f64 / 600.0)) as i16)
            .collect();
        let mut source: VecDeque<AudioFrame> = vec![AudioFrame::mono(samples)].into();
        let mut filter = DumpWaveFilter::new(config(60, 240, 10)).unwrap();

        let rendered = run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap();
        assert_eq!(rendered.width(), 60);
        assert!(rendered.samples().iter().all(|&h| h <= 240));
        assert_eq!(rendered.samples().iter().copied().max(), Some(240));
        assert_eq!(rendered.to_text().split(',').count(), 60);
    }

    #[test]
    fn teardown_persists_json_document() {
        let path = std::env::temp_dir().join(format!(
            "dumpwave-{}-teardown.json",
            std::process::id()
        ));
        let mut config = config(2, 100, 2);
        config.json = Some(path.clone());

        let mut source: VecDeque<AudioFrame> =
            vec![AudioFrame::mono(vec![i16::MAX, i16::MAX, 0, 0])].into();
        let mut filter = DumpWaveFilter::new(config).unwrap();
        run_pipeline(&mut source, &mut filter, &mut NullSink).unwrap();

        let rendered = filter.teardown().expect("finalized filter keeps its waveform");
        let document = persist::load_document(&path).unwrap();
        assert_eq!(document, rendered.document());
        assert_eq!(document.samples, vec![100, 6]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn teardown_survives_unwritable_target() {
        let mut config = config(1, 100, 1);
        config.json = Some(
            std::env::temp_dir()
                .join("dumpwave-does-not-exist")
                .join("deeper")
                .join("out.json"),
        );

        let mut filter = DumpWaveFilter::new(config).unwrap();
        filter.filter_frame(AudioFrame::mono(vec![1000])).unwrap();
        filter.end_of_stream().unwrap();
        assert!(filter.teardown().is_some());
    }
}
