use std::collections::VecDeque;
use std::path::PathBuf;

use crate::error::Result;
use crate::frame::{ColorMode, Frame, SourceInfo};
use crate::similarity::MetricBundle;

/// Ordered, finite supply of decoded frames.
///
/// Exhaustion is signalled by `Ok(None)`, never by an error.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Total frame count when the source knows it up front.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }

    fn info(&self) -> SourceInfo;
}

/// Consumer of detection output, called in strictly increasing frame order.
pub trait FrameSink {
    /// Metrics for every scored frame, before its decision is made.
    fn record_metrics(&mut self, _index: usize, _metrics: &MetricBundle) -> Result<()> {
        Ok(())
    }

    /// A frame selected as a key frame.
    fn key_frame(&mut self, index: usize, frame: &Frame) -> Result<()>;

    /// The source is exhausted; flush anything buffered.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Frames already held in memory.
pub struct InMemorySource {
    frames: VecDeque<Frame>,
    info: SourceInfo,
}

impl InMemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        let info = SourceInfo {
            location: PathBuf::from("<memory>"),
            total_frames: Some(frames.len()),
            width: frames.first().map_or(0, Frame::width),
            height: frames.first().map_or(0, Frame::height),
            color_mode: match frames.first() {
                Some(f) if !f.is_color() => ColorMode::Mono,
                _ => ColorMode::RGB,
            },
        };
        Self {
            frames: frames.into(),
            info,
        }
    }
}

impl FrameSource for InMemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.info.total_frames
    }

    fn info(&self) -> SourceInfo {
        self.info.clone()
    }
}

/// Sink that only remembers key-frame indices.
#[derive(Clone, Debug, Default)]
pub struct KeyFrameList {
    pub indices: Vec<usize>,
}

impl FrameSink for KeyFrameList {
    fn key_frame(&mut self, index: usize, _frame: &Frame) -> Result<()> {
        self.indices.push(index);
        Ok(())
    }
}

/// Fans every call out to several sinks, in order.
#[derive(Default)]
pub struct SinkSet<'a> {
    sinks: Vec<&'a mut dyn FrameSink>,
}

impl<'a> SinkSet<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: &'a mut dyn FrameSink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: &'a mut dyn FrameSink) {
        self.sinks.push(sink);
    }
}

impl FrameSink for SinkSet<'_> {
    fn record_metrics(&mut self, index: usize, metrics: &MetricBundle) -> Result<()> {
        self.sinks
            .iter_mut()
            .try_for_each(|s| s.record_metrics(index, metrics))
    }

    fn key_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        self.sinks.iter_mut().try_for_each(|s| s.key_frame(index, frame))
    }

    fn finish(&mut self) -> Result<()> {
        self.sinks.iter_mut().try_for_each(|s| s.finish())
    }
}

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Scoring,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scoring => write!(f, "Scoring frame pairs"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// Work items completed so far within the current stage.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_detection` delegates.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
