use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::compute::ComputeBackend;
use crate::decision::KeyFrameDetector;
use crate::error::{FramesiftError, Result};
use crate::frame::Frame;
use crate::similarity::SimilarityEngine;

use super::config::PipelineConfig;
use super::reorder::ReorderBuffer;
use super::types::{FrameSink, FrameSource, NoOpReporter, PipelineStage, ProgressReporter};

/// Outcome of a detection run.
#[derive(Clone, Debug, Default)]
pub struct DetectionSummary {
    pub frames_read: usize,
    pub pairs_scored: usize,
    pub key_frames: Vec<usize>,
    pub device: String,
}

fn check_cancel(cancel: Option<&AtomicBool>) -> Result<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(FramesiftError::Cancelled),
        _ => Ok(()),
    }
}

/// Pull up to `want` more frames onto `batch`. Returns false once the source is exhausted.
fn fill_batch(source: &mut dyn FrameSource, batch: &mut Vec<Frame>, want: usize) -> Result<bool> {
    while batch.len() < want {
        match source.next_frame()? {
            Some(frame) => batch.push(frame),
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Run key-frame detection over `source` with progress reporting and
/// optional cancellation.
///
/// Frames are read `batch_size` at a time; the last frame of each batch is
/// carried into the next so the pair spanning the boundary is scored too.
/// Metrics pass through a [`ReorderBuffer`] and reach the detector and the
/// sink strictly in frame order. `cancel` is polled between batches and
/// before every decision, so a cancelled run never leaves a half-applied step.
pub fn run_detection_reported(
    source: &mut dyn FrameSource,
    config: &PipelineConfig,
    backend: Arc<dyn ComputeBackend>,
    sink: &mut dyn FrameSink,
    reporter: Arc<dyn ProgressReporter>,
    cancel: Option<&AtomicBool>,
) -> Result<DetectionSummary> {
    let info = source.info();
    let total_hint = source.frame_count_hint();
    let batch_size = config.batch_size.max(2);
    info!(
        source = %info.location.display(),
        frames = ?total_hint,
        width = info.width,
        height = info.height,
        device = backend.name(),
        batch_size,
        "Starting key-frame detection"
    );

    let mut summary = DetectionSummary {
        device: backend.name().to_string(),
        ..Default::default()
    };
    let engine = SimilarityEngine::new(backend);
    let mut detector = KeyFrameDetector::new(config.decision.clone());
    let mut reorder = ReorderBuffer::new();
    let mut carry: Option<Frame> = None;

    reporter.begin_stage(PipelineStage::Scoring, total_hint);
    loop {
        check_cancel(cancel)?;

        let mut batch: Vec<Frame> = carry.take().into_iter().collect();
        let carried = batch.len();
        let more = fill_batch(source, &mut batch, batch_size)?;
        summary.frames_read += batch.len() - carried;

        if batch.len() >= 2 {
            let metrics = engine.compute_consecutive(&batch)?;
            // Each bundle remembers the batch position of its later frame.
            for (pos, bundle) in (1..batch.len()).zip(metrics) {
                reorder.insert(batch[pos].index(), (pos, bundle))?;
            }
            summary.pairs_scored += batch.len() - 1;
            debug!(
                first = batch[0].index(),
                frames = batch.len(),
                "Scored batch"
            );

            for (index, (pos, bundle)) in reorder.flush() {
                check_cancel(cancel)?;
                sink.record_metrics(index, &bundle)?;
                if let Some(key) = detector.step(index, &bundle)? {
                    sink.key_frame(key, &batch[pos])?;
                    summary.key_frames.push(key);
                }
            }
        }
        reporter.advance(summary.frames_read);

        carry = batch.pop();
        if !more {
            break;
        }
    }
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    sink.finish()?;
    reporter.finish_stage();

    info!(
        frames = summary.frames_read,
        key_frames = summary.key_frames.len(),
        "Key-frame detection complete"
    );
    Ok(summary)
}

/// Run key-frame detection without progress reporting or cancellation.
pub fn run_detection(
    source: &mut dyn FrameSource,
    config: &PipelineConfig,
    backend: Arc<dyn ComputeBackend>,
    sink: &mut dyn FrameSink,
) -> Result<DetectionSummary> {
    run_detection_reported(source, config, backend, sink, Arc::new(NoOpReporter), None)
}
