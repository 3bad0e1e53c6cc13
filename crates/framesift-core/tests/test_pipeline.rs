mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use framesift_core::compute::cpu::CpuBackend;
use framesift_core::compute::{create_backend, DevicePreference};
use framesift_core::error::{FramesiftError, Result};
use framesift_core::frame::Frame;
use framesift_core::io::image_io::{
    load_frame, save_frame, ImageSequenceSource, KeyFrameFormat, KeyFrameImageWriter,
};
use framesift_core::io::open_source;
use framesift_core::pipeline::config::PipelineConfig;
use framesift_core::pipeline::{
    run_detection, run_detection_reported, FrameSink, FrameSource, InMemorySource, KeyFrameList,
    NoOpReporter, SinkSet,
};
use framesift_core::similarity::MetricBundle;

use common::{gradient_frame, scene_clip};

/// Records every callback for later inspection.
#[derive(Default)]
struct RecordingSink {
    metrics: Vec<(usize, MetricBundle)>,
    keys: Vec<usize>,
    finished: bool,
}

impl FrameSink for RecordingSink {
    fn record_metrics(&mut self, index: usize, metrics: &MetricBundle) -> Result<()> {
        self.metrics.push((index, *metrics));
        Ok(())
    }

    fn key_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        assert_eq!(frame.index(), index);
        self.keys.push(index);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Raises `flag` once metrics for `at` have been recorded.
struct CancelAt<'a> {
    flag: &'a AtomicBool,
    at: usize,
    keys: Vec<usize>,
}

impl FrameSink for CancelAt<'_> {
    fn record_metrics(&mut self, index: usize, _metrics: &MetricBundle) -> Result<()> {
        if index == self.at {
            self.flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn key_frame(&mut self, index: usize, _frame: &Frame) -> Result<()> {
        self.keys.push(index);
        Ok(())
    }
}

fn config_with_batch(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        ..Default::default()
    }
}

fn run_clip(frames: Vec<Frame>, batch_size: usize) -> RecordingSink {
    let mut sink = RecordingSink::default();
    run_detection(
        &mut InMemorySource::new(frames),
        &config_with_batch(batch_size),
        Arc::new(CpuBackend),
        &mut sink,
    )
    .unwrap();
    sink
}

#[test]
fn test_scene_changes_become_key_frames() {
    let sink = run_clip(scene_clip(24, 30, 3, 8), 256);
    assert_eq!(sink.keys, vec![8, 16]);
    assert!(sink.finished);
}

#[test]
fn test_every_pair_scored_across_batch_boundaries() {
    // Batches of 4 read frames 0-3, then 4-6 behind the carried frame 3, and
    // so on; both scene cuts fall on the pair that straddles two reads.
    let sink = run_clip(scene_clip(24, 30, 3, 4), 4);
    let indices: Vec<usize> = sink.metrics.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (1..12).collect::<Vec<_>>());
    assert_eq!(sink.keys, vec![4, 8]);
}

#[test]
fn test_batch_size_does_not_change_results() {
    let frames = scene_clip(24, 30, 4, 6);
    let reference = run_clip(frames.clone(), 256);
    for batch_size in [0, 2, 3, 5, 7] {
        let sink = run_clip(frames.clone(), batch_size);
        assert_eq!(sink.keys, reference.keys, "batch size {batch_size}");
        assert_eq!(sink.metrics, reference.metrics, "batch size {batch_size}");
    }
}

#[test]
fn test_summary_counts() {
    let mut keys = KeyFrameList::default();
    let summary = run_detection(
        &mut InMemorySource::new(scene_clip(12, 12, 2, 4)),
        &config_with_batch(3),
        create_backend(DevicePreference::Cpu),
        &mut keys,
    )
    .unwrap();
    assert_eq!(summary.frames_read, 8);
    assert_eq!(summary.pairs_scored, 7);
    assert_eq!(summary.key_frames, keys.indices);
    assert_eq!(summary.device, "CPU/Rayon");
}

#[test]
fn test_empty_and_single_frame_sources() {
    assert!(run_clip(Vec::new(), 4).metrics.is_empty());
    let sink = run_clip(vec![gradient_frame(9, 9, 0, 0)], 4);
    assert!(sink.metrics.is_empty());
    assert!(sink.keys.is_empty());
    assert!(sink.finished);
}

#[test]
fn test_mid_stream_dimension_change_fails() {
    let frames = vec![
        gradient_frame(9, 9, 0, 0),
        gradient_frame(9, 9, 1, 1),
        gradient_frame(12, 9, 2, 2),
    ];
    let mut sink = RecordingSink::default();
    let err = run_detection(
        &mut InMemorySource::new(frames),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, FramesiftError::DimensionMismatch { .. }));
}

#[test]
fn test_repeated_frame_index_fails() {
    let frames: Vec<Frame> = scene_clip(30, 30, 3, 2)
        .into_iter()
        .map(|mut f| {
            f.metadata.frame_index = 0;
            f
        })
        .collect();
    let mut sink = RecordingSink::default();
    let err = run_detection(
        &mut InMemorySource::new(frames),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, FramesiftError::DuplicateIndex { index: 0 }));
    assert!(sink.metrics.is_empty());
}

#[test]
fn test_index_going_backwards_across_batches_fails() {
    let mut frames = scene_clip(30, 30, 1, 6);
    // Second read batch (frames 3-5 behind the carried frame 2) restarts at 1.
    for (i, frame) in frames.iter_mut().enumerate().skip(3) {
        frame.metadata.frame_index = i - 2;
    }
    let mut sink = RecordingSink::default();
    let err = run_detection(
        &mut InMemorySource::new(frames),
        &config_with_batch(3),
        Arc::new(CpuBackend),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, FramesiftError::OutOfOrder { index: 1, last: 2 }));
    assert_eq!(sink.metrics.len(), 2);
}

#[test]
fn test_cancel_before_start() {
    let flag = AtomicBool::new(true);
    let mut sink = RecordingSink::default();
    let err = run_detection_reported(
        &mut InMemorySource::new(scene_clip(12, 12, 2, 4)),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut sink,
        Arc::new(NoOpReporter),
        Some(&flag),
    )
    .unwrap_err();
    assert!(matches!(err, FramesiftError::Cancelled));
    assert!(sink.metrics.is_empty());
    assert!(sink.keys.is_empty());
    assert!(!sink.finished);
}

#[test]
fn test_cancel_mid_run_stops_before_next_decision() {
    let flag = AtomicBool::new(false);
    let mut sink = CancelAt {
        flag: &flag,
        at: 2,
        keys: Vec::new(),
    };
    // Scene cut at frame 4 is never reached.
    let err = run_detection_reported(
        &mut InMemorySource::new(scene_clip(12, 12, 2, 4)),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut sink,
        Arc::new(NoOpReporter),
        Some(&flag),
    )
    .unwrap_err();
    assert!(matches!(err, FramesiftError::Cancelled));
    assert!(sink.keys.is_empty());
}

#[test]
fn test_sink_set_fans_out() {
    let mut first = KeyFrameList::default();
    let mut second = RecordingSink::default();
    let mut sinks = SinkSet::new().with(&mut first);
    sinks.push(&mut second);

    run_detection(
        &mut InMemorySource::new(scene_clip(30, 30, 3, 3)),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut sinks,
    )
    .unwrap();
    drop(sinks);

    assert_eq!(first.indices, vec![3, 6]);
    assert_eq!(second.keys, first.indices);
    assert_eq!(second.metrics.len(), 8);
    assert!(second.finished);
}

#[test]
fn test_key_frame_images_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("keys");
    let frames = scene_clip(30, 30, 3, 3);
    let expected: Vec<Frame> = vec![frames[3].clone(), frames[6].clone()];

    let mut writer = KeyFrameImageWriter::create(&out, KeyFrameFormat::Png).unwrap();
    run_detection(
        &mut InMemorySource::new(frames),
        &PipelineConfig::default(),
        Arc::new(CpuBackend),
        &mut writer,
    )
    .unwrap();

    assert_eq!(
        writer.written(),
        &[out.join("frame_3.png"), out.join("frame_6.png")]
    );
    for (path, frame) in writer.written().iter().zip(&expected) {
        let loaded = load_frame(path, frame.index()).unwrap();
        assert_eq!(loaded.data, frame.data);
    }
}

#[test]
fn test_jpeg_key_frame_naming() {
    let dir = tempfile::tempdir().unwrap();
    let writer = KeyFrameImageWriter::create(dir.path(), KeyFrameFormat::default()).unwrap();
    assert_eq!(writer.path_for(42), dir.path().join("frame_42.jpg"));
}

#[test]
fn test_image_sequence_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("b");
    std::fs::create_dir(&nested).unwrap();

    let gray = |v: u8| Frame::from_gray(Array2::from_elem((6, 6), v), 0);
    save_frame(&gray(30), &dir.path().join("c.png")).unwrap();
    save_frame(&gray(10), &dir.path().join("a.png")).unwrap();
    save_frame(&gray(20), &nested.join("frame.png")).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let mut source = ImageSequenceSource::open(dir.path()).unwrap();
    assert_eq!(source.frame_count_hint(), Some(3));
    let mut seen = Vec::new();
    while let Some(frame) = source.next_frame().unwrap() {
        assert!(!frame.is_color());
        seen.push((frame.index(), frame.data[[0, 0, 0]]));
    }
    assert_eq!(seen, vec![(0, 10), (1, 20), (2, 30)]);

    let boxed = open_source(dir.path()).unwrap();
    assert_eq!(boxed.info().total_frames, Some(3));
}
