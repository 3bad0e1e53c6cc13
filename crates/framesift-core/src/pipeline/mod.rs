pub mod config;
mod orchestrator;
mod reorder;
mod types;

pub use orchestrator::{run_detection, run_detection_reported, DetectionSummary};
pub use reorder::ReorderBuffer;
pub use types::{
    FrameSink, FrameSource, InMemorySource, KeyFrameList, NoOpReporter, PipelineStage,
    ProgressReporter, SinkSet,
};
