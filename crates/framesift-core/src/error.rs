use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramesiftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Unsupported frame format: {0}")]
    UnsupportedFormat(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error(
        "Frame pair dimension mismatch: {first_height}x{first_width}x{first_channels} vs {second_height}x{second_width}x{second_channels}"
    )]
    DimensionMismatch {
        first_height: usize,
        first_width: usize,
        first_channels: usize,
        second_height: usize,
        second_width: usize,
        second_channels: usize,
    },

    #[error("Frame too small for region extraction: {width}x{height} (minimum 3x3)")]
    FrameTooSmall { width: usize, height: usize },

    #[error("Invalid metrics CSV at line {line}: {reason}")]
    InvalidCsv { line: usize, reason: String },

    #[error("Frame index {index} arrived after {last}; metrics must be strictly increasing")]
    OutOfOrder { index: usize, last: usize },

    #[error("Frame index {index} appears more than once in the stream")]
    DuplicateIndex { index: usize },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Processing cancelled")]
    Cancelled,

    #[error("GPU error: {0}")]
    GpuError(String),
}

pub type Result<T> = std::result::Result<T, FramesiftError>;
