use ndarray::{Array2, Array3, Axis, Zip};
use std::path::PathBuf;

use crate::consts::{COLOR_CHANNEL_COUNT, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::error::{FramesiftError, Result};

/// A single decoded video frame.
/// Samples are 8-bit, shape = (height, width, channels) with 1 or 3 channels (RGB order).
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, interleaved channels
    pub data: Array3<u8>,
    /// Per-frame metadata
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array3<u8>, frame_index: usize) -> Result<Self> {
        let channels = data.len_of(Axis(2));
        if channels != 1 && channels != COLOR_CHANNEL_COUNT {
            return Err(FramesiftError::UnsupportedFormat(format!(
                "{channels} channels (expected 1 or 3)"
            )));
        }
        Ok(Self {
            data,
            metadata: FrameMetadata { frame_index },
        })
    }

    /// Build a single-channel frame from a grayscale raster.
    pub fn from_gray(gray: Array2<u8>, frame_index: usize) -> Self {
        let (h, w) = gray.dim();
        let data = gray
            .into_shape_with_order((h, w, 1))
            .expect("grayscale raster reshapes to one channel");
        Self {
            data,
            metadata: FrameMetadata { frame_index },
        }
    }

    /// Build a frame from interleaved samples (`channels` per pixel).
    pub fn from_interleaved(
        samples: Vec<u8>,
        height: usize,
        width: usize,
        channels: usize,
        frame_index: usize,
    ) -> Result<Self> {
        let data = Array3::from_shape_vec((height, width, channels), samples).map_err(|e| {
            FramesiftError::UnsupportedFormat(format!(
                "{height}x{width}x{channels} sample buffer: {e}"
            ))
        })?;
        Self::new(data, frame_index)
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn index(&self) -> usize {
        self.metadata.frame_index
    }

    pub fn is_color(&self) -> bool {
        self.channels() == COLOR_CHANNEL_COUNT
    }

    /// Luminance raster as f32 on the 0-255 scale.
    ///
    /// Color frames are weighted with BT.601 coefficients and rounded to the
    /// nearest 8-bit level, so the result matches what an 8-bit decoder's
    /// color conversion produces.
    pub fn to_gray(&self) -> Array2<f32> {
        if !self.is_color() {
            return self.data.index_axis(Axis(2), 0).mapv(f32::from);
        }
        let mut gray = Array2::<f32>::zeros((self.height(), self.width()));
        Zip::from(&mut gray)
            .and(self.data.lanes(Axis(2)))
            .for_each(|g, px| {
                let y = LUMINANCE_R * f32::from(px[0])
                    + LUMINANCE_G * f32::from(px[1])
                    + LUMINANCE_B * f32::from(px[2]);
                *g = y.round().min(255.0);
            });
        gray
    }

    /// True when both frames share height, width and channel count.
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.data.dim() == other.data.dim()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
}

/// Sample layout of the source data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum ColorMode {
    Mono,
    RGB,
    BGR,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::RGB | Self::BGR => COLOR_CHANNEL_COUNT,
        }
    }
}

/// Metadata about a frame source.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub location: PathBuf,
    pub total_frames: Option<usize>,
    pub width: usize,
    pub height: usize,
    pub color_mode: ColorMode,
}
