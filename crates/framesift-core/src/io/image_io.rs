use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::error::Result;
use crate::frame::{ColorMode, Frame, SourceInfo};
use crate::pipeline::{FrameSink, FrameSource};

/// File extensions picked up by [`ImageSequenceSource`].
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Load an image file as a frame. Gray images stay single-channel.
pub fn load_frame(path: &Path, frame_index: usize) -> Result<Frame> {
    let img = image::open(path)?;
    Ok(frame_from_image(img, frame_index))
}

fn frame_from_image(img: DynamicImage, frame_index: usize) -> Frame {
    let (w, h) = (img.width() as usize, img.height() as usize);
    match img {
        DynamicImage::ImageLuma8(gray) => {
            let data = ndarray::Array2::from_shape_vec((h, w), gray.into_raw())
                .expect("buffer size matches dimensions");
            Frame::from_gray(data, frame_index)
        }
        other => {
            let rgb = other.to_rgb8();
            Frame::from_interleaved(rgb.into_raw(), h, w, 3, frame_index)
                .expect("buffer size matches dimensions")
        }
    }
}

/// Save a frame as 8-bit gray or RGB, choosing the format from the extension.
pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let samples: Vec<u8> = frame.data.iter().copied().collect();

    if frame.is_color() {
        let img = RgbImage::from_raw(w, h, samples).expect("buffer size matches dimensions");
        img.save_with_format(path, format)?;
    } else {
        let img = GrayImage::from_raw(w, h, samples).expect("buffer size matches dimensions");
        img.save_with_format(path, format)?;
    }
    Ok(())
}

/// Image files under `dir` (recursively), sorted by full path.
pub fn sorted_image_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    collect_images(dir, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// [`FrameSource`] over still images in a directory, in sorted path order.
///
/// Frame indices are positions in that order, starting at 0.
pub struct ImageSequenceSource {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    width: usize,
    height: usize,
    color_mode: ColorMode,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let paths = sorted_image_paths(dir)?;
        let (width, height, color_mode) = match paths.first() {
            Some(first) => {
                let frame = load_frame(first, 0)?;
                let mode = if frame.is_color() { ColorMode::RGB } else { ColorMode::Mono };
                (frame.width(), frame.height(), mode)
            }
            None => (0, 0, ColorMode::RGB),
        };
        debug!(dir = %dir.display(), images = paths.len(), "Opened image sequence");
        Ok(Self {
            dir: dir.to_path_buf(),
            paths,
            next: 0,
            width,
            height,
            color_mode,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let frame = load_frame(path, self.next)?;
        self.next += 1;
        Ok(Some(frame))
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            location: self.dir.clone(),
            total_frames: Some(self.paths.len()),
            width: self.width,
            height: self.height,
            color_mode: self.color_mode,
        }
    }
}

/// Image encoding for extracted key frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyFrameFormat {
    #[default]
    Jpeg,
    Png,
}

impl KeyFrameFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// [`FrameSink`] that writes each key frame to `<dir>/frame_<index>.<ext>`.
pub struct KeyFrameImageWriter {
    dir: PathBuf,
    format: KeyFrameFormat,
    written: Vec<PathBuf>,
}

impl KeyFrameImageWriter {
    /// Create the output directory if needed.
    pub fn create(dir: &Path, format: KeyFrameFormat) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            format,
            written: Vec::new(),
        })
    }

    /// Paths of the files written so far, in key-frame order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("frame_{index}.{}", self.format.extension()))
    }
}

impl FrameSink for KeyFrameImageWriter {
    fn key_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        let path = self.path_for(index);
        save_frame(frame, &path)?;
        debug!(frame = index, path = %path.display(), "Wrote key frame");
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!(count = self.written.len(), dir = %self.dir.display(), "Key frames extracted");
        Ok(())
    }
}
