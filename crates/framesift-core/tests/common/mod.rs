#![allow(dead_code)]

use std::path::Path;

use framesift_core::frame::{ColorMode, Frame};
use framesift_core::io::ser::{SerHeader, SER_HEADER_SIZE};
use framesift_core::io::ser_writer::SerWriter;
use framesift_core::similarity::MetricBundle;
use ndarray::{Array3, Axis};

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Write a SER buffer to a temporary file and return the temp file handle.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

/// Encode `frames` into an 8-bit SER file at `path`.
pub fn write_frames_ser(path: &Path, frames: &[Frame], color_mode: ColorMode) {
    let first = &frames[0];
    let header = SerHeader::new_8bit(
        first.width() as u32,
        first.height() as u32,
        color_mode,
        frames.len() as u32,
    );
    let mut writer = SerWriter::create(path, &header).expect("create SER");
    for frame in frames {
        writer.write_frame(frame).expect("write frame");
    }
    writer.finalize().expect("finalize SER");
}

/// Deterministic pseudo-random RGB frame (xorshift), distinct per `seed`.
pub fn noise_frame(h: usize, w: usize, seed: u32, index: usize) -> Frame {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    let data = Array3::from_shape_fn((h, w, 3), |_| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 24) as u8
    });
    Frame::new(data, index).expect("three channels")
}

/// Smooth RGB gradient; `shift` slides the pattern horizontally.
pub fn gradient_frame(h: usize, w: usize, shift: usize, index: usize) -> Frame {
    let data = Array3::from_shape_fn((h, w, 3), |(r, c, ch)| {
        let x = (c + shift) % w;
        ((x * 255 / w.max(1)) as u8)
            .wrapping_add((r * 3) as u8)
            .wrapping_add((ch * 40) as u8)
    });
    Frame::new(data, index).expect("three channels")
}

/// Uniform RGB frame.
pub fn solid_frame(h: usize, w: usize, rgb: [u8; 3], index: usize) -> Frame {
    let data = Array3::from_shape_fn((h, w, 3), |(_, _, ch)| rgb[ch]);
    Frame::new(data, index).expect("three channels")
}

/// A clip of `scenes` visually distinct scenes, each held for `scene_len` frames.
///
/// Red and green are per-scene noise; blue is a per-scene level in its own
/// histogram bin (up to four scenes), so histograms of different scenes
/// share no bins.
pub fn scene_clip(h: usize, w: usize, scenes: usize, scene_len: usize) -> Vec<Frame> {
    (0..scenes * scene_len)
        .map(|i| {
            let scene = i / scene_len;
            let mut frame = noise_frame(h, w, scene as u32 + 1, i);
            let blue = (scene % 4 * 64 + 16) as u8;
            frame.data.index_axis_mut(Axis(2), 2).fill(blue);
            frame
        })
        .collect()
}

/// Bundle sitting exactly on the default thresholds (every deficit zero).
pub fn bundle_at_default_thresholds() -> MetricBundle {
    MetricBundle {
        ssim_overall: 0.95,
        ssim_top: 0.95,
        ssim_bottom: 0.95,
        histogram_similarity: 0.7,
    }
}

/// Bundle for a pair of identical frames.
pub fn identical_bundle() -> MetricBundle {
    MetricBundle {
        ssim_overall: 1.0,
        ssim_top: 1.0,
        ssim_bottom: 1.0,
        histogram_similarity: 1.0,
    }
}
