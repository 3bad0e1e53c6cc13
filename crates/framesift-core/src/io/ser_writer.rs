use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{FramesiftError, Result};
use crate::frame::{ColorMode, Frame};
use crate::io::ser::{SerHeader, SER_HEADER_SIZE, SER_MAGIC};
use crate::pipeline::FrameSource;

/// Byte offset of the FrameCount field inside the header.
const FRAME_COUNT_OFFSET: u64 = 38;

/// Writes an 8-bit SER file frame by frame.
pub struct SerWriter {
    writer: BufWriter<File>,
    header: SerHeader,
    color_mode: ColorMode,
    frames_written: u32,
}

impl SerWriter {
    /// Create a new SER file and write the header.
    pub fn create(path: &Path, header: &SerHeader) -> Result<Self> {
        let color_mode = header.color_mode()?;
        if header.pixel_depth != 8 {
            return Err(FramesiftError::UnsupportedFormat(format!(
                "SER writer only emits 8-bit samples, got {}",
                header.pixel_depth
            )));
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            color_mode,
            frames_written: 0,
        })
    }

    /// Write one frame; its shape must match the header.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let expected = (
            self.header.height as usize,
            self.header.width as usize,
            self.color_mode.channels(),
        );
        if frame.data.dim() != expected {
            let (h, w, c) = frame.data.dim();
            return Err(FramesiftError::DimensionMismatch {
                first_height: expected.0,
                first_width: expected.1,
                first_channels: expected.2,
                second_height: h,
                second_width: w,
                second_channels: c,
            });
        }
        let mut samples: Vec<u8> = frame.data.iter().copied().collect();
        if self.color_mode == ColorMode::BGR {
            for px in samples.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        self.write_raw_frame(&samples)
    }

    /// Write a single raw frame (bytes must match the header's frame size).
    pub fn write_raw_frame(&mut self, data: &[u8]) -> Result<()> {
        debug_assert_eq!(Some(data.len()), self.header.frame_byte_size().ok());
        self.writer.write_all(data)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush, and patch the header's frame count if it differs from what was written.
    pub fn finalize(mut self) -> Result<()> {
        self.writer.flush()?;
        if self.frames_written != self.header.frame_count {
            let mut file = self
                .writer
                .into_inner()
                .map_err(|e| FramesiftError::Io(e.into_error()))?;
            file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
            file.write_all(&(self.frames_written as i32).to_le_bytes())?;
            file.flush()?;
        }
        Ok(())
    }
}

/// Drain `source` into a new 8-bit SER file at `path`.
///
/// BGR and deeper sources come out as 8-bit RGB. Every frame must match the
/// first frame's shape. Returns the number of frames written.
pub fn write_source(source: &mut dyn FrameSource, path: &Path) -> Result<usize> {
    let info = source.info();
    let color_mode = match info.color_mode {
        ColorMode::Mono => ColorMode::Mono,
        ColorMode::RGB | ColorMode::BGR => ColorMode::RGB,
    };
    let header = SerHeader::new_8bit(
        info.width as u32,
        info.height as u32,
        color_mode,
        info.total_frames.unwrap_or(0) as u32,
    );

    let mut writer = SerWriter::create(path, &header)?;
    let mut written = 0;
    while let Some(frame) = source.next_frame()? {
        writer.write_frame(&frame)?;
        written += 1;
    }
    writer.finalize()?;
    tracing::info!(frames = written, path = %path.display(), "Wrote SER file");
    Ok(written)
}

fn write_header(w: &mut impl Write, header: &SerHeader) -> Result<()> {
    // Magic (14 bytes)
    w.write_all(SER_MAGIC)?;
    // LuID (4 bytes)
    w.write_all(&0i32.to_le_bytes())?;
    // ColorID (4 bytes)
    w.write_all(&header.color_id.to_le_bytes())?;
    // LittleEndian flag: 0 = little-endian (Siril convention)
    let le_flag: i32 = if header.little_endian { 0 } else { 1 };
    w.write_all(&le_flag.to_le_bytes())?;
    w.write_all(&(header.width as i32).to_le_bytes())?;
    w.write_all(&(header.height as i32).to_le_bytes())?;
    w.write_all(&(header.pixel_depth as i32).to_le_bytes())?;
    w.write_all(&(header.frame_count as i32).to_le_bytes())?;
    write_fixed_string(w, &header.observer, 40)?;
    write_fixed_string(w, &header.instrument, 40)?;
    write_fixed_string(w, &header.telescope, 40)?;
    w.write_all(&header.date_time.to_le_bytes())?;
    w.write_all(&header.date_time_utc.to_le_bytes())?;

    debug_assert_eq!(
        14 + 4 + 4 + 4 + 4 + 4 + 4 + 4 + 40 + 40 + 40 + 8 + 8,
        SER_HEADER_SIZE
    );
    Ok(())
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    let to_write = bytes.len().min(len);
    w.write_all(&bytes[..to_write])?;
    w.write_all(&vec![0u8; len - to_write])?;
    Ok(())
}
