use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;

use crate::error::{FramesiftError, Result};
use crate::frame::{ColorMode, Frame, SourceInfo};
use crate::pipeline::FrameSource;

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER color ids this crate decodes.
pub const SER_COLOR_MONO: i32 = 0;
pub const SER_COLOR_RGB: i32 = 100;
pub const SER_COLOR_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Header for an 8-bit little-endian file with empty text fields.
    pub fn new_8bit(width: u32, height: u32, color_mode: ColorMode, frame_count: u32) -> Self {
        let color_id = match color_mode {
            ColorMode::Mono => SER_COLOR_MONO,
            ColorMode::RGB => SER_COLOR_RGB,
            ColorMode::BGR => SER_COLOR_BGR,
        };
        Self {
            color_id,
            little_endian: true,
            width,
            height,
            pixel_depth: 8,
            frame_count,
            observer: String::new(),
            instrument: String::new(),
            telescope: String::new(),
            date_time: 0,
            date_time_utc: 0,
        }
    }

    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            SER_COLOR_RGB | SER_COLOR_BGR => 3,
            _ => 1,
        }
    }

    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|p| p.checked_mul(self.bytes_per_sample() * self.planes_per_pixel()))
            .ok_or_else(|| FramesiftError::InvalidSer("Frame size overflows".into()))
    }

    /// Sample layout, or an error for Bayer and unknown color ids.
    pub fn color_mode(&self) -> Result<ColorMode> {
        match self.color_id {
            SER_COLOR_MONO => Ok(ColorMode::Mono),
            SER_COLOR_RGB => Ok(ColorMode::RGB),
            SER_COLOR_BGR => Ok(ColorMode::BGR),
            8..=19 => Err(FramesiftError::UnsupportedFormat(format!(
                "Bayer SER data (color id {}) must be debayered first",
                self.color_id
            ))),
            other => Err(FramesiftError::UnsupportedFormat(format!(
                "SER color id {other}"
            ))),
        }
    }
}

/// Memory-mapped SER file reader.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
    color_mode: ColorMode,
    frame_bytes: usize,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only and lives as long as the reader; a
        // concurrent truncation by another process is outside our contract.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(FramesiftError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(FramesiftError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let color_mode = header.color_mode()?;
        let frame_bytes = header.frame_byte_size()?;

        let expected_data_size = SER_HEADER_SIZE + frame_bytes * header.frame_count as usize;
        if mmap.len() < expected_data_size {
            return Err(FramesiftError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            color_mode,
            frame_bytes,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(FramesiftError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_bytes;
        Ok(&self.mmap[offset..offset + self.frame_bytes])
    }

    /// Read a single frame as 8-bit samples in RGB (or mono) order.
    ///
    /// Deeper samples are scaled down to 8 bits.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let planes = self.header.planes_per_pixel();

        let mut samples = decode_samples(
            raw,
            self.header.bytes_per_sample(),
            self.header.pixel_depth,
            self.header.little_endian,
        );
        if self.color_mode == ColorMode::BGR {
            for px in samples.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }

        Frame::from_interleaved(samples, h, w, planes, index)
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            location: path.to_path_buf(),
            total_frames: Some(self.frame_count()),
            width: self.header.width as usize,
            height: self.header.height as usize,
            color_mode: self.color_mode,
        }
    }

    /// Iterator over all frames.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }
}

/// [`FrameSource`] over the frames of a SER file, in file order.
pub struct SerFrameSource {
    reader: SerReader,
    path: PathBuf,
    next: usize,
}

impl SerFrameSource {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            reader: SerReader::open(path)?,
            path: path.to_path_buf(),
            next: 0,
        })
    }

    pub fn reader(&self) -> &SerReader {
        &self.reader
    }
}

impl FrameSource for SerFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next >= self.reader.frame_count() {
            return Ok(None);
        }
        let frame = self.reader.read_frame(self.next)?;
        self.next += 1;
        Ok(Some(frame))
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.reader.frame_count())
    }

    fn info(&self) -> SourceInfo {
        self.reader.source_info(&self.path)
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(FramesiftError::InvalidSer(format!(
            "Invalid dimensions {width}x{height}"
        )));
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(FramesiftError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count < 0 {
        return Err(FramesiftError::InvalidSer(format!(
            "Negative frame count {frame_count}"
        )));
    }

    // Writers disagree on the endianness flag; 0 is read as little-endian
    // the way Siril does.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn decode_samples(raw: &[u8], bytes_per_sample: usize, bit_depth: u32, little_endian: bool) -> Vec<u8> {
    if bytes_per_sample == 1 {
        return raw.to_vec();
    }
    let max_val = ((1u32 << bit_depth) - 1) as f32;
    raw.chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            let v = if little_endian {
                u16::from_le_bytes(pair)
            } else {
                u16::from_be_bytes(pair)
            };
            ((v as f32 / max_val).min(1.0) * 255.0).round() as u8
        })
        .collect()
}
