pub mod csv;
pub mod image_io;
pub mod ser;
pub mod ser_writer;

use std::path::Path;

use crate::error::Result;
use crate::pipeline::FrameSource;

/// Open `path` as a frame source: a directory is read as an image sequence,
/// anything else as a SER file.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if path.is_dir() {
        Ok(Box::new(image_io::ImageSequenceSource::open(path)?))
    } else {
        Ok(Box::new(ser::SerFrameSource::open(path)?))
    }
}
