use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framesift_core::io::open_source;
use framesift_core::io::ser_writer::write_source;
use framesift_core::pipeline::FrameSource;

#[derive(Args)]
pub struct ConvertArgs {
    /// Input SER file or image directory
    pub input: PathBuf,

    /// Output SER path
    #[arg(short, long, default_value = "frames.ser")]
    pub output: PathBuf,
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let mut source = open_source(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let info = source.info();

    let written = write_source(source.as_mut(), &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} frames ({}x{}) to {}",
        written,
        info.width,
        info.height,
        args.output.display()
    );
    Ok(())
}
