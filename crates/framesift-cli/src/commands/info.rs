use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framesift_core::io::open_source;
use framesift_core::pipeline::FrameSource;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or image directory
    pub input: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let source = open_source(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let info = source.info();

    println!("Source:      {}", info.location.display());
    match info.total_frames {
        Some(n) => println!("Frames:      {}", n),
        None => println!("Frames:      unknown"),
    }
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Color mode:  {:?}", info.color_mode);

    let channels = info.color_mode.channels();
    if let Some(n) = info.total_frames {
        let total_mb = (info.width * info.height * channels * n) as f64 / (1024.0 * 1024.0);
        println!("Data size:   {:.1} MB", total_mb);
    }

    Ok(())
}
