use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use framesift_core::compute::create_backend;
use framesift_core::io::csv::MetricsCsvWriter;
use framesift_core::io::open_source;
use framesift_core::pipeline::run_detection_reported;

use super::common::{load_config, BarReporter, DeviceArg};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input SER file or image directory
    pub input: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "frame_analysis.csv")]
    pub output: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames scored per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Compute device
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    if let Some(d) = args.device {
        config.device = d.into();
    }

    let mut source = open_source(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut csv = MetricsCsvWriter::new(BufWriter::new(file))?;

    let backend = create_backend(config.device);
    let reporter = Arc::new(BarReporter::new()?);
    let summary = run_detection_reported(
        source.as_mut(),
        &config,
        backend,
        &mut csv,
        reporter.clone(),
        None,
    )?;
    reporter.finish();

    println!(
        "Processed {} frames on {} and saved {} rows to {}",
        summary.frames_read,
        summary.device,
        csv.rows(),
        args.output.display()
    );
    Ok(())
}
