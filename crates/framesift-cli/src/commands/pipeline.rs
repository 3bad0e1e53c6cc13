use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use framesift_core::compute::create_backend;
use framesift_core::io::csv::MetricsCsvWriter;
use framesift_core::io::image_io::{KeyFrameFormat, KeyFrameImageWriter};
use framesift_core::io::open_source;
use framesift_core::pipeline::{run_detection_reported, FrameSource, SinkSet};

use super::common::{load_config, BarReporter, DeviceArg, ThresholdArgs};
use crate::summary::{print_pipeline_summary, print_result};

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jpg,
    Png,
}

#[derive(Args)]
pub struct RunArgs {
    /// Input SER file or image directory
    pub input: PathBuf,

    /// Directory for extracted key frames
    #[arg(short, long, default_value = "output_frames")]
    pub output: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also export per-frame metrics to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Image format for extracted key frames
    #[arg(long, value_enum, default_value = "jpg")]
    pub format: FormatArg,

    /// Frames scored per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Compute device
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    args.thresholds.apply(&mut config.decision);
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    if let Some(d) = args.device {
        config.device = d.into();
    }

    let mut source = open_source(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let backend = create_backend(config.device);
    print_pipeline_summary(&config, &source.info(), &args.output, backend.name());

    let format = match args.format {
        FormatArg::Jpg => KeyFrameFormat::Jpeg,
        FormatArg::Png => KeyFrameFormat::Png,
    };
    let mut images = KeyFrameImageWriter::create(&args.output, format)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let mut csv = match &args.csv {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Some(MetricsCsvWriter::new(BufWriter::new(file))?)
        }
        None => None,
    };

    let mut sinks = SinkSet::new().with(&mut images);
    if let Some(csv) = csv.as_mut() {
        sinks.push(csv);
    }

    let reporter = Arc::new(BarReporter::new()?);
    let summary = run_detection_reported(
        source.as_mut(),
        &config,
        backend,
        &mut sinks,
        reporter.clone(),
        None,
    )?;
    reporter.finish();
    drop(sinks);

    print_result(&summary, images.written());
    if let Some(path) = &args.csv {
        println!("Metrics saved to {}", path.display());
    }
    Ok(())
}
