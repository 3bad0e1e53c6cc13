use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framesift_core::decision::identify_key_frames;
use framesift_core::io::csv::read_metrics_csv;

use super::common::{load_config, ThresholdArgs};

#[derive(Args)]
pub struct DecideArgs {
    /// Metrics CSV written by `framesift analyze`
    pub metrics: PathBuf,

    /// Pipeline config file (TOML); only the decision section is used
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

pub fn run(args: &DecideArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?.decision;
    args.thresholds.apply(&mut config);

    let file = File::open(&args.metrics)
        .with_context(|| format!("Failed to open {}", args.metrics.display()))?;
    let rows = read_metrics_csv(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", args.metrics.display()))?;

    let key_frames = identify_key_frames(&config, rows.iter().map(|(i, m)| (*i, m)))?;

    for index in &key_frames {
        println!("{index}");
    }
    eprintln!(
        "{} key frames out of {} scored frames",
        key_frames.len(),
        rows.len()
    );
    Ok(())
}
