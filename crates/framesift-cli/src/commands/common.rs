use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use framesift_core::compute::DevicePreference;
use framesift_core::decision::DecisionConfig;
use framesift_core::pipeline::config::PipelineConfig;
use framesift_core::pipeline::{PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone, Copy, ValueEnum)]
pub enum DeviceArg {
    Auto,
    Cpu,
    Gpu,
}

impl From<DeviceArg> for DevicePreference {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => DevicePreference::Auto,
            DeviceArg::Cpu => DevicePreference::Cpu,
            DeviceArg::Gpu => DevicePreference::Gpu,
        }
    }
}

/// Decision thresholds; each flag overrides the config file or default.
#[derive(Args, Clone, Default)]
pub struct ThresholdArgs {
    /// Whole-frame SSIM threshold
    #[arg(long)]
    pub ssim_threshold: Option<f64>,

    /// Top-region SSIM threshold
    #[arg(long)]
    pub ssim_threshold_top: Option<f64>,

    /// Bottom-region SSIM threshold
    #[arg(long)]
    pub ssim_threshold_bottom: Option<f64>,

    /// Histogram correlation threshold
    #[arg(long)]
    pub histogram_threshold: Option<f64>,

    /// Seconds since the last key frame before time adds to the score
    #[arg(long)]
    pub time_threshold: Option<f64>,

    /// Frame rate of the source
    #[arg(long)]
    pub fps: Option<f64>,

    /// Composite score a frame must exceed to become a key frame
    #[arg(long)]
    pub score_cutoff: Option<f64>,
}

impl ThresholdArgs {
    pub fn apply(&self, config: &mut DecisionConfig) {
        let overrides = [
            (self.ssim_threshold, &mut config.ssim_threshold),
            (self.ssim_threshold_top, &mut config.ssim_threshold_top),
            (self.ssim_threshold_bottom, &mut config.ssim_threshold_bottom),
            (
                self.histogram_threshold,
                &mut config.histogram_similarity_threshold,
            ),
            (self.time_threshold, &mut config.time_threshold),
            (self.fps, &mut config.fps),
            (self.score_cutoff, &mut config.score_cutoff),
        ];
        for (value, field) in overrides {
            if let Some(v) = value {
                *field = v;
            }
        }
    }
}

/// Read a TOML pipeline config, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents).context("Invalid pipeline config")
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Progress bar driven by the pipeline's stage callbacks.
pub struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:22} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_position(0);
        self.pb.set_length(total_items.unwrap_or(0) as u64);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }
}
