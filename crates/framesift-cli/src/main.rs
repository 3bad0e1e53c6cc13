mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framesift", about = "Key-frame detection for decoded video frames")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show frame source metadata
    Info(commands::info::InfoArgs),
    /// Compute per-frame similarity metrics and export them as CSV
    Analyze(commands::analyze::AnalyzeArgs),
    /// Select key frames from a previously exported metrics CSV
    Decide(commands::decide::DecideArgs),
    /// Run detection and extract key frames as images
    Run(commands::pipeline::RunArgs),
    /// Re-encode a SER file or image directory as an 8-bit SER file
    Convert(commands::convert::ConvertArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Decide(args) => commands::decide::run(args),
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
