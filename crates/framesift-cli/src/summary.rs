use std::path::{Path, PathBuf};

use console::Style;
use framesift_core::frame::SourceInfo;
use framesift_core::pipeline::config::PipelineConfig;
use framesift_core::pipeline::DetectionSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(
    config: &PipelineConfig,
    source: &SourceInfo,
    output: &Path,
    device_name: &str,
) {
    let s = Styles::new();
    let d = &config.decision;

    println!();
    println!("  {}", s.title.apply_to("framesift"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(9)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(source.location.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Device"),
        s.method.apply_to(device_name)
    );
    let frames = source
        .total_frames
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    println!(
        "  {:<14}{} ({}x{}, {:?})",
        s.label.apply_to("Frames"),
        s.value.apply_to(frames),
        source.width,
        source.height,
        source.color_mode
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Batch size"),
        s.value.apply_to(config.batch_size)
    );

    println!();
    println!("  {}", s.header.apply_to("Thresholds"));
    let rows = [
        ("SSIM", d.ssim_threshold),
        ("SSIM top", d.ssim_threshold_top),
        ("SSIM bottom", d.ssim_threshold_bottom),
        ("Histogram", d.histogram_similarity_threshold),
        ("Time (s)", d.time_threshold),
        ("FPS", d.fps),
        ("Cutoff", d.score_cutoff),
    ];
    for (label, value) in rows {
        println!("  {:<14}{}", s.label.apply_to(label), s.value.apply_to(value));
    }
    println!();
}

pub fn print_result(summary: &DetectionSummary, written: &[PathBuf]) {
    let s = Styles::new();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames read"),
        s.value.apply_to(summary.frames_read)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Key frames"),
        s.value.apply_to(summary.key_frames.len())
    );
    for path in written {
        println!("    {}", s.path.apply_to(path.display()));
    }
}
