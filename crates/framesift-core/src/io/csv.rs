//! Tabular metrics export and re-import.
//!
//! One header row, then one row per scored frame:
//! `frame_count,ssim_top,ssim_bottom,ssim_overall,histogram_similarity`.
//! Floats are written in shortest round-trip form, so a file read back
//! reproduces the exact decisions of the run that wrote it.

use std::io::{BufRead, Write};

use crate::error::{FramesiftError, Result};
use crate::frame::Frame;
use crate::pipeline::FrameSink;
use crate::similarity::MetricBundle;

pub const CSV_COLUMNS: [&str; 5] = [
    "frame_count",
    "ssim_top",
    "ssim_bottom",
    "ssim_overall",
    "histogram_similarity",
];

/// [`FrameSink`] that records every metric bundle as a CSV row.
pub struct MetricsCsvWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> MetricsCsvWriter<W> {
    /// Wrap `out` and write the header row.
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", CSV_COLUMNS.join(","))?;
        Ok(Self { out, rows: 0 })
    }

    pub fn write_row(&mut self, index: usize, m: &MetricBundle) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{}",
            index, m.ssim_top, m.ssim_bottom, m.ssim_overall, m.histogram_similarity
        )?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> FrameSink for MetricsCsvWriter<W> {
    fn record_metrics(&mut self, index: usize, metrics: &MetricBundle) -> Result<()> {
        self.write_row(index, metrics)
    }

    fn key_frame(&mut self, _index: usize, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Parse a metrics CSV back into `(frame index, metrics)` rows.
///
/// Columns are matched by header name, so reordered columns are accepted.
/// Blank lines are skipped.
pub fn read_metrics_csv(input: impl BufRead) -> Result<Vec<(usize, MetricBundle)>> {
    let mut lines = input.lines().enumerate();

    let (header_line, header) = loop {
        match lines.next() {
            Some((i, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break (i + 1, line);
                }
            }
            None => return Ok(Vec::new()),
        }
    };
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let column = |name: &str| {
        names
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| FramesiftError::InvalidCsv {
                line: header_line,
                reason: format!("missing column `{name}`"),
            })
    };
    let cols = [
        column(CSV_COLUMNS[0])?,
        column(CSV_COLUMNS[1])?,
        column(CSV_COLUMNS[2])?,
        column(CSV_COLUMNS[3])?,
        column(CSV_COLUMNS[4])?,
    ];

    let mut rows = Vec::new();
    for (i, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != names.len() {
            return Err(FramesiftError::InvalidCsv {
                line: line_no,
                reason: format!("expected {} fields, found {}", names.len(), fields.len()),
            });
        }
        let float = |col: usize| -> Result<f64> {
            fields[col].parse().map_err(|_| FramesiftError::InvalidCsv {
                line: line_no,
                reason: format!("`{}` is not a number", fields[col]),
            })
        };
        let index: usize = fields[cols[0]].parse().map_err(|_| FramesiftError::InvalidCsv {
            line: line_no,
            reason: format!("`{}` is not a frame index", fields[cols[0]]),
        })?;
        rows.push((
            index,
            MetricBundle {
                ssim_top: float(cols[1])?,
                ssim_bottom: float(cols[2])?,
                ssim_overall: float(cols[3])?,
                histogram_similarity: float(cols[4])?,
            },
        ));
    }
    Ok(rows)
}
