use ndarray::{ArrayView1, Axis};
use rayon::prelude::*;

use crate::consts::{HISTOGRAM_BINS, HISTOGRAM_BIN_SHIFT, HISTOGRAM_LEN, PARALLEL_PIXEL_THRESHOLD};
use crate::frame::Frame;

/// Joint 8x8x8 color histogram, L2-normalized and flattened channel-major.
#[derive(Clone, Debug)]
pub struct ColorHistogram {
    bins: Vec<f64>,
}

impl ColorHistogram {
    /// Bin every pixel of `frame` over [0, 256) per channel.
    ///
    /// Grayscale samples land in the (v, v, v) bin.
    pub fn from_frame(frame: &Frame) -> Self {
        let (h, w) = (frame.height(), frame.width());
        let counts = if h * w >= PARALLEL_PIXEL_THRESHOLD {
            frame
                .data
                .axis_iter(Axis(0))
                .into_par_iter()
                .fold(
                    || vec![0u32; HISTOGRAM_LEN],
                    |mut acc, row| {
                        for px in row.outer_iter() {
                            acc[pixel_bin(px)] += 1;
                        }
                        acc
                    },
                )
                .reduce(
                    || vec![0u32; HISTOGRAM_LEN],
                    |mut a, b| {
                        a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                        a
                    },
                )
        } else {
            let mut acc = vec![0u32; HISTOGRAM_LEN];
            for px in frame.data.lanes(Axis(2)) {
                acc[pixel_bin(px)] += 1;
            }
            acc
        };

        let norm = counts
            .iter()
            .map(|&c| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt();
        let bins = if norm > 0.0 {
            counts.iter().map(|&c| c as f64 / norm).collect()
        } else {
            vec![0.0; HISTOGRAM_LEN]
        };

        Self { bins }
    }

    /// Zero-lag cross-correlation of two normalized histograms.
    pub fn correlate(&self, other: &ColorHistogram) -> f64 {
        self.bins
            .iter()
            .zip(&other.bins)
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }
}

/// Histogram correlation of a frame pair. Symmetric in its arguments.
pub fn histogram_similarity(a: &Frame, b: &Frame) -> f64 {
    ColorHistogram::from_frame(a).correlate(&ColorHistogram::from_frame(b))
}

/// Joint bin of one pixel; a single channel is read as (v, v, v).
#[inline]
fn pixel_bin(px: ArrayView1<u8>) -> usize {
    let bin = |v: u8| (v >> HISTOGRAM_BIN_SHIFT) as usize;
    let last = px.len() - 1;
    let (c0, c1, c2) = (bin(px[0]), bin(px[last / 2]), bin(px[last]));
    (c0 * HISTOGRAM_BINS + c1) * HISTOGRAM_BINS + c2
}
