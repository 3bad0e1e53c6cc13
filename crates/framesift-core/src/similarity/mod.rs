//! Similarity Engine: per-pair SSIM (whole frame and caption regions) plus
//! color-histogram correlation.

pub mod histogram;
pub mod ssim;

use std::sync::Arc;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::{ComputeBackend, SsimJob};
use crate::compute::cpu::CpuBackend;
use crate::error::{FramesiftError, Result};
use crate::frame::Frame;
use crate::region::Region;

use histogram::ColorHistogram;

/// Similarity signals for one frame pair, keyed by the later frame's index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub ssim_overall: f64,
    pub ssim_top: f64,
    pub ssim_bottom: f64,
    pub histogram_similarity: f64,
}

/// An ordered (previous, current) pair of equally shaped frames.
#[derive(Clone, Copy, Debug)]
pub struct FramePair<'a> {
    pub previous: &'a Frame,
    pub current: &'a Frame,
}

impl<'a> FramePair<'a> {
    pub fn new(previous: &'a Frame, current: &'a Frame) -> Self {
        Self { previous, current }
    }

    /// Index the pair's metrics are keyed by.
    pub fn index(&self) -> usize {
        self.current.index()
    }

    fn validate(&self) -> Result<()> {
        let (a, b) = (self.previous, self.current);
        if !a.same_shape(b) {
            return Err(FramesiftError::DimensionMismatch {
                first_height: a.height(),
                first_width: a.width(),
                first_channels: a.channels(),
                second_height: b.height(),
                second_width: b.width(),
                second_channels: b.channels(),
            });
        }
        // Region bounds fail for frames under 3x3.
        Region::TopThirdMiddle.bounds(a.height(), a.width())?;
        Ok(())
    }
}

/// Computes [`MetricBundle`]s, delegating the SSIM stage to a compute backend.
pub struct SimilarityEngine {
    backend: Arc<dyn ComputeBackend>,
}

impl SimilarityEngine {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    /// Engine on the CPU backend.
    pub fn cpu() -> Self {
        Self::new(Arc::new(CpuBackend))
    }

    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    /// Metrics for a batch of pairs, index-aligned with the input.
    ///
    /// Every pair is validated before any work starts, so an error never
    /// leaves a partial result behind.
    pub fn compute_metrics(&self, pairs: &[FramePair<'_>]) -> Result<Vec<MetricBundle>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        pairs.iter().try_for_each(FramePair::validate)?;

        let grays: Vec<(Array2<f32>, Array2<f32>)> = pairs
            .par_iter()
            .map(|p| (p.previous.to_gray(), p.current.to_gray()))
            .collect();
        let ssim_scores = self.ssim_stage(grays.iter().map(|(a, b)| (a, b)))?;

        let hist_scores: Vec<f64> = pairs
            .par_iter()
            .map(|p| histogram::histogram_similarity(p.previous, p.current))
            .collect();

        Ok(assemble(&ssim_scores, &hist_scores))
    }

    /// Metrics for every consecutive pair of `frames`.
    ///
    /// Equivalent to `compute_metrics` over `frames.windows(2)`, but converts
    /// and bins each frame once instead of twice.
    pub fn compute_consecutive(&self, frames: &[Frame]) -> Result<Vec<MetricBundle>> {
        if frames.len() < 2 {
            return Ok(Vec::new());
        }
        frames
            .windows(2)
            .try_for_each(|w| FramePair::new(&w[0], &w[1]).validate())?;

        let grays: Vec<Array2<f32>> = frames.par_iter().map(Frame::to_gray).collect();
        let ssim_scores = self.ssim_stage(grays.windows(2).map(|w| (&w[0], &w[1])))?;

        let hists: Vec<ColorHistogram> =
            frames.par_iter().map(ColorHistogram::from_frame).collect();
        let hist_scores: Vec<f64> = hists.windows(2).map(|w| w[0].correlate(&w[1])).collect();

        Ok(assemble(&ssim_scores, &hist_scores))
    }

    /// Run overall / top / bottom SSIM for each gray pair as one backend batch.
    ///
    /// Returns three scores per pair in that order.
    fn ssim_stage<'g>(
        &self,
        grays: impl Iterator<Item = (&'g Array2<f32>, &'g Array2<f32>)>,
    ) -> Result<Vec<f64>> {
        let mut jobs = Vec::new();
        for (a, b) in grays {
            let (va, vb) = (a.view(), b.view());
            jobs.push(SsimJob::new(va, vb));
            for region in Region::ALL {
                jobs.push(SsimJob::new(region.view(&va)?, region.view(&vb)?));
            }
        }
        tracing::debug!(jobs = jobs.len(), device = self.backend.name(), "SSIM batch");
        self.backend.ssim_batch(&jobs)
    }
}

fn assemble(ssim_scores: &[f64], hist_scores: &[f64]) -> Vec<MetricBundle> {
    ssim_scores
        .chunks_exact(1 + Region::ALL.len())
        .zip(hist_scores)
        .map(|(s, &h)| MetricBundle {
            ssim_overall: s[0],
            ssim_top: s[1],
            ssim_bottom: s[2],
            histogram_similarity: h,
        })
        .collect()
}
