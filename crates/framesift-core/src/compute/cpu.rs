use rayon::prelude::*;

use crate::consts::PARALLEL_JOB_THRESHOLD;
use crate::error::Result;
use crate::similarity::ssim::ssim;

use super::{ComputeBackend, SsimJob};

/// CPU backend using Rayon for parallelism.
pub struct CpuBackend;

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "CPU/Rayon"
    }

    fn ssim_batch(&self, jobs: &[SsimJob<'_>]) -> Result<Vec<f64>> {
        // Large single images parallelize over rows inside `ssim`; batches of
        // many small regions parallelize over jobs instead.
        let scores = if jobs.len() >= PARALLEL_JOB_THRESHOLD {
            jobs.par_iter().map(|j| ssim(j.first, j.second)).collect()
        } else {
            jobs.iter().map(|j| ssim(j.first, j.second)).collect()
        };
        Ok(scores)
    }
}
