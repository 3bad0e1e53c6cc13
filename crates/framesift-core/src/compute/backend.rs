use std::sync::Arc;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::cpu::CpuBackend;

/// One SSIM evaluation: two equally sized grayscale rasters (0-255 scale).
#[derive(Clone, Copy, Debug)]
pub struct SsimJob<'a> {
    pub first: ArrayView2<'a, f32>,
    pub second: ArrayView2<'a, f32>,
}

impl<'a> SsimJob<'a> {
    pub fn new(first: ArrayView2<'a, f32>, second: ArrayView2<'a, f32>) -> Self {
        debug_assert_eq!(first.dim(), second.dim());
        Self { first, second }
    }

    pub fn pixel_count(&self) -> usize {
        self.first.len()
    }
}

/// Execution device for the batched SSIM stage.
///
/// Implementations must return the same scalars (within 1e-5) for the same
/// jobs; choosing a backend is a throughput decision only.
pub trait ComputeBackend: Send + Sync {
    /// Human-readable device name for logs and summaries.
    fn name(&self) -> &str;

    fn is_gpu(&self) -> bool {
        false
    }

    /// Mean SSIM of every job, index-aligned with `jobs`.
    fn ssim_batch(&self, jobs: &[SsimJob<'_>]) -> Result<Vec<f64>>;
}

/// Requested compute device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePreference {
    /// Use a GPU when one is available, otherwise the CPU.
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Cpu => write!(f, "CPU"),
            Self::Gpu => write!(f, "GPU"),
        }
    }
}

/// Build the backend for `preference`, falling back to the CPU when no GPU
/// adapter can be opened (or the crate was built without the `gpu` feature).
pub fn create_backend(preference: DevicePreference) -> Arc<dyn ComputeBackend> {
    if preference == DevicePreference::Cpu {
        return Arc::new(CpuBackend);
    }

    #[cfg(feature = "gpu")]
    {
        match super::wgpu_backend::WgpuBackend::new() {
            Ok(backend) => return Arc::new(backend),
            Err(e) => tracing::warn!("GPU unavailable, using CPU: {e}"),
        }
    }

    #[cfg(not(feature = "gpu"))]
    {
        if preference == DevicePreference::Gpu {
            tracing::warn!("Built without the `gpu` feature, using CPU");
        }
    }

    Arc::new(CpuBackend)
}
