#![cfg(feature = "gpu")]

mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use framesift_core::compute::cpu::CpuBackend;
use framesift_core::compute::wgpu_backend::WgpuBackend;
use framesift_core::compute::{ComputeBackend, SsimJob};
use framesift_core::region::Region;
use framesift_core::similarity::SimilarityEngine;

use common::{gradient_frame, noise_frame, scene_clip};

fn gpu_or_skip() -> Option<WgpuBackend> {
    match WgpuBackend::new() {
        Ok(backend) => Some(backend),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

#[test]
fn test_gpu_matches_cpu_on_mixed_jobs() {
    let Some(gpu) = gpu_or_skip() else { return };
    assert!(gpu.is_gpu());

    let grays: Vec<(Array2<f32>, Array2<f32>)> = vec![
        (
            gradient_frame(40, 50, 0, 0).to_gray(),
            gradient_frame(40, 50, 7, 1).to_gray(),
        ),
        (
            noise_frame(17, 23, 1, 0).to_gray(),
            noise_frame(17, 23, 2, 1).to_gray(),
        ),
        (
            gradient_frame(9, 31, 3, 0).to_gray(),
            gradient_frame(9, 31, 3, 1).to_gray(),
        ),
    ];

    // Whole frames plus strided region views, interleaved by size.
    let mut jobs = Vec::new();
    for (a, b) in &grays {
        let (va, vb) = (a.view(), b.view());
        jobs.push(SsimJob::new(va, vb));
        for region in Region::ALL {
            jobs.push(SsimJob::new(
                region.view(&va).unwrap(),
                region.view(&vb).unwrap(),
            ));
        }
    }

    let cpu_scores = CpuBackend.ssim_batch(&jobs).unwrap();
    let gpu_scores = gpu.ssim_batch(&jobs).unwrap();
    assert_eq!(gpu_scores.len(), jobs.len());
    for (i, (c, g)) in cpu_scores.iter().zip(&gpu_scores).enumerate() {
        assert!(
            (c - g).abs() < 1e-5,
            "job {i}: cpu {c}, gpu {g}"
        );
    }
}

#[test]
fn test_gpu_engine_matches_cpu_engine() {
    let Some(gpu) = gpu_or_skip() else { return };

    let frames = scene_clip(36, 48, 3, 3);
    let cpu = SimilarityEngine::cpu().compute_consecutive(&frames).unwrap();
    let gpu = SimilarityEngine::new(std::sync::Arc::new(gpu))
        .compute_consecutive(&frames)
        .unwrap();

    assert_eq!(cpu.len(), gpu.len());
    for (c, g) in cpu.iter().zip(&gpu) {
        assert_abs_diff_eq!(c.ssim_overall, g.ssim_overall, epsilon = 1e-5);
        assert_abs_diff_eq!(c.ssim_top, g.ssim_top, epsilon = 1e-5);
        assert_abs_diff_eq!(c.ssim_bottom, g.ssim_bottom, epsilon = 1e-5);
        assert_eq!(c.histogram_similarity, g.histogram_similarity);
    }
}

#[test]
fn test_gpu_empty_batch() {
    let Some(gpu) = gpu_or_skip() else { return };
    assert!(gpu.ssim_batch(&[]).unwrap().is_empty());
}
