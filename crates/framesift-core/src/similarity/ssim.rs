use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, SSIM_C1, SSIM_C2, SSIM_WINDOW};

/// Structural similarity of two equally sized grayscale rasters (0-255 scale).
///
/// Local statistics come from a 3x3 mean filter with stride 1. The border is
/// zero-padded and the divisor stays at 9, so the SSIM map has exactly the
/// input's size. Returns the mean of the map.
pub fn ssim(a: ArrayView2<f32>, b: ArrayView2<f32>) -> f64 {
    let (h, w) = a.dim();
    debug_assert_eq!(a.dim(), b.dim());
    if h == 0 || w == 0 {
        return 1.0;
    }

    let row_sum = |row: usize| -> f64 {
        (0..w)
            .map(|col| ssim_at(&a, &b, row, col) as f64)
            .sum::<f64>()
    };

    let total: f64 = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let sums: Vec<f64> = (0..h).into_par_iter().map(row_sum).collect();
        sums.into_iter().sum()
    } else {
        (0..h).map(row_sum).sum()
    };

    total / (h * w) as f64
}

/// Full per-pixel SSIM map, same shape as the inputs.
pub fn ssim_map(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Array2<f32> {
    debug_assert_eq!(a.dim(), b.dim());
    Array2::from_shape_fn(a.dim(), |(row, col)| ssim_at(&a, &b, row, col))
}

/// SSIM of the 3x3 window centered on (row, col).
///
/// The summation order and f32 arithmetic mirror `ssim_batch.wgsl` so both
/// backends agree to well within 1e-5 on the image mean.
#[inline]
pub(crate) fn ssim_at(a: &ArrayView2<f32>, b: &ArrayView2<f32>, row: usize, col: usize) -> f32 {
    let (h, w) = a.dim();
    let radius = (SSIM_WINDOW / 2) as isize;
    let mut sum_a = 0.0f32;
    let mut sum_b = 0.0f32;
    let mut sum_aa = 0.0f32;
    let mut sum_bb = 0.0f32;
    let mut sum_ab = 0.0f32;

    for dr in -radius..=radius {
        let r = row as isize + dr;
        if r < 0 || r >= h as isize {
            continue;
        }
        for dc in -radius..=radius {
            let c = col as isize + dc;
            if c < 0 || c >= w as isize {
                continue;
            }
            let va = a[[r as usize, c as usize]];
            let vb = b[[r as usize, c as usize]];
            sum_a += va;
            sum_b += vb;
            sum_aa += va * va;
            sum_bb += vb * vb;
            sum_ab += va * vb;
        }
    }

    let n = (SSIM_WINDOW * SSIM_WINDOW) as f32;
    let mu_a = sum_a / n;
    let mu_b = sum_b / n;
    let mu_a_sq = mu_a * mu_a;
    let mu_b_sq = mu_b * mu_b;
    let mu_ab = mu_a * mu_b;
    let sigma_a_sq = sum_aa / n - mu_a_sq;
    let sigma_b_sq = sum_bb / n - mu_b_sq;
    let sigma_ab = sum_ab / n - mu_ab;

    ((2.0 * mu_ab + SSIM_C1) * (2.0 * sigma_ab + SSIM_C2))
        / ((mu_a_sq + mu_b_sq + SSIM_C1) * (sigma_a_sq + sigma_b_sq + SSIM_C2))
}
