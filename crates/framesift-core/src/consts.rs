/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum job count to use job-level Rayon parallelism.
pub const PARALLEL_JOB_THRESHOLD: usize = 4;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of channels in a color frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Dynamic range of 8-bit samples, used to calibrate the SSIM constants.
pub const SSIM_DYNAMIC_RANGE: f32 = 255.0;

/// SSIM luminance stabilizer: (0.01 * L)^2.
pub const SSIM_C1: f32 = (0.01 * SSIM_DYNAMIC_RANGE) * (0.01 * SSIM_DYNAMIC_RANGE);

/// SSIM contrast stabilizer: (0.03 * L)^2.
pub const SSIM_C2: f32 = (0.03 * SSIM_DYNAMIC_RANGE) * (0.03 * SSIM_DYNAMIC_RANGE);

/// Side length of the square SSIM averaging window.
pub const SSIM_WINDOW: usize = 3;

/// Histogram bins per color channel.
pub const HISTOGRAM_BINS: usize = 8;

/// Right shift mapping an 8-bit sample to its histogram bin (256 / 8 = 32).
pub const HISTOGRAM_BIN_SHIFT: u32 = 5;

/// Total number of bins in the joint color histogram.
pub const HISTOGRAM_LEN: usize = HISTOGRAM_BINS * HISTOGRAM_BINS * HISTOGRAM_BINS;

/// Default number of frames decoded per pipeline batch.
/// At 1920x1080 RGB, 256 frames = ~1.6 GB of samples.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Upper bound on packed f32 bytes per GPU sub-batch (one storage buffer).
pub const GPU_BATCH_BYTE_BUDGET: usize = 64 * 1024 * 1024;

/// Smallest frame side length that yields non-empty caption regions.
pub const MIN_REGION_FRAME_SIDE: usize = 3;
