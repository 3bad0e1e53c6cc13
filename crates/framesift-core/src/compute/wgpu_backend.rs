//! wgpu-based GPU compute backend (Metal / Vulkan / DX12).

use std::ops::Range;
use std::sync::{Arc, Mutex};

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::{GPU_BATCH_BYTE_BUDGET, SSIM_C1, SSIM_C2};
use crate::error::{FramesiftError, Result};
use crate::similarity::ssim::ssim;

use super::{ComputeBackend, SsimJob};

/// Workgroup edge length, must match `@workgroup_size` in `ssim_batch.wgsl`.
const WORKGROUP_EDGE: u32 = 16;

// ---------------------------------------------------------------------------
// Uniform / storage structs (must match WGSL layouts exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct JobDesc {
    offset: u32,
    height: u32,
    width: u32,
    _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SsimParams {
    job_count: u32,
    c1: f32,
    c2: f32,
    _pad: u32,
}

const fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// Split jobs (given by packed byte size) into consecutive index ranges that
/// each fit one dispatch: at most `budget` bytes and `max_jobs` z-slices.
/// A job larger than `budget` gets a range of its own.
fn plan_sub_batches(
    job_bytes: impl Iterator<Item = usize>,
    budget: usize,
    max_jobs: usize,
) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut bytes = 0usize;
    let mut count = 0;
    for (i, size) in job_bytes.enumerate() {
        let full = i > start && (bytes + size > budget || i - start >= max_jobs);
        if full {
            ranges.push(start..i);
            start = i;
            bytes = 0;
        }
        bytes += size;
        count = i + 1;
    }
    if start < count {
        ranges.push(start..count);
    }
    ranges
}

// ---------------------------------------------------------------------------
// WgpuBackend
// ---------------------------------------------------------------------------

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    limits: wgpu::Limits,
    ssim_pipeline: wgpu::ComputePipeline,
    /// Held from upload to download so concurrent batches never interleave.
    submit_lock: Mutex<()>,
}

impl WgpuBackend {
    pub fn new() -> std::result::Result<Self, String> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| format!("No suitable GPU adapter found: {e}"))?;

        let adapter_name = adapter.get_info().name.clone();
        tracing::info!("GPU adapter: {adapter_name}");

        let limits = wgpu::Limits::default();
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("framesift"),
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
                ..Default::default()
            },
        ))
        .map_err(|e| format!("Failed to create GPU device: {e}"))?;

        let device: Arc<wgpu::Device> = Arc::new(device);
        let queue: Arc<wgpu::Queue> = Arc::new(queue);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ssim_batch"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ssim_batch.wgsl").into()),
        });
        let ssim_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("ssim_batch"),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            limits,
            ssim_pipeline,
            submit_lock: Mutex::new(()),
        })
    }

    // --- Buffer helpers ---

    fn create_storage<T: Pod>(&self, data: &[T]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: None,
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
    }

    fn create_storage_uninit(&self, byte_size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: byte_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn create_uniform<T: Pod>(&self, data: &T) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: None,
                contents: bytemuck::bytes_of(data),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
    }

    fn download_f32(&self, buffer: &wgpu::Buffer) -> Result<Vec<f32>> {
        let size = buffer.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        enc.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(enc.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device.poll(wgpu::PollType::wait_indefinitely()).ok();
        rx.recv()
            .map_err(|_| FramesiftError::GpuError("GPU channel closed".into()))?
            .map_err(|e| FramesiftError::GpuError(format!("Buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    /// Largest packed f32 byte count a single storage binding may hold.
    fn max_packed_bytes(&self) -> usize {
        let binding = self.limits.max_storage_buffer_binding_size as usize;
        binding.min(GPU_BATCH_BYTE_BUDGET)
    }

    fn plan_sub_batches(&self, jobs: &[SsimJob<'_>]) -> Vec<Range<usize>> {
        plan_sub_batches(
            jobs.iter().map(|j| j.pixel_count() * std::mem::size_of::<f32>()),
            self.max_packed_bytes(),
            self.limits.max_compute_workgroups_per_dimension as usize,
        )
    }

    /// Evaluate one sub-batch in a single dispatch and reduce each job's map.
    fn run_sub_batch(&self, jobs: &[SsimJob<'_>]) -> Result<Vec<f64>> {
        let total: usize = jobs.iter().map(SsimJob::pixel_count).sum();
        let mut first = Vec::with_capacity(total);
        let mut second = Vec::with_capacity(total);
        let mut descs = Vec::with_capacity(jobs.len());
        let (mut max_h, mut max_w) = (0u32, 0u32);

        for job in jobs {
            let (h, w) = job.first.dim();
            descs.push(JobDesc {
                offset: first.len() as u32,
                height: h as u32,
                width: w as u32,
                _pad: 0,
            });
            // Region views are strided; iter() walks them in logical row-major order.
            first.extend(job.first.iter().copied());
            second.extend(job.second.iter().copied());
            max_h = max_h.max(h as u32);
            max_w = max_w.max(w as u32);
        }

        let _guard = self
            .submit_lock
            .lock()
            .map_err(|_| FramesiftError::GpuError("GPU submit lock poisoned".into()))?;

        let first_buf = self.create_storage(&first);
        let second_buf = self.create_storage(&second);
        let jobs_buf = self.create_storage(&descs);
        let out_buf = self.create_storage_uninit((total * std::mem::size_of::<f32>()) as u64);
        let uniform = self.create_uniform(&SsimParams {
            job_count: descs.len() as u32,
            c1: SSIM_C1,
            c2: SSIM_C2,
            _pad: 0,
        });

        let layout = self.ssim_pipeline.get_bind_group_layout(0);
        let bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: first_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: second_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: jobs_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: out_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        {
            let mut pass = enc.begin_compute_pass(&Default::default());
            pass.set_pipeline(&self.ssim_pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(
                div_ceil(max_w, WORKGROUP_EDGE),
                div_ceil(max_h, WORKGROUP_EDGE),
                descs.len() as u32,
            );
        }
        self.queue.submit(std::iter::once(enc.finish()));

        let map = self.download_f32(&out_buf)?;
        // Device buffers drop here, at the end of the sub-batch.

        Ok(descs
            .iter()
            .map(|d| {
                let start = d.offset as usize;
                let len = (d.height * d.width) as usize;
                let sum: f64 = map[start..start + len]
                    .chunks(d.width as usize)
                    .map(|row| row.iter().map(|&v| v as f64).sum::<f64>())
                    .sum();
                sum / len as f64
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// ComputeBackend implementation
// ---------------------------------------------------------------------------

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &str {
        &self.adapter_name
    }

    fn is_gpu(&self) -> bool {
        true
    }

    fn ssim_batch(&self, jobs: &[SsimJob<'_>]) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(jobs.len());
        let budget = self.max_packed_bytes();

        for range in self.plan_sub_batches(jobs) {
            let batch = &jobs[range];
            let oversized = batch.len() == 1
                && batch[0].pixel_count() * std::mem::size_of::<f32>() > budget;
            if oversized {
                // Frame exceeds one storage binding; CPU gives the same result.
                tracing::debug!(pixels = batch[0].pixel_count(), "SSIM job exceeds GPU buffer, using CPU");
                scores.push(ssim(batch[0].first, batch[0].second));
            } else {
                tracing::debug!(jobs = batch.len(), "Dispatching SSIM sub-batch");
                scores.extend(self.run_sub_batch(batch)?);
            }
        }

        Ok(scores)
    }
}
