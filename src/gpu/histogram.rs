/// Two-pass GPU histogram
///
/// Pass 1 counts R, G and B levels of a rendered bitmap into 768 atomic
/// bins. Pass 2 scales every bin by the global maximum to 0..100. Both
/// passes, the copy into a staging buffer and the readback share one
/// command buffer and one submit.
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use iced_wgpu::wgpu;

use super::cache::{PipelineCache, PipelineKey, ShaderId};
use super::context::{DeviceSlot, GpuContext};
use super::pipeline::shrink_rgba;
use super::scoped::{ScopedBuffer, ScopedTexture};
use super::shaders;
use crate::error::GpuError;

/// Bins per channel
pub const BINS: usize = 256;

const BIN_BUFFER_SIZE: u64 = (BINS * 3 * 4) as u64;
const WORKGROUP_SIZE: u32 = 16;

/// Per-channel level distribution, each bin in 0..=100
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramResult {
    pub r: [f32; BINS],
    pub g: [f32; BINS],
    pub b: [f32; BINS],
}

impl HistogramResult {
    pub fn empty() -> Self {
        Self {
            r: [0.0; BINS],
            g: [0.0; BINS],
            b: [0.0; BINS],
        }
    }

    /// Split a 768-entry R, G, B buffer
    pub fn from_normalized(values: &[f32]) -> Self {
        let mut result = Self::empty();
        for (channel, out) in [&mut result.r, &mut result.g, &mut result.b].into_iter().enumerate() {
            if let Some(src) = values.get(channel * BINS..(channel + 1) * BINS) {
                out.copy_from_slice(src);
            }
        }
        result
    }

    pub fn channels(&self) -> [&[f32; BINS]; 3] {
        [&self.r, &self.g, &self.b]
    }
}

/// CPU version of pass 2
#[cfg(test)]
pub fn normalize_counts(counts: &[u32; BINS * 3]) -> HistogramResult {
    let max = counts.iter().copied().max().unwrap_or(0);
    let normalized: Vec<f32> = counts
        .iter()
        .map(|&count| {
            if max == 0 {
                0.0
            } else {
                count as f32 / max as f32 * 100.0
            }
        })
        .collect();
    HistogramResult::from_normalized(&normalized)
}

/// CPU version of pass 1
#[cfg(test)]
pub fn count_levels(rgba: &[u8]) -> [u32; BINS * 3] {
    let mut counts = [0u32; BINS * 3];
    for pixel in rgba.chunks_exact(4) {
        counts[pixel[0] as usize] += 1;
        counts[BINS + pixel[1] as usize] += 1;
        counts[BINS * 2 + pixel[2] as usize] += 1;
    }
    counts
}

/// Both compute pipelines and their layouts
pub struct HistogramPipelines {
    count: wgpu::ComputePipeline,
    count_layout: wgpu::BindGroupLayout,
    normalize: wgpu::ComputePipeline,
    normalize_layout: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(BIN_BUFFER_SIZE),
        },
        count: None,
    }
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_point: &str,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point,
    })
}

impl HistogramPipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let count_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Histogram Count Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                storage_entry(1, false),
            ],
        });
        let normalize_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Histogram Normalize Layout"),
            entries: &[storage_entry(0, true), storage_entry(1, false)],
        });

        Self {
            count: compute_pipeline(
                device,
                "Histogram Count",
                shaders::HISTOGRAM_COUNT_SHADER,
                "count_bins",
                &count_layout,
            ),
            count_layout,
            normalize: compute_pipeline(
                device,
                "Histogram Normalize",
                shaders::HISTOGRAM_NORMALIZE_SHADER,
                "normalize_bins",
                &normalize_layout,
            ),
            normalize_layout,
        }
    }
}

/// Runs histograms on the shared device
pub struct HistogramEngine {
    slot: Arc<DeviceSlot>,
    pipelines: Mutex<PipelineCache<HistogramPipelines>>,
}

impl HistogramEngine {
    pub fn new(slot: Arc<DeviceSlot>) -> Self {
        Self {
            slot,
            pipelines: Mutex::new(PipelineCache::new()),
        }
    }

    #[cfg(test)]
    pub fn slot(&self) -> &Arc<DeviceSlot> {
        &self.slot
    }

    fn pipelines_for(&self, context: &GpuContext) -> Arc<HistogramPipelines> {
        let mut cache = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        cache.retain_device(context.id);
        let key = PipelineKey::compute(context.id, ShaderId::Histogram);
        Arc::clone(cache.get_or_insert_with(key, || HistogramPipelines::new(&context.device)))
    }

    /// Histogram of a `width` x `height` RGBA8 bitmap
    ///
    /// A zero-area image returns the empty result without touching the GPU.
    /// A bitmap larger than the device's texture limit is resampled to fit
    /// first; the bins are normalized, so only the sampling changes.
    pub async fn compute(&self, width: u32, height: u32, rgba: &[u8]) -> Result<HistogramResult, GpuError> {
        if width == 0 || height == 0 {
            return Ok(HistogramResult::empty());
        }

        let context = self.slot.acquire().await?;
        context.ensure_alive()?;
        let pipelines = self.pipelines_for(&context);
        let device = &context.device;

        let limit = device.limits().max_texture_dimension_2d;
        let resized = shrink_rgba(width, height, rgba, limit);
        let (width, height, rgba) = match &resized {
            Some(image) => {
                debug!("📐 Histogram source {}x{} resampled to {:?}", width, height, image.dimensions());
                (image.width(), image.height(), image.as_raw().as_slice())
            }
            None => (width, height, rgba),
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = ScopedTexture::new(
            device,
            &wgpu::TextureDescriptor {
                label: Some("Histogram Source"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
        );
        context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let counts = ScopedBuffer::new(
            device,
            &wgpu::BufferDescriptor {
                label: Some("Histogram Counts"),
                size: BIN_BUFFER_SIZE,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            },
        );
        let normalized = ScopedBuffer::new(
            device,
            &wgpu::BufferDescriptor {
                label: Some("Histogram Normalized"),
                size: BIN_BUFFER_SIZE,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            },
        );
        let staging = ScopedBuffer::new(
            device,
            &wgpu::BufferDescriptor {
                label: Some("Histogram Staging"),
                size: BIN_BUFFER_SIZE,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            },
        );

        let count_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Histogram Count Bind Group"),
            layout: &pipelines.count_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: counts.as_entire_binding(),
                },
            ],
        });
        let normalize_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Histogram Normalize Bind Group"),
            layout: &pipelines.normalize_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: counts.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: normalized.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Histogram Encoder"),
        });
        encoder.clear_buffer(&counts, 0, None);
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Histogram Count Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.count);
            pass.set_bind_group(0, &count_group, &[]);
            pass.dispatch_workgroups(
                width.div_ceil(WORKGROUP_SIZE),
                height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Histogram Normalize Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.normalize);
            pass.set_bind_group(0, &normalize_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&normalized, 0, &staging, 0, BIN_BUFFER_SIZE);
        context.queue.submit(Some(encoder.finish()));

        context.map_read(&staging).await?;
        let data = staging.slice(..).get_mapped_range();
        let values: Vec<f32> = data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        drop(data);
        staging.unmap();

        debug!("📊 Histogram of {}x{} read back", width, height);
        Ok(HistogramResult::from_normalized(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let pixel = [rgb[0], rgb[1], rgb[2], 255];
        pixel.repeat((width * height) as usize)
    }

    fn populated(channel: &[f32; BINS]) -> Vec<(usize, f32)> {
        channel
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .collect()
    }

    #[test]
    fn test_single_color_normalizes_to_one_full_bin() {
        let result = normalize_counts(&count_levels(&solid(4, 3, [10, 20, 30])));
        assert_eq!(populated(&result.r), vec![(10, 100.0)]);
        assert_eq!(populated(&result.g), vec![(20, 100.0)]);
        assert_eq!(populated(&result.b), vec![(30, 100.0)]);
    }

    #[test]
    fn test_global_max_across_channels() {
        // Two red levels, one green and one blue level
        let mut rgba = solid(1, 3, [0, 7, 9]);
        rgba[0] = 1;
        let result = normalize_counts(&count_levels(&rgba));
        assert_eq!(result.g[7], 100.0);
        assert_eq!(result.b[9], 100.0);
        assert!((result.r[0] - 200.0 / 3.0).abs() < 1e-4);
        assert!((result.r[1] - 100.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_all_zero_counts_give_zero() {
        assert_eq!(normalize_counts(&[0; BINS * 3]), HistogramResult::empty());
    }

    #[tokio::test]
    async fn test_zero_area_never_acquires_device() {
        let engine = HistogramEngine::new(Arc::new(DeviceSlot::default()));
        assert_eq!(engine.compute(0, 10, &[]).await.unwrap(), HistogramResult::empty());
        assert_eq!(engine.compute(10, 0, &[]).await.unwrap(), HistogramResult::empty());
        assert!(!engine.slot().is_acquired().await);
    }

    #[tokio::test]
    async fn test_gpu_matches_cpu() {
        let engine = HistogramEngine::new(Arc::new(DeviceSlot::default()));
        let mut rgba = solid(20, 18, [10, 20, 30]);
        // A few odd pixels so the maximum is not the only populated bin
        rgba[0..4].copy_from_slice(&[255, 0, 128, 255]);
        rgba[4..8].copy_from_slice(&[255, 0, 128, 255]);

        let gpu = match engine.compute(20, 18, &rgba).await {
            Ok(result) => result,
            Err(GpuError::NoAdapter) | Err(GpuError::DeviceRequest(_)) => {
                eprintln!("Skipping GPU test: no device");
                return;
            }
            Err(e) => panic!("histogram failed: {}", e),
        };
        let cpu = normalize_counts(&count_levels(&rgba));
        for (gpu_channel, cpu_channel) in gpu.channels().iter().zip(cpu.channels()) {
            for (g, c) in gpu_channel.iter().zip(cpu_channel.iter()) {
                assert!((g - c).abs() < 1e-3);
            }
        }
        assert_eq!(populated(&gpu.r)[1], (255, gpu.r[255]));
    }
}
