/// wgpu render pipeline for displaying images with live lighting
///
/// This module manages all the wgpu boilerplate:
/// - Texture creation and uploads (RGBA bitmap or 16-bit mosaic)
/// - Uniform buffers for lighting and sensor parameters
/// - Render pipeline state
/// - Draw commands
use image::imageops::FilterType;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

// Use wgpu from iced to avoid dependency conflicts
use iced_wgpu::wgpu;

use super::cache::{PipelineCache, PipelineKey, ShaderId};
use super::context::{DeviceSlot, GpuContext};
use super::scoped::{ScopedBuffer, ScopedTexture};
use crate::config::SensorConfig;
use crate::error::GpuError;
use crate::raw::Mosaic;
use crate::state::LightingParams;

/// Size of the lighting uniform block in bytes
pub const LIGHTING_UNIFORM_SIZE: usize = 48;

/// Lighting parameters in a GPU-friendly format
/// Must match the WGSL struct layout (11 floats + 1 padding float)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLightingParams {
    exposure: f32,
    contrast: f32,
    saturation: f32,
    vibrance: f32,
    highlights: f32,
    shadows: f32,
    whites: f32,
    blacks: f32,
    tint: f32,
    temperature: f32,
    hue: f32,
    _padding: f32,
}

impl From<&LightingParams> for GpuLightingParams {
    fn from(params: &LightingParams) -> Self {
        Self {
            exposure: params.exposure,
            contrast: params.contrast,
            saturation: params.saturation,
            vibrance: params.vibrance,
            highlights: params.highlights,
            shadows: params.shadows,
            whites: params.whites,
            blacks: params.blacks,
            tint: params.tint,
            temperature: params.temperature,
            hue: params.hue,
            _padding: 0.0,
        }
    }
}

/// Sensor levels and CFA phase for the mosaic shader (16 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSensorParams {
    black_level: f32,
    white_level: f32,
    cfa_phase: [u32; 2],
}

impl From<&SensorConfig> for GpuSensorParams {
    fn from(sensor: &SensorConfig) -> Self {
        Self {
            black_level: sensor.black_level as f32,
            white_level: sensor.white_level as f32,
            cfa_phase: [sensor.cfa_phase.0 % 2, sensor.cfa_phase.1 % 2],
        }
    }
}

/// Visible part of the source in UV space (16 bytes, vertex stage)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UvWindow {
    pub offset: [f32; 2],
    pub scale: [f32; 2],
}

impl UvWindow {
    pub const FULL: UvWindow = UvWindow {
        offset: [0.0, 0.0],
        scale: [1.0, 1.0],
    };
}

/// Largest size with the same aspect ratio whose sides fit in `max_dimension`
pub fn fit_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / longest as f64;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_dimension.max(1));
    (fit(width), fit(height))
}

/// Resample an RGBA8 bitmap so both sides fit in `max_dimension`
///
/// `None` when it already fits or `rgba` is shorter than the dimensions say.
pub fn shrink_rgba(width: u32, height: u32, rgba: &[u8], max_dimension: u32) -> Option<image::RgbaImage> {
    let (new_width, new_height) = fit_size(width, height, max_dimension);
    if (new_width, new_height) == (width, height) {
        return None;
    }
    let bitmap = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(width, height, rgba)?;
    Some(image::imageops::resize(&bitmap, new_width, new_height, FilterType::Triangle))
}

/// Pixels ready for upload
#[derive(Clone)]
pub enum SourcePixels {
    /// Decoded bitmap, 4 bytes per pixel
    Rgba {
        width: u32,
        height: u32,
        data: Arc<Vec<u8>>,
    },
    /// Raw sensor readout, one u16 per photosite
    Mosaic(Arc<Mosaic>),
}

// Manual Debug implementation (pixel data is too large to print)
impl std::fmt::Debug for SourcePixels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, width, height) = match self {
            Self::Rgba { width, height, .. } => ("Rgba", *width, *height),
            Self::Mosaic(mosaic) => ("Mosaic", mosaic.width, mosaic.height),
        };
        f.debug_struct("SourcePixels")
            .field("kind", &kind)
            .field("width", &width)
            .field("height", &height)
            .finish()
    }
}

impl SourcePixels {
    pub fn rgba(image: image::RgbaImage) -> Self {
        Self::Rgba {
            width: image.width(),
            height: image.height(),
            data: Arc::new(image.into_raw()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgba { width, height, .. } => (*width, *height),
            Self::Mosaic(mosaic) => (mosaic.width, mosaic.height),
        }
    }

    pub fn shader(&self) -> ShaderId {
        match self {
            Self::Rgba { .. } => ShaderId::RenderRgba,
            Self::Mosaic(_) => ShaderId::RenderMosaic,
        }
    }

    /// Same image with both sides at most `max_dimension`
    ///
    /// Bitmaps are resampled. Mosaics are binned 2x2 per color until they
    /// fit, which keeps the CFA phase. A source that fits is shared as is.
    pub fn fit_within(&self, max_dimension: u32) -> SourcePixels {
        match self {
            Self::Rgba { width, height, data } => {
                match shrink_rgba(*width, *height, data.as_slice(), max_dimension) {
                    Some(resized) => Self::rgba(resized),
                    None => self.clone(),
                }
            }
            Self::Mosaic(mosaic) => {
                let mut current = Arc::clone(mosaic);
                while current.width > max_dimension || current.height > max_dimension {
                    match current.binned() {
                        Some(binned) => current = Arc::new(binned),
                        None => break,
                    }
                }
                Self::Mosaic(current)
            }
        }
    }
}

/// Compiled render pipeline plus the layout its bind groups follow
pub struct RenderPipelines {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl RenderPipelines {
    pub fn new(device: &wgpu::Device, shader: ShaderId, format: wgpu::TextureFormat) -> Self {
        let mosaic = shader == ShaderId::RenderMosaic;

        let mut entries = vec![
            // Lighting uniform
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(LIGHTING_UNIFORM_SIZE as u64),
                },
                count: None,
            },
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(if mosaic {
                    wgpu::SamplerBindingType::NonFiltering
                } else {
                    wgpu::SamplerBindingType::Filtering
                }),
                count: None,
            },
            // Source texture
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: if mosaic {
                        wgpu::TextureSampleType::Uint
                    } else {
                        wgpu::TextureSampleType::Float { filterable: true }
                    },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
        ];
        // Visible UV window
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 4,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<UvWindow>() as u64),
            },
            count: None,
        });
        if mosaic {
            // Sensor uniform
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GpuSensorParams>() as u64,
                    ),
                },
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewer Bind Group Layout"),
            entries: &entries,
        });

        let filter = if mosaic {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Source Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let source = super::shaders::render_shader(shader, format.is_srgb());
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewer Render Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Viewer Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Viewer Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        debug!("🔧 Compiled {:?} pipeline for {:?}", shader, format);

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }
}

/// Source pixels resident on the GPU
pub struct UploadedSource {
    _texture: ScopedTexture,
    view: wgpu::TextureView,
    pub shader: ShaderId,
    pub width: u32,
    pub height: u32,
}

/// Copy the source pixels into a new texture
///
/// Sources larger than the device's texture limit are reduced first, so
/// `width` and `height` of the result may be smaller than the source's.
pub fn upload_source(device: &wgpu::Device, queue: &wgpu::Queue, source: &SourcePixels) -> UploadedSource {
    let limit = device.limits().max_texture_dimension_2d;
    let fitted = source.fit_within(limit);
    if fitted.dimensions() != source.dimensions() {
        info!(
            "📐 Source {:?} exceeds the {}px texture limit, uploading {:?}",
            source.dimensions(),
            limit,
            fitted.dimensions()
        );
    }

    let (width, height) = fitted.dimensions();
    let (format, bytes_per_pixel, bytes): (_, u32, &[u8]) = match &fitted {
        SourcePixels::Rgba { data, .. } => (wgpu::TextureFormat::Rgba8Unorm, 4, data.as_slice()),
        // 16-bit unsigned integer for RAW data
        SourcePixels::Mosaic(mosaic) => (
            wgpu::TextureFormat::R16Uint,
            2,
            bytemuck::cast_slice(&mosaic.data),
        ),
    };

    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = ScopedTexture::new(
        device,
        &wgpu::TextureDescriptor {
            label: Some("Viewer Source Texture"),
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
    );

    debug!("💾 Uploading {} bytes ({}x{} {:?})", bytes.len(), width, height, format);
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_pixel * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    UploadedSource {
        _texture: texture,
        view,
        shader: fitted.shader(),
        width,
        height,
    }
}

/// Per-pass uniforms and bind group
pub struct PreparedFrame {
    bind_group: wgpu::BindGroup,
    _lighting: ScopedBuffer,
    _window: ScopedBuffer,
    _sensor: Option<ScopedBuffer>,
}

/// Build the uniforms and bind group for one draw
pub fn prepare_frame(
    device: &wgpu::Device,
    pipelines: &RenderPipelines,
    source: &UploadedSource,
    params: &LightingParams,
    sensor: &SensorConfig,
    window: UvWindow,
) -> PreparedFrame {
    let lighting = ScopedBuffer::with_contents(
        device,
        "Lighting Uniform Buffer",
        bytemuck::cast_slice(&[GpuLightingParams::from(params)]),
        wgpu::BufferUsages::UNIFORM,
    );
    let window = ScopedBuffer::with_contents(
        device,
        "View Uniform Buffer",
        bytemuck::cast_slice(&[window]),
        wgpu::BufferUsages::UNIFORM,
    );

    let sensor = (source.shader == ShaderId::RenderMosaic).then(|| {
        ScopedBuffer::with_contents(
            device,
            "Sensor Uniform Buffer",
            bytemuck::cast_slice(&[GpuSensorParams::from(sensor)]),
            wgpu::BufferUsages::UNIFORM,
        )
    });

    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: lighting.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(&pipelines.sampler),
        },
        wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::TextureView(&source.view),
        },
        wgpu::BindGroupEntry {
            binding: 4,
            resource: window.as_entire_binding(),
        },
    ];
    if let Some(sensor) = &sensor {
        entries.push(wgpu::BindGroupEntry {
            binding: 3,
            resource: sensor.as_entire_binding(),
        });
    }

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Viewer Bind Group"),
        layout: &pipelines.bind_group_layout,
        entries: &entries,
    });

    PreparedFrame {
        bind_group,
        _lighting: lighting,
        _window: window,
        _sensor: sensor,
    }
}

/// Pixel rectangle inside the render target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Largest rectangle with the image's aspect ratio, centered in `bounds`
    pub fn fit(image: (u32, u32), bounds: Viewport) -> Viewport {
        let (image_w, image_h) = (image.0.max(1) as f32, image.1.max(1) as f32);
        let scale = (bounds.width / image_w).min(bounds.height / image_h);
        let width = image_w * scale;
        let height = image_h * scale;
        Viewport {
            x: bounds.x + (bounds.width - width) / 2.0,
            y: bounds.y + (bounds.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Crop to a `width` x `height` target
    ///
    /// Returns the visible rectangle and the part of the image it shows, so
    /// an overhanging image is cut off rather than squeezed. `None` if
    /// nothing is left.
    pub fn crop_to(self, width: u32, height: u32) -> Option<(Viewport, UvWindow)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x0 = self.x.max(0.0);
        let y0 = self.y.max(0.0);
        let x1 = (self.x + self.width).min(width as f32);
        let y1 = (self.y + self.height).min(height as f32);
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }

        let visible = Viewport {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        };
        let window = UvWindow {
            offset: [(x0 - self.x) / self.width, (y0 - self.y) / self.height],
            scale: [visible.width / self.width, visible.height / self.height],
        };
        Some((visible, window))
    }
}

/// Record the full-screen draw into `encoder`
///
/// Existing target content is kept and the image is alpha-blended over it.
pub fn encode_render(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipelines: &RenderPipelines,
    frame: &PreparedFrame,
    viewport: Viewport,
    scissor: Option<(u32, u32, u32, u32)>,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Viewer Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    if let Some((x, y, width, height)) = scissor {
        render_pass.set_scissor_rect(x, y, width, height);
    }
    render_pass.set_viewport(viewport.x, viewport.y, viewport.width, viewport.height, 0.0, 1.0);
    render_pass.set_pipeline(&pipelines.pipeline);
    render_pass.set_bind_group(0, &frame.bind_group, &[]);
    render_pass.draw(0..4, 0..1);
}

/// Headless renderer on the shared device
///
/// Renders through the same pipelines as the on-screen view and reads the
/// result back. One command buffer and one submit per render, every
/// texture and buffer released before returning.
pub struct OffscreenRenderer {
    slot: Arc<DeviceSlot>,
    pipelines: Mutex<PipelineCache<RenderPipelines>>,
}

impl OffscreenRenderer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(slot: Arc<DeviceSlot>) -> Self {
        Self {
            slot,
            pipelines: Mutex::new(PipelineCache::new()),
        }
    }

    fn pipelines_for(&self, context: &GpuContext, shader: ShaderId) -> Arc<RenderPipelines> {
        let mut cache = self.pipelines.lock().unwrap_or_else(PoisonError::into_inner);
        cache.retain_device(context.id);
        let key = PipelineKey::render(context.id, shader, Self::FORMAT);
        Arc::clone(cache.get_or_insert_with(key, || {
            RenderPipelines::new(&context.device, shader, Self::FORMAT)
        }))
    }

    /// Render `source` with `params` into an RGBA8 image
    ///
    /// The output is `width` x `height`, reduced to the device's texture
    /// limit if larger.
    pub async fn render(
        &self,
        source: &SourcePixels,
        params: &LightingParams,
        sensor: &SensorConfig,
        width: u32,
        height: u32,
    ) -> Result<image::RgbaImage, GpuError> {
        let context = self.slot.acquire().await?;
        context.ensure_alive()?;
        let device = &context.device;
        let limit = device.limits().max_texture_dimension_2d;
        let (width, height) = fit_size(width.max(1), height.max(1), limit);

        let pipelines = self.pipelines_for(&context, source.shader());
        let uploaded = upload_source(device, &context.queue, source);
        let frame = prepare_frame(device, &pipelines, &uploaded, params, sensor, UvWindow::FULL);

        let output = ScopedTexture::new(
            device,
            &wgpu::TextureDescriptor {
                label: Some("Output Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            },
        );
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row = width * 4;
        let padded_bytes_per_row = bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let readback = ScopedBuffer::new(
            device,
            &wgpu::BufferDescriptor {
                label: Some("Output Buffer"),
                size: (padded_bytes_per_row * height) as u64,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            },
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Render Encoder"),
        });
        let full = Viewport {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        };
        encode_render(&mut encoder, &output_view, &pipelines, &frame, full, None);
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        context.queue.submit(Some(encoder.finish()));

        context.map_read(&readback).await?;
        let data = readback.slice(..).get_mapped_range();
        let mut pixels = Vec::with_capacity((bytes_per_row * height) as usize);
        for row in data.chunks(padded_bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..bytes_per_row as usize]);
        }
        drop(data);
        readback.unmap();

        debug!("🖼️  Rendered {:?} offscreen at {}x{}", source, width, height);
        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| GpuError::Map("readback is shorter than the output".to_string()))
    }
}
