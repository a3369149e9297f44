/// GPU rendering and analysis module
///
/// This module provides real-time, non-destructive display of photos and
/// RAW mosaics using wgpu and custom WGSL shaders, plus a compute-shader
/// histogram.
///
/// Architecture:
/// - `context.rs` - shared device, lazily acquired and replaced on loss
/// - `cache.rs` - compiled pipelines keyed by device, shader and format
/// - `scoped.rs` - per-pass textures and buffers destroyed on drop
/// - `shaders.rs` - WGSL shader source code
/// - `pipeline.rs` - render pipeline: upload, uniforms, draw, offscreen readback
/// - `histogram.rs` - two-pass histogram with async readback

pub mod cache;
pub mod context;
pub mod histogram;
pub mod pipeline;
pub mod scoped;
pub mod shaders;

pub use cache::{PipelineCache, PipelineKey, ShaderId};
pub use context::{DeviceSlot, GpuContext};
pub use histogram::{HistogramEngine, HistogramResult};
pub use pipeline::{OffscreenRenderer, RenderPipelines, SourcePixels};
