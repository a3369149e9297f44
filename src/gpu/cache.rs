/// Compiled pipeline cache
///
/// Pipelines are compiled once per (device, shader, output format) and
/// owned here; callers get a shared handle. Entries belonging to a device
/// that has been replaced are dropped with `retain_device`.
use std::collections::HashMap;
use std::sync::Arc;

use iced_wgpu::wgpu;

/// Shader programs known to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    /// Full-screen pass sampling an RGBA bitmap
    RenderRgba,
    /// Full-screen pass demosaicing a 16-bit sensor mosaic
    RenderMosaic,
    /// Both histogram compute passes
    Histogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub device: u64,
    pub shader: ShaderId,
    /// Render target format; `None` for compute pipelines
    pub format: Option<wgpu::TextureFormat>,
}

impl PipelineKey {
    pub fn render(device: u64, shader: ShaderId, format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            shader,
            format: Some(format),
        }
    }

    pub fn compute(device: u64, shader: ShaderId) -> Self {
        Self {
            device,
            shader,
            format: None,
        }
    }
}

#[derive(Debug)]
pub struct PipelineCache<P> {
    entries: HashMap<PipelineKey, Arc<P>>,
}

impl<P> Default for PipelineCache<P> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<P> PipelineCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, compiling with `build` on a miss
    pub fn get_or_insert_with(&mut self, key: PipelineKey, build: impl FnOnce() -> P) -> &Arc<P> {
        self.entries.entry(key).or_insert_with(|| Arc::new(build()))
    }

    #[cfg(test)]
    pub fn get(&self, key: &PipelineKey) -> Option<&Arc<P>> {
        self.entries.get(key)
    }

    /// Drop everything compiled for other devices
    pub fn retain_device(&mut self, device: u64) {
        self.entries.retain(|key, _| key.device == device);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
