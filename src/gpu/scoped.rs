/// Per-pass GPU resources
///
/// Textures and buffers made for one render or histogram pass are wrapped
/// in these guards. Dropping the guard destroys the resource immediately,
/// so every exit path (including `?`) releases GPU memory.
use std::ops::Deref;

use iced_wgpu::wgpu;

pub struct ScopedTexture(wgpu::Texture);

impl ScopedTexture {
    pub fn new(device: &wgpu::Device, desc: &wgpu::TextureDescriptor) -> Self {
        Self(device.create_texture(desc))
    }
}

impl Deref for ScopedTexture {
    type Target = wgpu::Texture;

    fn deref(&self) -> &wgpu::Texture {
        &self.0
    }
}

impl Drop for ScopedTexture {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

pub struct ScopedBuffer(wgpu::Buffer);

impl ScopedBuffer {
    pub fn new(device: &wgpu::Device, desc: &wgpu::BufferDescriptor) -> Self {
        Self(device.create_buffer(desc))
    }

    pub fn with_contents(device: &wgpu::Device, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> Self {
        use wgpu::util::DeviceExt;
        Self(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        }))
    }
}

impl Deref for ScopedBuffer {
    type Target = wgpu::Buffer;

    fn deref(&self) -> &wgpu::Buffer {
        &self.0
    }
}

impl Drop for ScopedBuffer {
    fn drop(&mut self) {
        self.0.destroy();
    }
}
