use iced::mouse;
use iced::widget::shader::{self, wgpu, Storage};
use iced::Rectangle;
use std::sync::Arc;

use crate::config::SensorConfig;
use crate::gpu::pipeline::{self, PreparedFrame, UploadedSource, Viewport};
use crate::gpu::{PipelineCache, PipelineKey, RenderPipelines, SourcePixels};
use crate::state::{LightingParams, ResultKey};

/// Cache id of the device owned by the iced renderer
const ICED_DEVICE_ID: u64 = 0;

/// GPU-rendered image view
///
/// Draws straight into iced's frame via a shader primitive, no CPU
/// readback. A new primitive is produced whenever the view is rebuilt,
/// which happens only on source or lighting changes.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub source: SourcePixels,
    /// Identity of `source`, derived from the file contents
    pub key: ResultKey,
    pub params: LightingParams,
    pub sensor: SensorConfig,
}

impl<Message> shader::Program<Message> for ImageView {
    type State = ();
    type Primitive = ImagePrimitive;

    fn draw(&self, _state: &Self::State, _cursor: mouse::Cursor, _bounds: Rectangle) -> Self::Primitive {
        ImagePrimitive {
            view: self.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ImagePrimitive {
    view: ImageView,
}

/// Renderer-side state kept between frames
struct ViewerResources {
    pipelines: PipelineCache<RenderPipelines>,
    active: Option<Arc<RenderPipelines>>,
    /// Uploaded once per source, re-uploaded when the key changes. Keys hash
    /// the file contents, so an edited file never matches a stale texture.
    source: Option<(ResultKey, UploadedSource)>,
    frame: Option<PreparedFrame>,
    viewport: Option<Viewport>,
}

impl ViewerResources {
    fn new() -> Self {
        Self {
            pipelines: PipelineCache::new(),
            active: None,
            source: None,
            frame: None,
            viewport: None,
        }
    }
}

impl shader::Primitive for ImagePrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut Storage,
        bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        if !storage.has::<ViewerResources>() {
            storage.store(ViewerResources::new());
        }
        let Some(resources) = storage.get_mut::<ViewerResources>() else {
            return;
        };

        let shader_id = self.view.source.shader();
        let key = PipelineKey::render(ICED_DEVICE_ID, shader_id, format);
        let pipelines = Arc::clone(
            resources
                .pipelines
                .get_or_insert_with(key, || RenderPipelines::new(device, shader_id, format)),
        );

        let current = resources.source.as_ref().map(|(key, _)| *key);
        if current != Some(self.view.key) {
            // The old frame's bind group points at the old texture
            resources.frame = None;
            resources.source = Some((
                self.view.key,
                pipeline::upload_source(device, queue, &self.view.source),
            ));
        }
        let Some((_, uploaded)) = &resources.source else {
            return;
        };

        let scale = viewport.scale_factor() as f32;
        let physical = viewport.physical_size();
        let target = Viewport {
            x: bounds.x * scale,
            y: bounds.y * scale,
            width: bounds.width * scale,
            height: bounds.height * scale,
        };
        let Some((visible, window)) = Viewport::fit((uploaded.width, uploaded.height), target)
            .crop_to(physical.width, physical.height)
        else {
            resources.frame = None;
            resources.viewport = None;
            return;
        };

        resources.frame = Some(pipeline::prepare_frame(
            device,
            &pipelines,
            uploaded,
            &self.view.params,
            &self.view.sensor,
            window,
        ));
        resources.active = Some(pipelines);
        resources.viewport = Some(visible);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        let Some(resources) = storage.get::<ViewerResources>() else {
            return;
        };
        let (Some(pipelines), Some(frame), Some(viewport)) =
            (&resources.active, &resources.frame, resources.viewport)
        else {
            return;
        };

        pipeline::encode_render(
            encoder,
            target,
            pipelines,
            frame,
            viewport,
            Some((clip_bounds.x, clip_bounds.y, clip_bounds.width, clip_bounds.height)),
        );
    }
}
