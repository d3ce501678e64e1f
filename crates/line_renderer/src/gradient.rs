use line_protocol::{GradientRamp, TextureHandle};

use crate::emitter::LineCommandSink;

/// GPU-side state a line layer keeps across frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineLayerRenderState {
    gradient_texture: Option<TextureHandle>,
}

impl LineLayerRenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gradient_texture(&self) -> Option<TextureHandle> {
        self.gradient_texture
    }

    /// Forgets the gradient texture so the next draw re-uploads the ramp.
    ///
    /// Returns the stale handle; its owner is responsible for releasing it.
    pub fn invalidate_gradient(&mut self) -> Option<TextureHandle> {
        self.gradient_texture.take()
    }

    pub(crate) fn gradient_texture_or_create(
        &mut self,
        ramp: &GradientRamp,
        sink: &mut dyn LineCommandSink,
    ) -> TextureHandle {
        *self.gradient_texture.get_or_insert_with(|| {
            log::debug!(
                target: "line_renderer::gradient",
                "uploading gradient ramp width={}",
                ramp.width()
            );
            sink.create_gradient_texture(ramp)
        })
    }
}
