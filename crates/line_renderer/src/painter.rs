use std::collections::HashMap;

use line_protocol::{
    CameraTransform, ColorMode, CompareFunction, DepthMask, DepthMode, OverscaledTileId,
    RenderPass, StencilMode,
};

/// Frame-level render state the line driver reads.
pub trait Painter {
    fn render_pass(&self) -> RenderPass;

    fn transform(&self) -> &CameraTransform;

    fn depth_mode_for_sublayer(&self, sublayer: u32, mask: DepthMask) -> DepthMode;

    fn color_mode_for_render_pass(&self) -> ColorMode;

    fn stencil_mode_for_clipping(&self, tile: &OverscaledTileId) -> StencilMode;
}

/// Sublayers reserved in the depth range for every style layer.
pub const SUBLAYERS_PER_LAYER: u32 = 3;
pub const DEPTH_EPSILON: f32 = 1.0 / 65536.0;

/// Painter state for one frame, advanced layer by layer.
#[derive(Debug, Clone)]
pub struct FramePainter {
    pub render_pass: RenderPass,
    pub transform: CameraTransform,
    /// Index of the style layer being drawn, counted from the bottom.
    pub current_layer: u32,
    clip_ids: HashMap<OverscaledTileId, u32>,
}

impl FramePainter {
    pub fn new(render_pass: RenderPass, transform: CameraTransform) -> Self {
        Self {
            render_pass,
            transform,
            current_layer: 0,
            clip_ids: HashMap::new(),
        }
    }

    /// Records the stencil value written for `tile` by the clipping pass.
    pub fn set_clip_id(&mut self, tile: OverscaledTileId, clip_id: u32) {
        self.clip_ids.insert(tile, clip_id);
    }

    pub fn clip_id(&self, tile: &OverscaledTileId) -> Option<u32> {
        self.clip_ids.get(tile).copied()
    }
}

impl Painter for FramePainter {
    fn render_pass(&self) -> RenderPass {
        self.render_pass
    }

    fn transform(&self) -> &CameraTransform {
        &self.transform
    }

    fn depth_mode_for_sublayer(&self, sublayer: u32, mask: DepthMask) -> DepthMode {
        let slot = (1 + self.current_layer)
            .checked_mul(SUBLAYERS_PER_LAYER)
            .and_then(|base| base.checked_add(sublayer))
            .expect("depth sublayer overflow");
        let depth = 1.0 - slot as f32 * DEPTH_EPSILON;
        DepthMode {
            func: CompareFunction::LessEqual,
            mask,
            range: [depth, depth],
        }
    }

    fn color_mode_for_render_pass(&self) -> ColorMode {
        match self.render_pass {
            RenderPass::Opaque => ColorMode::Unblended,
            RenderPass::Translucent | RenderPass::Offscreen => ColorMode::AlphaBlended,
        }
    }

    fn stencil_mode_for_clipping(&self, tile: &OverscaledTileId) -> StencilMode {
        match self.clip_id(tile) {
            Some(clip_id) => StencilMode::clip_to(clip_id),
            None => StencilMode::DISABLED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painter(render_pass: RenderPass) -> FramePainter {
        FramePainter::new(
            render_pass,
            CameraTransform {
                zoom: 4.0,
                tile_zoom: 4.0,
                angle: 0.0,
                pixels_to_gl_units: [0.01, -0.01],
                device_pixel_ratio: 1.0,
            },
        )
    }

    #[test]
    fn higher_layers_sit_closer_to_the_camera() {
        let mut painter = painter(RenderPass::Translucent);
        let lower = painter.depth_mode_for_sublayer(0, DepthMask::ReadOnly);
        painter.current_layer = 1;
        let upper = painter.depth_mode_for_sublayer(0, DepthMask::ReadOnly);
        assert!(upper.range[0] < lower.range[0]);
        assert_eq!(lower.range[0], lower.range[1]);
        assert_eq!(lower.mask, DepthMask::ReadOnly);
        assert_eq!(lower.func, CompareFunction::LessEqual);
    }

    #[test]
    fn translucent_pass_blends() {
        assert_eq!(
            painter(RenderPass::Translucent).color_mode_for_render_pass(),
            ColorMode::AlphaBlended
        );
        assert_eq!(
            painter(RenderPass::Opaque).color_mode_for_render_pass(),
            ColorMode::Unblended
        );
    }

    #[test]
    fn stencil_uses_recorded_clip_id() {
        let mut painter = painter(RenderPass::Translucent);
        let clipped = OverscaledTileId::new(4, 0, 4, 1, 1);
        let unclipped = OverscaledTileId::new(4, 0, 4, 2, 1);
        painter.set_clip_id(clipped, 5);
        assert_eq!(
            painter.stencil_mode_for_clipping(&clipped),
            StencilMode::clip_to(5)
        );
        assert_eq!(
            painter.stencil_mode_for_clipping(&unclipped),
            StencilMode::DISABLED
        );
    }
}
