use atlas::DashAtlas;
use line_protocol::{
    DashCrossFade, DepthMask, LineLayer, OverscaledTileId, RenderPass, VisibleTile,
};

use crate::emitter::{ImageBinding, LineCommandSink, TileDrawParams, emit_draw};
use crate::gradient::LineLayerRenderState;
use crate::painter::Painter;
use crate::resource_gate::{GateDecision, PatternRequirement, gate_tile};
use crate::state_tracker::LoopState;
use crate::tile::{LineBucket, TileSource};
use crate::uniforms::{
    DashEndpoints, build_dash_texture_uniforms, build_paint_uniforms, build_pattern_uniforms,
    build_ratio_uniforms, build_tile_uniforms, tile_ratio,
};
use crate::variant::{ProgramVariant, select_variant};
use crate::{LayerSkipReason, TileSkipReason};

/// Collaborators one layer draw reads from and writes to.
pub struct LineDrawContext<'a> {
    pub painter: &'a dyn Painter,
    pub dash_atlas: &'a mut dyn DashAtlas,
    pub sink: &'a mut dyn LineCommandSink,
}

/// Outcome of one `draw_line` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerDrawReport {
    pub variant: Option<ProgramVariant>,
    pub layer_skip: Option<LayerSkipReason>,
    /// Tiles whose draw the sink accepted.
    pub drawn: Vec<OverscaledTileId>,
    pub skipped: Vec<(OverscaledTileId, TileSkipReason)>,
    /// Tiles whose zoom-ratio uniforms were rebuilt.
    pub ratio_uniform_builds: usize,
}

impl LayerDrawReport {
    fn skipped_layer(reason: LayerSkipReason) -> Self {
        Self {
            layer_skip: Some(reason),
            ..Self::default()
        }
    }

    pub fn drawn_count(&self) -> usize {
        self.drawn.len()
    }

    pub fn skip_reason(&self, tile: &OverscaledTileId) -> Option<TileSkipReason> {
        self.skipped
            .iter()
            .find(|(id, _)| id == tile)
            .map(|(_, reason)| *reason)
    }
}

/// Draws one line layer over the given visible tiles.
///
/// Layers outside the translucent pass, or with a constant opacity or width of
/// zero, draw nothing. Tiles that cannot be drawn are skipped without disturbing
/// the state carried between drawn tiles.
pub fn draw_line(
    context: &mut LineDrawContext<'_>,
    tiles: &dyn TileSource,
    layer: &LineLayer,
    render_state: &mut LineLayerRenderState,
    coords: &[VisibleTile],
) -> LayerDrawReport {
    let painter = context.painter;
    if painter.render_pass() != RenderPass::Translucent {
        return LayerDrawReport::skipped_layer(LayerSkipReason::WrongRenderPass);
    }
    let paint = &layer.paint;
    if paint.opacity.constant_or(1.0) == 0.0 {
        return LayerDrawReport::skipped_layer(LayerSkipReason::ZeroOpacity);
    }
    if paint.width.constant_or(1.0) == 0.0 {
        return LayerDrawReport::skipped_layer(LayerSkipReason::ZeroWidth);
    }

    context.sink.set_layer_modes(
        painter.depth_mode_for_sublayer(0, DepthMask::ReadOnly),
        painter.color_mode_for_render_pass(),
    );

    let variant = select_variant(paint);
    let layer_draw = LayerDraw {
        layer,
        variant,
        requirement: PatternRequirement::from_paint(&paint.pattern),
        dasharray: match variant {
            ProgramVariant::Dashed => paint.dasharray.as_ref(),
            _ => None,
        },
    };

    let mut report = LayerDrawReport {
        variant: Some(variant),
        ..LayerDrawReport::default()
    };
    let mut loop_state = LoopState::new();
    for visible in coords {
        match layer_draw.prepare_tile(context, tiles, render_state, visible, loop_state) {
            Ok((params, bucket)) => {
                let submitted = emit_draw(&mut *context.sink, &layer.id, &params, bucket);
                if params.ratio.is_some() {
                    report.ratio_uniform_builds += 1;
                }
                // the sink keeps the uniforms of a rejected draw
                loop_state = loop_state.advance(params.program, visible.id.overscaled_z);
                match submitted {
                    Ok(()) => report.drawn.push(visible.id),
                    Err(error) => {
                        log::warn!(
                            target: "line_renderer::draw",
                            "layer={} tile={:?}: {error}",
                            layer.id,
                            visible.id
                        );
                        report
                            .skipped
                            .push((visible.id, TileSkipReason::DrawRejected));
                    }
                }
            }
            Err(reason) => {
                log::trace!(
                    target: "line_renderer::draw",
                    "layer={} tile={:?} skipped: {reason}",
                    layer.id,
                    visible.id
                );
                report.skipped.push((visible.id, reason));
            }
        }
    }

    log::debug!(
        target: "line_renderer::draw",
        "layer={} variant={} drawn={} skipped={} ratio_builds={}",
        layer.id,
        variant.label(),
        report.drawn.len(),
        report.skipped.len(),
        report.ratio_uniform_builds
    );
    report
}

/// Per-layer values fixed for the whole tile loop.
struct LayerDraw<'l> {
    layer: &'l LineLayer,
    variant: ProgramVariant,
    requirement: PatternRequirement<'l>,
    dasharray: Option<&'l DashCrossFade>,
}

impl<'l> LayerDraw<'l> {
    fn prepare_tile<'t>(
        &self,
        context: &mut LineDrawContext<'_>,
        tiles: &'t dyn TileSource,
        render_state: &mut LineLayerRenderState,
        visible: &VisibleTile,
        loop_state: LoopState,
    ) -> Result<(TileDrawParams, &'t LineBucket), TileSkipReason> {
        let layer = self.layer;
        let paint = &layer.paint;
        let painter = context.painter;
        let transform = painter.transform();

        let tile = tiles.tile(&visible.id).ok_or(TileSkipReason::MissingTile)?;
        if let GateDecision::Skip(reason) = gate_tile(&self.requirement, tile.image_atlas()) {
            return Err(reason);
        }
        let bucket = tile
            .bucket(&layer.id)
            .ok_or(TileSkipReason::MissingBucket)?;
        let gradient_ramp = match self.variant {
            ProgramVariant::Gradient => Some(
                layer
                    .gradient
                    .as_ref()
                    .ok_or(TileSkipReason::GradientRampMissing)?,
            ),
            _ => None,
        };

        let program = context
            .sink
            .use_program(self.variant, &bucket.program_configuration);
        let change = loop_state.compare(program, tile.id.overscaled_z);
        let tile_ratio = tile_ratio(tile, transform);

        let dash_endpoints = match self.dasharray {
            Some(dasharray) if change.needs_ratio_uniforms() => {
                let round = layer.is_round_cap();
                let from = context
                    .dash_atlas
                    .get_dash(&dasharray.from, round)
                    .ok_or(TileSkipReason::DashAtlasFull)?;
                let to = context
                    .dash_atlas
                    .get_dash(&dasharray.to, round)
                    .ok_or(TileSkipReason::DashAtlasFull)?;
                Some((dasharray, DashEndpoints { from, to }))
            }
            _ => None,
        };

        let ratio = change.needs_ratio_uniforms().then(|| {
            build_ratio_uniforms(
                dash_endpoints
                    .as_ref()
                    .map(|(dasharray, endpoints)| (*dasharray, endpoints)),
                tile_ratio,
                context.dash_atlas.width(),
                transform,
            )
        });

        let mut image = None;
        let mut dash_texture = None;
        if let Some((dasharray, endpoints)) = &dash_endpoints
            && change.program_changed
        {
            dash_texture = Some(build_dash_texture_uniforms(dasharray, endpoints));
            image = Some(ImageBinding::dash_atlas(context.dash_atlas.texture()));
        }

        let mut pattern = None;
        if self.variant == ProgramVariant::Patterned
            && let Some(image_atlas) = tile.image_atlas()
        {
            pattern = Some(build_pattern_uniforms(
                paint.pattern.as_constant().and_then(Option::as_ref),
                image_atlas,
                tile_ratio,
                &layer.crossfade,
                transform,
            ));
            image = Some(ImageBinding::pattern(image_atlas.texture()));
        }

        if let Some(ramp) = gradient_ramp {
            let texture = render_state.gradient_texture_or_create(ramp, &mut *context.sink);
            image = Some(ImageBinding::gradient(texture));
        }

        let params = TileDrawParams {
            tile_id: visible.id,
            variant: self.variant,
            program,
            paint: change.program_changed.then(|| build_paint_uniforms(paint)),
            ratio,
            dash_texture,
            pattern,
            tile: build_tile_uniforms(visible, tile, paint, transform),
            image,
            stencil: painter.stencil_mode_for_clipping(&visible.id),
        };
        Ok((params, bucket))
    }
}
