//! Line layer renderer.
//!
//! `draw_line` walks the visible tiles of one line layer, decides per tile whether
//! it can be drawn, picks the shader variant, rebuilds only the uniforms that
//! changed since the previous tile and hands the resulting draw to a
//! [`LineCommandSink`]. [`WgpuLineSink`] is the wgpu backend for those commands.

mod draw_line;
mod emitter;
mod geometry;
mod gradient;
mod painter;
mod resource_gate;
mod state_tracker;
mod tile;
mod uniforms;
mod variant;
mod wgpu_sink;

use std::fmt;

pub use draw_line::{LayerDrawReport, LineDrawContext, draw_line};
pub use emitter::{
    ImageBinding, LineCommandSink, LineDrawCommand, SubmitError, TextureFilter, TextureWrap,
    TileDrawParams, emit_draw,
};
pub use geometry::{mat4_translate, translate_pos_matrix};
pub use gradient::LineLayerRenderState;
pub use painter::{DEPTH_EPSILON, FramePainter, Painter, SUBLAYERS_PER_LAYER};
pub use resource_gate::{GateDecision, PatternRequirement, gate_tile};
pub use state_tracker::{LoopState, TileStateChange};
pub use tile::{
    LineBucket, PaintAttribute, ProgramConfiguration, Segment, Tile, TileSource,
};
pub use uniforms::{
    DashEndpoints, DashScaleUniforms, DashTextureUniforms, PaintUniforms, PatternPositions,
    PatternUniforms, RatioUniforms, TileUniforms, build_dash_texture_uniforms, build_paint_uniforms,
    build_pattern_uniforms, build_ratio_uniforms, build_tile_uniforms, tile_ratio,
};
pub use variant::{ProgramVariant, select_variant};
pub use wgpu_sink::{
    LINE_SHADER_SOURCE, LineSinkConfig, LineSinkError, LineUniformsGpu, LineVertexGpu,
    WgpuLineSink,
};

/// Why a whole layer drew nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSkipReason {
    WrongRenderPass,
    ZeroOpacity,
    ZeroWidth,
}

/// Why a single tile of a layer drew nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSkipReason {
    MissingTile,
    MissingBucket,
    PatternAtlasAbsent,
    PatternAtlasEmpty,
    PatternImageMissing,
    GradientRampMissing,
    DashAtlasFull,
    /// The sink could not resolve the draw's buffers, texture or program.
    DrawRejected,
}

impl fmt::Display for TileSkipReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TileSkipReason::MissingTile => "tile not loaded",
            TileSkipReason::MissingBucket => "tile has no bucket for layer",
            TileSkipReason::PatternAtlasAbsent => "tile has no image atlas",
            TileSkipReason::PatternAtlasEmpty => "tile image atlas not populated",
            TileSkipReason::PatternImageMissing => "pattern image missing from atlas",
            TileSkipReason::GradientRampMissing => "layer has no gradient ramp",
            TileSkipReason::DashAtlasFull => "dash atlas has no room for dash array",
            TileSkipReason::DrawRejected => "sink rejected the draw",
        };
        formatter.write_str(reason)
    }
}

#[cfg(test)]
mod wgsl_tests;
