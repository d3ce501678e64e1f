//! Draw commands handed from the layer driver to a GPU backend.

use std::fmt;

use line_protocol::{
    ColorMode, DepthMode, GradientRamp, IndexBufferHandle, OverscaledTileId, ProgramId,
    StencilMode, TextureHandle, VertexBufferHandle,
};

use crate::tile::{LineBucket, ProgramConfiguration};
use crate::uniforms::{
    DashTextureUniforms, PaintUniforms, PatternUniforms, RatioUniforms, TileUniforms,
};
use crate::variant::ProgramVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
}

/// Texture bound to the program's image slot and how it is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageBinding {
    pub texture: TextureHandle,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl ImageBinding {
    pub fn dash_atlas(texture: TextureHandle) -> Self {
        Self {
            texture,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
        }
    }

    pub fn gradient(texture: TextureHandle) -> Self {
        Self {
            texture,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
        }
    }

    pub fn pattern(texture: TextureHandle) -> Self {
        Self {
            texture,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
        }
    }
}

/// State changes for one tile draw.
///
/// `None` fields keep the value the program had for the previous tile; the sink
/// is expected to retain uniform and texture state between draws of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDrawParams {
    pub tile_id: OverscaledTileId,
    pub variant: ProgramVariant,
    pub program: ProgramId,
    pub paint: Option<PaintUniforms>,
    pub ratio: Option<RatioUniforms>,
    pub dash_texture: Option<DashTextureUniforms>,
    pub pattern: Option<PatternUniforms>,
    pub tile: TileUniforms,
    pub image: Option<ImageBinding>,
    pub stencil: StencilMode,
}

/// Triangle-list draw of every segment of `bucket`.
#[derive(Debug, Clone, Copy)]
pub struct LineDrawCommand<'a> {
    pub layer_id: &'a str,
    pub params: &'a TileDrawParams,
    pub bucket: &'a LineBucket,
}

/// Backend that turns line draw commands into GPU work.
pub trait LineCommandSink {
    /// Returns the program for `variant` specialised to `configuration`.
    ///
    /// The same inputs under the same layer modes yield the same id.
    fn use_program(
        &mut self,
        variant: ProgramVariant,
        configuration: &ProgramConfiguration,
    ) -> ProgramId;

    fn set_layer_modes(&mut self, depth: DepthMode, color: ColorMode);

    fn create_gradient_texture(&mut self, ramp: &GradientRamp) -> TextureHandle;

    /// Records one draw.
    ///
    /// The command's uniforms and image binding become the sink's current state
    /// even when the draw itself is rejected, so later commands may omit them.
    fn submit(&mut self, command: &LineDrawCommand<'_>) -> Result<(), SubmitError>;
}

/// Resource a sink could not resolve for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    UnknownVertexBuffer(VertexBufferHandle),
    UnknownIndexBuffer(IndexBufferHandle),
    UnknownTexture(TextureHandle),
    UnknownProgram(ProgramId),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UnknownVertexBuffer(handle) => {
                write!(formatter, "vertex buffer {handle:?} is not registered")
            }
            SubmitError::UnknownIndexBuffer(handle) => {
                write!(formatter, "index buffer {handle:?} is not registered")
            }
            SubmitError::UnknownTexture(handle) => {
                write!(formatter, "texture {handle:?} is not registered")
            }
            SubmitError::UnknownProgram(program) => {
                write!(formatter, "program {program:?} was not created by this sink")
            }
        }
    }
}

impl std::error::Error for SubmitError {}

pub fn emit_draw(
    sink: &mut dyn LineCommandSink,
    layer_id: &str,
    params: &TileDrawParams,
    bucket: &LineBucket,
) -> Result<(), SubmitError> {
    log::trace!(
        target: "line_renderer::emit",
        "layer={layer_id} tile={:?} variant={} segments={}",
        params.tile_id,
        params.variant.label(),
        bucket.segments.len()
    );
    sink.submit(&LineDrawCommand {
        layer_id,
        params,
        bucket,
    })
}
