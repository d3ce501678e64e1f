//! Shared data model for line-layer rendering.
//!
//! Everything in this crate is plain data handed across the boundary between the
//! style system, the tile cache, the camera and the line renderer. Nothing here
//! touches the GPU; resources are referred to through opaque slotmap handles that a
//! command sink resolves.

mod camera;
mod gradient;
mod paint;
mod property;
mod tile_id;

pub use camera::{CameraTransform, EXTENT, pixels_to_tile_units};
pub use gradient::{ColorStop, GRADIENT_RAMP_WIDTH, GradientRamp};
pub use paint::{
    CrossfadeParameters, DashCrossFade, LineCap, LineJoin, LineLayer, LineLayout, LinePaint,
    TranslateAnchor,
};
pub use property::{CrossFaded, PropertyValue};
pub use tile_id::{CanonicalTileId, OverscaledTileId, VisibleTile};

slotmap::new_key_type! {
    pub struct TextureHandle;
    pub struct VertexBufferHandle;
    pub struct IndexBufferHandle;
    pub struct ProgramId;
}

/// Column-major 4x4 matrix, laid out the way the shaders consume it.
pub type TransformMatrix4x4 = [f32; 16];

pub const IDENTITY_MATRIX: TransformMatrix4x4 = [
    1.0, 0.0, 0.0, 0.0, // col0
    0.0, 1.0, 0.0, 0.0, // col1
    0.0, 0.0, 1.0, 0.0, // col2
    0.0, 0.0, 0.0, 1.0, // col3
];

/// Premultiplied RGBA color in linear 0..1 range.
pub type Color = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    Offscreen,
    Opaque,
    Translucent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthMask {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthMode {
    pub func: CompareFunction,
    pub mask: DepthMask,
    pub range: [f32; 2],
}

impl DepthMode {
    pub const DISABLED: DepthMode = DepthMode {
        func: CompareFunction::Always,
        mask: DepthMask::ReadOnly,
        range: [0.0, 1.0],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Unblended,
    AlphaBlended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilMode {
    pub func: CompareFunction,
    pub reference: u32,
    pub mask: u32,
}

impl StencilMode {
    pub const DISABLED: StencilMode = StencilMode {
        func: CompareFunction::Always,
        reference: 0,
        mask: 0,
    };

    /// Passes only where the stencil buffer holds `reference`.
    pub const fn clip_to(reference: u32) -> Self {
        Self {
            func: CompareFunction::Equal,
            reference,
            mask: 0xFF,
        }
    }
}
