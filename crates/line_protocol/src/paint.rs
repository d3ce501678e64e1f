use crate::{Color, ColorStop, CrossFaded, GradientRamp, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    Bevel,
    Round,
    #[default]
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranslateAnchor {
    #[default]
    Map,
    Viewport,
}

/// Dash arrays blended across a zoom transition.
///
/// Dash lengths are in line-width units; `from_scale`/`to_scale` stretch each
/// endpoint to the current zoom and `t` is the blend factor between them.
#[derive(Debug, Clone, PartialEq)]
pub struct DashCrossFade {
    pub from: Vec<f32>,
    pub to: Vec<f32>,
    pub from_scale: f32,
    pub to_scale: f32,
    pub t: f32,
}

/// Zoom crossfade state of the layer for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossfadeParameters {
    pub from_scale: f32,
    pub to_scale: f32,
    pub t: f32,
}

impl Default for CrossfadeParameters {
    fn default() -> Self {
        Self {
            from_scale: 1.0,
            to_scale: 1.0,
            t: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePaint {
    pub opacity: PropertyValue<f32>,
    pub color: PropertyValue<Color>,
    pub width: PropertyValue<f32>,
    pub gap_width: PropertyValue<f32>,
    pub offset: PropertyValue<f32>,
    pub blur: PropertyValue<f32>,
    pub translate: [f32; 2],
    pub translate_anchor: TranslateAnchor,
    pub dasharray: Option<DashCrossFade>,
    pub pattern: PropertyValue<Option<CrossFaded<String>>>,
    /// Configured gradient stops; the sampled ramp lives on [`LineLayer`].
    pub gradient: Option<Vec<ColorStop>>,
}

impl Default for LinePaint {
    fn default() -> Self {
        Self {
            opacity: PropertyValue::Constant(1.0),
            color: PropertyValue::Constant([0.0, 0.0, 0.0, 1.0]),
            width: PropertyValue::Constant(1.0),
            gap_width: PropertyValue::Constant(0.0),
            offset: PropertyValue::Constant(0.0),
            blur: PropertyValue::Constant(0.0),
            translate: [0.0, 0.0],
            translate_anchor: TranslateAnchor::Map,
            dasharray: None,
            pattern: PropertyValue::Constant(None),
            gradient: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineLayout {
    pub cap: LineCap,
    pub join: LineJoin,
}

/// Style-resolved line layer, frozen for the duration of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    pub id: String,
    pub paint: LinePaint,
    pub layout: LineLayout,
    pub crossfade: CrossfadeParameters,
    /// Ramp sampled from `paint.gradient`, filled in by the style system.
    pub gradient: Option<GradientRamp>,
}

impl LineLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            paint: LinePaint::default(),
            layout: LineLayout::default(),
            crossfade: CrossfadeParameters::default(),
            gradient: None,
        }
    }

    pub fn with_paint(mut self, paint: LinePaint) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_layout(mut self, layout: LineLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn is_round_cap(&self) -> bool {
        self.layout.cap == LineCap::Round
    }
}
