use crate::Color;

pub const GRADIENT_RAMP_WIDTH: u32 = 256;

/// Color at a normalized progress along the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub progress: f32,
    pub color: Color,
}

/// Precomputed RGBA8 color ramp sampled along line progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientRamp {
    width: u32,
    pixels: Vec<[u8; 4]>,
}

impl GradientRamp {
    pub fn new(pixels: Vec<[u8; 4]>) -> Self {
        assert!(!pixels.is_empty(), "gradient ramp must not be empty");
        let width = u32::try_from(pixels.len()).expect("gradient ramp width exceeds u32");
        Self { width, pixels }
    }

    /// Samples sorted color stops into a `GRADIENT_RAMP_WIDTH` x 1 ramp.
    pub fn from_stops(stops: &[ColorStop]) -> Self {
        assert!(!stops.is_empty(), "gradient needs at least one color stop");
        let last = GRADIENT_RAMP_WIDTH - 1;
        let pixels = (0..GRADIENT_RAMP_WIDTH)
            .map(|index| {
                let progress = index as f32 / last as f32;
                to_rgba8(color_at(stops, progress))
            })
            .collect();
        Self::new(pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_flattened()
    }
}

fn color_at(stops: &[ColorStop], progress: f32) -> Color {
    let first = stops[0];
    if progress <= first.progress {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if progress > upper.progress {
            continue;
        }
        let span = upper.progress - lower.progress;
        if span <= 0.0 {
            return upper.color;
        }
        let t = (progress - lower.progress) / span;
        return std::array::from_fn(|channel| {
            lower.color[channel] + (upper.color[channel] - lower.color[channel]) * t
        });
    }
    stops[stops.len() - 1].color
}

fn to_rgba8(color: Color) -> [u8; 4] {
    color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}
