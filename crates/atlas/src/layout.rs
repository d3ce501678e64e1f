/// Size of the dash atlas texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAtlasConfig {
    pub width: u32,
    pub height: u32,
}

impl LineAtlasConfig {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for LineAtlasConfig {
    fn default() -> Self {
        Self::new(256, 512)
    }
}

/// Location of a dash pattern inside the dash atlas.
///
/// `y` and `height` are normalized to the atlas height; `width` is the length of
/// one dash period in line-width units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Location of a pattern image inside a tile's image atlas, in texels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePosition {
    pub tl: [f32; 2],
    pub br: [f32; 2],
    pub pixel_ratio: f32,
}

impl ImagePosition {
    pub fn tl_br(&self) -> [f32; 4] {
        [self.tl[0], self.tl[1], self.br[0], self.br[1]]
    }
}
