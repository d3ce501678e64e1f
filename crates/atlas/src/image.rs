use std::collections::HashMap;

use line_protocol::TextureHandle;

use crate::layout::ImagePosition;

/// Pattern images packed for one tile.
///
/// An atlas with no positions exists while the tile worker is still populating it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAtlas {
    positions: HashMap<String, ImagePosition>,
    width: u32,
    height: u32,
    texture: TextureHandle,
}

impl ImageAtlas {
    pub fn new(width: u32, height: u32, texture: TextureHandle) -> Self {
        Self {
            positions: HashMap::new(),
            width,
            height,
            texture,
        }
    }

    pub fn with_positions(
        width: u32,
        height: u32,
        texture: TextureHandle,
        positions: impl IntoIterator<Item = (String, ImagePosition)>,
    ) -> Self {
        Self {
            positions: positions.into_iter().collect(),
            width,
            height,
            texture,
        }
    }

    pub fn insert(&mut self, image_id: impl Into<String>, position: ImagePosition) {
        self.positions.insert(image_id.into(), position);
    }

    pub fn position(&self, image_id: &str) -> Option<&ImagePosition> {
        self.positions.get(image_id)
    }

    pub fn is_populated(&self) -> bool {
        !self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}
