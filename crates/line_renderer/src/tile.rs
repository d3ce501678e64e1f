//! Tile-side inputs of a line draw.
//!
//! Tiles, buckets and their buffers are produced by the tile cache; this module only
//! describes the read-only view the renderer needs of them.

use std::collections::HashMap;

use atlas::ImageAtlas;
use line_protocol::{IndexBufferHandle, OverscaledTileId, VertexBufferHandle};

/// Contiguous range of a bucket's buffers drawn with one indexed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub vertex_offset: u32,
    pub primitive_offset: u32,
    pub vertex_length: u32,
    pub primitive_length: u32,
}

impl Segment {
    /// Index range of the segment's triangles.
    pub fn index_range(&self) -> std::ops::Range<u32> {
        let start = self
            .primitive_offset
            .checked_mul(3)
            .expect("segment index start overflow");
        let count = self
            .primitive_length
            .checked_mul(3)
            .expect("segment index count overflow");
        start..start.checked_add(count).expect("segment index end overflow")
    }
}

/// Paint attribute that may be bound per vertex instead of per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaintAttribute {
    Color,
    Opacity,
    Width,
    GapWidth,
    Offset,
    Blur,
    Pattern,
}

/// Which paint attributes a bucket carries as vertex data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProgramConfiguration {
    data_driven: Vec<PaintAttribute>,
}

impl ProgramConfiguration {
    pub fn new(data_driven: impl IntoIterator<Item = PaintAttribute>) -> Self {
        let mut data_driven: Vec<PaintAttribute> = data_driven.into_iter().collect();
        data_driven.sort();
        data_driven.dedup();
        Self { data_driven }
    }

    pub fn is_data_driven(&self, attribute: PaintAttribute) -> bool {
        self.data_driven.binary_search(&attribute).is_ok()
    }

    pub fn data_driven(&self) -> &[PaintAttribute] {
        &self.data_driven
    }

    /// Bitmask of data-driven attributes; part of a program's identity.
    pub fn key(&self) -> u32 {
        self.data_driven
            .iter()
            .fold(0, |key, attribute| key | (1 << *attribute as u32))
    }
}

/// Tessellated line geometry of one layer in one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBucket {
    pub layout_vertex_buffer: VertexBufferHandle,
    pub index_buffer: IndexBufferHandle,
    pub segments: Vec<Segment>,
    pub program_configuration: ProgramConfiguration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: OverscaledTileId,
    pub tile_size: u32,
    buckets: HashMap<String, LineBucket>,
    image_atlas: Option<ImageAtlas>,
}

impl Tile {
    pub fn new(id: OverscaledTileId, tile_size: u32) -> Self {
        assert!(tile_size > 0, "tile size must be positive");
        Self {
            id,
            tile_size,
            buckets: HashMap::new(),
            image_atlas: None,
        }
    }

    pub fn with_bucket(mut self, layer_id: impl Into<String>, bucket: LineBucket) -> Self {
        self.buckets.insert(layer_id.into(), bucket);
        self
    }

    pub fn with_image_atlas(mut self, image_atlas: ImageAtlas) -> Self {
        self.image_atlas = Some(image_atlas);
        self
    }

    pub fn set_image_atlas(&mut self, image_atlas: Option<ImageAtlas>) {
        self.image_atlas = image_atlas;
    }

    pub fn bucket(&self, layer_id: &str) -> Option<&LineBucket> {
        self.buckets.get(layer_id)
    }

    pub fn image_atlas(&self) -> Option<&ImageAtlas> {
        self.image_atlas.as_ref()
    }
}

/// Read access to loaded tiles.
pub trait TileSource {
    fn tile(&self, id: &OverscaledTileId) -> Option<&Tile>;
}

impl TileSource for HashMap<OverscaledTileId, Tile> {
    fn tile(&self, id: &OverscaledTileId) -> Option<&Tile> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_index_range_covers_whole_triangles() {
        let segment = Segment {
            vertex_offset: 40,
            primitive_offset: 10,
            vertex_length: 12,
            primitive_length: 4,
        };
        assert_eq!(segment.index_range(), 30..42);
    }

    #[test]
    fn program_configuration_key_ignores_order_and_duplicates() {
        let first = ProgramConfiguration::new([PaintAttribute::Width, PaintAttribute::Color]);
        let second = ProgramConfiguration::new([
            PaintAttribute::Color,
            PaintAttribute::Width,
            PaintAttribute::Color,
        ]);
        assert_eq!(first, second);
        assert_eq!(first.key(), second.key());
        assert!(first.is_data_driven(PaintAttribute::Width));
        assert!(!first.is_data_driven(PaintAttribute::Blur));
        assert_eq!(ProgramConfiguration::default().key(), 0);
    }
}
