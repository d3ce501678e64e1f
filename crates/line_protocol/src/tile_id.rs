use crate::TransformMatrix4x4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalTileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Tile address including the zoom its geometry was generated at.
///
/// `overscaled_z >= canonical.z`; the two differ when a lower-resolution tile is
/// reused past the source's maximum zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverscaledTileId {
    pub overscaled_z: u8,
    pub wrap: i16,
    pub canonical: CanonicalTileId,
}

impl OverscaledTileId {
    pub fn new(overscaled_z: u8, wrap: i16, z: u8, x: u32, y: u32) -> Self {
        assert!(
            overscaled_z >= z,
            "overscaled zoom {overscaled_z} must not be below canonical zoom {z}"
        );
        Self {
            overscaled_z,
            wrap,
            canonical: CanonicalTileId { z, x, y },
        }
    }
}

/// One entry of the visible-tile list with its camera projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub id: OverscaledTileId,
    pub pos_matrix: TransformMatrix4x4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overscaled_id_keeps_canonical_address() {
        let id = OverscaledTileId::new(16, 0, 14, 8800, 5373);
        assert_eq!(id.overscaled_z, 16);
        assert_eq!(
            id.canonical,
            CanonicalTileId {
                z: 14,
                x: 8800,
                y: 5373
            }
        );
    }

    #[test]
    #[should_panic(expected = "must not be below canonical zoom")]
    fn overscaled_id_rejects_underscaled_zoom() {
        let _ = OverscaledTileId::new(3, 0, 4, 1, 1);
    }
}
