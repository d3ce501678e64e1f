/// Tile coordinate extent of vector tile geometry.
pub const EXTENT: f64 = 8192.0;

/// Camera values the line renderer reads each pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    /// Fractional display zoom.
    pub zoom: f64,
    /// Integer zoom of the tiles covering the view.
    pub tile_zoom: f64,
    /// Map bearing in radians.
    pub angle: f64,
    /// Clip-space units per screen pixel along x and y.
    pub pixels_to_gl_units: [f64; 2],
    pub device_pixel_ratio: f64,
}

impl CameraTransform {
    pub fn units_to_pixels(&self) -> [f64; 2] {
        [
            1.0 / self.pixels_to_gl_units[0],
            1.0 / self.pixels_to_gl_units[1],
        ]
    }
}

/// Converts a length in screen pixels at `zoom` into tile units of a tile
/// with the given size and overscaled zoom.
pub fn pixels_to_tile_units(tile_size: u32, overscaled_z: u8, pixel_value: f64, zoom: f64) -> f64 {
    let scale = 2f64.powf(zoom - f64::from(overscaled_z));
    pixel_value * (EXTENT / (f64::from(tile_size) * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_pixel_at_tile_zoom_spans_extent_over_tile_size() {
        assert_eq!(pixels_to_tile_units(512, 10, 1.0, 10.0), 16.0);
    }

    #[test]
    fn pixels_shrink_in_tile_units_when_zooming_in() {
        let at_zoom = pixels_to_tile_units(512, 10, 1.0, 10.0);
        let one_level_in = pixels_to_tile_units(512, 10, 1.0, 11.0);
        assert_eq!(one_level_in * 2.0, at_zoom);
    }

    #[test]
    fn units_to_pixels_inverts_gl_units() {
        let transform = CameraTransform {
            zoom: 3.0,
            tile_zoom: 3.0,
            angle: 0.0,
            pixels_to_gl_units: [2.0 / 800.0, -2.0 / 600.0],
            device_pixel_ratio: 1.0,
        };
        let [x, y] = transform.units_to_pixels();
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y + 300.0).abs() < 1e-9);
    }
}
