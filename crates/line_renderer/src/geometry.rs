use line_protocol::{
    CameraTransform, TransformMatrix4x4, TranslateAnchor, pixels_to_tile_units,
};

use crate::tile::Tile;

/// Offsets a tile's position matrix by a screen-pixel translation.
///
/// Viewport-anchored translations are counter-rotated by the map bearing so they
/// stay fixed on screen. A zero translation returns `matrix` unchanged.
pub fn translate_pos_matrix(
    matrix: &TransformMatrix4x4,
    tile: &Tile,
    translate: [f32; 2],
    anchor: TranslateAnchor,
    transform: &CameraTransform,
) -> TransformMatrix4x4 {
    if translate == [0.0, 0.0] {
        return *matrix;
    }

    let angle = match anchor {
        TranslateAnchor::Viewport => -transform.angle,
        TranslateAnchor::Map => 0.0,
    };
    let (sin, cos) = angle.sin_cos();
    let [tx, ty] = [f64::from(translate[0]), f64::from(translate[1])];
    let rotated = [tx * cos - ty * sin, tx * sin + ty * cos];

    let to_tile_units = |pixels: f64| {
        pixels_to_tile_units(tile.tile_size, tile.id.overscaled_z, pixels, transform.zoom)
    };
    mat4_translate(
        matrix,
        [to_tile_units(rotated[0]), to_tile_units(rotated[1]), 0.0],
    )
}

/// Post-multiplies a column-major matrix by a translation.
pub fn mat4_translate(matrix: &TransformMatrix4x4, offset: [f64; 3]) -> TransformMatrix4x4 {
    let mut out = *matrix;
    let [x, y, z] = offset;
    for row in 0..4 {
        let translated = f64::from(matrix[row]) * x
            + f64::from(matrix[4 + row]) * y
            + f64::from(matrix[8 + row]) * z
            + f64::from(matrix[12 + row]);
        out[12 + row] = translated as f32;
    }
    out
}
