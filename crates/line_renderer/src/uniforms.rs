//! Uniform values for line programs.
//!
//! Values are grouped by how often they change: paint uniforms once per program
//! switch, ratio uniforms when the program or the tile zoom changes, tile
//! uniforms on every tile.

use atlas::{DashPosition, ImageAtlas};
use line_protocol::{
    CameraTransform, Color, CrossFaded, CrossfadeParameters, DashCrossFade, LinePaint,
    TransformMatrix4x4, VisibleTile, pixels_to_tile_units,
};

use crate::geometry::translate_pos_matrix;
use crate::tile::Tile;

/// Texels per line-width unit the SDF gamma is computed against.
const SDF_TEXELS_PER_WIDTH: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintUniforms {
    pub color: Color,
    pub opacity: f32,
    pub width: f32,
    pub gap_width: f32,
    pub offset: f32,
    pub blur: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashScaleUniforms {
    pub patternscale_a: [f32; 2],
    pub patternscale_b: [f32; 2],
    pub sdfgamma: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioUniforms {
    /// Present for the dashed program only.
    pub dash: Option<DashScaleUniforms>,
    pub units_to_pixels: [f32; 2],
    pub device_pixel_ratio: f32,
}

/// Atlas rows and blend factor of the two dash arrays being crossfaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashTextureUniforms {
    pub tex_y_a: f32,
    pub tex_y_b: f32,
    pub mix: f32,
}

/// Atlas rectangles of the two crossfaded pattern images, as `[tl, br]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternPositions {
    pub pattern_from: [f32; 4],
    pub pattern_to: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternUniforms {
    /// Absent for data-driven patterns; their positions travel with the vertices.
    pub positions: Option<PatternPositions>,
    pub texsize: [f32; 2],
    /// Device pixel ratio, tile zoom ratio, from scale, to scale.
    pub scale: [f32; 4],
    pub fade: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileUniforms {
    pub matrix: TransformMatrix4x4,
    pub ratio: f32,
}

/// Both dash array endpoints as placed in the dash atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashEndpoints {
    pub from: DashPosition,
    pub to: DashPosition,
}

/// Tile units per screen pixel at the integer tile zoom, inverted.
pub fn tile_ratio(tile: &Tile, transform: &CameraTransform) -> f64 {
    1.0 / pixels_to_tile_units(tile.tile_size, tile.id.overscaled_z, 1.0, transform.tile_zoom)
}

pub fn build_paint_uniforms(paint: &LinePaint) -> PaintUniforms {
    PaintUniforms {
        color: paint.color.constant_or([0.0, 0.0, 0.0, 1.0]),
        opacity: paint.opacity.constant_or(1.0),
        width: paint.width.constant_or(1.0),
        gap_width: paint.gap_width.constant_or(0.0),
        offset: paint.offset.constant_or(0.0),
        blur: paint.blur.constant_or(0.0),
    }
}

pub fn build_ratio_uniforms(
    dash: Option<(&DashCrossFade, &DashEndpoints)>,
    tile_ratio: f64,
    dash_atlas_width: u32,
    transform: &CameraTransform,
) -> RatioUniforms {
    let [units_x, units_y] = transform.units_to_pixels();
    RatioUniforms {
        dash: dash.map(|(dasharray, endpoints)| {
            build_dash_scale(dasharray, endpoints, tile_ratio, dash_atlas_width, transform)
        }),
        units_to_pixels: [units_x as f32, units_y as f32],
        device_pixel_ratio: transform.device_pixel_ratio as f32,
    }
}

fn build_dash_scale(
    dasharray: &DashCrossFade,
    endpoints: &DashEndpoints,
    tile_ratio: f64,
    dash_atlas_width: u32,
    transform: &CameraTransform,
) -> DashScaleUniforms {
    let width_a = f64::from(endpoints.from.width) * f64::from(dasharray.from_scale);
    let width_b = f64::from(endpoints.to.width) * f64::from(dasharray.to_scale);
    let sdfgamma = f64::from(dash_atlas_width)
        / (width_a.min(width_b) * SDF_TEXELS_PER_WIDTH * transform.device_pixel_ratio)
        / 2.0;
    DashScaleUniforms {
        patternscale_a: [
            (tile_ratio / width_a) as f32,
            -endpoints.from.height / 2.0,
        ],
        patternscale_b: [(tile_ratio / width_b) as f32, -endpoints.to.height / 2.0],
        sdfgamma: sdfgamma as f32,
    }
}

pub fn build_dash_texture_uniforms(
    dasharray: &DashCrossFade,
    endpoints: &DashEndpoints,
) -> DashTextureUniforms {
    DashTextureUniforms {
        tex_y_a: endpoints.from.y,
        tex_y_b: endpoints.to.y,
        mix: dasharray.t,
    }
}

/// Builds the per-tile pattern values.
///
/// Positions are only resolved for a constant pattern and are left out when
/// either of its images is missing from the atlas.
pub fn build_pattern_uniforms(
    pattern: Option<&CrossFaded<String>>,
    image_atlas: &ImageAtlas,
    tile_ratio: f64,
    crossfade: &CrossfadeParameters,
    transform: &CameraTransform,
) -> PatternUniforms {
    let positions = pattern.and_then(|pattern| {
        Some(PatternPositions {
            pattern_from: image_atlas.position(&pattern.from)?.tl_br(),
            pattern_to: image_atlas.position(&pattern.to)?.tl_br(),
        })
    });
    let [texture_width, texture_height] = image_atlas.size();
    PatternUniforms {
        positions,
        texsize: [texture_width as f32, texture_height as f32],
        scale: [
            transform.device_pixel_ratio as f32,
            tile_ratio as f32,
            crossfade.from_scale,
            crossfade.to_scale,
        ],
        fade: crossfade.t,
    }
}

pub fn build_tile_uniforms(
    visible: &VisibleTile,
    tile: &Tile,
    paint: &LinePaint,
    transform: &CameraTransform,
) -> TileUniforms {
    let ratio = 1.0
        / pixels_to_tile_units(tile.tile_size, tile.id.overscaled_z, 1.0, transform.zoom);
    TileUniforms {
        matrix: translate_pos_matrix(
            &visible.pos_matrix,
            tile,
            paint.translate,
            paint.translate_anchor,
            transform,
        ),
        ratio: ratio as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas::ImagePosition;
    use line_protocol::{IDENTITY_MATRIX, OverscaledTileId, PropertyValue, TextureHandle};

    fn transform() -> CameraTransform {
        CameraTransform {
            zoom: 10.5,
            tile_zoom: 10.0,
            angle: 0.0,
            pixels_to_gl_units: [2.0 / 800.0, -2.0 / 600.0],
            device_pixel_ratio: 2.0,
        }
    }

    fn tile() -> Tile {
        Tile::new(OverscaledTileId::new(10, 0, 10, 1, 1), 512)
    }

    fn endpoints() -> DashEndpoints {
        DashEndpoints {
            from: DashPosition {
                x: 0.0,
                y: 7.5 / 512.0,
                width: 4.0,
                height: 14.0 / 512.0,
            },
            to: DashPosition {
                x: 0.0,
                y: 22.5 / 512.0,
                width: 8.0,
                height: 14.0 / 512.0,
            },
        }
    }

    fn dasharray() -> DashCrossFade {
        DashCrossFade {
            from: vec![2.0, 2.0],
            to: vec![4.0, 4.0],
            from_scale: 2.0,
            to_scale: 1.0,
            t: 0.5,
        }
    }

    #[test]
    fn tile_ratio_is_inverse_tile_units_per_pixel() {
        assert_eq!(tile_ratio(&tile(), &transform()), 1.0 / 16.0);
    }

    #[test]
    fn paint_uniforms_use_defaults_for_data_driven_values() {
        let paint = LinePaint {
            width: PropertyValue::DataDriven {
                possible_outputs: vec![4.0, 6.0],
            },
            opacity: PropertyValue::Constant(0.5),
            ..LinePaint::default()
        };
        let uniforms = build_paint_uniforms(&paint);
        assert_eq!(uniforms.width, 1.0);
        assert_eq!(uniforms.opacity, 0.5);
        assert_eq!(uniforms.color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn dash_scale_stretches_by_endpoint_scale() {
        let dasharray = dasharray();
        let endpoints = endpoints();
        let ratio = build_ratio_uniforms(
            Some((&dasharray, &endpoints)),
            1.0 / 16.0,
            256,
            &transform(),
        );
        let dash = ratio.dash.unwrap();
        // both endpoints are 8 units wide once scaled
        assert_eq!(dash.patternscale_a, [1.0 / 128.0, -7.0 / 512.0]);
        assert_eq!(dash.patternscale_b, [1.0 / 128.0, -7.0 / 512.0]);
        assert_eq!(dash.sdfgamma, 256.0 / (8.0 * 256.0 * 2.0) / 2.0);
        assert_eq!(ratio.units_to_pixels, [400.0, -300.0]);
        assert_eq!(ratio.device_pixel_ratio, 2.0);
    }

    #[test]
    fn ratio_uniforms_without_dash_skip_dash_scale() {
        let ratio = build_ratio_uniforms(None, 1.0, 256, &transform());
        assert!(ratio.dash.is_none());
    }

    #[test]
    fn dash_texture_uniforms_carry_rows_and_blend() {
        let uniforms = build_dash_texture_uniforms(&dasharray(), &endpoints());
        assert_eq!(uniforms.tex_y_a, 7.5 / 512.0);
        assert_eq!(uniforms.tex_y_b, 22.5 / 512.0);
        assert_eq!(uniforms.mix, 0.5);
    }

    #[test]
    fn pattern_uniforms_resolve_positions_of_both_images() {
        let atlas = ImageAtlas::with_positions(
            128,
            64,
            TextureHandle::default(),
            [(
                "p1".to_string(),
                ImagePosition {
                    tl: [2.0, 2.0],
                    br: [10.0, 18.0],
                    pixel_ratio: 1.0,
                },
            )],
        );
        let crossfade = CrossfadeParameters {
            from_scale: 2.0,
            to_scale: 1.0,
            t: 0.25,
        };
        let same = CrossFaded {
            from: "p1".to_string(),
            to: "p1".to_string(),
        };
        let uniforms =
            build_pattern_uniforms(Some(&same), &atlas, 0.5, &crossfade, &transform());
        let positions = uniforms.positions.unwrap();
        assert_eq!(positions.pattern_from, [2.0, 2.0, 10.0, 18.0]);
        assert_eq!(positions.pattern_to, [2.0, 2.0, 10.0, 18.0]);
        assert_eq!(uniforms.texsize, [128.0, 64.0]);
        assert_eq!(uniforms.scale, [2.0, 0.5, 2.0, 1.0]);
        assert_eq!(uniforms.fade, 0.25);

        let missing = CrossFaded {
            from: "p1".to_string(),
            to: "p2".to_string(),
        };
        let uniforms =
            build_pattern_uniforms(Some(&missing), &atlas, 0.5, &crossfade, &transform());
        assert!(uniforms.positions.is_none());
    }

    #[test]
    fn data_driven_pattern_uniforms_keep_tile_values() {
        let atlas = ImageAtlas::with_positions(
            32,
            16,
            TextureHandle::default(),
            std::iter::empty(),
        );
        let crossfade = CrossfadeParameters {
            from_scale: 1.0,
            to_scale: 0.5,
            t: 0.6,
        };
        let uniforms = build_pattern_uniforms(None, &atlas, 0.25, &crossfade, &transform());
        assert!(uniforms.positions.is_none());
        assert_eq!(uniforms.texsize, [32.0, 16.0]);
        assert_eq!(uniforms.scale, [2.0, 0.25, 1.0, 0.5]);
        assert_eq!(uniforms.fade, 0.6);
    }

    #[test]
    fn tile_uniforms_use_display_zoom_for_ratio() {
        let visible = VisibleTile {
            id: tile().id,
            pos_matrix: IDENTITY_MATRIX,
        };
        let uniforms = build_tile_uniforms(&visible, &tile(), &LinePaint::default(), &transform());
        let expected = 1.0 / pixels_to_tile_units(512, 10, 1.0, 10.5);
        assert_eq!(uniforms.ratio, expected as f32);
        assert_eq!(uniforms.matrix, IDENTITY_MATRIX);
    }
}
