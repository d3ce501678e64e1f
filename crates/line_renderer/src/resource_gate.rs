//! Per-tile check that the images a patterned layer needs are in place.

use atlas::ImageAtlas;
use line_protocol::{CrossFaded, PropertyValue};

use crate::TileSkipReason;

/// Images the layer's pattern needs from each tile's image atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRequirement<'a> {
    /// The layer has no pattern.
    None,
    /// Pattern images are chosen per feature; any populated atlas will do.
    AnyImage,
    /// Both endpoints of a constant pattern crossfade must resolve.
    Images { from: &'a str, to: &'a str },
}

impl<'a> PatternRequirement<'a> {
    pub fn from_paint(pattern: &'a PropertyValue<Option<CrossFaded<String>>>) -> Self {
        match pattern {
            PropertyValue::Constant(None) => PatternRequirement::None,
            PropertyValue::Constant(Some(images)) => {
                if images.from.is_empty() || images.to.is_empty() {
                    PatternRequirement::AnyImage
                } else {
                    PatternRequirement::Images {
                        from: &images.from,
                        to: &images.to,
                    }
                }
            }
            PropertyValue::DataDriven { .. } => PatternRequirement::AnyImage,
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, PatternRequirement::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Renderable,
    Skip(TileSkipReason),
}

/// Decides whether a tile may be drawn given its image atlas.
///
/// Layers without a pattern always pass; the atlas is never inspected for them.
pub fn gate_tile(
    requirement: &PatternRequirement<'_>,
    image_atlas: Option<&ImageAtlas>,
) -> GateDecision {
    if !requirement.is_required() {
        return GateDecision::Renderable;
    }
    let Some(image_atlas) = image_atlas else {
        return GateDecision::Skip(TileSkipReason::PatternAtlasAbsent);
    };
    if !image_atlas.is_populated() {
        return GateDecision::Skip(TileSkipReason::PatternAtlasEmpty);
    }
    if let PatternRequirement::Images { from, to } = requirement {
        if image_atlas.position(from).is_none() || image_atlas.position(to).is_none() {
            return GateDecision::Skip(TileSkipReason::PatternImageMissing);
        }
    }
    GateDecision::Renderable
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas::ImagePosition;
    use line_protocol::TextureHandle;

    fn position() -> ImagePosition {
        ImagePosition {
            tl: [0.0, 0.0],
            br: [8.0, 8.0],
            pixel_ratio: 1.0,
        }
    }

    fn atlas_with(images: &[&str]) -> ImageAtlas {
        ImageAtlas::with_positions(
            64,
            64,
            TextureHandle::default(),
            images.iter().map(|id| (id.to_string(), position())),
        )
    }

    fn constant_pattern(from: &str, to: &str) -> PropertyValue<Option<CrossFaded<String>>> {
        PropertyValue::Constant(Some(CrossFaded {
            from: from.to_string(),
            to: to.to_string(),
        }))
    }

    #[test]
    fn unpatterned_layer_ignores_atlas() {
        let pattern = PropertyValue::Constant(None);
        let requirement = PatternRequirement::from_paint(&pattern);
        assert_eq!(requirement, PatternRequirement::None);
        assert_eq!(gate_tile(&requirement, None), GateDecision::Renderable);
    }

    #[test]
    fn missing_atlas_skips() {
        let pattern = constant_pattern("p1", "p2");
        let requirement = PatternRequirement::from_paint(&pattern);
        assert_eq!(
            gate_tile(&requirement, None),
            GateDecision::Skip(TileSkipReason::PatternAtlasAbsent)
        );
    }

    #[test]
    fn unpopulated_atlas_skips() {
        let pattern = constant_pattern("p1", "p2");
        let requirement = PatternRequirement::from_paint(&pattern);
        let empty = atlas_with(&[]);
        assert_eq!(
            gate_tile(&requirement, Some(&empty)),
            GateDecision::Skip(TileSkipReason::PatternAtlasEmpty)
        );
    }

    #[test]
    fn both_crossfade_endpoints_must_resolve() {
        let pattern = constant_pattern("p1", "p2");
        let requirement = PatternRequirement::from_paint(&pattern);
        let partial = atlas_with(&["p1"]);
        assert_eq!(
            gate_tile(&requirement, Some(&partial)),
            GateDecision::Skip(TileSkipReason::PatternImageMissing)
        );
        let full = atlas_with(&["p1", "p2"]);
        assert_eq!(gate_tile(&requirement, Some(&full)), GateDecision::Renderable);
    }

    #[test]
    fn data_driven_pattern_needs_only_a_populated_atlas() {
        let pattern = PropertyValue::DataDriven {
            possible_outputs: vec![Some(CrossFaded {
                from: "a".to_string(),
                to: "b".to_string(),
            })],
        };
        let requirement = PatternRequirement::from_paint(&pattern);
        assert_eq!(requirement, PatternRequirement::AnyImage);
        let unrelated = atlas_with(&["other"]);
        assert_eq!(
            gate_tile(&requirement, Some(&unrelated)),
            GateDecision::Renderable
        );
    }

    #[test]
    fn blank_image_names_fall_back_to_populated_check() {
        let pattern = constant_pattern("", "p2");
        let requirement = PatternRequirement::from_paint(&pattern);
        assert_eq!(requirement, PatternRequirement::AnyImage);
        let unrelated = atlas_with(&["other"]);
        assert_eq!(
            gate_tile(&requirement, Some(&unrelated)),
            GateDecision::Renderable
        );
    }
}
