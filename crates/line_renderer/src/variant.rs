use line_protocol::LinePaint;

/// Shader program family used to draw a line layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramVariant {
    Plain,
    Dashed,
    Patterned,
    Gradient,
}

impl ProgramVariant {
    pub const ALL: [ProgramVariant; 4] = [
        ProgramVariant::Plain,
        ProgramVariant::Dashed,
        ProgramVariant::Patterned,
        ProgramVariant::Gradient,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProgramVariant::Plain => "line",
            ProgramVariant::Dashed => "line_sdf",
            ProgramVariant::Patterned => "line_pattern",
            ProgramVariant::Gradient => "line_gradient",
        }
    }

    /// Vertex and fragment entry points in `line.wgsl`.
    pub fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            ProgramVariant::Plain => ("vs_line", "fs_line"),
            ProgramVariant::Dashed => ("vs_line_sdf", "fs_line_sdf"),
            ProgramVariant::Patterned => ("vs_line", "fs_line_pattern"),
            ProgramVariant::Gradient => ("vs_line", "fs_line_gradient"),
        }
    }

    pub fn samples_image(self) -> bool {
        !matches!(self, ProgramVariant::Plain)
    }
}

/// Picks the program for a layer: dash, then pattern, then gradient, then plain.
///
/// A data-driven pattern whose possible outputs are all unset does not select the
/// pattern program.
pub fn select_variant(paint: &LinePaint) -> ProgramVariant {
    if paint.dasharray.is_some() {
        ProgramVariant::Dashed
    } else if !paint.pattern.possible_outputs().is_empty() {
        ProgramVariant::Patterned
    } else if paint.gradient.is_some() {
        ProgramVariant::Gradient
    } else {
        ProgramVariant::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use line_protocol::{ColorStop, CrossFaded, DashCrossFade, PropertyValue};

    fn dash() -> DashCrossFade {
        DashCrossFade {
            from: vec![2.0, 1.0],
            to: vec![2.0, 1.0],
            from_scale: 1.0,
            to_scale: 1.0,
            t: 1.0,
        }
    }

    fn pattern() -> PropertyValue<Option<CrossFaded<String>>> {
        PropertyValue::Constant(Some(CrossFaded {
            from: "p1".to_string(),
            to: "p2".to_string(),
        }))
    }

    fn gradient() -> Option<Vec<ColorStop>> {
        Some(vec![ColorStop {
            progress: 0.0,
            color: [1.0, 0.0, 0.0, 1.0],
        }])
    }

    #[test]
    fn default_paint_is_plain() {
        assert_eq!(select_variant(&LinePaint::default()), ProgramVariant::Plain);
    }

    #[test]
    fn dash_wins_over_pattern_and_gradient() {
        let paint = LinePaint {
            dasharray: Some(dash()),
            pattern: pattern(),
            gradient: gradient(),
            ..LinePaint::default()
        };
        assert_eq!(select_variant(&paint), ProgramVariant::Dashed);
    }

    #[test]
    fn pattern_wins_over_gradient() {
        let paint = LinePaint {
            pattern: pattern(),
            gradient: gradient(),
            ..LinePaint::default()
        };
        assert_eq!(select_variant(&paint), ProgramVariant::Patterned);
    }

    #[test]
    fn gradient_without_dash_or_pattern() {
        let paint = LinePaint {
            gradient: gradient(),
            ..LinePaint::default()
        };
        assert_eq!(select_variant(&paint), ProgramVariant::Gradient);
    }

    #[test]
    fn data_driven_pattern_without_outputs_falls_through() {
        let paint = LinePaint {
            pattern: PropertyValue::DataDriven {
                possible_outputs: vec![None],
            },
            ..LinePaint::default()
        };
        assert_eq!(select_variant(&paint), ProgramVariant::Plain);
    }

    #[test]
    fn only_plain_skips_image_binding() {
        for variant in ProgramVariant::ALL {
            assert_eq!(variant.samples_image(), variant != ProgramVariant::Plain);
        }
    }
}
