/// A paint property after zoom evaluation.
///
/// Constant values apply to every feature of the layer. Data-driven values are
/// resolved per feature into vertex attributes; only the set of values they can
/// produce is known up front.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<T> {
    Constant(T),
    DataDriven { possible_outputs: Vec<T> },
}

impl<T: Clone> PropertyValue<T> {
    pub fn constant_or(&self, default: T) -> T {
        match self {
            PropertyValue::Constant(value) => value.clone(),
            PropertyValue::DataDriven { .. } => default,
        }
    }
}

impl<T> PropertyValue<T> {
    pub fn is_constant(&self) -> bool {
        matches!(self, PropertyValue::Constant(_))
    }

    pub fn as_constant(&self) -> Option<&T> {
        match self {
            PropertyValue::Constant(value) => Some(value),
            PropertyValue::DataDriven { .. } => None,
        }
    }
}

impl<T> PropertyValue<Option<T>> {
    /// Values this property can evaluate to, skipping the unset case.
    pub fn possible_outputs(&self) -> Vec<&T> {
        match self {
            PropertyValue::Constant(Some(value)) => vec![value],
            PropertyValue::Constant(None) => Vec::new(),
            PropertyValue::DataDriven { possible_outputs } => {
                possible_outputs.iter().filter_map(Option::as_ref).collect()
            }
        }
    }
}

impl<T> Default for PropertyValue<Option<T>> {
    fn default() -> Self {
        PropertyValue::Constant(None)
    }
}

/// Pair of values blended across a zoom transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossFaded<T> {
    pub from: T,
    pub to: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_or_ignores_default_for_constants() {
        assert_eq!(PropertyValue::Constant(0.0_f32).constant_or(1.0), 0.0);
        let data_driven: PropertyValue<f32> = PropertyValue::DataDriven {
            possible_outputs: vec![0.0],
        };
        assert_eq!(data_driven.constant_or(1.0), 1.0);
    }

    #[test]
    fn possible_outputs_skip_unset_values() {
        let unset: PropertyValue<Option<&str>> = PropertyValue::Constant(None);
        assert!(unset.possible_outputs().is_empty());

        let data_driven = PropertyValue::DataDriven {
            possible_outputs: vec![None, Some("dots"), Some("stripes")],
        };
        assert_eq!(data_driven.possible_outputs(), vec![&"dots", &"stripes"]);
    }
}
