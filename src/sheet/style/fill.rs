//! Fill patterns, gradients and colors.

use super::Color;
use std::hash::{Hash, Hasher};

/// Cell fill pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternType {
    None,
    Solid,
    Gray125,
    Gray0625,
    DarkGray,
    MediumGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Solid => "solid",
            Self::Gray125 => "gray125",
            Self::Gray0625 => "gray0625",
            Self::DarkGray => "darkGray",
            Self::MediumGray => "mediumGray",
            Self::LightGray => "lightGray",
            Self::DarkHorizontal => "darkHorizontal",
            Self::DarkVertical => "darkVertical",
            Self::DarkDown => "darkDown",
            Self::DarkUp => "darkUp",
            Self::DarkGrid => "darkGrid",
            Self::DarkTrellis => "darkTrellis",
            Self::LightHorizontal => "lightHorizontal",
            Self::LightVertical => "lightVertical",
            Self::LightDown => "lightDown",
            Self::LightUp => "lightUp",
            Self::LightGrid => "lightGrid",
            Self::LightTrellis => "lightTrellis",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "none" => Self::None,
            "solid" => Self::Solid,
            "gray125" => Self::Gray125,
            "gray0625" => Self::Gray0625,
            "darkGray" => Self::DarkGray,
            "mediumGray" => Self::MediumGray,
            "lightGray" => Self::LightGray,
            "darkHorizontal" => Self::DarkHorizontal,
            "darkVertical" => Self::DarkVertical,
            "darkDown" => Self::DarkDown,
            "darkUp" => Self::DarkUp,
            "darkGrid" => Self::DarkGrid,
            "darkTrellis" => Self::DarkTrellis,
            "lightHorizontal" => Self::LightHorizontal,
            "lightVertical" => Self::LightVertical,
            "lightDown" => Self::LightDown,
            "lightUp" => Self::LightUp,
            "lightGrid" => Self::LightGrid,
            "lightTrellis" => Self::LightTrellis,
            _ => return None,
        })
    }
}

/// Gradient shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GradientType {
    /// Bands along the `degree` angle
    #[default]
    Linear,
    /// Bands spreading from the rectangle given by `left`/`right`/`top`/`bottom`
    Path,
}

impl GradientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Path => "path",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "linear" => Some(Self::Linear),
            "path" => Some(Self::Path),
            _ => None,
        }
    }
}

/// One color stop; `position` runs from 0.0 to 1.0.
#[derive(Debug, Clone)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

impl PartialEq for GradientStop {
    fn eq(&self, other: &Self) -> bool {
        self.position.to_bits() == other.position.to_bits() && self.color == other.color
    }
}

impl Eq for GradientStop {}

impl Hash for GradientStop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.to_bits().hash(state);
        self.color.hash(state);
    }
}

/// A `<gradientFill>`.
#[derive(Debug, Clone, Default)]
pub struct GradientFill {
    pub kind: GradientType,
    /// Angle of a linear gradient in degrees
    pub degree: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub stops: Vec<GradientStop>,
}

impl GradientFill {
    /// Two-stop linear gradient.
    pub fn linear(degree: f64, from: Color, to: Color) -> Self {
        Self {
            degree,
            stops: vec![
                GradientStop {
                    position: 0.0,
                    color: from,
                },
                GradientStop {
                    position: 1.0,
                    color: to,
                },
            ],
            ..Self::default()
        }
    }

    fn bits(&self) -> [u64; 5] {
        [self.degree, self.left, self.right, self.top, self.bottom].map(f64::to_bits)
    }
}

impl PartialEq for GradientFill {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.bits() == other.bits() && self.stops == other.stops
    }
}

impl Eq for GradientFill {}

impl Hash for GradientFill {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.bits().hash(state);
        self.stops.hash(state);
    }
}

/// Fill information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Fill {
    #[default]
    None,
    Pattern {
        pattern: PatternType,
        fg_color: Option<Color>,
        bg_color: Option<Color>,
    },
    Gradient(GradientFill),
}

impl Fill {
    /// Solid fill in the given color.
    #[inline]
    pub fn solid(color: Color) -> Self {
        Fill::Pattern {
            pattern: PatternType::Solid,
            fg_color: Some(color),
            bg_color: None,
        }
    }

    #[inline]
    pub fn pattern(pattern: PatternType, fg_color: Option<Color>, bg_color: Option<Color>) -> Self {
        if pattern == PatternType::None {
            return Fill::None;
        }
        Fill::Pattern {
            pattern,
            fg_color,
            bg_color,
        }
    }

    /// The `gray125` fill Excel requires at index 1.
    #[inline]
    pub fn gray125() -> Self {
        Fill::pattern(PatternType::Gray125, None, None)
    }

    /// Pattern of a pattern fill; `None` for empty and gradient fills.
    pub fn pattern_type(&self) -> PatternType {
        match self {
            Fill::None | Fill::Gradient(_) => PatternType::None,
            Fill::Pattern { pattern, .. } => *pattern,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.pattern_type() == PatternType::Solid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_gradient_identity() {
        let a = Fill::Gradient(GradientFill::linear(90.0, Color::theme(0), Color::theme(4)));
        let b = Fill::Gradient(GradientFill::linear(90.0, Color::theme(0), Color::theme(4)));
        let c = Fill::Gradient(GradientFill::linear(45.0, Color::theme(0), Color::theme(4)));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.pattern_type(), PatternType::None);
        let set: HashSet<Fill> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
