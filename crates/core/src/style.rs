//! Layered brush style.
//!
//! Points, curves, groups, and the builder each carry a [`Style`] whose
//! fields are optional. Resolution walks the layers from most to least
//! specific and takes the first value set for each attribute, falling back
//! to [`ResolvedStyle::default`].

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Partial style: `None` means "inherit from the next layer".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Extra rotation in radians, added to the curve's own direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Layers `self` over `under`: fields set on `self` win.
    pub fn over(self, under: &Style) -> Style {
        Style {
            thickness: self.thickness.or(under.thickness),
            alpha: self.alpha.or(under.alpha),
            color: self.color.or(under.color),
            rotation: self.rotation.or(under.rotation),
        }
    }

    /// Resolves a stack of layers ordered most specific first.
    pub fn resolve(layers: &[&Style]) -> ResolvedStyle {
        let merged = layers
            .iter()
            .fold(Style::default(), |acc, layer| acc.over(layer));
        let base = ResolvedStyle::default();
        ResolvedStyle {
            thickness: merged.thickness.unwrap_or(base.thickness),
            alpha: merged.alpha.unwrap_or(base.alpha),
            color: merged.color.unwrap_or(base.color),
            rotation: merged.rotation.unwrap_or(base.rotation),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }
}

/// Fully resolved style handed to the buffer writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    pub thickness: f64,
    pub alpha: f64,
    pub color: Color,
    pub rotation: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            alpha: 1.0,
            color: Color::WHITE,
            rotation: 0.0,
        }
    }
}
