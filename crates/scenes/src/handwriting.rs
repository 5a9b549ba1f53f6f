//! Asemic handwriting across the canvas.

use brush_engine_core::builder::Builder;
use brush_engine_core::error::BrushError;
use brush_engine_core::geometry::GroupSettings;
use brush_engine_core::params::{param_f64, param_string, param_vec2};
use brush_engine_core::spline::Kernel;
use brush_engine_core::style::Style;
use brush_engine_core::text::TextLayout;
use brush_engine_core::transform::{Reset, TransformOpts};
use brush_engine_core::Scene;
use glam::DVec2;
use serde_json::{json, Value};

const DEFAULT_TEXT: &str = "the quick brown fox\njumps over the lazy dog";
const DEFAULT_SIZE: f64 = 0.04;
const DEFAULT_STRENGTH: f64 = 0.3;
const DEFAULT_THICKNESS: f64 = 0.003;

#[derive(Debug, Clone, PartialEq)]
pub struct HandwritingParams {
    pub text: String,
    pub layout: TextLayout,
    /// Canvas units per glyph-cell unit.
    pub size: f64,
    /// Top-left corner of the first line.
    pub origin: DVec2,
    pub strength: f64,
    pub thickness: f64,
}

impl Default for HandwritingParams {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            layout: TextLayout::default(),
            size: DEFAULT_SIZE,
            origin: DVec2::splat(0.1),
            strength: DEFAULT_STRENGTH,
            thickness: DEFAULT_THICKNESS,
        }
    }
}

impl HandwritingParams {
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            text: param_string(params, "text", &d.text),
            layout: TextLayout::from_json(params),
            size: param_f64(params, "size", d.size),
            origin: param_vec2(params, "origin", d.origin),
            strength: param_f64(params, "strength", d.strength),
            thickness: param_f64(params, "thickness", d.thickness),
        }
    }
}

pub struct Handwriting {
    params: HandwritingParams,
}

impl Handwriting {
    pub fn new(params: HandwritingParams) -> Self {
        Self { params }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(HandwritingParams::from_json(params))
    }
}

impl Scene for Handwriting {
    fn name(&self) -> &str {
        "handwriting"
    }

    fn build(&mut self, b: &mut Builder) -> Result<(), BrushError> {
        let p = &self.params;
        b.new_group(
            GroupSettings::default()
                .kernel(Kernel::Bezier { strength: p.strength })
                .style(Style::new().thickness(p.thickness)),
        );
        b.transform(
            TransformOpts::new()
                .push()
                .translate(p.origin.x, p.origin.y)
                .scale_uniform(p.size),
        )?;
        b.text(&p.text, &p.layout)?;
        b.transform(TransformOpts::new().reset(Reset::Pop))?;
        Ok(())
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "text": p.text,
            "advance": p.layout.advance,
            "height": p.layout.height,
            "line_height": p.layout.line_height,
            "slant": p.layout.slant,
            "jitter": p.layout.jitter,
            "size": p.size,
            "origin": [p.origin.x, p.origin.y],
            "strength": p.strength,
            "thickness": p.thickness,
        })
    }
}
