//! A grid of noisy strokes, one per cell.
//!
//! Each cell gets a short horizontal stroke whose control points are lifted
//! by simplex noise, then tilted by a per-cell hash. Neighbouring cells
//! sample nearby noise, so the grid reads as one flowing texture.

use brush_engine_core::builder::{Builder, NoiseOpts};
use brush_engine_core::error::BrushError;
use brush_engine_core::geometry::{DrawMode, GroupSettings};
use brush_engine_core::params::{param_f64, param_string, param_usize};
use brush_engine_core::spline::Kernel;
use brush_engine_core::style::Style;
use brush_engine_core::transform::{Reset, TransformOpts};
use brush_engine_core::Scene;
use glam::DVec2;
use serde_json::{json, Value};

const DEFAULT_COLS: usize = 6;
const DEFAULT_ROWS: usize = 6;
/// Control points per stroke. Raised to 3 if lower.
const DEFAULT_POINTS: usize = 5;
const DEFAULT_NOISE_SCALE: f64 = 1.5;
const DEFAULT_AMPLITUDE: f64 = 0.3;
const DEFAULT_STRENGTH: f64 = 0.5;
const DEFAULT_TILT: f64 = 0.6;
const DEFAULT_THICKNESS: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeGridParams {
    pub cols: usize,
    pub rows: usize,
    pub points: usize,
    pub noise_scale: f64,
    /// Vertical lift of the noise, in cell units.
    pub amplitude: f64,
    /// Bezier blend strength.
    pub strength: f64,
    /// Largest random tilt in radians.
    pub tilt: f64,
    pub thickness: f64,
    pub mode: DrawMode,
}

impl Default for StrokeGridParams {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            points: DEFAULT_POINTS,
            noise_scale: DEFAULT_NOISE_SCALE,
            amplitude: DEFAULT_AMPLITUDE,
            strength: DEFAULT_STRENGTH,
            tilt: DEFAULT_TILT,
            thickness: DEFAULT_THICKNESS,
            mode: DrawMode::Line,
        }
    }
}

impl StrokeGridParams {
    pub fn from_json(params: &Value) -> Self {
        let mode = match param_string(params, "mode", "line").as_str() {
            "dash" => DrawMode::Dash,
            "mesh" => DrawMode::Mesh,
            _ => DrawMode::Line,
        };
        Self {
            cols: param_usize(params, "cols", DEFAULT_COLS),
            rows: param_usize(params, "rows", DEFAULT_ROWS),
            points: param_usize(params, "points", DEFAULT_POINTS).max(3),
            noise_scale: param_f64(params, "noise_scale", DEFAULT_NOISE_SCALE),
            amplitude: param_f64(params, "amplitude", DEFAULT_AMPLITUDE),
            strength: param_f64(params, "strength", DEFAULT_STRENGTH),
            tilt: param_f64(params, "tilt", DEFAULT_TILT),
            thickness: param_f64(params, "thickness", DEFAULT_THICKNESS),
            mode,
        }
    }
}

fn mode_name(mode: DrawMode) -> &'static str {
    match mode {
        DrawMode::Dash => "dash",
        DrawMode::Mesh => "mesh",
        _ => "line",
    }
}

pub struct StrokeGrid {
    params: StrokeGridParams,
}

impl StrokeGrid {
    pub fn new(params: StrokeGridParams) -> Self {
        Self { params }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(StrokeGridParams::from_json(params))
    }
}

impl Scene for StrokeGrid {
    fn name(&self) -> &str {
        "stroke-grid"
    }

    fn build(&mut self, b: &mut Builder) -> Result<(), BrushError> {
        let p = self.params.clone();
        b.new_group(
            GroupSettings::default()
                .mode(p.mode)
                .kernel(Kernel::Bezier { strength: p.strength })
                .style(Style::new().thickness(p.thickness)),
        );
        let cell_size = DVec2::new(1.0 / p.cols.max(1) as f64, 1.0 / p.rows.max(1) as f64);
        b.repeat_grid([p.cols as i64, p.rows as i64], |b, cell| {
            let tilt = (b.hash(cell.index as f64) * 2.0 - 1.0) * p.tilt;
            b.transform(
                TransformOpts::new()
                    .push()
                    .translate(cell.p_center.x, cell.p_center.y)
                    .scale(cell_size.x * 0.8, cell_size.y * 0.8)
                    .rotate(tilt),
            )?;
            let stroke: Vec<DVec2> = (0..p.points)
                .map(|k| {
                    let x = k as f64 / (p.points - 1) as f64 - 0.5;
                    let sample = cell.p_center * p.noise_scale + DVec2::new(x * cell_size.x, 0.0);
                    let lift = b.noise(
                        sample,
                        NoiseOpts {
                            signed: true,
                            advance: false,
                            frequency: 1.0,
                        },
                    );
                    DVec2::new(x, lift * p.amplitude)
                })
                .collect();
            b.new_curve(stroke)?;
            b.transform(TransformOpts::new().reset(Reset::Pop))?;
            Ok(())
        })
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "cols": p.cols,
            "rows": p.rows,
            "points": p.points,
            "noise_scale": p.noise_scale,
            "amplitude": p.amplitude,
            "strength": p.strength,
            "tilt": p.tilt,
            "thickness": p.thickness,
            "mode": mode_name(p.mode),
        })
    }
}
