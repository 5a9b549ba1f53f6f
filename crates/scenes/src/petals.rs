//! A ring of polygon petals that wobble and periodically regrow.
//!
//! Each petal is a regular polygon pushed out from the center on its own
//! rotated frame. Every frame the petals drift through a simplex flow, and
//! every `interval_ms` the scene rebuilds, snapping them back and rerolling
//! their hashed tilts.

use std::f64::consts::TAU;

use brush_engine_core::builder::{Builder, ShapeOpts};
use brush_engine_core::color::Color;
use brush_engine_core::displace::{displace_group, SimplexFlow};
use brush_engine_core::error::BrushError;
use brush_engine_core::geometry::{DrawMode, GroupSettings};
use brush_engine_core::params::{param_color, param_f64, param_usize};
use brush_engine_core::scene::{FrameContext, Recalculate};
use brush_engine_core::spline::Kernel;
use brush_engine_core::style::Style;
use brush_engine_core::transform::{Reset, TransformOpts};
use brush_engine_core::Scene;
use serde_json::{json, Value};

const DEFAULT_COUNT: usize = 8;
const DEFAULT_SIDES: usize = 5;
const DEFAULT_RADIUS: f64 = 0.08;
const DEFAULT_RING: f64 = 0.25;
const DEFAULT_WOBBLE: f64 = 0.05;
const DEFAULT_INTERVAL_MS: f64 = 2000.0;
const DEFAULT_THICKNESS: f64 = 0.006;
const FLOW_SCALE: f64 = 4.0;
const FLOW_SPEED: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PetalsParams {
    pub count: usize,
    pub sides: usize,
    pub radius: f64,
    /// Distance of each petal from the center.
    pub ring: f64,
    /// Drift speed of the per-frame wobble, canvas units per second.
    pub wobble: f64,
    pub interval_ms: f64,
    pub thickness: f64,
    pub inner: Color,
    pub outer: Color,
}

impl Default for PetalsParams {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            sides: DEFAULT_SIDES,
            radius: DEFAULT_RADIUS,
            ring: DEFAULT_RING,
            wobble: DEFAULT_WOBBLE,
            interval_ms: DEFAULT_INTERVAL_MS,
            thickness: DEFAULT_THICKNESS,
            inner: Color::new(1.0, 140.0 / 255.0, 179.0 / 255.0),
            outer: Color::new(89.0 / 255.0, 51.0 / 255.0, 153.0 / 255.0),
        }
    }
}

impl PetalsParams {
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            count: param_usize(params, "count", d.count),
            sides: param_usize(params, "sides", d.sides),
            radius: param_f64(params, "radius", d.radius),
            ring: param_f64(params, "ring", d.ring),
            wobble: param_f64(params, "wobble", d.wobble),
            interval_ms: param_f64(params, "interval_ms", d.interval_ms),
            thickness: param_f64(params, "thickness", d.thickness),
            inner: param_color(params, "inner", d.inner),
            outer: param_color(params, "outer", d.outer),
        }
    }
}

pub struct Petals {
    params: PetalsParams,
    flow: SimplexFlow,
}

impl Petals {
    pub fn new(params: PetalsParams, seed: u64) -> Self {
        Self {
            params,
            flow: SimplexFlow::new(FLOW_SCALE, 1.0, FLOW_SPEED, seed),
        }
    }

    pub fn from_json(params: &Value, seed: u64) -> Self {
        Self::new(PetalsParams::from_json(params), seed)
    }
}

impl Scene for Petals {
    fn name(&self) -> &str {
        "petals"
    }

    fn build(&mut self, b: &mut Builder) -> Result<(), BrushError> {
        let p = self.params.clone();
        b.new_group(
            GroupSettings::default()
                .mode(DrawMode::Mesh)
                .kernel(Kernel::Bezier { strength: 0.5 })
                .update(true)
                .style(Style::new().thickness(p.thickness)),
        );
        b.transform(TransformOpts::new().mark("center").translate(0.5, 0.5))?;
        b.repeat(p.count as i64, |b, r| {
            let angle = TAU * r.i as f64 / r.count as f64;
            let tilt = b.hash(r.p) * TAU;
            b.transform(TransformOpts::new().push().rotate(angle))?;
            b.transform(TransformOpts::new().translate(p.ring, 0.0).rotate(tilt))?;
            let color = p.inner.lerp(p.outer, r.p);
            b.style(Style::new().color(color));
            b.with_group(GroupSettings::default().mode(DrawMode::Mesh).update(true), |b| {
                b.new_shape(
                    p.sides,
                    ShapeOpts {
                        closed: true,
                        radius: p.radius,
                    },
                )
            })?;
            b.transform(TransformOpts::new().reset(Reset::Pop))?;
            Ok(())
        })?;
        b.transform(TransformOpts::new().reset(Reset::Marker("center".into())))?;
        Ok(())
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), BrushError> {
        let amount = self.params.wobble * frame.uniforms.delta_time;
        for group in frame.groups.iter_mut() {
            displace_group(group, &self.flow, frame.uniforms.time, amount);
        }
        Ok(())
    }

    fn recalculate(&self) -> Recalculate {
        Recalculate::Interval(self.params.interval_ms)
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "count": p.count,
            "sides": p.sides,
            "radius": p.radius,
            "ring": p.ring,
            "wobble": p.wobble,
            "interval_ms": p.interval_ms,
            "thickness": p.thickness,
            "inner": p.inner.to_hex(),
            "outer": p.outer.to_hex(),
        })
    }
}
