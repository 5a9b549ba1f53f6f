//! A particle cloud orbiting an attractor.
//!
//! Particles are scattered over a hexagon and then pulled toward the
//! attractor every frame, with a spin term that bends the fall into an orbit.
//! With `follow_pointer` the attractor tracks the pointer.

use brush_engine_core::builder::{Builder, ShapeOpts};
use brush_engine_core::color::Color;
use brush_engine_core::error::BrushError;
use brush_engine_core::geometry::GroupSettings;
use brush_engine_core::params::{param_color, param_f64};
use brush_engine_core::particles::ParticleParams;
use brush_engine_core::style::Style;
use brush_engine_core::transform::{Reset, TransformOpts};
use brush_engine_core::Scene;
use serde_json::{json, Value};

const DEFAULT_RADIUS: f64 = 0.3;
const DEFAULT_THICKNESS: f64 = 0.004;
const DEFAULT_SPINNING_FORCE: f64 = 0.08;
const DEFAULT_ATTRACTOR_PUSH: f64 = 0.002;
const HEX_SIDES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCloudParams {
    pub particles: ParticleParams,
    /// Radius of the spawn hexagon around the canvas center.
    pub radius: f64,
    pub thickness: f64,
    pub color: Color,
}

impl Default for OrbitCloudParams {
    fn default() -> Self {
        Self {
            particles: ParticleParams {
                spinning_force: DEFAULT_SPINNING_FORCE,
                attractor_push: DEFAULT_ATTRACTOR_PUSH,
                ..ParticleParams::default()
            },
            radius: DEFAULT_RADIUS,
            thickness: DEFAULT_THICKNESS,
            color: Color::WHITE,
        }
    }
}

impl OrbitCloudParams {
    /// Particle keys (`count`, `damping`, ...) sit at the top level next to
    /// the scene's own keys.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        let mut particles = ParticleParams::from_json(params);
        if params.get("spinning_force").is_none() {
            particles.spinning_force = d.particles.spinning_force;
        }
        if params.get("attractor_push").is_none() {
            particles.attractor_push = d.particles.attractor_push;
        }
        Self {
            particles,
            radius: param_f64(params, "radius", d.radius),
            thickness: param_f64(params, "thickness", d.thickness),
            color: param_color(params, "color", d.color),
        }
    }
}

pub struct OrbitCloud {
    params: OrbitCloudParams,
}

impl OrbitCloud {
    pub fn new(params: OrbitCloudParams) -> Self {
        Self { params }
    }

    pub fn from_json(params: &Value) -> Self {
        Self::new(OrbitCloudParams::from_json(params))
    }
}

impl Scene for OrbitCloud {
    fn name(&self) -> &str {
        "orbit-cloud"
    }

    fn build(&mut self, b: &mut Builder) -> Result<(), BrushError> {
        let p = &self.params;
        b.new_group(
            GroupSettings::default()
                .update(true)
                .style(Style::new().thickness(p.thickness).color(p.color))
                .particles(p.particles.clone()),
        );
        b.transform(TransformOpts::new().push().translate(0.5, 0.5))?;
        b.new_shape(
            HEX_SIDES,
            ShapeOpts {
                closed: false,
                radius: p.radius,
            },
        )?;
        b.transform(TransformOpts::new().reset(Reset::Pop))?;
        Ok(())
    }

    fn params(&self) -> Value {
        let p = &self.params;
        let mut out = serde_json::to_value(&p.particles).unwrap_or_else(|_| json!({}));
        if let Some(obj) = out.as_object_mut() {
            obj.insert("radius".into(), json!(p.radius));
            obj.insert("thickness".into(), json!(p.thickness));
            obj.insert("color".into(), json!(p.color.to_hex()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush_engine_core::{FrameStatus, FrameUniforms, Sketch};
    use glam::DVec2;

    fn sketch(params: Value) -> Sketch {
        Sketch::new(Box::new(OrbitCloud::from_json(&params)), 3, &FrameUniforms::default()).unwrap()
    }

    #[test]
    fn creates_requested_particle_count() {
        let s = sketch(json!({"count": 40}));
        let set = s.groups()[0].particles.as_ref().unwrap();
        assert_eq!(set.len(), 40);
        assert_eq!(s.buffers().vertex_count(), 40);
    }

    #[test]
    fn particles_spawn_inside_hexagon_bounds() {
        let s = sketch(json!({"count": 100, "radius": 0.2}));
        let set = s.groups()[0].particles.as_ref().unwrap();
        assert!(set
            .positions()
            .all(|p| (p - DVec2::splat(0.5)).abs().max_element() <= 0.2 + 1e-9));
    }

    #[test]
    fn zero_particles_fail_to_build() {
        let result = Sketch::new(
            Box::new(OrbitCloud::from_json(&json!({"count": 0}))),
            3,
            &FrameUniforms::default(),
        );
        assert_eq!(result.err(), Some(BrushError::InvalidParticleCount));
    }

    #[test]
    fn ticks_move_particles_toward_pointer() {
        let mut s = sketch(json!({
            "count": 16,
            "follow_pointer": true,
            "spinning_force": 0.0,
            "attractor_push": 0.0,
            "attractor_pull": 0.05
        }));
        let target = DVec2::new(0.9, 0.1);
        let mean_dist = |s: &Sketch| {
            let set = s.groups()[0].particles.as_ref().unwrap();
            set.positions().map(|p| p.distance(target)).sum::<f64>() / set.len() as f64
        };
        let before = mean_dist(&s);
        let mut u = FrameUniforms {
            pointer: target,
            ..FrameUniforms::default()
        };
        for _ in 0..30 {
            u.advance(1.0 / 60.0);
            assert_eq!(s.tick(&u), FrameStatus::Fresh);
        }
        assert!(mean_dist(&s) < before, "particles did not approach the pointer");
    }

    #[test]
    fn defaults_spin() {
        let p = OrbitCloudParams::from_json(&json!({}));
        assert_eq!(p.particles.spinning_force, DEFAULT_SPINNING_FORCE);
        let p = OrbitCloudParams::from_json(&json!({"spinning_force": 0.0}));
        assert_eq!(p.particles.spinning_force, 0.0);
    }

    #[test]
    fn params_round_trip() {
        let scene = OrbitCloud::from_json(&json!({"count": 9, "radius": 0.1, "color": "#ff0000"}));
        let again = OrbitCloud::from_json(&scene.params());
        assert_eq!(again.params, scene.params);
    }
}
