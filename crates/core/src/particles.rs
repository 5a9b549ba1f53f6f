//! Particle physics for point-cloud brushes.
//!
//! Each tick, every particle's velocity is damped, pulled toward an
//! attractor, pushed away by a short-range repulsion, and rotated by a spin
//! term. The speed is then clamped and the position advanced:
//!
//! ```text
//! v' = v(1 - damping) + A·pull - R·push + perp(v)·spin
//! |v'| clamped to [min_speed, max_speed]
//! p' = p + v'
//! ```
//!
//! `A` is the vector to the attractor (a linear spring) and `R` is the unit
//! vector to the attractor scaled by `1 / (1 + d²)`, so repulsion dominates
//! only close in.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FrameUniforms;
use crate::error::BrushError;
use crate::geometry::Curve;
use crate::params::{param_bool, param_f64, param_usize, param_vec2};
use crate::prng::Xorshift64;
use crate::transform::Transform;

/// Distances and speeds below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

const DEFAULT_COUNT: usize = 256;
const DEFAULT_DAMPING: f64 = 0.05;
const DEFAULT_ATTRACTOR_PULL: f64 = 0.001;
const DEFAULT_ATTRACTOR_PUSH: f64 = 0.0;
const DEFAULT_SPINNING_FORCE: f64 = 0.0;
const DEFAULT_MIN_SPEED: f64 = 0.0;
const DEFAULT_MAX_SPEED: f64 = 0.02;

/// Tunables for a particle group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleParams {
    /// Fixed at creation. Rebuild the group to change it.
    pub count: usize,
    pub damping: f64,
    pub attractor_pull: f64,
    pub attractor_push: f64,
    pub spinning_force: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Scatter particles over the owning curve's bounds instead of stacking
    /// them on its first point.
    pub initial_spread: bool,
    pub attractor: DVec2,
    /// Use the pointer position as the attractor.
    pub follow_pointer: bool,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            damping: DEFAULT_DAMPING,
            attractor_pull: DEFAULT_ATTRACTOR_PULL,
            attractor_push: DEFAULT_ATTRACTOR_PUSH,
            spinning_force: DEFAULT_SPINNING_FORCE,
            min_speed: DEFAULT_MIN_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            initial_spread: true,
            attractor: DVec2::splat(0.5),
            follow_pointer: false,
        }
    }
}

impl ParticleParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            count: param_usize(params, "count", d.count),
            damping: param_f64(params, "damping", d.damping),
            attractor_pull: param_f64(params, "attractor_pull", d.attractor_pull),
            attractor_push: param_f64(params, "attractor_push", d.attractor_push),
            spinning_force: param_f64(params, "spinning_force", d.spinning_force),
            min_speed: param_f64(params, "min_speed", d.min_speed),
            max_speed: param_f64(params, "max_speed", d.max_speed),
            initial_spread: param_bool(params, "initial_spread", d.initial_spread),
            attractor: param_vec2(params, "attractor", d.attractor),
            follow_pointer: param_bool(params, "follow_pointer", d.follow_pointer),
        }
    }

    /// Checks that every tunable is a finite number and the count is
    /// non-zero.
    pub fn validate(&self) -> Result<(), BrushError> {
        if self.count == 0 {
            return Err(BrushError::InvalidParticleCount);
        }
        let fields = [
            ("damping", self.damping),
            ("attractor_pull", self.attractor_pull),
            ("attractor_push", self.attractor_push),
            ("spinning_force", self.spinning_force),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("attractor.x", self.attractor.x),
            ("attractor.y", self.attractor.y),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, v)) => Err(BrushError::InvalidConfig(format!(
                "particle {name} must be finite, got {v}"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: DVec2,
    pub vel: DVec2,
}

/// A fixed-size particle population owned by one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    params: ParticleParams,
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Creates `params.count` particles at rest.
    ///
    /// With `initial_spread`, positions are uniform over the owning curve's
    /// bounds, or over the unit square under `transform` when there is no
    /// curve. Otherwise all particles start on the curve's first point (or
    /// the transformed unit-square center).
    pub fn new(
        curve: Option<&Curve>,
        transform: &Transform,
        params: ParticleParams,
        seed: u64,
    ) -> Result<Self, BrushError> {
        params.validate()?;
        let (lo, hi) = spawn_region(curve, transform);
        let origin = curve
            .and_then(|c| c.points.first())
            .map(|p| p.pos)
            .unwrap_or_else(|| transform.apply(DVec2::splat(0.5)));
        let mut rng = Xorshift64::new(seed);
        let particles = (0..params.count)
            .map(|_| Particle {
                pos: if params.initial_spread {
                    rng.next_in_rect(lo, hi)
                } else {
                    origin
                },
                vel: DVec2::ZERO,
            })
            .collect();
        Ok(Self { params, particles })
    }

    pub fn params(&self) -> &ParticleParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Advances every particle one integration step toward `attractor`.
    pub fn step(&mut self, attractor: DVec2) {
        let p = &self.params;
        let (min_speed, max_speed) = (p.min_speed, p.max_speed.max(p.min_speed));
        for particle in &mut self.particles {
            let to_target = attractor - particle.pos;
            let dist = to_target.length();
            let repulsion = if dist < SINGULARITY_EPS {
                DVec2::ZERO
            } else {
                to_target / dist / (1.0 + dist * dist)
            };
            let spin = particle.vel.perp();

            let mut vel = particle.vel * (1.0 - p.damping) + to_target * p.attractor_pull
                - repulsion * p.attractor_push
                + spin * p.spinning_force;

            // A zero velocity has no direction to stretch to `min_speed`.
            let speed = vel.length();
            if speed > SINGULARITY_EPS {
                vel *= speed.clamp(min_speed, max_speed) / speed;
            }
            particle.vel = vel;
            particle.pos += vel;
        }
    }

    /// One tick driven by the frame uniforms.
    pub fn update(&mut self, uniforms: &FrameUniforms) {
        let attractor = if self.params.follow_pointer {
            uniforms.pointer
        } else {
            self.params.attractor
        };
        self.step(attractor);
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.particles.iter().map(|p| p.pos)
    }

    /// Current speed of every particle.
    pub fn speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles.iter().map(|p| p.vel.length())
    }
}

fn spawn_region(curve: Option<&Curve>, transform: &Transform) -> (DVec2, DVec2) {
    if let Some(bounds) = curve.and_then(Curve::bounds) {
        return bounds;
    }
    let corners = [DVec2::ZERO, DVec2::X, DVec2::Y, DVec2::ONE].map(|c| transform.apply(c));
    corners
        .iter()
        .fold((corners[0], corners[0]), |(lo, hi), &c| (lo.min(c), hi.max(c)))
}
