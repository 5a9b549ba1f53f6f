//! Displacement fields that warp finished geometry.
//!
//! A [`Displacement`] returns an offset vector at any point and time. Scene
//! updates use [`displace_group`] to push every control point of a group
//! tree through a field, which is how strokes wobble between frames without
//! a rebuild.
//!
//! All fields are deterministic: the same inputs give the same offset.

use glam::DVec2;
use noise::{NoiseFn, Perlin};

use crate::geometry::Group;
use crate::procedural::Simplex2;

/// Distances below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

/// Offset between the two noise samples that make up one vector.
const CHANNEL_OFFSET: f64 = 100.0;

pub trait Displacement: Send + Sync {
    /// Offset at `pos` at `time`.
    fn sample(&self, pos: DVec2, time: f64) -> DVec2;
}

// ---------------------------------------------------------------------------
// Noise flows
// ---------------------------------------------------------------------------

/// Curl of a scalar Perlin field: roughly divergence-free swirls.
pub struct CurlFlow {
    noise: Perlin,
    scale: f64,
    strength: f64,
    eps: f64,
}

impl CurlFlow {
    pub fn new(scale: f64, strength: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            strength,
            eps: 0.001,
        }
    }
}

impl Displacement for CurlFlow {
    fn sample(&self, pos: DVec2, time: f64) -> DVec2 {
        let s = pos * self.scale;
        let eps = self.eps * self.scale;
        if eps.abs() < SINGULARITY_EPS {
            return DVec2::ZERO;
        }
        let f = |x: f64, y: f64| self.noise.get([x, y, time]);
        // curl F = (dF/dy, -dF/dx)
        let df_dy = (f(s.x, s.y + eps) - f(s.x, s.y - eps)) / (2.0 * eps);
        let df_dx = (f(s.x + eps, s.y) - f(s.x - eps, s.y)) / (2.0 * eps);
        DVec2::new(df_dy, -df_dx) * self.strength
    }
}

/// Multi-octave Perlin turbulence.
pub struct TurbulenceFlow {
    noise: Perlin,
    scale: f64,
    strength: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
}

impl TurbulenceFlow {
    pub fn new(
        scale: f64,
        strength: f64,
        seed: u32,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            strength,
            octaves,
            persistence,
            lacunarity,
        }
    }
}

impl Displacement for TurbulenceFlow {
    fn sample(&self, pos: DVec2, time: f64) -> DVec2 {
        let (sum, _, _) = (0..self.octaves).fold(
            (DVec2::ZERO, 1.0, 1.0),
            |(sum, amp, freq), _| {
                let s = pos * self.scale * freq;
                let v = DVec2::new(
                    self.noise.get([s.x, s.y, time]),
                    self.noise.get([s.x + CHANNEL_OFFSET, s.y + CHANNEL_OFFSET, time]),
                );
                (sum + v * amp, amp * self.persistence, freq * self.lacunarity)
            },
        );
        sum * self.strength
    }
}

/// Two channels of the engine's own simplex noise, drifting with time.
pub struct SimplexFlow {
    noise: Simplex2,
    scale: f64,
    strength: f64,
    /// Drift per second along the diagonal.
    speed: f64,
}

impl SimplexFlow {
    pub fn new(scale: f64, strength: f64, speed: f64, seed: u64) -> Self {
        Self {
            noise: Simplex2::new(seed),
            scale,
            strength,
            speed,
        }
    }
}

impl Displacement for SimplexFlow {
    fn sample(&self, pos: DVec2, time: f64) -> DVec2 {
        let s = pos * self.scale + DVec2::splat(time * self.speed);
        DVec2::new(
            self.noise.sample(s),
            self.noise.sample(s + DVec2::splat(CHANNEL_OFFSET)),
        ) * self.strength
    }
}

// ---------------------------------------------------------------------------
// Geometric flows
// ---------------------------------------------------------------------------

/// Counter-clockwise swirl around `center` with Gaussian falloff.
pub struct Vortex {
    pub center: DVec2,
    pub strength: f64,
    pub radius: f64,
}

impl Displacement for Vortex {
    fn sample(&self, pos: DVec2, _time: f64) -> DVec2 {
        let r = pos - self.center;
        let dist_sq = r.length_squared();
        let dist = dist_sq.sqrt();
        if dist < SINGULARITY_EPS || self.radius.abs() < SINGULARITY_EPS {
            return DVec2::ZERO;
        }
        let falloff = (-dist_sq / (2.0 * self.radius * self.radius)).exp();
        r.perp() / dist * self.strength * falloff
    }
}

/// Sum of several fields.
#[derive(Default)]
pub struct CompositeFlow {
    sources: Vec<Box<dyn Displacement>>,
}

impl CompositeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, source: Box<dyn Displacement>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Displacement for CompositeFlow {
    fn sample(&self, pos: DVec2, time: f64) -> DVec2 {
        self.sources
            .iter()
            .map(|s| s.sample(pos, time))
            .fold(DVec2::ZERO, |acc, v| acc + v)
    }
}

/// Moves every control point of `group` and its descendants by
/// `field(pos, time) * amount`.
pub fn displace_group(group: &mut Group, field: &dyn Displacement, time: f64, amount: f64) {
    group.for_each_mut(&mut |g| {
        for curve in &mut g.curves {
            for point in &mut curve.points {
                point.pos += field.sample(point.pos, time) * amount;
            }
        }
    });
}
