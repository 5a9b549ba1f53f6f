//! Noise and procedural fields: Gaussian kernels, a cheap grid blur,
//! hash-seeded sine waves, and seeded 2D simplex noise.
//!
//! [`Simplex2`] implements [`noise::NoiseFn`] so it composes with the
//! `noise` crate's combinators and can stand in anywhere a `Perlin` or
//! `OpenSimplex` generator is accepted.

use std::f64::consts::{PI, TAU};
use std::sync::OnceLock;

use glam::DVec2;
use noise::NoiseFn;

use crate::prng::{hash01_pair, Xorshift64};

/// Default Gaussian width used for brush falloff.
pub const DEFAULT_SIGMA: f64 = 0.15;

/// Number of sine terms summed by [`noise_wave_random`].
const WAVE_HARMONICS: u64 = 10;

/// Normalized Gaussian: `exp(-x²/2σ²) / sqrt(2πσ²)`.
///
/// A non-positive `sigma` collapses the kernel: returns 0 everywhere.
pub fn gaussian(x: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    let coefficient = 1.0 / (sigma * sigma * 2.0 * PI).sqrt();
    coefficient * (-(x * x) / (2.0 * sigma * sigma)).exp()
}

/// Averages `sample` over a 3x3 neighbourhood of grid cells of size
/// `blur_radius`, anchored at `uv` snapped down to that grid.
///
/// All nine taps carry equal weight. A non-positive radius returns
/// `sample(uv)` unchanged.
pub fn gaussian_blur<F>(sample: F, uv: DVec2, blur_radius: f64) -> f64
where
    F: Fn(DVec2) -> f64,
{
    if blur_radius <= 0.0 {
        return sample(uv);
    }
    let snapped = (uv / blur_radius).floor() * blur_radius;
    let mut total = 0.0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let offset = DVec2::new(dx as f64, dy as f64) * blur_radius;
            total += sample(snapped + offset);
        }
    }
    total / 9.0
}

/// Sum of ten hash-seeded, phase-shifted sine waves driven by `time`,
/// normalized to [0, 1].
///
/// Harmonic `k` runs at `freq * (k + 1) * (0.75 + 0.5 * h)` for a hashed `h`,
/// so the result never repeats on a short period and needs no lookups.
pub fn noise_wave_random(time: f64, seed: f64, freq: f64) -> f64 {
    let key = seed.to_bits();
    let sum: f64 = (0..WAVE_HARMONICS)
        .map(|k| {
            let rate = (k + 1) as f64 * (0.75 + 0.5 * hash01_pair(key, k));
            let phase = hash01_pair(key, k + WAVE_HARMONICS) * TAU;
            (time * freq * rate + phase).sin()
        })
        .sum();
    (sum / WAVE_HARMONICS as f64) * 0.5 + 0.5
}

/// Skew factor to the simplex lattice: (sqrt(3) - 1) / 2.
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor back to Cartesian space: (3 - sqrt(3)) / 6.
const G2: f64 = 0.211_324_865_405_187_1;

/// Twelve gradient directions (the 3D cube edges projected to xy).
const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Seeded 2D simplex noise with output in [-1, 1].
#[derive(Debug, Clone)]
pub struct Simplex2 {
    seed: u64,
    perm: [u8; 512],
}

impl Simplex2 {
    /// Builds the permutation table for `seed` with a Fisher-Yates shuffle.
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut rng = Xorshift64::keyed(seed, 0x51_3D_1E);
        for i in (1..256).rev() {
            let j = rng.next_usize(i + 1);
            table.swap(i, j);
        }
        let perm = std::array::from_fn(|i| table[i & 255]);
        Self { seed, perm }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn gradient_index(&self, i: i64, j: i64) -> usize {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        self.perm[ii + self.perm[jj] as usize] as usize % GRADIENTS.len()
    }

    /// Corner contribution with the quartic falloff `(0.5 - r²)⁴`.
    fn corner(&self, i: i64, j: i64, x: f64, y: f64) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            return 0.0;
        }
        let (gx, gy) = GRADIENTS[self.gradient_index(i, j)];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }

    /// Samples the noise at `p`.
    pub fn sample(&self, p: DVec2) -> f64 {
        let s = (p.x + p.y) * F2;
        let i = (p.x + s).floor();
        let j = (p.y + s).floor();
        let t = (i + j) * G2;
        let x0 = p.x - (i - t);
        let y0 = p.y - (j - t);

        // Which of the two triangles of the skewed cell we are in.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let (i, j) = (i as i64, j as i64);
        let n = self.corner(i, j, x0, y0)
            + self.corner(i + i1, j + j1, x1, y1)
            + self.corner(i + 1, j + 1, x2, y2);
        (70.0 * n).clamp(-1.0, 1.0)
    }
}

impl NoiseFn<f64, 2> for Simplex2 {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(DVec2::new(point[0], point[1]))
    }
}

/// Simplex noise with seed 0.
pub fn snoise2(p: DVec2) -> f64 {
    static DEFAULT: OnceLock<Simplex2> = OnceLock::new();
    DEFAULT.get_or_init(|| Simplex2::new(0)).sample(p)
}

/// Fractal sum of `octaves` layers of any 2D noise, normalized by the total
/// amplitude so the output range matches the source's.
pub fn fbm2<N>(source: &N, p: DVec2, octaves: u32, lacunarity: f64, gain: f64) -> f64
where
    N: NoiseFn<f64, 2>,
{
    let (sum, norm, _, _) = (0..octaves).fold((0.0, 0.0, 1.0, 1.0), |(sum, norm, amp, freq), _| {
        let q = p * freq;
        (
            sum + source.get([q.x, q.y]) * amp,
            norm + amp,
            amp * gain,
            freq * lacunarity,
        )
    });
    if norm == 0.0 {
        0.0
    } else {
        sum / norm
    }
}
