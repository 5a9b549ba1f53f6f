//! Scalar remapping helpers used throughout builder scripts.
//!
//! [`RangeMap`] carries the `(low, high) -> (low_out, high_out)` remap with
//! an optional power-law warp and output clamping. [`scale`] applies it to
//! either a scalar or an array and returns the same shape it was given.

use serde::{Deserialize, Serialize};

/// A scalar or an array of scalars. Remapping preserves which one it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Remappable {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Remappable {
    /// Returns the scalar, or `None` for an array.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Remappable::Scalar(v) => Some(*v),
            Remappable::Array(_) => None,
        }
    }

    /// Returns the array, or `None` for a scalar.
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Remappable::Scalar(_) => None,
            Remappable::Array(v) => Some(v),
        }
    }
}

impl From<f64> for Remappable {
    fn from(v: f64) -> Self {
        Remappable::Scalar(v)
    }
}

impl From<Vec<f64>> for Remappable {
    fn from(v: Vec<f64>) -> Self {
        Remappable::Array(v)
    }
}

impl From<&[f64]> for Remappable {
    fn from(v: &[f64]) -> Self {
        Remappable::Array(v.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Remappable {
    fn from(v: [f64; N]) -> Self {
        Remappable::Array(v.to_vec())
    }
}

/// Linear remap from `[low, high]` to `[low_out, high_out]`.
///
/// Defaults: `exp = 1` (no warp), `clamp = true`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeMap {
    pub low: f64,
    pub high: f64,
    pub low_out: f64,
    pub high_out: f64,
    pub exp: f64,
    pub clamp: bool,
}

impl RangeMap {
    pub fn new(low: f64, high: f64, low_out: f64, high_out: f64) -> Self {
        Self {
            low,
            high,
            low_out,
            high_out,
            exp: 1.0,
            clamp: true,
        }
    }

    /// Sets the power-law exponent applied to the normalized value.
    pub fn with_exp(mut self, exp: f64) -> Self {
        self.exp = exp;
        self
    }

    /// Enables or disables output clamping.
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    /// Remaps a single value.
    ///
    /// A zero-width input range returns `low_out`. The clamp bounds come
    /// from the output range, so inverted output ranges clamp correctly.
    pub fn apply(&self, input: f64) -> f64 {
        if self.low == self.high {
            return self.low_out;
        }
        let mut n = (input - self.low) / (self.high - self.low);
        if self.clamp {
            n = n.clamp(0.0, 1.0);
        }
        if self.exp != 1.0 {
            // Sign-preserving so unclamped values below `low` stay below it.
            n = n.signum() * n.abs().powf(self.exp);
        }
        let out = self.low_out + n * (self.high_out - self.low_out);
        if self.clamp {
            let lo = self.low_out.min(self.high_out);
            let hi = self.low_out.max(self.high_out);
            out.clamp(lo, hi)
        } else {
            out
        }
    }
}

/// Remaps a scalar or array element-wise, preserving its shape.
pub fn scale(input: impl Into<Remappable>, map: &RangeMap) -> Remappable {
    match input.into() {
        Remappable::Scalar(v) => Remappable::Scalar(map.apply(v)),
        Remappable::Array(vs) => Remappable::Array(vs.into_iter().map(|v| map.apply(v)).collect()),
    }
}

/// Scalar shorthand for `RangeMap::new(low, high, low_out, high_out).apply(input)`.
pub fn scale_f64(input: f64, low: f64, high: f64, low_out: f64, high_out: f64) -> f64 {
    RangeMap::new(low, high, low_out, high_out).apply(input)
}

/// Interpolates between `low` and `high` by `p`, with `p` clamped to [0, 1].
pub fn get_range(p: f64, low: f64, high: f64) -> f64 {
    lerp(low, high, p.clamp(0.0, 1.0))
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Fractional part, always in [0, 1) (GLSL `fract`).
pub fn fract(x: f64) -> f64 {
    x - x.floor()
}

/// Hermite smoothstep between `edge0` and `edge1`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn scale_maps_midpoint() {
        let v = scale_f64(5.0, 0.0, 10.0, 0.0, 1.0);
        assert!((v - 0.5).abs() < EPS, "got {v}");
    }

    #[test]
    fn degenerate_range_returns_low_out() {
        let v = scale_f64(5.0, 5.0, 5.0, 0.0, 1.0);
        assert_eq!(v, 0.0);
        let v = RangeMap::new(3.0, 3.0, 7.0, 9.0).with_clamp(false).apply(100.0);
        assert_eq!(v, 7.0);
    }

    #[test]
    fn clamp_limits_output() {
        assert_eq!(scale_f64(20.0, 0.0, 10.0, 0.0, 1.0), 1.0);
        assert_eq!(scale_f64(-5.0, 0.0, 10.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn inverted_output_range_clamps_to_output_bounds() {
        assert_eq!(scale_f64(20.0, 0.0, 10.0, 1.0, 0.0), 0.0);
        assert_eq!(scale_f64(-5.0, 0.0, 10.0, 1.0, 0.0), 1.0);
        let mid = scale_f64(2.5, 0.0, 10.0, 1.0, 0.0);
        assert!((mid - 0.75).abs() < EPS, "got {mid}");
    }

    #[test]
    fn unclamped_extrapolates() {
        let v = RangeMap::new(0.0, 10.0, 0.0, 1.0)
            .with_clamp(false)
            .apply(20.0);
        assert!((v - 2.0).abs() < EPS, "got {v}");
    }

    #[test]
    fn exponent_warps_normalized_value() {
        let v = RangeMap::new(0.0, 10.0, 0.0, 100.0).with_exp(2.0).apply(5.0);
        assert!((v - 25.0).abs() < 1e-9, "got {v}");
    }

    #[test]
    fn scale_preserves_scalar_shape() {
        let out = scale(2.0, &RangeMap::new(0.0, 4.0, 0.0, 1.0));
        assert_eq!(out, Remappable::Scalar(0.5));
    }

    #[test]
    fn scale_maps_arrays_element_wise() {
        let out = scale([0.0, 2.0, 4.0], &RangeMap::new(0.0, 4.0, 10.0, 20.0));
        assert_eq!(out, Remappable::Array(vec![10.0, 15.0, 20.0]));
        assert!(out.as_scalar().is_none());
        assert_eq!(out.as_slice().map(<[f64]>::len), Some(3));
    }

    #[test]
    fn get_range_clamps_progress() {
        assert_eq!(get_range(2.0, 1.0, 3.0), 3.0);
        assert_eq!(get_range(-1.0, 1.0, 3.0), 1.0);
        assert_eq!(get_range(0.5, 1.0, 3.0), 2.0);
    }

    #[test]
    fn fract_is_positive_for_negative_inputs() {
        assert!((fract(-0.25) - 0.75).abs() < EPS);
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scale_is_idempotent_once_clamped(x in -1e6_f64..1e6) {
                let once = scale_f64(x, 0.0, 10.0, 0.0, 1.0);
                let twice = scale_f64(once, 0.0, 1.0, 0.0, 1.0);
                prop_assert!((once - twice).abs() < 1e-12, "{once} vs {twice}");
            }

            #[test]
            fn clamped_output_within_output_bounds(
                x in -1e6_f64..1e6,
                lo in -100.0_f64..100.0,
                hi in -100.0_f64..100.0,
                lo_out in -100.0_f64..100.0,
                hi_out in -100.0_f64..100.0,
                exp in 0.1_f64..4.0,
            ) {
                let v = RangeMap::new(lo, hi, lo_out, hi_out).with_exp(exp).apply(x);
                prop_assert!(v >= lo_out.min(hi_out) && v <= lo_out.max(hi_out), "{v} outside [{lo_out}, {hi_out}]");
            }
        }
    }
}
