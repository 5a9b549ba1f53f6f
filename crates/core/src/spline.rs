//! Closed-form spline evaluation.
//!
//! Curves are evaluated with one of two kernels:
//!
//! - [`Kernel::Bezier`]: chained quadratic segments whose shape is picked by a
//!   `strength` in [0, 1]. `0` is a pure quadratic Bézier, `1` is the control
//!   polyline walked at constant speed, and anything in between is a
//!   rational Bézier whose middle weight grows with strength.
//! - [`Kernel::CatmullRom`]: centripetal Catmull-Rom through the interior
//!   control points. The first and last points only shape the end tangents.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::BrushError;

/// Lengths below this are treated as zero.
const LENGTH_EPS: f64 = 1e-12;

/// Curve kernel used to turn control points into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Kernel {
    Bezier { strength: f64 },
    CatmullRom,
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Bezier { strength: 0.0 }
    }
}

impl Kernel {
    /// Fewest control points the kernel can evaluate.
    pub fn min_points(&self) -> usize {
        match self {
            Kernel::Bezier { .. } => 3,
            Kernel::CatmullRom => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Bezier { .. } => "quadratic bezier",
            Kernel::CatmullRom => "catmull-rom",
        }
    }

    /// Number of evaluable segments for `n` control points.
    pub fn segments(&self, n: usize) -> usize {
        n.saturating_sub(self.min_points() - 1)
    }

    fn check(&self, n: usize) -> Result<(), BrushError> {
        if n < self.min_points() {
            return Err(BrushError::InsufficientControlPoints {
                kernel: self.name(),
                required: self.min_points(),
                got: n,
            });
        }
        Ok(())
    }
}

/// A position on a curve with its direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineSample {
    pub position: DVec2,
    pub tangent: DVec2,
    /// `atan2(tangent.y, tangent.x)` in radians.
    pub rotation: f64,
}

impl SplineSample {
    fn new(position: DVec2, tangent: DVec2) -> Self {
        Self {
            position,
            tangent,
            rotation: rotation(tangent),
        }
    }

    /// Unit normal (tangent rotated 90° counter-clockwise).
    pub fn normal(&self) -> DVec2 {
        normal(self.tangent)
    }
}

/// Quadratic Bézier: `p0(1-t)² + 2·p1·t(1-t) + p2·t²`.
pub fn bezier2(t: f64, p0: DVec2, p1: DVec2, p2: DVec2) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * t * u) + p2 * (t * t)
}

/// Derivative of [`bezier2`]: `2(1-t)(p1-p0) + 2t(p2-p1)`.
pub fn bezier_tangent(t: f64, p0: DVec2, p1: DVec2, p2: DVec2) -> DVec2 {
    (p1 - p0) * (2.0 * (1.0 - t)) + (p2 - p1) * (2.0 * t)
}

/// Walks `p0 → p1 → p2` at constant speed.
///
/// `t` is a fraction of the total length `l0 + l1`, not of the segment
/// count, so unevenly spaced control points do not change the speed.
pub fn polyline2(t: f64, p0: DVec2, p1: DVec2, p2: DVec2) -> DVec2 {
    let l0 = p0.distance(p1);
    let l1 = p1.distance(p2);
    let total = l0 + l1;
    if total < LENGTH_EPS {
        return p1;
    }
    let d = t * total;
    if d < l0 {
        p0.lerp(p1, d / l0)
    } else if l1 < LENGTH_EPS {
        p2
    } else {
        p1.lerp(p2, (d - l0) / l1)
    }
}

/// Direction of travel along [`polyline2`] at `t`.
fn polyline_tangent(t: f64, p0: DVec2, p1: DVec2, p2: DVec2) -> DVec2 {
    let l0 = p0.distance(p1);
    let l1 = p1.distance(p2);
    if t * (l0 + l1) < l0 || l1 < LENGTH_EPS {
        p1 - p0
    } else {
        p2 - p1
    }
}

/// Rational quadratic Bézier with middle weight `w = 1 + 2·strength`.
pub fn rational_bezier2(t: f64, p0: DVec2, p1: DVec2, p2: DVec2, strength: f64) -> DVec2 {
    let u = 1.0 - t;
    let w = 1.0 + 2.0 * strength;
    let b0 = u * u;
    let b1 = 2.0 * t * u * w;
    let b2 = t * t;
    (p0 * b0 + p1 * b1 + p2 * b2) / (b0 + b1 + b2)
}

/// Analytic derivative of [`rational_bezier2`] (quotient rule).
fn rational_tangent(t: f64, p0: DVec2, p1: DVec2, p2: DVec2, strength: f64) -> DVec2 {
    let u = 1.0 - t;
    let w = 1.0 + 2.0 * strength;
    let n = p0 * (u * u) + p1 * (2.0 * t * u * w) + p2 * (t * t);
    let d = u * u + 2.0 * t * u * w + t * t;
    let dn = p0 * (-2.0 * u) + p1 * (2.0 * w * (1.0 - 2.0 * t)) + p2 * (2.0 * t);
    let dd = -2.0 * u + 2.0 * w * (1.0 - 2.0 * t) + 2.0 * t;
    (dn * d - n * dd) / (d * d)
}

/// Evaluates one quadratic segment with the strength-selected kernel.
pub fn bezier_blend(t: f64, p0: DVec2, p1: DVec2, p2: DVec2, strength: f64) -> SplineSample {
    if strength <= 0.0 {
        SplineSample::new(bezier2(t, p0, p1, p2), bezier_tangent(t, p0, p1, p2))
    } else if strength >= 1.0 {
        SplineSample::new(polyline2(t, p0, p1, p2), polyline_tangent(t, p0, p1, p2))
    } else {
        SplineSample::new(
            rational_bezier2(t, p0, p1, p2, strength),
            rational_tangent(t, p0, p1, p2, strength),
        )
    }
}

/// Angle of a direction vector in radians.
pub fn rotation(tangent: DVec2) -> f64 {
    tangent.y.atan2(tangent.x)
}

/// Unit normal of a tangent, or zero for a zero tangent.
pub fn normal(tangent: DVec2) -> DVec2 {
    tangent.normalize_or_zero().perp()
}

/// Segment index and local parameter for a global `t` over chained segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProgress {
    pub index: usize,
    pub local_t: f64,
}

/// Maps `t` in [0, 1] onto the `n - 2` quadratic segments of `n` control
/// points.
///
/// `local_t` is in [0, 1) except at `t >= 1`, which maps to the end of the
/// last segment (`local_t = 1`). Negative `t` maps to the start.
pub fn multi_bezier_progress(t: f64, n: usize) -> Result<SegmentProgress, BrushError> {
    Kernel::Bezier { strength: 0.0 }.check(n)?;
    Ok(chain_progress(t, n - 2))
}

fn chain_progress(t: f64, subdivisions: usize) -> SegmentProgress {
    if t >= 1.0 {
        return SegmentProgress {
            index: subdivisions - 1,
            local_t: 1.0,
        };
    }
    let scaled = t.max(0.0) * subdivisions as f64;
    let index = (scaled.floor() as usize).min(subdivisions - 1);
    // Rounding in `t * subdivisions` can land exactly on the next boundary.
    let local_t = (scaled - index as f64).min(1.0 - f64::EPSILON);
    SegmentProgress { index, local_t }
}

/// Control triple for quadratic segment `k` of a chain.
///
/// Segment `k` is built on points `(k, k+1, k+2)`. Its ends are moved to
/// the midpoints of the shared edges (except at the chain's own ends) so
/// neighbouring segments meet at the same point with the same tangent.
/// Callers check `points.len() >= 3` and `k < points.len() - 2` first.
fn segment_controls(points: &[DVec2], k: usize) -> (DVec2, DVec2, DVec2) {
    let last = points.len() - 3;
    let start = if k == 0 {
        points[0]
    } else {
        (points[k] + points[k + 1]) * 0.5
    };
    let end = if k == last {
        points[k + 2]
    } else {
        (points[k + 1] + points[k + 2]) * 0.5
    };
    (start, points[k + 1], end)
}

/// Evaluates a chain of quadratic segments at global `t`.
pub fn multi_bezier(points: &[DVec2], t: f64, strength: f64) -> Result<SplineSample, BrushError> {
    let progress = multi_bezier_progress(t, points.len())?;
    let (p0, p1, p2) = segment_controls(points, progress.index);
    Ok(bezier_blend(progress.local_t, p0, p1, p2, strength))
}

/// Centripetal (α = 0.5) Catmull-Rom on the window `(p0, p1, p2, p3)`.
///
/// Returns `p1` at `t = 0` and `p2` at `t = 1`.
pub fn catmull_rom(t: f64, p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> SplineSample {
    let (a, b, c, d) = catmull_rom_coefficients(p0, p1, p2, p3);
    let position = ((a * t + b) * t + c) * t + d;
    let tangent = (a * (3.0 * t) + b * 2.0) * t + c;
    SplineSample::new(position, tangent)
}

/// Cubic coefficients `(a, b, c, d)` of `a t³ + b t² + c t + d`.
fn catmull_rom_coefficients(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> (DVec2, DVec2, DVec2, DVec2) {
    let t01 = p0.distance(p1).sqrt().max(LENGTH_EPS);
    let t12 = p1.distance(p2).sqrt().max(LENGTH_EPS);
    let t23 = p2.distance(p3).sqrt().max(LENGTH_EPS);

    let m1 = p2 - p1 + ((p1 - p0) / t01 - (p2 - p0) / (t01 + t12)) * t12;
    let m2 = p2 - p1 + ((p3 - p2) / t23 - (p3 - p1) / (t12 + t23)) * t12;

    let a = (p1 - p2) * 2.0 + m1 + m2;
    let b = (p1 - p2) * -3.0 - m1 - m1 - m2;
    (a, b, m1, p1)
}

/// Usable Catmull-Rom segments for `n` points: `n - 3`.
pub fn catmull_rom_segments(n: usize) -> usize {
    Kernel::CatmullRom.segments(n)
}

/// Evaluates a Catmull-Rom chain at global `t` across its `n - 3` segments.
pub fn catmull_rom_chain(points: &[DVec2], t: f64) -> Result<SplineSample, BrushError> {
    Kernel::CatmullRom.check(points.len())?;
    let progress = chain_progress(t, catmull_rom_segments(points.len()));
    let k = progress.index;
    Ok(catmull_rom(
        progress.local_t,
        points[k],
        points[k + 1],
        points[k + 2],
        points[k + 3],
    ))
}

/// Samples every segment of a curve `samples_per_segment` times, including
/// the final endpoint once.
pub fn sample_curve(
    points: &[DVec2],
    kernel: Kernel,
    samples_per_segment: usize,
) -> Result<Vec<SplineSample>, BrushError> {
    kernel.check(points.len())?;
    let per = samples_per_segment.max(1);
    let segments = kernel.segments(points.len());
    let mut out = Vec::with_capacity(segments * per + 1);
    for k in 0..segments {
        // Every segment contributes its start; the last also its end.
        let count = if k + 1 == segments { per + 1 } else { per };
        for s in 0..count {
            let t = s as f64 / per as f64;
            out.push(match kernel {
                Kernel::Bezier { strength } => {
                    let (p0, p1, p2) = segment_controls(points, k);
                    bezier_blend(t, p0, p1, p2, strength)
                }
                Kernel::CatmullRom => catmull_rom(
                    t,
                    points[k],
                    points[k + 1],
                    points[k + 2],
                    points[k + 3],
                ),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: DVec2, b: DVec2) -> bool {
        a.distance(b) < EPS
    }

    fn pts(raw: &[(f64, f64)]) -> Vec<DVec2> {
        raw.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
    }

    #[test]
    fn bezier2_midpoint() {
        let p = bezier2(0.5, DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0));
        assert!(close(p, DVec2::new(1.0, 1.0)), "got {p}");
    }

    #[test]
    fn tangent_of_symmetric_arch_is_horizontal_at_apex() {
        let tan = bezier_tangent(0.5, DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0));
        assert!(tan.y.abs() < EPS && tan.x > 0.0, "got {tan}");
        assert!(rotation(tan).abs() < EPS);
    }

    #[test]
    fn polyline_moves_at_constant_speed() {
        // l0 = 1, l1 = 3: a quarter of the way is exactly p1.
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(1.0, 3.0));
        assert!(close(polyline2(0.25, p0, p1, p2), p1));
        assert!(close(polyline2(0.125, p0, p1, p2), DVec2::new(0.5, 0.0)));
        assert!(close(polyline2(0.625, p0, p1, p2), DVec2::new(1.0, 1.5)));
    }

    #[test]
    fn polyline_is_not_a_naive_half_split() {
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(1.0, 3.0));
        let naive = p0.lerp(p1, 1.0);
        let actual = polyline2(0.5, p0, p1, p2);
        assert!(!close(actual, naive), "t=0.5 must be past p1, got {actual}");
    }

    #[test]
    fn polyline_handles_coincident_points() {
        let p = DVec2::new(2.0, 2.0);
        assert!(close(polyline2(0.3, p, p, p), p));
        let q = DVec2::new(3.0, 2.0);
        assert!(close(polyline2(1.0, p, q, q), q));
    }

    #[test]
    fn strength_zero_is_quadratic_bezier() {
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0));
        let s = bezier_blend(0.3, p0, p1, p2, 0.0);
        assert!(close(s.position, bezier2(0.3, p0, p1, p2)));
    }

    #[test]
    fn rational_with_zero_strength_matches_quadratic() {
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0));
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            assert!(close(rational_bezier2(t, p0, p1, p2, 0.0), bezier2(t, p0, p1, p2)));
        }
    }

    #[test]
    fn rational_strength_pulls_toward_middle_point() {
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0));
        let soft = bezier_blend(0.5, p0, p1, p2, 0.1).position;
        let hard = bezier_blend(0.5, p0, p1, p2, 0.9).position;
        assert!(hard.distance(p1) < soft.distance(p1), "soft={soft} hard={hard}");
    }

    #[test]
    fn rational_tangent_matches_finite_difference() {
        let (p0, p1, p2) = (DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(3.0, -1.0));
        let h = 1e-6;
        let t = 0.37;
        let fd = (rational_bezier2(t + h, p0, p1, p2, 0.4) - rational_bezier2(t - h, p0, p1, p2, 0.4))
            / (2.0 * h);
        let analytic = rational_tangent(t, p0, p1, p2, 0.4);
        assert!(fd.distance(analytic) < 1e-5, "fd={fd} analytic={analytic}");
    }

    #[test]
    fn progress_for_five_points() {
        let at = |t| multi_bezier_progress(t, 5).unwrap();
        assert_eq!(at(0.0), SegmentProgress { index: 0, local_t: 0.0 });
        assert_eq!(at(0.5).index, 1);
        let end = at(1.0 - 1e-12);
        assert_eq!(end.index, 2);
        assert!(end.local_t < 1.0);
        // Boundaries at 1/3 and 2/3 step the index by exactly one.
        let eps = 1e-9;
        assert_eq!(at(1.0 / 3.0 - eps).index + 1, at(1.0 / 3.0 + eps).index);
        assert_eq!(at(2.0 / 3.0 - eps).index + 1, at(2.0 / 3.0 + eps).index);
    }

    #[test]
    fn progress_at_one_is_end_of_last_segment() {
        let p = multi_bezier_progress(1.0, 5).unwrap();
        assert_eq!(p, SegmentProgress { index: 2, local_t: 1.0 });
    }

    #[test]
    fn progress_rejects_short_curves() {
        let err = multi_bezier_progress(0.5, 2).unwrap_err();
        assert!(matches!(
            err,
            BrushError::InsufficientControlPoints { required: 3, got: 2, .. }
        ));
    }

    #[test]
    fn short_chains_fail_before_indexing() {
        for raw in [&[][..], &[(0.0, 0.0)][..], &[(0.0, 0.0), (1.0, 1.0)][..]] {
            let p = pts(raw);
            for t in [0.0, 0.5, 1.0] {
                assert!(matches!(
                    multi_bezier(&p, t, 0.5),
                    Err(BrushError::InsufficientControlPoints { required: 3, .. })
                ));
            }
            assert!(sample_curve(&p, Kernel::Bezier { strength: 0.0 }, 4).is_err());
        }
    }

    #[test]
    fn multi_bezier_hits_chain_endpoints() {
        let p = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0)]);
        assert!(close(multi_bezier(&p, 0.0, 0.0).unwrap().position, p[0]));
        assert!(close(multi_bezier(&p, 1.0, 0.0).unwrap().position, p[4]));
    }

    #[test]
    fn multi_bezier_segments_meet() {
        let p = pts(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0), (4.0, 3.0), (5.0, 0.0)]);
        for k in 0..2 {
            let (_, _, end) = segment_controls(&p, k);
            let (start, _, _) = segment_controls(&p, k + 1);
            assert!(close(end, start), "segment {k} ends at {end}, next starts at {start}");
        }
    }

    #[test]
    fn catmull_rom_passes_through_inner_points() {
        let p = pts(&[(0.0, 0.0), (1.0, 2.0), (3.0, 2.5), (4.0, 0.0)]);
        assert!(close(catmull_rom(0.0, p[0], p[1], p[2], p[3]).position, p[1]));
        assert!(close(catmull_rom(1.0, p[0], p[1], p[2], p[3]).position, p[2]));
    }

    #[test]
    fn catmull_rom_chain_of_six_has_three_continuous_segments() {
        let p = pts(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, -1.0),
            (3.0, 2.0),
            (4.0, 0.0),
            (5.0, 1.0),
        ]);
        assert_eq!(catmull_rom_segments(p.len()), 3);
        for k in 0..2 {
            let end = catmull_rom(1.0, p[k], p[k + 1], p[k + 2], p[k + 3]).position;
            let start = catmull_rom(0.0, p[k + 1], p[k + 2], p[k + 3], p[k + 4]).position;
            assert!(close(end, start), "segment {k}: {end} vs {start}");
        }
        let samples = sample_curve(&p, Kernel::CatmullRom, 8).unwrap();
        assert_eq!(samples.len(), 3 * 8 + 1);
        assert!(close(samples[0].position, p[1]));
        assert!(close(samples[samples.len() - 1].position, p[4]));
    }

    #[test]
    fn catmull_rom_chain_rejects_three_points() {
        let p = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        assert!(matches!(
            catmull_rom_chain(&p, 0.5),
            Err(BrushError::InsufficientControlPoints { required: 4, got: 3, .. })
        ));
    }

    #[test]
    fn catmull_rom_survives_duplicate_points() {
        let p = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (1.0, 1.0)]);
        let s = catmull_rom_chain(&p, 0.5).unwrap();
        assert!(s.position.is_finite(), "got {}", s.position);
    }

    #[test]
    fn sample_curve_counts_for_bezier() {
        let p = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0)]);
        let samples = sample_curve(&p, Kernel::Bezier { strength: 0.5 }, 4).unwrap();
        assert_eq!(samples.len(), 2 * 4 + 1);
        assert!(close(samples[0].position, p[0]));
        assert!(close(samples[8].position, p[3]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_point() -> impl Strategy<Value = DVec2> {
            (-1e3_f64..1e3, -1e3_f64..1e3).prop_map(|(x, y)| DVec2::new(x, y))
        }

        proptest! {
            #[test]
            fn bezier2_endpoints(p0 in any_point(), p1 in any_point(), p2 in any_point()) {
                prop_assert!(bezier2(0.0, p0, p1, p2).distance(p0) < 1e-9);
                prop_assert!(bezier2(1.0, p0, p1, p2).distance(p2) < 1e-9);
            }

            #[test]
            fn every_strength_keeps_endpoints(
                p0 in any_point(),
                p1 in any_point(),
                p2 in any_point(),
                strength in 0.0_f64..=1.0,
            ) {
                let a = bezier_blend(0.0, p0, p1, p2, strength).position;
                let b = bezier_blend(1.0, p0, p1, p2, strength).position;
                prop_assert!(a.distance(p0) < 1e-6, "start {a} vs {p0}");
                prop_assert!(b.distance(p2) < 1e-6, "end {b} vs {p2}");
            }

            #[test]
            fn progress_local_t_in_unit_interval(t in 0.0_f64..1.0, n in 3_usize..40) {
                let p = multi_bezier_progress(t, n).unwrap();
                prop_assert!(p.index < n - 2);
                prop_assert!((0.0..1.0).contains(&p.local_t), "local_t = {}", p.local_t);
            }
        }
    }
}
