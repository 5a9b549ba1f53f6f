//! Flat vertex buffers for a renderer.
//!
//! [`FrameBuffers::from_groups`] walks a group tree depth first and writes one
//! [`GroupBuffer`] per group. Attributes are `f32` and laid out per vertex,
//! ready to upload:
//!
//! | attribute   | floats per vertex |
//! |-------------|-------------------|
//! | `positions` | 2                 |
//! | `thickness` | 1                 |
//! | `alpha`     | 1                 |
//! | `rotation`  | 1                 |
//! | `color`     | 3                 |
//! | `arc_length`| 1 (dash only)     |

use glam::DVec2;

use crate::error::BrushError;
use crate::geometry::{Curve, DrawMode, Group};
use crate::math::{lerp, RangeMap};
use crate::spline::{rotation, sample_curve};
use crate::style::{ResolvedStyle, Style};

/// Particle thickness at rest, as a fraction of the group thickness.
const PARTICLE_REST_THICKNESS: f64 = 0.5;

/// Vertex data for one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBuffer {
    pub mode: DrawMode,
    pub positions: Vec<f32>,
    pub thickness: Vec<f32>,
    pub alpha: Vec<f32>,
    pub rotation: Vec<f32>,
    pub color: Vec<f32>,
    /// Distance along the curve from its first vertex. Empty unless the
    /// mode is [`DrawMode::Dash`].
    pub arc_length: Vec<f32>,
    /// First vertex of each curve. Mesh strips count two vertices per sample.
    pub curve_offsets: Vec<u32>,
}

impl GroupBuffer {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    fn push_vertex(&mut self, pos: DVec2, style: &ResolvedStyle, rotation: f64) {
        self.positions.extend([pos.x as f32, pos.y as f32]);
        self.thickness.push(style.thickness as f32);
        self.alpha.push(style.alpha as f32);
        self.rotation.push(rotation as f32);
        self.color.extend(style.color.to_f32());
    }

    fn begin_curve(&mut self) {
        self.curve_offsets.push(self.vertex_count() as u32);
    }

    /// Writes one group's own curves (children are separate buffers).
    pub fn from_group(group: &Group, global: &Style) -> Result<GroupBuffer, BrushError> {
        let mut buf = GroupBuffer {
            mode: group.settings.mode,
            ..GroupBuffer::default()
        };
        match group.settings.mode {
            DrawMode::Line | DrawMode::Dash | DrawMode::Mesh => {
                for curve in &group.curves {
                    buf.write_spline(group, global, curve)?;
                }
            }
            DrawMode::Points => {
                for curve in &group.curves {
                    buf.begin_curve();
                    for point in &curve.points {
                        let style = group.resolve_style(global, curve, point);
                        buf.push_vertex(point.pos, &style, style.rotation);
                    }
                }
            }
            DrawMode::Particles => buf.write_particles(group, global),
        }
        Ok(buf)
    }

    fn write_spline(&mut self, group: &Group, global: &Style, curve: &Curve) -> Result<(), BrushError> {
        let settings = &group.settings;
        let samples = sample_curve(&curve.positions(), settings.kernel, settings.samples)?;
        let styles: Vec<ResolvedStyle> = curve
            .points
            .iter()
            .map(|p| group.resolve_style(global, curve, p))
            .collect();
        let last = samples.len().saturating_sub(1).max(1) as f64;

        self.begin_curve();
        let mut travelled = 0.0;
        let mut prev: Option<DVec2> = None;
        for (k, sample) in samples.iter().enumerate() {
            let style = style_along(&styles, k as f64 / last);
            let angle = sample.rotation + style.rotation;
            match settings.mode {
                DrawMode::Mesh => {
                    let offset = sample.normal() * (style.thickness * 0.5);
                    self.push_vertex(sample.position + offset, &style, angle);
                    self.push_vertex(sample.position - offset, &style, angle);
                }
                DrawMode::Dash => {
                    if let Some(p) = prev {
                        travelled += p.distance(sample.position);
                    }
                    self.arc_length.push(travelled as f32);
                    self.push_vertex(sample.position, &style, angle);
                }
                _ => self.push_vertex(sample.position, &style, angle),
            }
            prev = Some(sample.position);
        }
        Ok(())
    }

    fn write_particles(&mut self, group: &Group, global: &Style) {
        let Some(set) = &group.particles else { return };
        let base = match group.curves.first() {
            Some(curve) => Style::resolve(&[&curve.style, &group.settings.style, global]),
            None => Style::resolve(&[&group.settings.style, global]),
        };
        let speed_to_thickness = RangeMap::new(
            0.0,
            set.params().max_speed,
            PARTICLE_REST_THICKNESS,
            1.0,
        );
        self.begin_curve();
        for particle in set.particles() {
            let style = ResolvedStyle {
                thickness: base.thickness * speed_to_thickness.apply(particle.vel.length()),
                ..base
            };
            let heading = if particle.vel == DVec2::ZERO {
                0.0
            } else {
                rotation(particle.vel)
            };
            self.push_vertex(particle.pos, &style, heading + base.rotation);
        }
    }
}

/// Interpolates control-point styles at progress `u` along the curve.
fn style_along(styles: &[ResolvedStyle], u: f64) -> ResolvedStyle {
    let Some(first) = styles.first() else {
        return ResolvedStyle::default();
    };
    if styles.len() == 1 {
        return *first;
    }
    let f = u.clamp(0.0, 1.0) * (styles.len() - 1) as f64;
    let i = (f.floor() as usize).min(styles.len() - 2);
    let t = f - i as f64;
    let (a, b) = (&styles[i], &styles[i + 1]);
    ResolvedStyle {
        thickness: lerp(a.thickness, b.thickness, t),
        alpha: lerp(a.alpha, b.alpha, t),
        color: a.color.lerp(b.color, t),
        rotation: lerp(a.rotation, b.rotation, t),
    }
}

/// Buffers for a whole group tree, in depth-first order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffers {
    pub groups: Vec<GroupBuffer>,
}

impl FrameBuffers {
    pub fn from_groups(groups: &[Group]) -> Result<FrameBuffers, BrushError> {
        let global = Style::default();
        let groups = groups
            .iter()
            .flat_map(Group::iter)
            .map(|g| GroupBuffer::from_group(g, &global))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FrameBuffers { groups })
    }

    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(GroupBuffer::vertex_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::{GroupSettings, Point};
    use crate::particles::{ParticleParams, ParticleSet};
    use crate::spline::Kernel;
    use crate::transform::Transform;

    fn group(mode: DrawMode, samples: usize, raw: &[(f64, f64)]) -> Group {
        let mut g = Group::new(
            GroupSettings::default()
                .mode(mode)
                .samples(samples)
                .kernel(Kernel::Bezier { strength: 1.0 }),
            Transform::IDENTITY,
        );
        let mut c = Curve::default();
        c.points = raw.iter().map(|&(x, y)| Point::new(DVec2::new(x, y))).collect();
        g.curves.push(c);
        g
    }

    const L: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];

    #[test]
    fn line_writes_every_sample() {
        let buf = GroupBuffer::from_group(&group(DrawMode::Line, 4, L), &Style::default()).unwrap();
        assert_eq!(buf.vertex_count(), 5);
        assert_eq!(buf.thickness.len(), 5);
        assert_eq!(buf.color.len(), 15);
        assert_eq!(buf.curve_offsets, vec![0]);
        assert!(buf.arc_length.is_empty());
        assert_eq!(&buf.positions[..2], &[0.0, 0.0]);
        assert_eq!(&buf.positions[8..], &[1.0, 1.0]);
    }

    #[test]
    fn dash_arc_length_is_cumulative() {
        // Strength 1 walks the polyline at constant speed, total length 2.
        let buf = GroupBuffer::from_group(&group(DrawMode::Dash, 4, L), &Style::default()).unwrap();
        assert_eq!(buf.arc_length.len(), buf.vertex_count());
        assert_eq!(buf.arc_length[0], 0.0);
        assert!(buf.arc_length.windows(2).all(|w| w[0] <= w[1]));
        assert!((buf.arc_length[4] - 2.0).abs() < 1e-5, "{:?}", buf.arc_length);
    }

    #[test]
    fn mesh_is_a_ribbon_of_thickness() {
        let mut g = group(DrawMode::Mesh, 2, &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        g.settings.style = Style::new().thickness(0.4);
        let buf = GroupBuffer::from_group(&g, &Style::default()).unwrap();
        assert_eq!(buf.vertex_count(), 2 * 3);
        for pair in buf.positions.chunks(4) {
            let (top, bottom) = (pair[1], pair[3]);
            assert!(((top - bottom).abs() - 0.4).abs() < 1e-6, "{pair:?}");
            assert_eq!(pair[0], pair[2]);
        }
    }

    #[test]
    fn points_write_control_points_with_styles() {
        let mut g = group(DrawMode::Points, 16, &[(0.0, 0.0), (2.0, 3.0)]);
        g.curves[0].points[1].style = Style::new().color(Color::BLACK).rotation(0.5);
        let buf = GroupBuffer::from_group(&g, &Style::default()).unwrap();
        assert_eq!(buf.positions, vec![0.0, 0.0, 2.0, 3.0]);
        assert_eq!(&buf.color[3..], &[0.0, 0.0, 0.0]);
        assert_eq!(buf.rotation, vec![0.0, 0.5]);
    }

    #[test]
    fn styles_interpolate_between_control_points() {
        let mut g = group(DrawMode::Line, 4, L);
        g.curves[0].points[0].style = Style::new().alpha(0.0);
        g.curves[0].points[2].style = Style::new().alpha(1.0);
        g.curves[0].points[1].style = Style::new().alpha(0.5);
        let buf = GroupBuffer::from_group(&g, &Style::default()).unwrap();
        assert_eq!(buf.alpha, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn short_curve_fails() {
        let g = group(DrawMode::Line, 4, &[(0.0, 0.0), (1.0, 0.0)]);
        assert!(matches!(
            GroupBuffer::from_group(&g, &Style::default()),
            Err(BrushError::InsufficientControlPoints { .. })
        ));
    }

    #[test]
    fn particles_write_one_vertex_each() {
        let mut g = group(DrawMode::Particles, 1, L);
        let params = ParticleParams {
            count: 7,
            ..ParticleParams::default()
        };
        g.particles = Some(
            ParticleSet::new(g.curves.first(), &Transform::IDENTITY, params, 4).unwrap(),
        );
        let buf = GroupBuffer::from_group(&g, &Style::default()).unwrap();
        assert_eq!(buf.vertex_count(), 7);
        // Particles at rest draw at rest thickness.
        assert!(buf.thickness.iter().all(|&t| t == 0.5));
    }

    #[test]
    fn frame_buffers_flatten_depth_first() {
        let mut root = group(DrawMode::Line, 2, L);
        root.children.push(group(DrawMode::Points, 2, L));
        let other = group(DrawMode::Dash, 2, L);
        let frame = FrameBuffers::from_groups(&[root, other]).unwrap();
        let modes: Vec<DrawMode> = frame.groups.iter().map(|g| g.mode).collect();
        assert_eq!(modes, vec![DrawMode::Line, DrawMode::Points, DrawMode::Dash]);
        assert_eq!(frame.vertex_count(), 3 + 3 + 3);
    }
}
