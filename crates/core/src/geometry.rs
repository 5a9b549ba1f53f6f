//! Point / curve / group data model.
//!
//! A [`Group`] owns an ordered list of [`Curve`]s and an ordered list of
//! child groups, so scenes form a tree. A [`Curve`] owns its [`Point`]s in
//! insertion order, which is also the spline control polygon.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::particles::{ParticleParams, ParticleSet};
use crate::spline::Kernel;
use crate::style::{ResolvedStyle, Style};
use crate::transform::Transform;

/// Default spline samples per curve segment.
pub const DEFAULT_SAMPLES: usize = 16;

/// A control point with its own style overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub pos: DVec2,
    #[serde(default)]
    pub style: Style,
}

impl Point {
    pub fn new(pos: DVec2) -> Self {
        Self {
            pos,
            style: Style::default(),
        }
    }

    pub fn with_style(pos: DVec2, style: Style) -> Self {
        Self { pos, style }
    }
}

/// Ordered control points plus a curve-level style layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub points: Vec<Point>,
    #[serde(default)]
    pub style: Style,
}

impl Curve {
    pub fn new(style: Style) -> Self {
        Self {
            points: Vec::new(),
            style,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Control point positions in order.
    pub fn positions(&self) -> Vec<DVec2> {
        self.points.iter().map(|p| p.pos).collect()
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty curve.
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let first = self.points.first()?.pos;
        Some(
            self.points
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(p.pos), hi.max(p.pos))),
        )
    }
}

/// How a group's finished geometry is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    Line,
    Dash,
    Mesh,
    Points,
    Particles,
}

impl DrawMode {
    /// Modes that evaluate curves through a spline kernel.
    pub fn uses_spline(&self) -> bool {
        matches!(self, DrawMode::Line | DrawMode::Dash | DrawMode::Mesh)
    }
}

/// Per-group configuration fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub mode: DrawMode,
    pub kernel: Kernel,
    /// Whether per-frame updates (particle steps, scene callbacks) touch
    /// this group.
    pub update: bool,
    /// Spline samples per segment.
    pub samples: usize,
    pub style: Style,
    /// Required for [`DrawMode::Particles`].
    pub particles: Option<ParticleParams>,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            mode: DrawMode::Line,
            kernel: Kernel::default(),
            update: false,
            samples: DEFAULT_SAMPLES,
            style: Style::default(),
            particles: None,
        }
    }
}

impl GroupSettings {
    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Switches to particle mode with the given parameters.
    pub fn particles(mut self, params: ParticleParams) -> Self {
        self.mode = DrawMode::Particles;
        self.particles = Some(params);
        self
    }
}

/// A node in the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub settings: GroupSettings,
    /// Builder transform at the moment the group was opened.
    pub transform: Transform,
    pub curves: Vec<Curve>,
    pub children: Vec<Group>,
    pub particles: Option<ParticleSet>,
}

impl Group {
    pub fn new(settings: GroupSettings, transform: Transform) -> Self {
        Self {
            settings,
            transform,
            curves: Vec::new(),
            children: Vec::new(),
            particles: None,
        }
    }

    /// This group followed by all descendants, depth first.
    pub fn iter(&self) -> GroupIter<'_> {
        GroupIter { stack: vec![self] }
    }

    /// Visits this group and all descendants depth first, mutably.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Group)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }

    /// Total points across this group's own curves.
    pub fn point_count(&self) -> usize {
        self.curves.iter().map(Curve::len).sum()
    }

    /// Resolves the style of one point, most specific layer first.
    pub fn resolve_style(&self, global: &Style, curve: &Curve, point: &Point) -> ResolvedStyle {
        Style::resolve(&[&point.style, &curve.style, &self.settings.style, global])
    }
}

/// Depth-first pre-order iterator over a group tree.
pub struct GroupIter<'a> {
    stack: Vec<&'a Group>,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = &'a Group;

    fn next(&mut self) -> Option<Self::Item> {
        let group = self.stack.pop()?;
        self.stack.extend(group.children.iter().rev());
        Some(group)
    }
}
