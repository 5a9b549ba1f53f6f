//! The builder that scene scripts draw with.
//!
//! A [`Builder`] threads a transform stack through a script, turns control
//! points into curves inside groups, and hands out deterministic randomness.
//! Points are transformed as they are created. [`Builder::finish`] validates
//! the result and returns the finished group tree.
//!
//! ```text
//! transform(push, translate) -> new_curve(..) -> transform(reset: pop)
//! ```

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::FrameUniforms;
use crate::error::BrushError;
use crate::geometry::{Curve, DrawMode, Group, GroupSettings, Point};
use crate::particles::ParticleSet;
use crate::prng::{hash_combine, hash01_pair};
use crate::procedural::Simplex2;
use crate::style::Style;
use crate::text::{glyph_strokes, TextLayout};
use crate::transform::{Transform, TransformContext, TransformOpts};

/// A control point as written in a script, before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointSpec {
    pub pos: DVec2,
    pub style: Style,
}

impl PointSpec {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            style: Style::default(),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl From<DVec2> for PointSpec {
    fn from(pos: DVec2) -> Self {
        Self {
            pos,
            style: Style::default(),
        }
    }
}

impl From<[f64; 2]> for PointSpec {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<(f64, f64)> for PointSpec {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Loop state passed to [`Builder::repeat`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repeat {
    pub i: usize,
    /// `i / (count - 1)`, or `0` when `count` is 1.
    pub p: f64,
    pub count: usize,
}

/// Cell state passed to [`Builder::repeat_grid`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// `[column, row]`.
    pub i: [usize; 2],
    /// Progress per axis, `0` to `1` inclusive.
    pub p: DVec2,
    /// Progress of the cell center per axis, never touching `0` or `1`.
    pub p_center: DVec2,
    /// `[columns, rows]`.
    pub count: [usize; 2],
    /// Row-major linear index.
    pub index: usize,
}

/// Regular polygon options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeOpts {
    /// Repeat the first vertex at the end.
    pub closed: bool,
    pub radius: f64,
}

impl Default for ShapeOpts {
    fn default() -> Self {
        Self {
            closed: true,
            radius: 0.5,
        }
    }
}

/// Options for [`Builder::noise`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseOpts {
    /// Return [-1, 1] instead of [0, 1].
    pub signed: bool,
    /// Offset the coordinates by the time uniform.
    pub advance: bool,
    pub frequency: f64,
}

impl Default for NoiseOpts {
    fn default() -> Self {
        Self {
            signed: false,
            advance: true,
            frequency: 1.0,
        }
    }
}

/// Script-facing geometry builder. One per build run.
pub struct Builder {
    seed: u64,
    uniforms: FrameUniforms,
    transforms: TransformContext,
    global_style: Style,
    roots: Vec<Group>,
    /// Open groups, innermost last.
    open: Vec<Group>,
    /// Open groups below this index belong to an enclosing `with_group`.
    floor: usize,
    hash_calls: u64,
    simplex: Simplex2,
}

impl Builder {
    pub fn new(seed: u64, uniforms: FrameUniforms) -> Self {
        Self {
            seed,
            uniforms,
            transforms: TransformContext::new(),
            global_style: Style::default(),
            roots: Vec::new(),
            open: Vec::new(),
            floor: 0,
            hash_calls: 0,
            simplex: Simplex2::new(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn current_transform(&self) -> &Transform {
        self.transforms.current()
    }

    // ---- transform ----------------------------------------------------------

    /// Applies one transform call (reset, push, merge) and returns the new
    /// current transform.
    pub fn transform(&mut self, opts: TransformOpts) -> Result<Transform, BrushError> {
        self.transforms.transform(&opts)
    }

    /// Sets the global style layer for groups opened from now on.
    pub fn style(&mut self, style: Style) -> &mut Self {
        self.global_style = style;
        self
    }

    // ---- groups -------------------------------------------------------------

    /// Closes the current group at this nesting level and opens a sibling.
    pub fn new_group(&mut self, settings: GroupSettings) -> &mut Self {
        self.close_to(self.floor);
        let group = self.make_group(settings);
        self.open.push(group);
        self
    }

    /// Opens a child of the current group, runs `f` inside it, and closes it
    /// (and anything `f` opened) again.
    pub fn with_group<F>(&mut self, settings: GroupSettings, f: F) -> Result<(), BrushError>
    where
        F: FnOnce(&mut Builder) -> Result<(), BrushError>,
    {
        let depth = self.open.len();
        let saved_floor = self.floor;
        let group = self.make_group(settings);
        self.open.push(group);
        self.floor = self.open.len();
        let result = f(self);
        self.close_to(depth);
        self.floor = saved_floor;
        result
    }

    /// Layers the new group's style over the enclosing open group's, then
    /// over the global style.
    fn make_group(&self, mut settings: GroupSettings) -> Group {
        let inherited = match self.open.last() {
            Some(parent) => parent.settings.style.over(&self.global_style),
            None => self.global_style,
        };
        settings.style = settings.style.over(&inherited);
        Group::new(settings, *self.transforms.current())
    }

    fn close_to(&mut self, depth: usize) {
        while self.open.len() > depth {
            let Some(group) = self.open.pop() else { break };
            match self.open.last_mut() {
                Some(parent) => parent.children.push(group),
                None => self.roots.push(group),
            }
        }
    }

    /// The innermost open group, opening a default one if needed.
    fn current_group(&mut self) -> &mut Group {
        if self.open.is_empty() {
            self.new_group(GroupSettings::default());
        }
        let last = self.open.len() - 1;
        &mut self.open[last]
    }

    // ---- points & curves ----------------------------------------------------

    fn make_point(&self, spec: PointSpec) -> Result<Point, BrushError> {
        if !spec.pos.is_finite() {
            return Err(BrushError::NonFiniteCoordinate {
                x: spec.pos.x,
                y: spec.pos.y,
            });
        }
        let t = self.transforms.current();
        let pos = t.apply(spec.pos);
        if !pos.is_finite() {
            return Err(BrushError::NonFiniteCoordinate { x: pos.x, y: pos.y });
        }
        let mut style = spec.style;
        if let Some(r) = style.rotation {
            style.rotation = Some(r + t.rotate);
        }
        Ok(Point::with_style(pos, style))
    }

    fn make_points<I, P>(&self, points: I) -> Result<Vec<Point>, BrushError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PointSpec>,
    {
        points
            .into_iter()
            .map(|p| self.make_point(p.into()))
            .collect()
    }

    /// Starts a new curve in the current group.
    pub fn new_curve<I, P>(&mut self, points: I) -> Result<(), BrushError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PointSpec>,
    {
        self.new_curve_styled(Style::default(), points)
    }

    /// Starts a new curve with a curve-level style layer.
    pub fn new_curve_styled<I, P>(&mut self, style: Style, points: I) -> Result<(), BrushError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PointSpec>,
    {
        let points = self.make_points(points)?;
        self.current_group().curves.push(Curve { points, style });
        Ok(())
    }

    /// Appends points to the current curve, starting one if the group has
    /// none.
    pub fn new_points<I, P>(&mut self, points: I) -> Result<(), BrushError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PointSpec>,
    {
        let points = self.make_points(points)?;
        let group = self.current_group();
        if group.curves.is_empty() {
            group.curves.push(Curve::default());
        }
        if let Some(curve) = group.curves.last_mut() {
            curve.points.extend(points);
        }
        Ok(())
    }

    /// Adds a regular polygon centered on the local origin as a new curve.
    pub fn new_shape(&mut self, sides: usize, opts: ShapeOpts) -> Result<(), BrushError> {
        if sides < 3 {
            return Err(BrushError::InsufficientControlPoints {
                kernel: "polygon",
                required: 3,
                got: sides,
            });
        }
        let vertex = |k: usize| DVec2::from_angle(TAU * k as f64 / sides as f64) * opts.radius;
        let count = if opts.closed { sides + 1 } else { sides };
        self.new_curve((0..count).map(|k| vertex(k % sides)))
    }

    /// Lays out `text` as handwriting strokes, one curve per character.
    pub fn text(&mut self, text: &str, layout: &TextLayout) -> Result<(), BrushError> {
        for stroke in glyph_strokes(text, layout, self.seed) {
            self.new_curve(stroke)?;
        }
        Ok(())
    }

    // ---- iteration ----------------------------------------------------------

    /// Calls `f` `n` times with the loop index and progress.
    pub fn repeat<F>(&mut self, n: i64, mut f: F) -> Result<(), BrushError>
    where
        F: FnMut(&mut Builder, Repeat) -> Result<(), BrushError>,
    {
        let count = checked_count(n)?;
        for i in 0..count {
            f(self, Repeat { i, p: progress(i, count), count })?;
        }
        Ok(())
    }

    /// Calls `f` once per cell of a `[columns, rows]` grid, row by row.
    pub fn repeat_grid<F>(&mut self, counts: [i64; 2], mut f: F) -> Result<(), BrushError>
    where
        F: FnMut(&mut Builder, GridCell) -> Result<(), BrushError>,
    {
        let cols = checked_count(counts[0])?;
        let rows = checked_count(counts[1])?;
        for row in 0..rows {
            for col in 0..cols {
                let cell = GridCell {
                    i: [col, row],
                    p: DVec2::new(progress(col, cols), progress(row, rows)),
                    p_center: DVec2::new(
                        (col as f64 + 0.5) / cols as f64,
                        (row as f64 + 0.5) / rows as f64,
                    ),
                    count: [cols, rows],
                    index: row * cols + col,
                };
                f(self, cell)?;
            }
        }
        Ok(())
    }

    // ---- randomness ---------------------------------------------------------

    /// Hash of `seed` in [0, 1).
    ///
    /// Each call is keyed by its position in the build, so two calls with the
    /// same argument differ while a rebuild with the same sketch seed repeats
    /// the exact sequence.
    pub fn hash(&mut self, seed: f64) -> f64 {
        let key = hash_combine(self.seed, self.hash_calls);
        self.hash_calls += 1;
        // Fold -0.0 into 0.0.
        hash01_pair(key, (seed + 0.0).to_bits())
    }

    /// Simplex noise at `coords`.
    pub fn noise(&self, coords: DVec2, opts: NoiseOpts) -> f64 {
        let mut p = coords * opts.frequency;
        if opts.advance {
            p += DVec2::splat(self.uniforms.time);
        }
        let n = self.simplex.sample(p);
        if opts.signed {
            n
        } else {
            n * 0.5 + 0.5
        }
    }

    // ---- finish -------------------------------------------------------------

    /// Closes every group and validates the tree.
    ///
    /// Fails on an unbalanced transform stack, on curves too short for their
    /// group's spline kernel, and on empty particle groups. Nothing from a
    /// failed build is returned.
    pub fn finish(mut self) -> Result<Vec<Group>, BrushError> {
        self.close_to(0);
        self.transforms.ensure_balanced()?;
        let mut next_key = 0;
        for root in &mut self.roots {
            finalize(root, self.seed, &mut next_key)?;
        }
        log::debug!(
            "build finished: {} root group(s), {} point(s)",
            self.roots.len(),
            self.roots
                .iter()
                .flat_map(Group::iter)
                .map(Group::point_count)
                .sum::<usize>()
        );
        Ok(self.roots)
    }
}

fn finalize(group: &mut Group, seed: u64, next_key: &mut u64) -> Result<(), BrushError> {
    let settings = &group.settings;
    if settings.mode.uses_spline() {
        let kernel = settings.kernel;
        if let Some(short) = group.curves.iter().find(|c| c.len() < kernel.min_points()) {
            return Err(BrushError::InsufficientControlPoints {
                kernel: kernel.name(),
                required: kernel.min_points(),
                got: short.len(),
            });
        }
    }
    if settings.mode == DrawMode::Particles {
        let params = settings.particles.clone().unwrap_or_default();
        group.particles = Some(ParticleSet::new(
            group.curves.first(),
            &group.transform,
            params,
            hash_combine(seed, *next_key),
        )?);
    }
    *next_key += 1;
    for child in &mut group.children {
        finalize(child, seed, next_key)?;
    }
    Ok(())
}

fn checked_count(n: i64) -> Result<usize, BrushError> {
    usize::try_from(n).map_err(|_| BrushError::InvalidRepeatCount(n))
}

fn progress(i: usize, count: usize) -> f64 {
    if count > 1 {
        i as f64 / (count - 1) as f64
    } else {
        0.0
    }
}
