//! Scene lifecycle: build once, then tick every frame.
//!
//! A [`Scene`] draws its geometry through a [`Builder`] and may adjust it
//! every frame. A [`Sketch`] owns one scene together with its finished group
//! tree and the last buffers that rendered cleanly. Each [`Sketch::tick`]
//! works on a copy of the tree and only commits it if the whole frame
//! succeeds, so a failing frame leaves the previous picture on screen.

use serde_json::Value;

use crate::buffers::FrameBuffers;
use crate::builder::Builder;
use crate::config::FrameUniforms;
use crate::error::BrushError;
use crate::geometry::Group;

/// When a sketch reruns its scene's build.
pub enum Recalculate {
    /// Build once at creation.
    Never,
    EveryFrame,
    /// Every so many milliseconds of sketch time.
    Interval(f64),
    /// The callback receives the sketch time in milliseconds at each
    /// rebuild and returns the delay until the next one.
    Dynamic(Box<dyn FnMut(f64) -> f64>),
}

impl std::fmt::Debug for Recalculate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recalculate::Never => f.write_str("Never"),
            Recalculate::EveryFrame => f.write_str("EveryFrame"),
            Recalculate::Interval(ms) => f.debug_tuple("Interval").field(ms).finish(),
            Recalculate::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl Recalculate {
    /// Sketch time (ms) of the next rebuild after one at `now_ms`.
    fn next_after(&mut self, now_ms: f64) -> f64 {
        match self {
            Recalculate::Never => f64::INFINITY,
            Recalculate::EveryFrame => now_ms,
            Recalculate::Interval(ms) => now_ms + ms.max(0.0),
            Recalculate::Dynamic(delay) => now_ms + delay(now_ms).max(0.0),
        }
    }
}

/// What a scene's per-frame update may touch.
pub struct FrameContext<'a> {
    pub uniforms: &'a FrameUniforms,
    pub seed: u64,
    /// Working copy of the group tree. Committed only if the frame succeeds.
    pub groups: &'a mut [Group],
}

/// A procedural drawing.
///
/// This trait is **object-safe**: sketches hold a `Box<dyn Scene>`.
pub trait Scene {
    /// Registry name, e.g. `"petals"`.
    fn name(&self) -> &str;

    /// Draws the scene. Called at creation and on every recalculation.
    fn build(&mut self, builder: &mut Builder) -> Result<(), BrushError>;

    /// Adjusts the finished geometry once per frame.
    fn update(&mut self, _frame: &mut FrameContext<'_>) -> Result<(), BrushError> {
        Ok(())
    }

    fn recalculate(&self) -> Recalculate {
        Recalculate::Never
    }

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;
}

/// Outcome of one [`Sketch::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    /// The buffers were refreshed.
    Fresh,
    /// The frame failed; the buffers are the previous frame's.
    Stale(BrushError),
}

impl FrameStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, FrameStatus::Fresh)
    }
}

/// A scene plus its live geometry and buffers.
pub struct Sketch {
    scene: Box<dyn Scene>,
    seed: u64,
    recalculate: Recalculate,
    next_build_ms: f64,
    groups: Vec<Group>,
    buffers: FrameBuffers,
    frames: u64,
}

impl Sketch {
    /// Builds the scene once. Any build error is returned and no sketch is
    /// created.
    pub fn new(mut scene: Box<dyn Scene>, seed: u64, uniforms: &FrameUniforms) -> Result<Self, BrushError> {
        let groups = run_build(scene.as_mut(), seed, uniforms)?;
        let buffers = FrameBuffers::from_groups(&groups)?;
        let mut recalculate = scene.recalculate();
        let next_build_ms = recalculate.next_after(uniforms.time * 1000.0);
        log::info!(
            "sketch '{}' built: {} group(s), {} vertices",
            scene.name(),
            groups.len(),
            buffers.vertex_count()
        );
        Ok(Self {
            scene,
            seed,
            recalculate,
            next_build_ms,
            groups,
            buffers,
            frames: 0,
        })
    }

    /// Advances one frame.
    ///
    /// Rebuilds if a recalculation is due, runs the scene update, steps the
    /// particles of every group marked for updates, and refreshes the
    /// buffers. Any error aborts only this frame.
    pub fn tick(&mut self, uniforms: &FrameUniforms) -> FrameStatus {
        match self.try_tick(uniforms) {
            Ok(()) => {
                self.frames += 1;
                log::trace!(
                    "sketch '{}' frame {} at t={:.3}s: {} vertices",
                    self.scene.name(),
                    self.frames,
                    uniforms.time,
                    self.buffers.vertex_count()
                );
                FrameStatus::Fresh
            }
            Err(err) => {
                log::warn!(
                    "sketch '{}' frame {} failed, keeping previous buffers: {err}",
                    self.scene.name(),
                    self.frames
                );
                FrameStatus::Stale(err)
            }
        }
    }

    fn try_tick(&mut self, uniforms: &FrameUniforms) -> Result<(), BrushError> {
        let now_ms = uniforms.time * 1000.0;
        let rebuild = now_ms >= self.next_build_ms;
        let mut groups = if rebuild {
            run_build(self.scene.as_mut(), self.seed, uniforms)?
        } else {
            self.groups.clone()
        };

        self.scene.update(&mut FrameContext {
            uniforms,
            seed: self.seed,
            groups: &mut groups,
        })?;

        for root in &mut groups {
            root.for_each_mut(&mut |g| {
                if g.settings.update {
                    if let Some(set) = &mut g.particles {
                        set.update(uniforms);
                    }
                }
            });
        }

        let buffers = FrameBuffers::from_groups(&groups)?;
        if rebuild {
            self.next_build_ms = self.recalculate.next_after(now_ms);
        }
        self.groups = groups;
        self.buffers = buffers;
        Ok(())
    }

    /// Drops all geometry and builds from scratch. Particle counts can only
    /// change this way.
    pub fn rebuild(&mut self, uniforms: &FrameUniforms) -> Result<(), BrushError> {
        self.clear();
        let groups = run_build(self.scene.as_mut(), self.seed, uniforms)?;
        self.buffers = FrameBuffers::from_groups(&groups)?;
        self.groups = groups;
        self.next_build_ms = self.recalculate.next_after(uniforms.time * 1000.0);
        Ok(())
    }

    /// Drops all geometry and buffers.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.buffers = FrameBuffers::default();
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Frames that completed successfully.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn run_build(scene: &mut dyn Scene, seed: u64, uniforms: &FrameUniforms) -> Result<Vec<Group>, BrushError> {
    let mut builder = Builder::new(seed, *uniforms);
    scene.build(&mut builder)?;
    builder.finish()
}
