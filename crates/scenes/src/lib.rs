#![deny(unsafe_code)]
//! Scene registry: maps scene names to the built-in builder scenes.
//!
//! Hosts construct scenes by name through [`SceneKind::from_name`], or go
//! straight from a [`SketchConfig`] to a running [`Sketch`] with
//! [`sketch_from_config`].

pub mod handwriting;
pub mod orbit_cloud;
pub mod petals;
pub mod stroke_grid;

use brush_engine_core::builder::Builder;
use brush_engine_core::config::SketchConfig;
use brush_engine_core::error::BrushError;
use brush_engine_core::scene::{FrameContext, Recalculate, Scene, Sketch};
use serde_json::Value;

/// All available scene names.
const SCENE_NAMES: &[&str] = &["stroke-grid", "orbit-cloud", "handwriting", "petals"];

/// Enumeration of the built-in scenes.
///
/// Wraps each scene and delegates the [`Scene`] trait methods.
pub enum SceneKind {
    StrokeGrid(stroke_grid::StrokeGrid),
    OrbitCloud(orbit_cloud::OrbitCloud),
    Handwriting(handwriting::Handwriting),
    Petals(petals::Petals),
}

impl SceneKind {
    /// Constructs a scene by name.
    ///
    /// Returns `BrushError::UnknownScene` if the name is not recognized.
    pub fn from_name(name: &str, seed: u64, params: &Value) -> Result<Self, BrushError> {
        match name {
            "stroke-grid" => Ok(SceneKind::StrokeGrid(stroke_grid::StrokeGrid::from_json(
                params,
            ))),
            "orbit-cloud" => Ok(SceneKind::OrbitCloud(orbit_cloud::OrbitCloud::from_json(
                params,
            ))),
            "handwriting" => Ok(SceneKind::Handwriting(
                handwriting::Handwriting::from_json(params),
            )),
            "petals" => Ok(SceneKind::Petals(petals::Petals::from_json(params, seed))),
            _ => Err(BrushError::UnknownScene(name.to_string())),
        }
    }

    /// Returns a slice of all recognized scene names.
    pub fn list_scenes() -> &'static [&'static str] {
        SCENE_NAMES
    }
}

impl Scene for SceneKind {
    fn name(&self) -> &str {
        match self {
            SceneKind::StrokeGrid(s) => s.name(),
            SceneKind::OrbitCloud(s) => s.name(),
            SceneKind::Handwriting(s) => s.name(),
            SceneKind::Petals(s) => s.name(),
        }
    }

    fn build(&mut self, builder: &mut Builder) -> Result<(), BrushError> {
        match self {
            SceneKind::StrokeGrid(s) => s.build(builder),
            SceneKind::OrbitCloud(s) => s.build(builder),
            SceneKind::Handwriting(s) => s.build(builder),
            SceneKind::Petals(s) => s.build(builder),
        }
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> Result<(), BrushError> {
        match self {
            SceneKind::StrokeGrid(s) => s.update(frame),
            SceneKind::OrbitCloud(s) => s.update(frame),
            SceneKind::Handwriting(s) => s.update(frame),
            SceneKind::Petals(s) => s.update(frame),
        }
    }

    fn recalculate(&self) -> Recalculate {
        match self {
            SceneKind::StrokeGrid(s) => s.recalculate(),
            SceneKind::OrbitCloud(s) => s.recalculate(),
            SceneKind::Handwriting(s) => s.recalculate(),
            SceneKind::Petals(s) => s.recalculate(),
        }
    }

    fn params(&self) -> Value {
        match self {
            SceneKind::StrokeGrid(s) => s.params(),
            SceneKind::OrbitCloud(s) => s.params(),
            SceneKind::Handwriting(s) => s.params(),
            SceneKind::Petals(s) => s.params(),
        }
    }
}

/// Validates `config`, constructs its scene, and runs the first build.
pub fn sketch_from_config(config: &SketchConfig) -> Result<Sketch, BrushError> {
    config.validate()?;
    let scene = SceneKind::from_name(&config.scene, config.seed, &config.params)?;
    Sketch::new(Box::new(scene), config.seed, &config.initial_uniforms())
}

/// Builds `config` and ticks it for `config.frames` frames.
///
/// Returns the sketch and the number of frames that went stale.
pub fn run_headless(config: &SketchConfig) -> Result<(Sketch, usize), BrushError> {
    let mut sketch = sketch_from_config(config)?;
    let mut uniforms = config.initial_uniforms();
    let mut stale = 0;
    for _ in 0..config.frames {
        uniforms.advance(config.frame_delta);
        if !sketch.tick(&uniforms).is_fresh() {
            stale += 1;
        }
    }
    if stale > 0 {
        log::warn!(
            "scene '{}': {stale} of {} frame(s) went stale",
            config.scene,
            config.frames
        );
    }
    Ok((sketch, stale))
}
