//! Reproducible sketch configuration and per-frame uniforms.
//!
//! A [`SketchConfig`] names a scene, its parameters, and the PRNG seed, so
//! two identical configs fed to the same build produce identical geometry.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BrushError;
use crate::params::json_type_name;

const DEFAULT_FRAME_DELTA: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchConfig {
    pub scene: String,
    pub seed: u64,
    #[serde(default = "empty_object")]
    pub params: Value,
    /// Frames to run when driven headless. `0` means build only.
    #[serde(default)]
    pub frames: usize,
    /// Seconds between frames.
    #[serde(default = "default_frame_delta")]
    pub frame_delta: f64,
    /// Canvas width over height.
    #[serde(default = "default_aspect")]
    pub aspect: f64,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_frame_delta() -> f64 {
    DEFAULT_FRAME_DELTA
}

fn default_aspect() -> f64 {
    1.0
}

impl SketchConfig {
    /// Creates a config with empty params and no frames.
    pub fn new(scene: &str, seed: u64) -> Self {
        Self {
            scene: scene.to_string(),
            seed,
            params: empty_object(),
            frames: 0,
            frame_delta: DEFAULT_FRAME_DELTA,
            aspect: default_aspect(),
        }
    }

    /// Checks that params is an object and the timing values are usable.
    pub fn validate(&self) -> Result<(), BrushError> {
        if !self.params.is_object() {
            return Err(BrushError::ParamTypeMismatch {
                name: "params".into(),
                expected: "object".into(),
                got: json_type_name(&self.params).into(),
            });
        }
        if !(self.frame_delta.is_finite() && self.frame_delta >= 0.0) {
            return Err(BrushError::InvalidConfig(format!(
                "frame_delta must be finite and non-negative, got {}",
                self.frame_delta
            )));
        }
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return Err(BrushError::InvalidConfig(format!(
                "aspect must be finite and positive, got {}",
                self.aspect
            )));
        }
        Ok(())
    }

    /// Uniforms for the first frame.
    pub fn initial_uniforms(&self) -> FrameUniforms {
        FrameUniforms {
            aspect: self.aspect,
            ..FrameUniforms::default()
        }
    }
}

/// Values that change every frame and are visible to builders and updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameUniforms {
    /// Seconds since the sketch started.
    pub time: f64,
    pub delta_time: f64,
    /// Pointer position in canvas space.
    pub pointer: DVec2,
    pub aspect: f64,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            delta_time: 0.0,
            pointer: DVec2::splat(0.5),
            aspect: 1.0,
        }
    }
}

impl FrameUniforms {
    /// Moves time forward by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
        self.delta_time = dt;
    }
}
