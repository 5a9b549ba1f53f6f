#![deny(unsafe_code)]
//! Core of the brush-engine procedural drawing system.
//!
//! Scenes are scripts that draw through a [`Builder`]: they push and pop
//! transforms, lay down control points as [`Curve`]s inside [`Group`]s, and
//! draw randomness from seeded hashes and simplex noise. A [`Sketch`] runs a
//! [`Scene`] frame by frame, stepping particle brushes and writing flat
//! [`FrameBuffers`] for a renderer.
//!
//! Curves are evaluated with closed-form splines (chained quadratic Bézier
//! with a strength blend, or centripetal Catmull-Rom) from [`spline`].

pub mod buffers;
pub mod builder;
pub mod color;
pub mod config;
pub mod displace;
pub mod error;
pub mod geometry;
pub mod math;
pub mod params;
pub mod particles;
pub mod prng;
pub mod procedural;
pub mod scene;
pub mod spline;
pub mod style;
pub mod text;
pub mod transform;

pub use buffers::{FrameBuffers, GroupBuffer};
pub use builder::{Builder, GridCell, NoiseOpts, PointSpec, Repeat, ShapeOpts};
pub use color::Color;
pub use config::{FrameUniforms, SketchConfig};
pub use displace::Displacement;
pub use error::BrushError;
pub use geometry::{Curve, DrawMode, Group, GroupSettings, Point};
pub use math::{scale, RangeMap, Remappable};
pub use particles::{ParticleParams, ParticleSet};
pub use prng::Xorshift64;
pub use scene::{FrameContext, FrameStatus, Recalculate, Scene, Sketch};
pub use spline::{Kernel, SplineSample};
pub use style::{ResolvedStyle, Style};
pub use text::TextLayout;
pub use transform::{Reset, Transform, TransformContext, TransformOpts};
