//! The transform stack threaded through builder scripts.
//!
//! A [`TransformContext`] holds the current composed [`Transform`] and a
//! stack of snapshots. Points are transformed when they are created, so
//! changing the transform later never moves existing geometry.

use glam::{DMat2, DVec2};
use serde::{Deserialize, Serialize};

use crate::error::BrushError;

/// Composed affine transform.
///
/// Applied to a point as `translate + linear * p`. Each `then` multiplies
/// its own rotation and scale onto the right of `linear`, so nested
/// transforms compose outer to inner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translate: DVec2,
    pub linear: DMat2,
    /// Accumulated rotation in radians, counter-clockwise. Only styles read
    /// it; positions go through `linear`.
    pub rotate: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate: DVec2::ZERO,
        linear: DMat2::IDENTITY,
        rotate: 0.0,
    };

    /// Scales, then rotates, then translates.
    pub fn new(translate: DVec2, scale: DVec2, rotate: f64) -> Self {
        Self {
            translate,
            linear: DMat2::from_angle(rotate) * DMat2::from_diagonal(scale),
            rotate,
        }
    }

    /// Maps a local point into canvas space.
    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.translate + self.linear * p
    }

    /// Composes `opts` inside this transform.
    ///
    /// The translation is expressed in the current frame, before this call's
    /// own rotation and scale. Within one call the scale applies first.
    pub fn then(&self, opts: &TransformOpts) -> Transform {
        let mut next = *self;
        if let Some(t) = opts.translate {
            next.translate = self.apply(t);
        }
        if let Some(r) = opts.rotate {
            next.linear *= DMat2::from_angle(r);
            next.rotate = self.rotate + r;
        }
        if let Some(s) = opts.scale {
            next.linear *= DMat2::from_diagonal(s);
        }
        next
    }
}

/// How a `transform` call restores a previous state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reset {
    /// Back to the identity. The stack is untouched.
    Identity,
    /// Back to the most recent snapshot, which stays on the stack.
    Last,
    /// Back to the most recent snapshot, which is removed.
    Pop,
    /// Back to the newest snapshot pushed with this mark; it and every
    /// snapshot above it are removed.
    Marker(String),
}

/// One `transform` call: optional reset, optional push, then the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOpts {
    pub translate: Option<DVec2>,
    pub scale: Option<DVec2>,
    pub rotate: Option<f64>,
    pub push: bool,
    /// Names the pushed snapshot. Implies `push`.
    pub mark: Option<String>,
    pub reset: Option<Reset>,
}

impl TransformOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, x: f64, y: f64) -> Self {
        self.translate = Some(DVec2::new(x, y));
        self
    }

    pub fn scale(mut self, x: f64, y: f64) -> Self {
        self.scale = Some(DVec2::new(x, y));
        self
    }

    pub fn scale_uniform(self, s: f64) -> Self {
        self.scale(s, s)
    }

    pub fn rotate(mut self, radians: f64) -> Self {
        self.rotate = Some(radians);
        self
    }

    pub fn push(mut self) -> Self {
        self.push = true;
        self
    }

    pub fn mark(mut self, name: impl Into<String>) -> Self {
        self.mark = Some(name.into());
        self
    }

    pub fn reset(mut self, reset: Reset) -> Self {
        self.reset = Some(reset);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    transform: Transform,
    mark: Option<String>,
}

/// Current transform plus the snapshot stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    current: Transform,
    stack: Vec<Snapshot>,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Transform {
        &self.current
    }

    /// Number of snapshots on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Applies one `transform` call: reset, then push, then merge.
    pub fn transform(&mut self, opts: &TransformOpts) -> Result<Transform, BrushError> {
        if let Some(reset) = &opts.reset {
            self.reset(reset)?;
        }
        if opts.push || opts.mark.is_some() {
            self.stack.push(Snapshot {
                transform: self.current,
                mark: opts.mark.clone(),
            });
        }
        self.current = self.current.then(opts);
        Ok(self.current)
    }

    /// Snapshots the current transform.
    pub fn push(&mut self) {
        self.stack.push(Snapshot {
            transform: self.current,
            mark: None,
        });
    }

    /// Restores and removes the most recent snapshot.
    pub fn pop(&mut self) -> Result<Transform, BrushError> {
        self.reset(&Reset::Pop)?;
        Ok(self.current)
    }

    pub fn reset(&mut self, reset: &Reset) -> Result<(), BrushError> {
        match reset {
            Reset::Identity => self.current = Transform::IDENTITY,
            Reset::Last => {
                let top = self.stack.last().ok_or_else(|| {
                    BrushError::TransformStack("reset to last snapshot on an empty stack".into())
                })?;
                self.current = top.transform;
            }
            Reset::Pop => {
                let top = self.stack.pop().ok_or_else(|| {
                    BrushError::TransformStack("pop on an empty stack".into())
                })?;
                self.current = top.transform;
            }
            Reset::Marker(name) => {
                let idx = self
                    .stack
                    .iter()
                    .rposition(|s| s.mark.as_deref() == Some(name.as_str()))
                    .ok_or_else(|| {
                        BrushError::TransformStack(format!("marker '{name}' was never pushed"))
                    })?;
                self.current = self.stack[idx].transform;
                self.stack.truncate(idx);
            }
        }
        Ok(())
    }

    /// Fails if any snapshot is still on the stack.
    pub fn ensure_balanced(&self) -> Result<(), BrushError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(BrushError::UnbalancedTransformStack {
                depth: self.stack.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: DVec2, b: DVec2) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn identity_leaves_points_alone() {
        let p = DVec2::new(3.0, -2.0);
        assert_eq!(Transform::IDENTITY.apply(p), p);
    }

    #[test]
    fn apply_scales_then_rotates_then_translates() {
        let t = Transform::new(DVec2::new(10.0, 0.0), DVec2::splat(2.0), FRAC_PI_2);
        assert!(close(t.apply(DVec2::new(1.0, 0.0)), DVec2::new(10.0, 2.0)));
    }

    #[test]
    fn non_uniform_scale_then_rotate_composes_outer_to_inner() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().scale(2.0, 1.0)).unwrap();
        ctx.transform(&TransformOpts::new().rotate(FRAC_PI_2)).unwrap();
        let p = ctx.current().apply(DVec2::new(1.0, 0.0));
        assert!(close(p, DVec2::new(0.0, 1.0)), "got {p}");

        // The other order stretches the rotated point instead.
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().rotate(FRAC_PI_2)).unwrap();
        ctx.transform(&TransformOpts::new().scale(2.0, 1.0)).unwrap();
        let p = ctx.current().apply(DVec2::new(1.0, 0.0));
        assert!(close(p, DVec2::new(0.0, 2.0)), "got {p}");
    }

    #[test]
    fn one_call_matches_the_constructor() {
        let opts = TransformOpts::new()
            .translate(1.0, -1.0)
            .scale(3.0, 0.5)
            .rotate(0.7);
        let t = Transform::IDENTITY.then(&opts);
        let expected = Transform::new(DVec2::new(1.0, -1.0), DVec2::new(3.0, 0.5), 0.7);
        let p = DVec2::new(0.2, 0.9);
        assert!(close(t.apply(p), expected.apply(p)));
        assert_eq!(t.rotate, 0.7);
    }

    #[test]
    fn nested_translate_is_in_parent_frame() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().scale_uniform(2.0).rotate(FRAC_PI_2))
            .unwrap();
        ctx.transform(&TransformOpts::new().translate(1.0, 0.0)).unwrap();
        assert!(close(ctx.current().translate, DVec2::new(0.0, 2.0)));
    }

    #[test]
    fn push_then_reset_last_restores_exactly() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().translate(0.3, 0.4).rotate(0.2))
            .unwrap();
        let before = *ctx.current();
        ctx.transform(
            &TransformOpts::new()
                .push()
                .translate(5.0, 5.0)
                .scale(3.0, 0.5)
                .rotate(1.0),
        )
        .unwrap();
        assert_ne!(*ctx.current(), before);
        ctx.reset(&Reset::Last).unwrap();
        let after = *ctx.current();
        assert_eq!(after.translate, before.translate);
        assert_eq!(after.linear, before.linear);
        assert_eq!(after.rotate, before.rotate);
        assert_eq!(ctx.depth(), 1, "last keeps the snapshot");
    }

    #[test]
    fn pop_restores_and_removes() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().push().translate(1.0, 1.0))
            .unwrap();
        ctx.pop().unwrap();
        assert_eq!(*ctx.current(), Transform::IDENTITY);
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.ensure_balanced().is_ok());
    }

    #[test]
    fn reset_happens_before_push_and_merge() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().push().translate(1.0, 0.0))
            .unwrap();
        // Pop back to identity, then translate from there.
        ctx.transform(&TransformOpts::new().reset(Reset::Pop).translate(0.0, 2.0))
            .unwrap();
        assert!(close(ctx.current().translate, DVec2::new(0.0, 2.0)));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn identity_reset_keeps_stack() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().push().scale_uniform(4.0))
            .unwrap();
        ctx.reset(&Reset::Identity).unwrap();
        assert_eq!(*ctx.current(), Transform::IDENTITY);
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn marker_reset_unwinds_everything_above_it() {
        let mut ctx = TransformContext::new();
        ctx.transform(&TransformOpts::new().translate(1.0, 0.0)).unwrap();
        let at_mark = *ctx.current();
        ctx.transform(&TransformOpts::new().mark("base").rotate(0.5))
            .unwrap();
        ctx.transform(&TransformOpts::new().push().translate(2.0, 2.0))
            .unwrap();
        ctx.transform(&TransformOpts::new().push().scale_uniform(0.5))
            .unwrap();
        assert_eq!(ctx.depth(), 3);
        ctx.reset(&Reset::Marker("base".into())).unwrap();
        assert_eq!(*ctx.current(), at_mark);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn unknown_marker_is_an_error() {
        let mut ctx = TransformContext::new();
        ctx.push();
        let err = ctx.reset(&Reset::Marker("nope".into())).unwrap_err();
        assert!(matches!(err, BrushError::TransformStack(ref m) if m.contains("nope")));
        assert_eq!(ctx.depth(), 1, "failed reset must not touch the stack");
    }

    #[test]
    fn last_and_pop_on_empty_stack_fail() {
        let mut ctx = TransformContext::new();
        assert!(ctx.reset(&Reset::Last).is_err());
        assert!(ctx.pop().is_err());
    }

    #[test]
    fn unbalanced_stack_reports_depth() {
        let mut ctx = TransformContext::new();
        ctx.push();
        ctx.push();
        assert_eq!(
            ctx.ensure_balanced(),
            Err(BrushError::UnbalancedTransformStack { depth: 2 })
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn push_pop_is_exact_for_any_transform(
                tx in -1e3_f64..1e3,
                ty in -1e3_f64..1e3,
                s in 0.01_f64..100.0,
                r in -10.0_f64..10.0,
            ) {
                let mut ctx = TransformContext::new();
                ctx.transform(&TransformOpts::new().translate(tx, ty)).unwrap();
                let before = *ctx.current();
                ctx.transform(&TransformOpts::new().push().scale_uniform(s).rotate(r)).unwrap();
                ctx.pop().unwrap();
                prop_assert_eq!(*ctx.current(), before);
            }
        }
    }
}
