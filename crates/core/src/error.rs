//! Error types for the brush-engine core.
//!
//! Every variant except [`BrushError::UpdateFailed`] is a build-time error:
//! it surfaces from the builder before any frame is scheduled, and nothing
//! from the failed build is kept.

use thiserror::Error;

/// Errors produced by builder, spline, and scene operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrushError {
    /// A reset targeted a snapshot that does not exist (empty stack or an
    /// unknown marker).
    #[error("transform stack error: {0}")]
    TransformStack(String),

    /// The transform stack was not empty when the builder script finished.
    #[error("unbalanced transform stack: {depth} push(es) never popped")]
    UnbalancedTransformStack { depth: usize },

    /// A curve is shorter than the spline kernel evaluating it requires.
    #[error("{kernel} needs at least {required} control points, got {got}")]
    InsufficientControlPoints {
        kernel: &'static str,
        required: usize,
        got: usize,
    },

    /// `repeat` or `repeat_grid` was called with a negative count.
    #[error("invalid repeat count: {0}")]
    InvalidRepeatCount(i64),

    /// A point was created with a NaN or infinite coordinate.
    #[error("non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A particle group was configured with zero particles.
    #[error("invalid particle count: a particle group needs at least one particle")]
    InvalidParticleCount,

    /// No scene is registered under the requested name.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A per-frame update callback reported a failure.
    #[error("frame update failed: {0}")]
    UpdateFailed(String),

    /// A sketch configuration failed validation.
    #[error("invalid sketch config: {0}")]
    InvalidConfig(String),

    /// A parameter existed but had the wrong JSON type.
    #[error("parameter type mismatch for '{name}': expected {expected}, got {got}")]
    ParamTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_stack_includes_message() {
        let err = BrushError::TransformStack("marker 'base' was never pushed".into());
        let msg = format!("{err}");
        assert!(msg.contains("base"), "missing marker name in: {msg}");
    }

    #[test]
    fn unbalanced_stack_includes_depth() {
        let err = BrushError::UnbalancedTransformStack { depth: 3 };
        let msg = format!("{err}");
        assert!(msg.contains('3'), "missing depth in: {msg}");
    }

    #[test]
    fn insufficient_control_points_includes_all_fields() {
        let err = BrushError::InsufficientControlPoints {
            kernel: "catmull-rom",
            required: 4,
            got: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("catmull-rom"), "missing kernel in: {msg}");
        assert!(msg.contains('4'), "missing required count in: {msg}");
        assert!(msg.contains('2'), "missing actual count in: {msg}");
    }

    #[test]
    fn invalid_repeat_count_includes_value() {
        let msg = BrushError::InvalidRepeatCount(-7).to_string();
        assert!(msg.contains("-7"), "missing count in: {msg}");
    }

    #[test]
    fn non_finite_coordinate_includes_values() {
        let msg = BrushError::NonFiniteCoordinate {
            x: f64::NAN,
            y: 2.0,
        }
        .to_string();
        assert!(msg.contains("NaN"), "missing x in: {msg}");
        assert!(msg.contains('2'), "missing y in: {msg}");
    }

    #[test]
    fn param_type_mismatch_includes_all_fields() {
        let err = BrushError::ParamTypeMismatch {
            name: "count".into(),
            expected: "integer".into(),
            got: "string".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("count"), "missing param name in: {msg}");
        assert!(msg.contains("integer"), "missing expected type in: {msg}");
        assert!(msg.contains("string"), "missing got type in: {msg}");
    }

    #[test]
    fn brush_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BrushError>();
    }

    #[test]
    fn brush_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<BrushError>();
    }
}
