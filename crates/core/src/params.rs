//! Never-failing readers for scene parameters stored in a JSON object.
//!
//! Each reader takes the params value, a key, and a default. A missing key
//! or a value of the wrong type yields the default, so a scene always gets
//! a usable configuration from whatever the host passed in.

use glam::DVec2;
use serde_json::Value;

use crate::color::Color;

/// Reads a number (integers included) from `params[name]`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Reads a non-negative integer from `params[name]`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

/// Reads a `[x, y]` array. Anything other than two numbers yields `default`.
pub fn param_vec2(params: &Value, name: &str, default: DVec2) -> DVec2 {
    match params.get(name).and_then(Value::as_array).map(Vec::as_slice) {
        Some([x, y]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => DVec2::new(x, y),
            _ => default,
        },
        _ => default,
    }
}

/// Reads a `"#rrggbb"` color string.
pub fn param_color(params: &Value, name: &str, default: Color) -> Color {
    params
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| Color::from_hex(s).ok())
        .unwrap_or(default)
}

/// JSON type name used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
