//! Asemic handwriting: text laid out as hashed stroke curves.
//!
//! Every visible character becomes one stroke of 3 to 6 control points
//! scattered inside its glyph cell. The points are hashed from the seed,
//! the character, and its position in the string, so the same text always
//! produces the same strokes and repeated letters still differ slightly.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::param_f64;
use crate::prng::{hash_combine, hash01_pair};

const MIN_STROKE_POINTS: u64 = 3;
const MAX_STROKE_POINTS: u64 = 6;

/// Horizontal fraction of the cell left blank on each side.
const CELL_MARGIN: f64 = 0.1;

const DEFAULT_ADVANCE: f64 = 0.6;
const DEFAULT_HEIGHT: f64 = 1.0;
const DEFAULT_LINE_HEIGHT: f64 = 1.4;
const DEFAULT_SLANT: f64 = 0.0;
const DEFAULT_JITTER: f64 = 0.15;

/// Glyph cell geometry in local (pre-transform) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayout {
    /// Cell width; the cursor moves this far per character.
    pub advance: f64,
    /// Cell height.
    pub height: f64,
    /// Vertical distance between baselines.
    pub line_height: f64,
    /// Horizontal shear per unit of height.
    pub slant: f64,
    /// Vertical scatter of stroke points as a fraction of height.
    pub jitter: f64,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            advance: DEFAULT_ADVANCE,
            height: DEFAULT_HEIGHT,
            line_height: DEFAULT_LINE_HEIGHT,
            slant: DEFAULT_SLANT,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl TextLayout {
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            advance: param_f64(params, "advance", d.advance),
            height: param_f64(params, "height", d.height),
            line_height: param_f64(params, "line_height", d.line_height),
            slant: param_f64(params, "slant", d.slant),
            jitter: param_f64(params, "jitter", d.jitter),
        }
    }
}

/// Lays out `text` and returns one stroke per visible character.
///
/// Line `n` occupies `y` in `[n * line_height, n * line_height + height]`.
/// `\n` starts a new line; any other whitespace only advances the cursor.
pub fn glyph_strokes(text: &str, layout: &TextLayout, seed: u64) -> Vec<Vec<DVec2>> {
    let mut strokes = Vec::new();
    let mut cursor = DVec2::ZERO;
    for (index, ch) in text.chars().enumerate() {
        if ch == '\n' {
            cursor = DVec2::new(0.0, cursor.y + layout.line_height);
            continue;
        }
        if !ch.is_whitespace() {
            let key = hash_combine(hash_combine(seed, u64::from(ch)), index as u64);
            strokes.push(glyph_stroke(cursor, key, layout));
        }
        cursor.x += layout.advance;
    }
    strokes
}

fn glyph_stroke(origin: DVec2, key: u64, layout: &TextLayout) -> Vec<DVec2> {
    let span = MAX_STROKE_POINTS - MIN_STROKE_POINTS + 1;
    let n = MIN_STROKE_POINTS + hash_combine(key, u64::MAX) % span;
    (0..n)
        .map(|k| {
            let u = hash01_pair(key, 2 * k);
            let v = hash01_pair(key, 2 * k + 1);
            let along = k as f64 / (n - 1) as f64;
            let y = layout.height * (along + (v - 0.5) * layout.jitter).clamp(0.0, 1.0);
            let x = layout.advance * (CELL_MARGIN + (1.0 - 2.0 * CELL_MARGIN) * u)
                + layout.slant * (layout.height - y);
            origin + DVec2::new(x, y)
        })
        .collect()
}
