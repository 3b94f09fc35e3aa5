//! Bit-depth rescaling.
//!
//! Depths 8..=16 are integer sample domains; depth 32 is normalized float
//! in `[0, 1]`. Both converters are `(value, target, source) -> value` and
//! are identity when `target == source`.
//!
//! ```text
//!   by shift:    8 -> 10   x * 2^(10-8)          128 -> 512
//!   by stretch:  8 -> 10   x * 1023 / 255        255 -> 1023
//!   either:      8 -> 32   x / 255
//!               32 -> 10   x * 1023
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Depth value that denotes the normalized float domain.
pub const FLOAT_DEPTH: u32 = 32;

/// Largest representable integer sample at `depth` (255, 1023, ...).
#[inline]
pub fn max_value(depth: u32) -> f64 {
    ((1u64 << depth) - 1) as f64
}

/// Handles the float-domain endpoints shared by both converters.
#[inline]
fn float_endpoint(value: f64, target: u32, source: u32) -> Option<f64> {
    if target == FLOAT_DEPTH {
        Some(value / max_value(source))
    } else if source == FLOAT_DEPTH {
        Some(value * max_value(target))
    } else {
        None
    }
}

/// Power-of-two rescale (`value << (target - source)` in spirit).
pub fn upscale_by_shift(value: f64, target: u32, source: u32) -> f64 {
    if target == source {
        return value;
    }
    if let Some(scaled) = float_endpoint(value, target, source) {
        return scaled;
    }
    if target > source {
        value * (1u64 << (target - source)) as f64
    } else {
        value / (1u64 << (source - target)) as f64
    }
}

/// Full-range rescale by the ratio of maximum sample values.
pub fn upscale_by_stretch(value: f64, target: u32, source: u32) -> f64 {
    if target == source {
        return value;
    }
    if let Some(scaled) = float_endpoint(value, target, source) {
        return scaled;
    }
    value * max_value(target) / max_value(source)
}

// ---------------------------------------------------------------------------
// Filter parameter scaling
// ---------------------------------------------------------------------------

/// Bit depth a numeric filter parameter was written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamScale {
    /// Use the value as-is.
    None,
    #[default]
    I8,
    I10,
    I12,
    I14,
    I16,
    F32,
}

impl ParamScale {
    /// Source depth, or `None` for unscaled parameters.
    pub const fn depth(self) -> Option<u32> {
        match self {
            Self::None => None,
            Self::I8 => Some(8),
            Self::I10 => Some(10),
            Self::I12 => Some(12),
            Self::I14 => Some(14),
            Self::I16 => Some(16),
            Self::F32 => Some(FLOAT_DEPTH),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::I8 => "i8",
            Self::I10 => "i10",
            Self::I12 => "i12",
            Self::I14 => "i14",
            Self::I16 => "i16",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for ParamScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParamScale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "i8" => Ok(Self::I8),
            "i10" => Ok(Self::I10),
            "i12" => Ok(Self::I12),
            "i14" => Ok(Self::I14),
            "i16" => Ok(Self::I16),
            "f32" => Ok(Self::F32),
            other => Err(ParseError::InvalidParamScale(other.to_string())),
        }
    }
}

impl TryFrom<String> for ParamScale {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamScale> for String {
    fn from(value: ParamScale) -> Self {
        value.label().to_string()
    }
}

/// A parameter converted to the clip's bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledParam {
    /// Exact scaled value.
    pub value: f32,
    /// Truncated and range-limited value for integer clips; 0 for float clips.
    pub int_value: i32,
}

/// Rescale a filter parameter from `mode`'s depth to `clip_depth`.
///
/// `fullscale` selects stretch scaling; otherwise shift scaling is used,
/// except that the source maximum always maps to the clip maximum.
pub fn scale_param(
    input: f32,
    mode: ParamScale,
    clip_depth: u32,
    fullscale: bool,
    allow_negative: bool,
) -> ScaledParam {
    let value = match mode.depth() {
        None => input,
        Some(depth) if depth == clip_depth => input,
        Some(depth) if fullscale => {
            let normalized = if depth == FLOAT_DEPTH {
                input
            } else {
                input / max_value(depth) as f32
            };
            if clip_depth == FLOAT_DEPTH {
                normalized
            } else {
                normalized * max_value(clip_depth) as f32
            }
        }
        Some(depth) => shift_param(input, depth, clip_depth),
    };

    ScaledParam {
        value,
        int_value: clamp_int(value, clip_depth, allow_negative),
    }
}

fn shift_param(input: f32, depth: u32, clip_depth: u32) -> f32 {
    if clip_depth == FLOAT_DEPTH {
        return input / max_value(depth) as f32;
    }
    if depth == FLOAT_DEPTH {
        return input * max_value(clip_depth) as f32;
    }
    let magnitude = input.abs();
    let scaled = if (max_value(depth) as f32 - magnitude).abs() < 0.000001 {
        max_value(clip_depth) as f32
    } else if depth > clip_depth {
        magnitude / (1u32 << (depth - clip_depth)) as f32
    } else {
        magnitude * (1u32 << (clip_depth - depth)) as f32
    };
    if input < 0.0 { -scaled } else { scaled }
}

fn clamp_int(value: f32, clip_depth: u32, allow_negative: bool) -> i32 {
    if clip_depth == FLOAT_DEPTH {
        return 0;
    }
    let max = max_value(clip_depth) as i32;
    if value >= 0.0 || !allow_negative {
        (value as i32).clamp(0, max)
    } else {
        -((-value) as i32).clamp(0, max)
    }
}
