//! Filter configuration.
//!
//! [`LutConfig`] is the serde-facing description of a LUT filter: the
//! expressions per plane, what to do with each plane, and how spatial
//! coordinates are normalized. Field names follow the filter's public
//! parameter names, so a config reads the same in JSON as in a script:
//!
//! ```json
//! { "expr": "x 16 - 255 * 219 /", "U": "copy", "V": "copy" }
//! ```
//!
//! [`RealtimeConfig`] controls the worker threads of realtime evaluation and
//! reads its defaults from the environment.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use pixexpr_core::ParamScale;
use serde::{Deserialize, Serialize};

use crate::error::LutError;

/// Number of planes a filter addresses (Y, U, V, A).
pub const PLANE_COUNT: usize = 4;

/// Environment variable overriding the realtime worker count.
pub const THREADS_ENV: &str = "PIXEXPR_THREADS";

/// Smallest band of rows handed to one worker.
const DEFAULT_MIN_BAND_ROWS: usize = 16;

// ---------------------------------------------------------------------------
// Plane operators
// ---------------------------------------------------------------------------

/// Clip labels of the `copy` operators, indexed by clip.
const COPY_LABELS: [&str; 4] = ["copy", "copy second", "copy third", "copy fourth"];

/// What a filter does with one plane.
///
/// Accepts either a label or the numeric convention of the filter family:
/// `3` process, `2` copy the first clip, `4`..`6` copy the second to fourth
/// clip, `1` leave untouched, and `v <= 0` fill with `-v`. As a label, a
/// number is only accepted as a fill value (`"-128"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperatorRepr", into = "OperatorRepr")]
pub enum PlaneOperator {
    /// Run the plane's expression.
    Process,
    /// Copy the plane of clip `n`, 0 being the first.
    Copy(usize),
    /// Leave the destination as it is.
    Ignore,
    /// Fill with a constant given at the config's `paramscale`.
    Fill(f32),
}

impl PlaneOperator {
    fn from_code(code: f32) -> Result<Self, LutError> {
        if code == 3.0 {
            Ok(Self::Process)
        } else if code == 2.0 {
            Ok(Self::Copy(0))
        } else if code == 4.0 || code == 5.0 || code == 6.0 {
            Ok(Self::Copy(code as usize - 3))
        } else if code == 1.0 {
            Ok(Self::Ignore)
        } else if code <= 0.0 {
            Ok(Self::Fill(-code))
        } else {
            Err(LutError::InvalidPlaneOperator(code.to_string()))
        }
    }

    /// Lower `Copy` to the last clip that exists when only `clips` are given.
    pub fn limit_clips(self, clips: usize) -> Self {
        match self {
            Self::Copy(n) => Self::Copy(n.min(clips.saturating_sub(1))),
            other => other,
        }
    }
}

impl fmt::Display for PlaneOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => f.write_str("process"),
            Self::Copy(n) => match COPY_LABELS.get(*n) {
                Some(label) => f.write_str(label),
                None => write!(f, "copy {n}"),
            },
            Self::Ignore => f.write_str("none"),
            Self::Fill(value) => write!(f, "{}", -value),
        }
    }
}

impl FromStr for PlaneOperator {
    type Err = LutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        match label {
            "process" => return Ok(Self::Process),
            "copy first" => return Ok(Self::Copy(0)),
            "none" | "ignore" => return Ok(Self::Ignore),
            _ => {}
        }
        if let Some(n) = COPY_LABELS.iter().position(|&copy| copy == label) {
            return Ok(Self::Copy(n));
        }
        if let Some(value) = label.strip_prefix("fill ") {
            return match value.trim().parse::<f32>() {
                Ok(value) if value >= 0.0 => Ok(Self::Fill(value)),
                _ => Err(LutError::InvalidPlaneOperator(s.to_string())),
            };
        }
        match label.parse::<f32>() {
            Ok(value) if value <= 0.0 => Ok(Self::Fill(-value)),
            _ => Err(LutError::InvalidPlaneOperator(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OperatorRepr {
    Code(f32),
    Label(String),
}

impl TryFrom<OperatorRepr> for PlaneOperator {
    type Error = LutError;

    fn try_from(value: OperatorRepr) -> Result<Self, Self::Error> {
        match value {
            OperatorRepr::Code(code) => Self::from_code(code),
            OperatorRepr::Label(label) => label.parse(),
        }
    }
}

impl From<PlaneOperator> for OperatorRepr {
    fn from(value: PlaneOperator) -> Self {
        OperatorRepr::Label(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Spatial coordinates
// ---------------------------------------------------------------------------

/// How a spatial LUT maps pixel coordinates into `x` and `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpatialMode {
    /// Raw pixel coordinates.
    Absolute,
    /// `x / (width - 1)`: both borders reach 0 and 1.
    RelativeInclusive,
    /// `x / width`: the right and bottom borders stay below 1.
    RelativeExclusive,
}

impl SpatialMode {
    /// Divisor applied to a coordinate along an axis of `len` samples.
    pub fn divisor(self, len: usize) -> Option<f64> {
        match self {
            Self::Absolute => None,
            Self::RelativeInclusive if len >= 2 => Some((len - 1) as f64),
            Self::RelativeInclusive | Self::RelativeExclusive => Some(len.max(1) as f64),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::RelativeInclusive => "relative inclusive",
            Self::RelativeExclusive => "relative exclusive",
        }
    }
}

impl FromStr for SpatialMode {
    type Err = LutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "absolute" => Ok(Self::Absolute),
            "relative inclusive" | "relative closed" => Ok(Self::RelativeInclusive),
            "relative" | "relative exclusive" | "relative opened" => Ok(Self::RelativeExclusive),
            other => Err(LutError::InvalidSpatialMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for SpatialMode {
    type Error = LutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpatialMode> for String {
    fn from(value: SpatialMode) -> Self {
        value.label().to_string()
    }
}

// ---------------------------------------------------------------------------
// Filter configuration
// ---------------------------------------------------------------------------

/// Configuration of one LUT filter instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Expression used by every processed plane without its own.
    pub expr: Option<String>,
    #[serde(rename = "yExpr")]
    pub y_expr: Option<String>,
    #[serde(rename = "uExpr")]
    pub u_expr: Option<String>,
    #[serde(rename = "vExpr")]
    pub v_expr: Option<String>,
    #[serde(rename = "aExpr")]
    pub a_expr: Option<String>,

    #[serde(rename = "Y")]
    pub y: PlaneOperator,
    #[serde(rename = "U")]
    pub u: PlaneOperator,
    #[serde(rename = "V")]
    pub v: PlaneOperator,
    #[serde(rename = "A")]
    pub a: PlaneOperator,
    /// Overrides `U` and `V` when set.
    pub chroma: Option<PlaneOperator>,
    /// Overrides `A` when set.
    pub alpha: Option<PlaneOperator>,

    /// Evaluate per sample instead of through a table. `None` lets the
    /// filter decide from its input count and bit depth.
    pub realtime: Option<bool>,
    /// Depth that `Fill` constants are written for.
    pub paramscale: ParamScale,
    /// Planes hold RGB rather than YUV; `Fill` constants are then stretched
    /// to the clip depth instead of shifted.
    pub rgb: bool,

    /// Spatial coordinate mode; overrides `relative` and `biased`.
    pub mode: Option<SpatialMode>,
    pub relative: bool,
    pub biased: bool,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            expr: None,
            y_expr: None,
            u_expr: None,
            v_expr: None,
            a_expr: None,
            y: PlaneOperator::Process,
            u: PlaneOperator::Ignore,
            v: PlaneOperator::Ignore,
            a: PlaneOperator::Ignore,
            chroma: None,
            alpha: None,
            realtime: None,
            paramscale: ParamScale::I8,
            rgb: false,
            mode: None,
            relative: true,
            biased: true,
        }
    }
}

impl LutConfig {
    /// Config processing only the first plane with `expr`.
    pub fn with_expr(expr: impl Into<String>) -> Self {
        Self {
            expr: Some(expr.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Per-plane operators with `chroma` and `alpha` overrides applied.
    pub fn operators(&self) -> [PlaneOperator; PLANE_COUNT] {
        let chroma = self.chroma;
        [
            self.y,
            chroma.unwrap_or(self.u),
            chroma.unwrap_or(self.v),
            self.alpha.unwrap_or(self.a),
        ]
    }

    /// Expression for `plane`: its own when set and non-empty, else `expr`.
    pub fn plane_expr(&self, plane: usize) -> Option<&str> {
        let own = match plane {
            0 => self.y_expr.as_deref(),
            1 => self.u_expr.as_deref(),
            2 => self.v_expr.as_deref(),
            3 => self.a_expr.as_deref(),
            _ => None,
        };
        own.filter(|e| !e.trim().is_empty())
            .or_else(|| self.expr.as_deref().filter(|e| !e.trim().is_empty()))
    }

    /// Whether `plane` falls back to the shared `expr`.
    pub fn uses_shared_expr(&self, plane: usize) -> bool {
        match (self.plane_expr(plane), self.expr.as_deref()) {
            (Some(chosen), Some(shared)) => std::ptr::eq(chosen, shared),
            _ => false,
        }
    }

    /// Effective spatial mode.
    pub fn spatial_mode(&self) -> SpatialMode {
        match self.mode {
            Some(mode) => mode,
            None if !self.relative => SpatialMode::Absolute,
            None if self.biased => SpatialMode::RelativeExclusive,
            None => SpatialMode::RelativeInclusive,
        }
    }
}

// ---------------------------------------------------------------------------
// Realtime workers
// ---------------------------------------------------------------------------

/// Worker settings for realtime evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Maximum worker threads per plane.
    pub threads: usize,
    /// Rows below which a band is not split further.
    pub min_band_rows: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            threads: std::env::var(THREADS_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or_else(|| {
                    std::thread::available_parallelism()
                        .map(NonZeroUsize::get)
                        .unwrap_or(1)
                }),
            min_band_rows: DEFAULT_MIN_BAND_ROWS,
        }
    }
}

impl RealtimeConfig {
    pub fn single_threaded() -> Self {
        Self {
            threads: 1,
            min_band_rows: DEFAULT_MIN_BAND_ROWS,
        }
    }

    /// Rows per band for a plane of `height` rows.
    pub fn band_rows(&self, height: usize) -> usize {
        let threads = self.threads.max(1);
        height.div_ceil(threads).max(self.min_band_rows).max(1)
    }
}
