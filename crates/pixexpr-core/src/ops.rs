//! Numeric operations bound to the DSL vocabulary.
//!
//! Every operation works in `f64` and never panics. Booleans are encoded as
//! `+1.0` (true) and `-1.0` (false); an operand counts as true iff it is
//! strictly positive. Invalid arithmetic propagates IEEE `inf`/`nan`.

/// Absolute tolerance used by `==` and `!=`.
pub const EQUALITY_TOLERANCE: f64 = 1e-6;

const TRUE: f64 = 1.0;
const FALSE: f64 = -1.0;

#[inline]
fn boolean(cond: bool) -> f64 {
    if cond { TRUE } else { FALSE }
}

// Saturating float -> integer conversions (NaN maps to 0).
#[inline]
fn to_u64(x: f64) -> u64 {
    x as u64
}

#[inline]
fn to_i64(x: f64) -> i64 {
    x as i64
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

pub fn add(x: f64, y: f64) -> f64 {
    x + y
}

pub fn sub(x: f64, y: f64) -> f64 {
    x - y
}

pub fn mul(x: f64, y: f64) -> f64 {
    x * y
}

pub fn div(x: f64, y: f64) -> f64 {
    x / y
}

pub fn pow(x: f64, y: f64) -> f64 {
    x.powf(y)
}

/// Integer remainder after truncating both operands to `i64`.
///
/// A zero divisor yields `NaN`.
pub fn modulo(x: f64, y: f64) -> f64 {
    match to_i64(x).checked_rem(to_i64(y)) {
        Some(r) => r as f64,
        None if to_i64(y) == -1 => 0.0,
        None => f64::NAN,
    }
}

/// `cond > 0 ? then : otherwise`.
pub fn select(cond: f64, then: f64, otherwise: f64) -> f64 {
    if cond > 0.0 { then } else { otherwise }
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

pub fn equal(x: f64, y: f64) -> f64 {
    boolean((x - y).abs() < EQUALITY_TOLERANCE)
}

pub fn not_equal(x: f64, y: f64) -> f64 {
    boolean((x - y).abs() >= EQUALITY_TOLERANCE)
}

pub fn less_equal(x: f64, y: f64) -> f64 {
    boolean(x <= y)
}

pub fn less(x: f64, y: f64) -> f64 {
    boolean(x < y)
}

pub fn greater_equal(x: f64, y: f64) -> f64 {
    boolean(x >= y)
}

pub fn greater(x: f64, y: f64) -> f64 {
    boolean(x > y)
}

// ---------------------------------------------------------------------------
// Boolean logic
// ---------------------------------------------------------------------------

pub fn and(x: f64, y: f64) -> f64 {
    boolean(x > 0.0 && y > 0.0)
}

pub fn or(x: f64, y: f64) -> f64 {
    boolean(x > 0.0 || y > 0.0)
}

pub fn and_not(x: f64, y: f64) -> f64 {
    boolean(x > 0.0 && y <= 0.0)
}

pub fn xor(x: f64, y: f64) -> f64 {
    boolean((x > 0.0) != (y > 0.0))
}

// ---------------------------------------------------------------------------
// Unsigned bit arithmetic
// ---------------------------------------------------------------------------

pub fn and_unsigned(x: f64, y: f64) -> f64 {
    (to_u64(x) & to_u64(y)) as f64
}

pub fn or_unsigned(x: f64, y: f64) -> f64 {
    (to_u64(x) | to_u64(y)) as f64
}

pub fn xor_unsigned(x: f64, y: f64) -> f64 {
    (to_u64(x) ^ to_u64(y)) as f64
}

pub fn not_unsigned(x: f64) -> f64 {
    (!to_u64(x)) as f64
}

fn shl_u64(value: u64, amount: i64) -> u64 {
    u32::try_from(amount)
        .ok()
        .and_then(|n| value.checked_shl(n))
        .unwrap_or(0)
}

fn shr_u64(value: u64, amount: i64) -> u64 {
    u32::try_from(amount)
        .ok()
        .and_then(|n| value.checked_shr(n))
        .unwrap_or(0)
}

/// `x << y`, or `x >> -y` when `y` is negative.
pub fn shift_left_unsigned(x: f64, y: f64) -> f64 {
    let value = to_u64(x);
    let shifted = if y >= 0.0 {
        shl_u64(value, to_i64(y))
    } else {
        shr_u64(value, to_i64(-y))
    };
    shifted as f64
}

/// `x >> y`, or `x << -y` when `y` is negative.
pub fn shift_right_unsigned(x: f64, y: f64) -> f64 {
    let value = to_u64(x);
    let shifted = if y >= 0.0 {
        shr_u64(value, to_i64(y))
    } else {
        shl_u64(value, to_i64(-y))
    };
    shifted as f64
}

// ---------------------------------------------------------------------------
// Signed bit arithmetic
// ---------------------------------------------------------------------------

pub fn and_signed(x: f64, y: f64) -> f64 {
    (to_i64(x) & to_i64(y)) as f64
}

pub fn or_signed(x: f64, y: f64) -> f64 {
    (to_i64(x) | to_i64(y)) as f64
}

pub fn xor_signed(x: f64, y: f64) -> f64 {
    (to_i64(x) ^ to_i64(y)) as f64
}

pub fn not_signed(x: f64) -> f64 {
    (!to_i64(x)) as f64
}

fn shl_i64(value: i64, amount: i64) -> i64 {
    u32::try_from(amount)
        .ok()
        .and_then(|n| value.checked_shl(n))
        .unwrap_or(0)
}

// Arithmetic shift: everything shifted out leaves the sign fill.
fn shr_i64(value: i64, amount: i64) -> i64 {
    u32::try_from(amount)
        .ok()
        .and_then(|n| value.checked_shr(n))
        .unwrap_or(if value < 0 { -1 } else { 0 })
}

pub fn shift_left_signed(x: f64, y: f64) -> f64 {
    let value = to_i64(x);
    let shifted = if y >= 0.0 {
        shl_i64(value, to_i64(y))
    } else {
        shr_i64(value, to_i64(-y))
    };
    shifted as f64
}

pub fn shift_right_signed(x: f64, y: f64) -> f64 {
    let value = to_i64(x);
    let shifted = if y >= 0.0 {
        shr_i64(value, to_i64(y))
    } else {
        shl_i64(value, to_i64(-y))
    };
    shifted as f64
}

// ---------------------------------------------------------------------------
// Math functions
// ---------------------------------------------------------------------------

pub fn cos(x: f64) -> f64 {
    x.cos()
}

pub fn sin(x: f64) -> f64 {
    x.sin()
}

pub fn tan(x: f64) -> f64 {
    x.tan()
}

pub fn log(x: f64) -> f64 {
    x.ln()
}

pub fn exp(x: f64) -> f64 {
    x.exp()
}

pub fn abs(x: f64) -> f64 {
    x.abs()
}

pub fn acos(x: f64) -> f64 {
    x.acos()
}

pub fn asin(x: f64) -> f64 {
    x.asin()
}

pub fn atan(x: f64) -> f64 {
    x.atan()
}

/// Rounds half away from zero.
pub fn round(x: f64) -> f64 {
    x.round()
}

pub fn floor(x: f64) -> f64 {
    x.floor()
}

pub fn ceil(x: f64) -> f64 {
    x.ceil()
}

/// Truncates through a saturating `i64` conversion.
pub fn trunc(x: f64) -> f64 {
    to_i64(x) as f64
}

/// Clamps `x` into `[lo, hi]`. Unlike `f64::clamp` this never panics on an
/// inverted range; `lo` wins in that case.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    let upper = if x > hi { hi } else { x };
    if upper < lo { lo } else { upper }
}

pub fn min(x: f64, y: f64) -> f64 {
    if x < y { x } else { y }
}

pub fn max(x: f64, y: f64) -> f64 {
    if x > y { x } else { y }
}
