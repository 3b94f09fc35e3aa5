//! Single-channel sample planes.
//!
//! A [`Plane`] is a dense row-major buffer of one sample type. The three
//! supported sample types map onto the three narrowing rules of
//! [`EvaluationContext`]:
//!
//! ```text
//!   u8   ->  compute_byte         8 bit
//!   u16  ->  compute_word(bits)   10, 12, 14, 16 bit
//!   f32  ->  compute_float        32 bit float
//! ```

use pixexpr_core::scale::FLOAT_DEPTH;
use pixexpr_core::{EvaluationContext, ScaledParam};

use crate::error::LutError;

/// A sample type a LUT can read and write.
pub trait Sample: bytemuck::Pod + Send + Sync + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// Entries in a one-input table for this type; 0 when tables are not
    /// supported and evaluation must be realtime.
    const TABLE_LEN: usize;

    fn supports_depth(bits: u32) -> bool;

    fn to_f64(self) -> f64;

    /// Index into a lookup table, if this type can be tabled.
    fn table_index(self) -> Option<usize>;

    /// Evaluate `ctx` at `bits` and narrow the result into this type.
    fn evaluate(ctx: &mut EvaluationContext, bits: u32, inputs: [f64; 4]) -> Self;

    /// Largest representable value at `bits`.
    fn saturated(bits: u32) -> Self;

    /// Narrow a scaled parameter into this type.
    fn from_param(param: ScaledParam) -> Self;
}

impl Sample for u8 {
    const NAME: &'static str = "u8";
    const TABLE_LEN: usize = 1 << 8;

    fn supports_depth(bits: u32) -> bool {
        bits == 8
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn table_index(self) -> Option<usize> {
        Some(usize::from(self))
    }

    #[inline]
    fn evaluate(ctx: &mut EvaluationContext, _bits: u32, [x, y, z, a]: [f64; 4]) -> Self {
        ctx.compute_byte(x, y, z, a)
    }

    fn saturated(_bits: u32) -> Self {
        u8::MAX
    }

    fn from_param(param: ScaledParam) -> Self {
        param.int_value.clamp(0, i32::from(u8::MAX)) as u8
    }
}

impl Sample for u16 {
    const NAME: &'static str = "u16";
    const TABLE_LEN: usize = 1 << 16;

    fn supports_depth(bits: u32) -> bool {
        matches!(bits, 10 | 12 | 14 | 16)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn table_index(self) -> Option<usize> {
        Some(usize::from(self))
    }

    #[inline]
    fn evaluate(ctx: &mut EvaluationContext, bits: u32, [x, y, z, a]: [f64; 4]) -> Self {
        ctx.compute_word(bits, x, y, z, a)
    }

    fn saturated(bits: u32) -> Self {
        ((1u32 << bits) - 1) as u16
    }

    fn from_param(param: ScaledParam) -> Self {
        param.int_value.clamp(0, i32::from(u16::MAX)) as u16
    }
}

impl Sample for f32 {
    const NAME: &'static str = "f32";
    const TABLE_LEN: usize = 0;

    fn supports_depth(bits: u32) -> bool {
        bits == FLOAT_DEPTH
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn table_index(self) -> Option<usize> {
        None
    }

    #[inline]
    fn evaluate(ctx: &mut EvaluationContext, _bits: u32, [x, y, z, a]: [f64; 4]) -> Self {
        ctx.compute_float(x, y, z, a)
    }

    fn saturated(_bits: u32) -> Self {
        1.0
    }

    fn from_param(param: ScaledParam) -> Self {
        param.value
    }
}

/// Fail unless `T` can carry `bits`-bit samples.
pub fn check_depth<T: Sample>(bits: u32) -> Result<(), LutError> {
    if T::supports_depth(bits) {
        Ok(())
    } else {
        Err(LutError::UnsupportedBitDepth {
            bits,
            sample: T::NAME,
        })
    }
}

/// Row-major plane of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Sample> Plane<T> {
    /// Zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::zeroed(); width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, LutError> {
        if data.len() != width * height {
            return Err(LutError::BufferSize {
                expected: width * height,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Plane whose sample at `(x, y)` is `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Raw sample bytes in native endianness.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Fail unless `other` has the same dimensions.
    pub fn check_same_size(&self, other: &Plane<T>) -> Result<(), LutError> {
        if self.dimensions() != other.dimensions() {
            return Err(LutError::DimensionMismatch {
                expected: self.dimensions(),
                found: other.dimensions(),
            });
        }
        Ok(())
    }
}
