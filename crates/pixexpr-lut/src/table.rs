//! Precomputed lookup tables.
//!
//! A table holds the narrowed result of a program for every possible input
//! combination, so applying it is one indexed read per sample.
//!
//! ```text
//!   SingleLut   x            u8: 256 entries, u16: 65536 entries
//!   MultiLut    x y [z [a]]  u8 only: 256^n entries,
//!                            index = x << 8(n-1) | y << 8(n-2) | ...
//! ```
//!
//! 16-bit-container tables below 16 bits are filled above the depth maximum
//! with the saturated value, so out-of-range samples map to white.

use pixexpr_core::{EvaluationContext, SymbolEntry};

use crate::error::LutError;
use crate::plane::{Plane, Sample, check_depth};

/// Largest multi-input table that may be built (four 8-bit inputs).
pub const MAX_TABLE_INPUTS: usize = 4;

/// One-input lookup table.
#[derive(Debug, Clone)]
pub struct SingleLut<T> {
    bits: u32,
    table: Vec<T>,
}

impl<T: Sample> SingleLut<T> {
    /// Evaluate `tokens` for every `bits`-bit input value.
    pub fn build(tokens: &[SymbolEntry], bits: u32) -> Result<Self, LutError> {
        check_depth::<T>(bits)?;
        if T::TABLE_LEN == 0 {
            return Err(LutError::TableUnsupported { bits, inputs: 1 });
        }

        let mut ctx = EvaluationContext::compile(tokens);
        let max = (1usize << bits) - 1;
        let mut table = Vec::with_capacity(T::TABLE_LEN);
        for value in 0..=max {
            table.push(T::evaluate(&mut ctx, bits, [value as f64, 0.0, 0.0, 0.0]));
        }
        table.resize(T::TABLE_LEN, T::saturated(bits));

        tracing::debug!("built {bits}-bit single-input lut ({} entries)", table.len());
        Ok(Self { bits, table })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn entries(&self) -> &[T] {
        &self.table
    }

    #[inline]
    pub fn lookup(&self, value: T) -> T {
        value
            .table_index()
            .and_then(|i| self.table.get(i))
            .copied()
            .unwrap_or(value)
    }

    /// Replace every sample of `plane` in place.
    pub fn apply(&self, plane: &mut Plane<T>) {
        for sample in plane.data_mut() {
            *sample = self.lookup(*sample);
        }
    }
}

/// Two- to four-input 8-bit lookup table.
#[derive(Debug, Clone)]
pub struct MultiLut<T> {
    inputs: usize,
    table: Vec<T>,
}

impl<T: Sample> MultiLut<T> {
    /// Evaluate `tokens` over all `inputs`-tuples of 8-bit values.
    ///
    /// Only 8-bit samples can be tabled; deeper clips must be evaluated in
    /// realtime.
    pub fn build(tokens: &[SymbolEntry], inputs: usize, bits: u32) -> Result<Self, LutError> {
        check_depth::<T>(bits)?;
        if bits != 8 || T::TABLE_LEN != 1 << 8 || !(2..=MAX_TABLE_INPUTS).contains(&inputs) {
            return Err(LutError::TableUnsupported { bits, inputs });
        }

        let len = 1usize << (8 * inputs);
        let mut ctx = EvaluationContext::compile(tokens);
        let mut table = Vec::with_capacity(len);
        for index in 0..len {
            let mut values = [0.0; 4];
            for (slot, value) in values.iter_mut().take(inputs).enumerate() {
                let shift = 8 * (inputs - 1 - slot);
                *value = ((index >> shift) & 0xff) as f64;
            }
            table.push(T::evaluate(&mut ctx, bits, values));
        }

        tracing::debug!("built {inputs}-input lut ({len} entries)");
        Ok(Self { inputs, table })
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn entries(&self) -> &[T] {
        &self.table
    }

    /// Table entry for one sample per input, `x` first.
    #[inline]
    pub fn lookup(&self, samples: &[T]) -> T {
        let mut index = 0usize;
        for sample in samples.iter().take(self.inputs) {
            index = (index << 8) | sample.table_index().unwrap_or(0);
        }
        self.table.get(index).copied().unwrap_or_else(T::zeroed)
    }

    /// Rewrite `dst` in place, reading `x` from `dst` and the remaining
    /// inputs from `sources` in order.
    pub fn apply(&self, dst: &mut Plane<T>, sources: &[&Plane<T>]) -> Result<(), LutError> {
        let needed = self.inputs - 1;
        if sources.len() < needed {
            return Err(LutError::MissingSource {
                needed,
                found: sources.len(),
            });
        }
        let sources = &sources[..needed];
        for source in sources {
            dst.check_same_size(source)?;
        }

        let mut samples = [T::zeroed(); MAX_TABLE_INPUTS];
        for (i, sample) in dst.data_mut().iter_mut().enumerate() {
            samples[0] = *sample;
            for (slot, source) in samples[1..].iter_mut().zip(sources) {
                *slot = source.data()[i];
            }
            *sample = self.lookup(&samples[..self.inputs]);
        }
        Ok(())
    }
}
