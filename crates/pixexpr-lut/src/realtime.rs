//! Per-sample evaluation without tables.
//!
//! Used for float clips, multi-input clips deeper than 8 bits, and whenever
//! a config asks for it. A [`ContextPool`] shares one token stream between
//! worker threads; each worker borrows its own [`EvaluationContext`] since
//! evaluation mutates the context's stack.
//!
//! ```text
//!   dst rows  ──chunks──>  band 0 ─┐
//!                          band 1 ─┼─ scoped threads, one pooled context each
//!                          band 2 ─┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use pixexpr_core::{EvaluationContext, SymbolEntry};

use crate::config::RealtimeConfig;
use crate::error::LutError;
use crate::plane::{Plane, Sample, check_depth};

/// Reusable evaluation contexts compiled from one token stream.
#[derive(Debug)]
pub struct ContextPool {
    tokens: Arc<[SymbolEntry]>,
    idle: Mutex<Vec<EvaluationContext>>,
}

impl ContextPool {
    pub fn new(tokens: impl Into<Arc<[SymbolEntry]>>) -> Self {
        Self {
            tokens: tokens.into(),
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn tokens(&self) -> &[SymbolEntry] {
        &self.tokens
    }

    /// Contexts currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Run `f` with an idle context, compiling a new one if none is free.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut EvaluationContext) -> R) -> R {
        let idle = self.idle.lock().pop();
        let mut ctx = idle.unwrap_or_else(|| {
            tracing::debug!("compiling pooled context");
            EvaluationContext::compile(&self.tokens)
        });
        let result = f(&mut ctx);
        self.idle.lock().push(ctx);
        result
    }
}

/// Evaluate the pool's program for every sample of `dst`.
///
/// `x` is read from `dst` itself (in place); `y`, `z` and `a` come from
/// `sources` in order. Planes without a matching source read 0.
pub fn process<T: Sample>(
    pool: &ContextPool,
    bits: u32,
    dst: &mut Plane<T>,
    sources: &[&Plane<T>],
    workers: &RealtimeConfig,
) -> Result<(), LutError> {
    process_with(pool, bits, dst, sources, workers, |_, _| None)
}

/// Evaluate the pool's program at every coordinate of `dst`, ignoring its
/// contents. `coords` maps `(column, row)` into the `x` and `y` inputs.
pub fn process_spatial<T: Sample>(
    pool: &ContextPool,
    bits: u32,
    dst: &mut Plane<T>,
    workers: &RealtimeConfig,
    coords: impl Fn(usize, usize) -> (f64, f64) + Sync,
) -> Result<(), LutError> {
    process_with(pool, bits, dst, &[], workers, |col, row| {
        let (x, y) = coords(col, row);
        Some([x, y, 0.0, 0.0])
    })
}

// `override_inputs` replaces the sample-derived inputs when it returns Some.
fn process_with<T: Sample>(
    pool: &ContextPool,
    bits: u32,
    dst: &mut Plane<T>,
    sources: &[&Plane<T>],
    workers: &RealtimeConfig,
    override_inputs: impl Fn(usize, usize) -> Option<[f64; 4]> + Sync,
) -> Result<(), LutError> {
    check_depth::<T>(bits)?;
    for source in sources {
        dst.check_same_size(source)?;
    }
    let width = dst.width();
    let height = dst.height();
    if width == 0 || height == 0 {
        return Ok(());
    }

    let band_rows = workers.band_rows(height);
    let run_band = |first_row: usize, band: &mut [T]| {
        pool.with_context(|ctx| {
            for (offset, row) in band.chunks_mut(width).enumerate() {
                let y = first_row + offset;
                for (x, sample) in row.iter_mut().enumerate() {
                    let inputs = override_inputs(x, y).unwrap_or_else(|| {
                        let mut inputs = [sample.to_f64(), 0.0, 0.0, 0.0];
                        let i = y * width + x;
                        for (slot, source) in inputs[1..].iter_mut().zip(sources) {
                            *slot = source.data()[i].to_f64();
                        }
                        inputs
                    });
                    *sample = T::evaluate(ctx, bits, inputs);
                }
            }
        })
    };

    if band_rows >= height {
        run_band(0, dst.data_mut());
        return Ok(());
    }

    tracing::debug!(
        "realtime evaluation over {} bands of {band_rows} rows",
        height.div_ceil(band_rows)
    );
    std::thread::scope(|scope| {
        for (index, band) in dst.data_mut().chunks_mut(band_rows * width).enumerate() {
            let run_band = &run_band;
            scope.spawn(move || run_band(index * band_rows, band));
        }
    });
    Ok(())
}
