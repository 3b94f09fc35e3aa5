//! Pixexpr Core — the pixel-math expression language.
//!
//! Expressions are written in RPN over a fixed vocabulary, compiled once into
//! an [`EvaluationContext`] and then evaluated per LUT entry or per sample.
//! No frame, plane or plugin-host types live here.
//!
//! ```text
//!   "x 16 - 255 * 219 /"  --Parser-->  [SymbolEntry]  --compile-->  EvaluationContext
//!                                                                    evaluate(x, y, z, a, bitdepth)
//! ```

pub mod context;
pub mod depth;
pub mod error;
pub mod infix;
pub mod ops;
pub mod parser;
pub mod scale;
pub mod symbol;

// Re-exports for convenience.
pub use context::EvaluationContext;
pub use error::ParseError;
pub use parser::Parser;
pub use scale::{ParamScale, ScaledParam, scale_param, upscale_by_shift, upscale_by_stretch};
pub use symbol::{Category, SymbolEntry, SymbolKind, VarKind, lookup};
