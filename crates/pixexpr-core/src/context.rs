//! Compiled expression plus everything needed to evaluate it.
//!
//! # Evaluation model
//! A register-plus-stack machine. The register holds the most recent value;
//! the stack only holds operands that are still waiting for an operator.
//!
//! ```text
//!   5 3 swap -
//!   term   register  stack
//!   5      5         [_]
//!   3      3         [_, 5]
//!   swap   5         [_, 3]
//!   -      -2        [_]          (3 - 5)
//! ```
//!
//! Compared to a plain RPN machine this saves one push/pop pair per term.
//! The bottom slot `_` is the initial register value, NaN, and is never read
//! by a balanced program.

use crate::depth::{MAX_INT_DEPTH, MIN_INT_DEPTH, RangeTable};
use crate::infix;
use crate::scale::{FLOAT_DEPTH, max_value};
use crate::symbol::{DirectiveKind, Operation, SymbolEntry, SymbolKind, VarKind};

/// Script bit depth assumed when no `i*`/`f32` directive is present.
pub const DEFAULT_SCRIPT_BIT_DEPTH: u32 = 8;

/// One compiled expression, ready to be evaluated many times.
///
/// A context owns its scratch stack, so it must not be shared between
/// threads while evaluating; build one per worker instead. Compilation is a
/// single pass over the tokens and cheap enough to repeat per thread.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    program: Vec<SymbolEntry>,
    directives: Vec<SymbolEntry>,
    stack: Vec<f64>,
    script_bit_depth: u32,
    float_autoscale_bit_depth: u32,
    ranges: RangeTable,
    float_input_scale: f64,
    float_input_inv_scale: f64,
}

impl EvaluationContext {
    /// Split `tokens` into the executable program and the configuration
    /// directives, resolving the directives as they are met.
    ///
    /// `tokens` must be well-formed (see [`crate::parser::check_balance`]).
    /// When a directive family appears more than once the last one wins.
    pub fn compile(tokens: &[SymbolEntry]) -> Self {
        let mut program = Vec::with_capacity(tokens.len());
        let mut directives = Vec::new();
        let mut script_bit_depth = DEFAULT_SCRIPT_BIT_DEPTH;
        let mut float_autoscale_bit_depth = 0;

        for entry in tokens {
            match entry.as_directive() {
                Some(directive) => {
                    match directive.kind {
                        DirectiveKind::ScriptBitDepth => script_bit_depth = directive.depth,
                        DirectiveKind::FloatClampBitDepth => {
                            float_autoscale_bit_depth = directive.depth
                        }
                    }
                    directives.push(entry.clone());
                }
                None => program.push(entry.clone()),
            }
        }

        let float_input_scale =
            if (MIN_INT_DEPTH..=MAX_INT_DEPTH).contains(&float_autoscale_bit_depth) {
                max_value(float_autoscale_bit_depth)
            } else {
                1.0
            };

        tracing::debug!(
            "compiled {} terms ({} directives), script depth {}, float clamp depth {}",
            program.len(),
            directives.len(),
            script_bit_depth,
            float_autoscale_bit_depth
        );

        Self {
            stack: Vec::with_capacity(program.len() + 1),
            program,
            directives,
            script_bit_depth,
            float_autoscale_bit_depth,
            ranges: RangeTable::new(),
            float_input_scale,
            float_input_inv_scale: 1.0 / float_input_scale,
        }
    }

    /// Executable terms, in evaluation order.
    pub fn program(&self) -> &[SymbolEntry] {
        &self.program
    }

    /// Configuration directives removed from the program, in source order.
    pub fn directives(&self) -> &[SymbolEntry] {
        &self.directives
    }

    pub fn script_bit_depth(&self) -> u32 {
        self.script_bit_depth
    }

    /// Integer depth emulated for float samples; 0 when disabled.
    pub fn float_autoscale_bit_depth(&self) -> u32 {
        self.float_autoscale_bit_depth
    }

    pub fn float_input_scale(&self) -> f64 {
        self.float_input_scale
    }

    pub fn float_input_inv_scale(&self) -> f64 {
        self.float_input_inv_scale
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    /// Evaluate the program for one set of inputs.
    ///
    /// `bitdepth` is the depth of the sample being produced (8..=16, or 32
    /// for float) and selects the range constants.
    ///
    /// # Panics
    /// Panics if the program reads a range constant and `bitdepth` is not a
    /// supported depth.
    pub fn evaluate(&mut self, x: f64, y: f64, z: f64, a: f64, bitdepth: u32) -> f64 {
        let stack = &mut self.stack;
        stack.clear();
        let mut reg = f64::NAN;

        for entry in &self.program {
            match *entry.kind() {
                SymbolKind::Number(value) => {
                    stack.push(reg);
                    reg = value;
                }
                SymbolKind::Variable(kind) => {
                    stack.push(reg);
                    reg = match kind {
                        VarKind::X => x,
                        VarKind::Y => y,
                        VarKind::Z => z,
                        VarKind::A => a,
                        VarKind::BitDepth => f64::from(bitdepth),
                        VarKind::ScriptBitDepth => f64::from(self.script_bit_depth),
                        VarKind::RangeHalf => self.ranges.points(bitdepth).range_half,
                        VarKind::RangeMax => self.ranges.points(bitdepth).range_max,
                        VarKind::RangeSize => self.ranges.points(bitdepth).range_size,
                        VarKind::YMin => self.ranges.points(bitdepth).ymin,
                        VarKind::YMax => self.ranges.points(bitdepth).ymax,
                        VarKind::CMin => self.ranges.points(bitdepth).cmin,
                        VarKind::CMax => self.ranges.points(bitdepth).cmax,
                    };
                }
                SymbolKind::Dup => stack.push(reg),
                SymbolKind::Swap => {
                    if let Some(top) = stack.last_mut() {
                        std::mem::swap(top, &mut reg);
                    }
                }
                SymbolKind::Autoscale(scale) => {
                    reg = scale(reg, bitdepth, self.script_bit_depth);
                }
                SymbolKind::Operator(op) | SymbolKind::Function(op) => {
                    reg = match op {
                        Operation::Unary(f) => f(reg),
                        Operation::Binary(f) => {
                            let lhs = pop(stack);
                            f(lhs, reg)
                        }
                        Operation::Ternary(f) => {
                            let second = pop(stack);
                            let first = pop(stack);
                            f(first, second, reg)
                        }
                        Operation::Nullary(f) => {
                            stack.push(reg);
                            f()
                        }
                    };
                }
                SymbolKind::Ternary(f) => {
                    let second = pop(stack);
                    let first = pop(stack);
                    reg = f(first, second, reg);
                }
                SymbolKind::Config(_) => {}
            }
        }

        reg
    }

    /// Evaluate as an 8-bit sample: rounded and clamped to `0..=255`.
    pub fn compute_byte(&mut self, x: f64, y: f64, z: f64, a: f64) -> u8 {
        to_byte(self.evaluate(x, y, z, a, 8))
    }

    /// Evaluate as a `bits`-deep integer sample, clamped to its range.
    pub fn compute_word(&mut self, bits: u32, x: f64, y: f64, z: f64, a: f64) -> u16 {
        to_word(self.evaluate(x, y, z, a, bits), bits)
    }

    /// Evaluate as a float sample.
    ///
    /// With a `clamp_f*` directive the inputs are first stretched to the
    /// emulated integer range, and the result is scaled back and clamped to
    /// `[0, 1]`.
    pub fn compute_float(&mut self, x: f64, y: f64, z: f64, a: f64) -> f32 {
        let depth = self.float_autoscale_bit_depth;
        if depth == 0 {
            return self.evaluate(x, y, z, a, FLOAT_DEPTH) as f32;
        }

        let scale = self.float_input_scale;
        let eval_depth = if (MIN_INT_DEPTH..=MAX_INT_DEPTH).contains(&depth) {
            depth
        } else {
            FLOAT_DEPTH
        };
        let result = self.evaluate(x * scale, y * scale, z * scale, a * scale, eval_depth);
        (result * self.float_input_inv_scale).clamp(0.0, 1.0) as f32
    }

    /// Parenthesized infix rendering of the program, for diagnostics.
    pub fn infix(&self) -> String {
        infix::to_infix(&self.program)
    }
}

// A balanced program never underflows; NaN marks a missing operand.
#[inline]
fn pop(stack: &mut Vec<f64>) -> f64 {
    stack.pop().unwrap_or(f64::NAN)
}

/// Round half up and clamp to `0..=255`; NaN becomes 0.
#[inline]
pub fn to_byte(value: f64) -> u8 {
    (value + 0.5).clamp(0.0, 255.0) as u8
}

/// Round half up and clamp to `0..=(1 << bits) - 1`; NaN becomes 0.
#[inline]
pub fn to_word(value: f64, bits: u32) -> u16 {
    (value + 0.5).clamp(0.0, max_value(bits.min(16))) as u16
}
