//! The DSL vocabulary: categories, bound operations and the symbol table.
//!
//! The table is built once on first use and never mutated, so every lookup
//! is a lock-free read that can happen concurrently from any thread.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::ops;
use crate::scale;

/// Coarse classification of a vocabulary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Number,
    Variable,
    Operator,
    Function,
    Ternary,
    AutoscaleFunction,
    ConfigDirective,
    Dup,
    Swap,
}

/// Which runtime or context value a VARIABLE entry reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    X,
    Y,
    Z,
    A,
    BitDepth,
    ScriptBitDepth,
    RangeHalf,
    RangeMax,
    RangeSize,
    YMin,
    YMax,
    CMin,
    CMax,
}

impl VarKind {
    /// The four per-call input variables.
    pub const INPUTS: [VarKind; 4] = [VarKind::X, VarKind::Y, VarKind::Z, VarKind::A];

    /// `true` for `x`, `y`, `z` and `a`.
    pub const fn is_input(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Z | Self::A)
    }
}

/// A bound numeric operation, tagged by how many operands it consumes.
#[derive(Clone, Copy)]
pub enum Operation {
    Nullary(fn() -> f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Ternary(fn(f64, f64, f64) -> f64),
}

impl Operation {
    pub const fn arity(&self) -> usize {
        match self {
            Self::Nullary(_) => 0,
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
            Self::Ternary(_) => 3,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation/{}", self.arity())
    }
}

/// `(value, target_depth, source_depth) -> value`.
pub type ScaleFn = fn(f64, u32, u32) -> f64;

/// The two families of compile-time configuration directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `i8` .. `f32`: bit depth the script's literals are written in.
    ScriptBitDepth,
    /// `clamp_f*`: integer range emulated when evaluating float samples.
    FloatClampBitDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigDirective {
    pub kind: DirectiveKind,
    pub depth: u32,
}

/// Payload of a vocabulary entry. The category is derived from this, so a
/// category can never disagree with the operation it carries.
#[derive(Debug, Clone, Copy)]
pub enum SymbolKind {
    Number(f64),
    Variable(VarKind),
    Operator(Operation),
    Function(Operation),
    Ternary(fn(f64, f64, f64) -> f64),
    Autoscale(ScaleFn),
    Config(ConfigDirective),
    Dup,
    Swap,
}

/// One token of a compiled expression.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    token: Cow<'static, str>,
    alias: Option<&'static str>,
    kind: SymbolKind,
}

impl SymbolEntry {
    const fn builtin(token: &'static str, alias: Option<&'static str>, kind: SymbolKind) -> Self {
        Self {
            token: Cow::Borrowed(token),
            alias,
            kind,
        }
    }

    /// A numeric literal as produced by the tokenizer.
    pub fn number(token: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self {
            token: token.into(),
            alias: None,
            kind: SymbolKind::Number(value),
        }
    }

    /// Primary spelling.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Legacy alias spelling, if any.
    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub fn category(&self) -> Category {
        match self.kind {
            SymbolKind::Number(_) => Category::Number,
            SymbolKind::Variable(_) => Category::Variable,
            SymbolKind::Operator(_) => Category::Operator,
            SymbolKind::Function(_) => Category::Function,
            SymbolKind::Ternary(_) => Category::Ternary,
            SymbolKind::Autoscale(_) => Category::AutoscaleFunction,
            SymbolKind::Config(_) => Category::ConfigDirective,
            SymbolKind::Dup => Category::Dup,
            SymbolKind::Swap => Category::Swap,
        }
    }

    /// Number of operands taken from the caller's point of view.
    ///
    /// Autoscale functions report 1: their two bit-depth operands are
    /// injected by the evaluator.
    pub fn arity(&self) -> usize {
        match &self.kind {
            SymbolKind::Operator(op) | SymbolKind::Function(op) => op.arity(),
            SymbolKind::Ternary(_) => 3,
            SymbolKind::Autoscale(_) => 1,
            _ => 0,
        }
    }

    /// `true` if `token` is either spelling of this entry.
    pub fn matches(&self, token: &str) -> bool {
        self.token == token || self.alias == Some(token)
    }

    pub fn as_directive(&self) -> Option<ConfigDirective> {
        match self.kind {
            SymbolKind::Config(directive) => Some(directive),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<VarKind> {
        match self.kind {
            SymbolKind::Variable(var) => Some(var),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

use Operation::{Binary, Ternary, Unary};
use SymbolKind::{Autoscale, Config, Function, Operator, Variable};

const fn op(token: &'static str, f: fn(f64, f64) -> f64) -> SymbolEntry {
    SymbolEntry::builtin(token, None, Operator(Binary(f)))
}

const fn op2(token: &'static str, alias: &'static str, f: fn(f64, f64) -> f64) -> SymbolEntry {
    SymbolEntry::builtin(token, Some(alias), Operator(Binary(f)))
}

const fn func1(token: &'static str, f: fn(f64) -> f64) -> SymbolEntry {
    SymbolEntry::builtin(token, None, Function(Unary(f)))
}

const fn var(token: &'static str, kind: VarKind) -> SymbolEntry {
    SymbolEntry::builtin(token, None, Variable(kind))
}

const fn script_depth(token: &'static str, depth: u32) -> SymbolEntry {
    SymbolEntry::builtin(
        token,
        None,
        Config(ConfigDirective {
            kind: DirectiveKind::ScriptBitDepth,
            depth,
        }),
    )
}

const fn clamp_depth(token: &'static str, depth: u32) -> SymbolEntry {
    SymbolEntry::builtin(
        token,
        None,
        Config(ConfigDirective {
            kind: DirectiveKind::FloatClampBitDepth,
            depth,
        }),
    )
}

/// Every built-in vocabulary entry, in registration order.
pub static SYMBOLS: &[SymbolEntry] = &[
    // arithmetic
    op("+", ops::add),
    op("-", ops::sub),
    op("*", ops::mul),
    op("/", ops::div),
    op("^", ops::pow),
    op("%", ops::modulo),
    SymbolEntry::builtin("?", None, SymbolKind::Ternary(ops::select)),
    // comparison
    op2("==", "=", ops::equal),
    op("!=", ops::not_equal),
    op("<=", ops::less_equal),
    op("<", ops::less),
    op(">=", ops::greater_equal),
    op(">", ops::greater),
    // boolean
    op("&", ops::and),
    op("|", ops::or),
    op("&!", ops::and_not),
    op2("°", "@", ops::xor),
    // unsigned bit
    op("&u", ops::and_unsigned),
    op("|u", ops::or_unsigned),
    op2("°u", "@u", ops::xor_unsigned),
    func1("~u", ops::not_unsigned),
    op2("<<", "<<u", ops::shift_left_unsigned),
    op2(">>", ">>u", ops::shift_right_unsigned),
    // signed bit
    op("&s", ops::and_signed),
    op("|s", ops::or_signed),
    op2("°s", "@s", ops::xor_signed),
    func1("~s", ops::not_signed),
    op("<<s", ops::shift_left_signed),
    op(">>s", ops::shift_right_signed),
    // constants
    SymbolEntry::builtin("pi", None, SymbolKind::Number(std::f64::consts::PI)),
    // variables
    var("x", VarKind::X),
    var("y", VarKind::Y),
    var("z", VarKind::Z),
    var("a", VarKind::A),
    var("bitdepth", VarKind::BitDepth),
    var("sbitdepth", VarKind::ScriptBitDepth),
    var("range_half", VarKind::RangeHalf),
    var("range_max", VarKind::RangeMax),
    var("range_size", VarKind::RangeSize),
    var("ymin", VarKind::YMin),
    var("ymax", VarKind::YMax),
    var("cmin", VarKind::CMin),
    var("cmax", VarKind::CMax),
    // math
    func1("cos", ops::cos),
    func1("sin", ops::sin),
    func1("tan", ops::tan),
    func1("log", ops::log),
    func1("exp", ops::exp),
    func1("abs", ops::abs),
    func1("atan", ops::atan),
    func1("acos", ops::acos),
    func1("asin", ops::asin),
    func1("round", ops::round),
    func1("floor", ops::floor),
    func1("ceil", ops::ceil),
    func1("trunc", ops::trunc),
    SymbolEntry::builtin("clip", None, Function(Ternary(ops::clip))),
    SymbolEntry::builtin("min", None, Function(Binary(ops::min))),
    SymbolEntry::builtin("max", None, Function(Binary(ops::max))),
    // autoscale
    SymbolEntry::builtin("scaleb", Some("@B"), Autoscale(scale::upscale_by_shift)),
    SymbolEntry::builtin("scalef", Some("@F"), Autoscale(scale::upscale_by_stretch)),
    // stack
    SymbolEntry::builtin("dup", None, SymbolKind::Dup),
    SymbolEntry::builtin("swap", None, SymbolKind::Swap),
    // configuration
    script_depth("i8", 8),
    script_depth("i10", 10),
    script_depth("i12", 12),
    script_depth("i14", 14),
    script_depth("i16", 16),
    script_depth("f32", 32),
    clamp_depth("clamp_f", 32),
    clamp_depth("clamp_f_i8", 8),
    clamp_depth("clamp_f_i10", 10),
    clamp_depth("clamp_f_i12", 12),
    clamp_depth("clamp_f_i14", 14),
    clamp_depth("clamp_f_i16", 16),
    clamp_depth("clamp_f_f32", 32),
];

static INDEX: LazyLock<HashMap<&'static str, &'static SymbolEntry>> = LazyLock::new(|| {
    let mut index = HashMap::with_capacity(SYMBOLS.len() * 2);
    for entry in SYMBOLS {
        if let Cow::Borrowed(token) = entry.token {
            index.insert(token, entry);
        }
        if let Some(alias) = entry.alias {
            index.insert(alias, entry);
        }
    }
    index
});

/// Exact-match lookup against primary and alias spellings.
pub fn lookup(token: &str) -> Option<&'static SymbolEntry> {
    INDEX.get(token).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_matches_primary_and_alias() {
        let eq = lookup("==").expect("== registered");
        let legacy = lookup("=").expect("= registered");
        assert_eq!(eq.token(), legacy.token());
        assert_eq!(lookup("@B").map(SymbolEntry::token), Some("scaleb"));
        assert_eq!(lookup(">>u").map(SymbolEntry::token), Some(">>"));
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_spellings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in SYMBOLS {
            assert!(seen.insert(entry.token().to_string()), "duplicate {}", entry.token());
            if let Some(alias) = entry.alias() {
                assert!(seen.insert(alias.to_string()), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn test_categories_and_arities() {
        let cases = [
            ("+", Category::Operator, 2),
            ("?", Category::Ternary, 3),
            ("~u", Category::Function, 1),
            ("clip", Category::Function, 3),
            ("min", Category::Function, 2),
            ("scalef", Category::AutoscaleFunction, 1),
            ("pi", Category::Number, 0),
            ("range_max", Category::Variable, 0),
            ("dup", Category::Dup, 0),
            ("swap", Category::Swap, 0),
            ("clamp_f_i10", Category::ConfigDirective, 0),
        ];
        for (token, category, arity) in cases {
            let entry = lookup(token).unwrap_or_else(|| panic!("{token} missing"));
            assert_eq!(entry.category(), category, "{token}");
            assert_eq!(entry.arity(), arity, "{token}");
        }
    }

    #[test]
    fn test_directives_carry_kind_and_depth() {
        let i10 = lookup("i10").and_then(SymbolEntry::as_directive);
        assert_eq!(
            i10,
            Some(ConfigDirective {
                kind: DirectiveKind::ScriptBitDepth,
                depth: 10
            })
        );
        let clamp = lookup("clamp_f").and_then(SymbolEntry::as_directive);
        assert_eq!(
            clamp,
            Some(ConfigDirective {
                kind: DirectiveKind::FloatClampBitDepth,
                depth: 32
            })
        );
    }

    #[test]
    fn test_every_variable_kind_is_registered() {
        for kind in [
            VarKind::X,
            VarKind::Y,
            VarKind::Z,
            VarKind::A,
            VarKind::BitDepth,
            VarKind::ScriptBitDepth,
            VarKind::RangeHalf,
            VarKind::RangeMax,
            VarKind::RangeSize,
            VarKind::YMin,
            VarKind::YMax,
            VarKind::CMin,
            VarKind::CMax,
        ] {
            assert!(
                SYMBOLS.iter().any(|entry| entry.as_variable() == Some(kind)),
                "{kind:?} missing from symbol table"
            );
        }
    }
}
