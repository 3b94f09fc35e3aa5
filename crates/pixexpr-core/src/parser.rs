//! Whitespace-separated RPN source to token stream.
//!
//! Every token resolves to a [`SymbolEntry`]: either a vocabulary entry or a
//! numeric literal. The parser also checks stack balance, so any stream it
//! returns is safe to hand to [`EvaluationContext::compile`].
//!
//! [`EvaluationContext::compile`]: crate::context::EvaluationContext::compile

use crate::error::ParseError;
use crate::symbol::{self, SymbolEntry, SymbolKind, VarKind};

/// Tokenizer with a configurable set of input variables.
///
/// Context variables (`bitdepth`, `range_max`, ...) are always available;
/// `x`, `y`, `z` and `a` only once enabled, so a one-input LUT rejects `y`.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    inputs: Vec<VarKind>,
}

impl Parser {
    /// Parser with no input variables enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that accepts exactly `inputs`.
    pub fn for_inputs(inputs: &[VarKind]) -> Self {
        inputs
            .iter()
            .fold(Self::new(), |parser, &kind| parser.with_variable(kind))
    }

    /// Enable an input variable.
    pub fn with_variable(mut self, kind: VarKind) -> Self {
        if !self.inputs.contains(&kind) {
            self.inputs.push(kind);
        }
        self
    }

    pub fn inputs(&self) -> &[VarKind] {
        &self.inputs
    }

    /// Tokenize and validate `source`.
    pub fn parse(&self, source: &str) -> Result<Vec<SymbolEntry>, ParseError> {
        let mut tokens = Vec::new();
        for word in source.split_whitespace() {
            tokens.push(self.resolve(word)?);
        }
        check_balance(&tokens)?;
        Ok(tokens)
    }

    fn resolve(&self, word: &str) -> Result<SymbolEntry, ParseError> {
        if let Some(entry) = symbol::lookup(word) {
            if let Some(kind) = entry.as_variable() {
                if kind.is_input() && !self.inputs.contains(&kind) {
                    return Err(ParseError::VariableNotAllowed(word.to_string()));
                }
            }
            return Ok(entry.clone());
        }
        match word.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                Ok(SymbolEntry::number(word.to_string(), value))
            }
            _ => Err(ParseError::UnknownToken(word.to_string())),
        }
    }
}

/// Simulates stack depth across `tokens`.
///
/// Configuration directives are ignored; the expression must leave exactly
/// one value behind.
pub fn check_balance(tokens: &[SymbolEntry]) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut executable = 0usize;

    for (position, entry) in tokens.iter().enumerate() {
        let (needs, produces) = match entry.kind() {
            SymbolKind::Config(_) => continue,
            SymbolKind::Number(_) | SymbolKind::Variable(_) => (0, 1),
            SymbolKind::Dup => (1, 2),
            SymbolKind::Swap => (2, 2),
            SymbolKind::Autoscale(_) => (1, 1),
            SymbolKind::Operator(op) | SymbolKind::Function(op) => (op.arity(), 1),
            SymbolKind::Ternary(_) => (3, 1),
        };
        executable += 1;
        if depth < needs {
            return Err(ParseError::StackUnderflow {
                token: entry.token().to_string(),
                position,
            });
        }
        depth = depth - needs + produces;
    }

    if executable == 0 {
        return Err(ParseError::EmptyExpression);
    }
    if depth != 1 {
        return Err(ParseError::UnbalancedStack { depth });
    }
    Ok(())
}
