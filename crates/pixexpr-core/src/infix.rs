//! Infix rendering of a compiled program.
//!
//! Walks the program backwards, rebuilding each operator's operands
//! recursively. `dup` and `swap` have no infix form and render as an empty
//! string, so output for programs using them is partial.

use crate::symbol::{Operation, SymbolEntry, SymbolKind};

pub fn to_infix(program: &[SymbolEntry]) -> String {
    let mut walker = Walker {
        program,
        pos: program.len(),
    };
    walker.next_term()
}

struct Walker<'a> {
    program: &'a [SymbolEntry],
    pos: usize,
}

impl Walker<'_> {
    fn next_term(&mut self) -> String {
        let Some(pos) = self.pos.checked_sub(1) else {
            return String::new();
        };
        self.pos = pos;
        let entry = &self.program[pos];
        let name = entry.token();

        match entry.kind() {
            SymbolKind::Number(_) | SymbolKind::Variable(_) => name.to_string(),
            SymbolKind::Function(op) => self.call(name, op.arity()),
            SymbolKind::Autoscale(_) => self.call(name, 1),
            SymbolKind::Operator(Operation::Binary(_)) => {
                let rhs = self.next_term();
                let lhs = self.next_term();
                format!("({lhs}{name}{rhs})")
            }
            SymbolKind::Operator(op) => self.call(name, op.arity()),
            SymbolKind::Ternary(_) => {
                let otherwise = self.next_term();
                let then = self.next_term();
                let cond = self.next_term();
                format!("(({cond}) ? {then} : {otherwise})")
            }
            SymbolKind::Dup | SymbolKind::Swap | SymbolKind::Config(_) => String::new(),
        }
    }

    fn call(&mut self, name: &str, arity: usize) -> String {
        let mut args: Vec<String> = (0..arity).map(|_| self.next_term()).collect();
        args.reverse();
        format!("{name}({})", args.join(","))
    }
}
