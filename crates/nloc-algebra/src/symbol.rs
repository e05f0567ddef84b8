use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use nloc_core::{ErrorInfo, NlocError};
use serde::{Deserialize, Serialize};

/// Atomic algebraic identifier.
///
/// Operator symbols are Hermitian and do not commute with each other;
/// commutative symbols are real scalars such as the auxiliary columns of a
/// scalar extension. Two symbols are equal when both the name and the
/// commutativity flag agree.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    name: String,
    commutative: bool,
}

impl Symbol {
    /// Creates a non-commuting Hermitian operator symbol.
    pub fn operator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commutative: false,
        }
    }

    /// Creates a commuting real scalar symbol.
    pub fn commuting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commutative: true,
        }
    }

    /// Returns the symbol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the symbol commutes with everything.
    pub fn is_commutative(&self) -> bool {
        self.commutative
    }
}

impl Ord for Symbol {
    // Commuting scalars sort ahead of operators, mirroring how products print.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .commutative
            .cmp(&self.commutative)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commutative {
            write!(f, "Symbol({})", self.name)
        } else {
            write!(f, "Operator({})", self.name)
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Name lookup for symbols, used when monomials are parsed from text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from any collection of symbols.
    pub fn from_symbols<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let mut table = Self::new();
        for symbol in symbols {
            table.insert(symbol.clone());
        }
        table
    }

    /// Registers a symbol, replacing any previous symbol with the same name.
    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name.clone(), symbol);
    }

    /// Looks up a symbol by name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Looks up a symbol by name, failing with `unknown-symbol`.
    pub fn resolve(&self, name: &str) -> Result<Symbol, NlocError> {
        self.get(name).cloned().ok_or_else(|| {
            NlocError::Algebra(
                ErrorInfo::new("unknown-symbol", "symbol is not declared in the table")
                    .with_context("name", name)
                    .with_hint("declare the operator through the party structure"),
            )
        })
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commuting_symbols_sort_first() {
        let a = Symbol::operator("A0");
        let z = Symbol::commuting("z_");
        assert!(z < a);
        assert!(Symbol::operator("A0") < Symbol::operator("B0"));
    }

    #[test]
    fn flag_is_part_of_identity() {
        assert_ne!(Symbol::operator("x"), Symbol::commuting("x"));
    }

    #[test]
    fn resolve_reports_unknown_names() {
        let table = SymbolTable::from_symbols(&[Symbol::operator("A0")]);
        assert_eq!(table.resolve("A0").unwrap(), Symbol::operator("A0"));
        let err = table.resolve("B7").unwrap_err();
        assert_eq!(err.code(), "unknown-symbol");
        assert_eq!(err.info().context["name"], "B7");
    }
}
