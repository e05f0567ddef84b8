use std::fmt;
use std::ops::Mul;

use nloc_core::{ErrorInfo, NlocError};
use serde::{Deserialize, Serialize};

use crate::symbol::{Symbol, SymbolTable};

/// Ordered product of symbols.
///
/// Commuting scalars are kept as a sorted multiset in front of the
/// non-commuting operator word, so two monomials are equal exactly when they
/// print the same. Powers stay expanded: `A0*A0` has degree two. Rewrite
/// rules such as idempotence are applied explicitly through
/// [`Substitutions`](crate::Substitutions).
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct Monomial {
    commuting: Vec<Symbol>,
    word: Vec<Symbol>,
}

impl Monomial {
    /// The multiplicative identity.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Monomial consisting of a single symbol.
    pub fn from_symbol(symbol: Symbol) -> Self {
        let mut monomial = Self::identity();
        monomial.push(symbol);
        monomial
    }

    /// Product of the symbols taken left to right.
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut monomial = Self::identity();
        for symbol in symbols {
            monomial.push(symbol);
        }
        monomial
    }

    pub(crate) fn from_parts(mut commuting: Vec<Symbol>, word: Vec<Symbol>) -> Self {
        commuting.sort();
        Self { commuting, word }
    }

    fn push(&mut self, symbol: Symbol) {
        if symbol.is_commutative() {
            let at = self.commuting.partition_point(|existing| existing <= &symbol);
            self.commuting.insert(at, symbol);
        } else {
            self.word.push(symbol);
        }
    }

    /// Returns whether this is the identity.
    pub fn is_identity(&self) -> bool {
        self.commuting.is_empty() && self.word.is_empty()
    }

    /// Total number of factors, counting repeats.
    pub fn degree(&self) -> usize {
        self.commuting.len() + self.word.len()
    }

    /// Sorted commuting factors.
    pub fn commuting(&self) -> &[Symbol] {
        &self.commuting
    }

    /// Non-commuting operator word in product order.
    pub fn word(&self) -> &[Symbol] {
        &self.word
    }

    /// All factors in display order: commuting scalars first, then the word.
    pub fn factors(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.commuting.iter().chain(self.word.iter())
    }

    /// Returns the single symbol if the monomial has degree one.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        if self.degree() == 1 {
            self.factors().next()
        } else {
            None
        }
    }

    /// Non-commutative product `self * other`.
    pub fn product(&self, other: &Monomial) -> Monomial {
        let mut commuting = Vec::with_capacity(self.commuting.len() + other.commuting.len());
        commuting.extend_from_slice(&self.commuting);
        commuting.extend_from_slice(&other.commuting);
        let mut word = Vec::with_capacity(self.word.len() + other.word.len());
        word.extend_from_slice(&self.word);
        word.extend_from_slice(&other.word);
        Self::from_parts(commuting, word)
    }

    /// Parses `A0*B1**2*c` style text, resolving names through `table`.
    ///
    /// `1` denotes the identity, either alone or as a factor.
    pub fn parse(text: &str, table: &SymbolTable) -> Result<Monomial, NlocError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(parse_error(text, "empty monomial"));
        }
        let mut monomial = Monomial::identity();
        for raw in trimmed.replace("**", "^").split('*') {
            let raw = raw.trim();
            let (name, exponent) = match raw.split_once('^') {
                Some((name, exponent)) => {
                    let exponent = exponent
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| parse_error(text, "invalid exponent"))?;
                    (name.trim(), exponent)
                }
                None => (raw, 1),
            };
            if name.is_empty() {
                return Err(parse_error(text, "empty factor"));
            }
            if name == "1" {
                continue;
            }
            let symbol = table.resolve(name)?;
            for _ in 0..exponent {
                monomial.push(symbol.clone());
            }
        }
        Ok(monomial)
    }
}

fn parse_error(text: &str, message: &str) -> NlocError {
    NlocError::Algebra(ErrorInfo::new("parse-monomial", message).with_context("text", text))
}

impl From<Symbol> for Monomial {
    fn from(symbol: Symbol) -> Self {
        Monomial::from_symbol(symbol)
    }
}

impl From<Vec<Symbol>> for Monomial {
    fn from(symbols: Vec<Symbol>) -> Self {
        Monomial::from_symbols(symbols)
    }
}

impl From<Monomial> for Vec<Symbol> {
    fn from(monomial: Monomial) -> Self {
        let Monomial {
            mut commuting,
            word,
        } = monomial;
        commuting.extend(word);
        commuting
    }
}

impl Mul for &Monomial {
    type Output = Monomial;

    fn mul(self, rhs: &Monomial) -> Monomial {
        self.product(rhs)
    }
}

impl Mul for Monomial {
    type Output = Monomial;

    fn mul(self, rhs: Monomial) -> Monomial {
        self.product(&rhs)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            return f.write_str("1");
        }
        let factors: Vec<&Symbol> = self.factors().collect();
        let mut idx = 0;
        let mut first = true;
        while idx < factors.len() {
            let mut run = 1;
            while idx + run < factors.len() && factors[idx + run] == factors[idx] {
                run += 1;
            }
            if !first {
                f.write_str("*")?;
            }
            first = false;
            if run > 1 {
                write!(f, "{}**{}", factors[idx], run)?;
            } else {
                write!(f, "{}", factors[idx])?;
            }
            idx += run;
        }
        Ok(())
    }
}

impl fmt::Debug for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Monomial({self})")
    }
}
