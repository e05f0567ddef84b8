use std::collections::HashSet;

use nloc_core::{ErrorInfo, NlocError};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::symbol::Symbol;

const MAX_REWRITES: usize = 100_000;

/// Right-hand side of a rewrite rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Replacement {
    /// The matched product vanishes.
    Zero,
    /// The matched product is replaced by `coeff * monomial`.
    Term {
        /// Numeric factor carried into the rewritten monomial.
        coeff: Complex64,
        /// Replacement product.
        monomial: Monomial,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Rule {
    lhs: Monomial,
    rhs: Replacement,
}

/// Ordered rewrite rules such as idempotence (`P*P -> P`), orthogonality
/// (`P*Q -> 0`) or commutation (`Q*P -> P*Q`).
///
/// A rule matches when its operator word occurs contiguously in the target
/// word and its commuting factors are contained in the target's. Rules are
/// tried in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Substitutions {
    rules: Vec<Rule>,
}

fn malformed(lhs: &Monomial, message: &str) -> ErrorInfo {
    ErrorInfo::new("malformed-substitution", message).with_context("lhs", lhs.to_string())
}

/// Removes `sub` from the sorted multiset `set`, or returns `None` if it is not contained.
fn subtract_multiset(set: &[Symbol], sub: &[Symbol]) -> Option<Vec<Symbol>> {
    let mut remaining = set.to_vec();
    for symbol in sub {
        let idx = remaining.iter().position(|candidate| candidate == symbol)?;
        remaining.remove(idx);
    }
    Some(remaining)
}

fn find_subword(word: &[Symbol], pattern: &[Symbol]) -> Option<usize> {
    if pattern.is_empty() {
        return Some(0);
    }
    if pattern.len() > word.len() {
        return None;
    }
    (0..=word.len() - pattern.len()).find(|&start| &word[start..start + pattern.len()] == pattern)
}

impl Rule {
    /// Applies the rule once at its leftmost match.
    fn rewrite(&self, target: &Monomial) -> Option<(Complex64, Option<Monomial>)> {
        let commuting = subtract_multiset(target.commuting(), self.lhs.commuting())?;
        let start = find_subword(target.word(), self.lhs.word())?;
        match &self.rhs {
            Replacement::Zero => Some((Complex64::new(0.0, 0.0), None)),
            Replacement::Term { coeff, monomial } => {
                let word = target.word();
                let end = start + self.lhs.word().len();
                let mut new_word = Vec::with_capacity(word.len() - self.lhs.word().len() + monomial.word().len());
                new_word.extend_from_slice(&word[..start]);
                new_word.extend_from_slice(monomial.word());
                new_word.extend_from_slice(&word[end..]);
                let mut new_commuting = commuting;
                new_commuting.extend_from_slice(monomial.commuting());
                Some((*coeff, Some(Monomial::from_parts(new_commuting, new_word))))
            }
        }
    }
}

impl Substitutions {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule `lhs -> rhs`. Re-adding an existing left-hand side replaces
    /// its right-hand side in place.
    ///
    /// The right-hand side must expand to zero or to a single scaled monomial.
    pub fn insert(&mut self, lhs: Monomial, rhs: Expr) -> Result<(), NlocError> {
        if lhs.is_identity() {
            return Err(NlocError::Substitution(malformed(
                &lhs,
                "the identity cannot be rewritten",
            )));
        }
        let mut terms = rhs.terms();
        let rhs = match terms.len() {
            0 => Replacement::Zero,
            1 => {
                let (monomial, coeff) = terms.remove(0);
                Replacement::Term { coeff, monomial }
            }
            _ => {
                return Err(NlocError::Substitution(
                    malformed(&lhs, "right-hand side must be a single scaled monomial")
                        .with_context("rhs", rhs.to_string()),
                ))
            }
        };
        if let Some(rule) = self.rules.iter_mut().find(|rule| rule.lhs == lhs) {
            rule.rhs = rhs;
        } else {
            self.rules.push(Rule { lhs, rhs });
        }
        Ok(())
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether no rules are defined.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns whether `monomial` is exactly the left-hand side of a rule.
    pub fn contains_lhs(&self, monomial: &Monomial) -> bool {
        self.rules.iter().any(|rule| &rule.lhs == monomial)
    }

    /// Iterates over the rules in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&Monomial, &Replacement)> + '_ {
        self.rules.iter().map(|rule| (&rule.lhs, &rule.rhs))
    }

    /// Rewrites `monomial` until no rule applies.
    ///
    /// Returns `None` when the product vanishes, otherwise the accumulated
    /// numeric factor and the reduced monomial. Rule sets that revisit a
    /// state fail with `substitution-cycle`.
    pub fn apply(&self, monomial: &Monomial) -> Result<Option<(Complex64, Monomial)>, NlocError> {
        let mut coeff = Complex64::new(1.0, 0.0);
        let mut current = monomial.clone();
        let mut seen = HashSet::new();
        seen.insert(current.clone());
        'rewrite: for _ in 0..MAX_REWRITES {
            for rule in &self.rules {
                let Some((factor, rewritten)) = rule.rewrite(&current) else {
                    continue;
                };
                let Some(rewritten) = rewritten else {
                    return Ok(None);
                };
                coeff *= factor;
                if !seen.insert(rewritten.clone()) {
                    return Err(cycle_error(monomial, &rewritten));
                }
                current = rewritten;
                continue 'rewrite;
            }
            return Ok(Some((coeff, current)));
        }
        Err(cycle_error(monomial, &current))
    }

    /// Rewrites and returns only the reduced monomial, dropping the scalar factor.
    pub fn reduce(&self, monomial: &Monomial) -> Result<Option<Monomial>, NlocError> {
        Ok(self.apply(monomial)?.map(|(_, reduced)| reduced))
    }
}

fn cycle_error(start: &Monomial, state: &Monomial) -> NlocError {
    NlocError::Substitution(
        ErrorInfo::new("substitution-cycle", "rewrite rules do not terminate")
            .with_context("monomial", start.to_string())
            .with_context("state", state.to_string())
            .with_hint("make every rule reduce the word, e.g. order commutations by party"),
    )
}
