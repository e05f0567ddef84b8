use std::collections::HashSet;

use nloc_core::NlocError;
use tracing::trace;

use crate::monomial::Monomial;
use crate::substitutions::Substitutions;
use crate::symbol::Symbol;

/// Concatenates nested sequences in order.
pub fn flatten<T: Clone>(nested: &[Vec<T>]) -> Vec<T> {
    nested.iter().flat_map(|inner| inner.iter().cloned()).collect()
}

fn push_unique(out: &mut Vec<Monomial>, seen: &mut HashSet<Monomial>, monomial: Monomial) {
    if seen.insert(monomial.clone()) {
        out.push(monomial);
    }
}

/// All words in `variables` up to `degree`, without any rewriting.
///
/// Each additional degree left-multiplies the previous list by `1` and then by
/// every variable in turn; duplicates are dropped keeping the first
/// occurrence. The identity always comes first.
pub fn get_monomials(variables: &[Symbol], degree: usize) -> Vec<Monomial> {
    if variables.is_empty() || degree == 0 {
        return vec![Monomial::identity()];
    }
    let mut current: Vec<Monomial> = std::iter::once(Monomial::identity())
        .chain(variables.iter().cloned().map(Monomial::from_symbol))
        .collect();
    let left_factors: Vec<Monomial> = current.clone();
    for _ in 1..degree {
        let mut next = Vec::with_capacity(current.len() * left_factors.len());
        let mut seen = HashSet::with_capacity(next.capacity());
        for left in &left_factors {
            for right in &current {
                push_unique(&mut next, &mut seen, left.product(right));
            }
        }
        current = next;
    }
    current
}

/// Monomials up to `degree` reduced by `substitutions`.
///
/// `extra` monomials are appended to the raw enumeration. Monomials that are
/// literally a rule's left-hand side are dropped, the rest are rewritten,
/// stripped of scalar factors, and deduplicated in first-appearance order.
/// Products that vanish are dropped. The identity stays first.
pub fn get_all_monomials(
    variables: &[Symbol],
    extra: &[Monomial],
    substitutions: &Substitutions,
    degree: usize,
) -> Result<Vec<Monomial>, NlocError> {
    let raw = get_monomials(variables, degree);
    let raw_len = raw.len();
    let mut out = Vec::with_capacity(raw_len + extra.len());
    let mut seen = HashSet::with_capacity(raw_len + extra.len());
    for monomial in raw.into_iter().chain(extra.iter().cloned()) {
        if substitutions.contains_lhs(&monomial) {
            continue;
        }
        if let Some(reduced) = substitutions.reduce(&monomial)? {
            push_unique(&mut out, &mut seen, reduced);
        }
    }
    trace!(
        variables = variables.len(),
        degree,
        raw = raw_len,
        reduced = out.len(),
        "enumerated monomials"
    );
    Ok(out)
}
