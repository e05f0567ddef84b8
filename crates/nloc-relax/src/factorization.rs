use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::iter;

use nloc_algebra::{
    flatten, generate_variables, get_all_monomials, Expr, Monomial, Party, Substitutions, Symbol,
};
use nloc_core::{ErrorInfo, NlocError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::moments::Moments;

/// Options for [`get_factorization_constraints`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorizationOpts {
    /// Build extra columns for every party instead of all but the last.
    #[serde(default)]
    pub all_parties: bool,
    /// Also return the monomial each extra column stands for.
    #[serde(default)]
    pub return_column_names: bool,
}

/// Output of [`get_factorization_constraints`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizationConstraints {
    /// `<P_i P_j ...> = <P_i><P_j>...` constraints keyed by the joint monomial.
    pub constraints: BTreeMap<Monomial, Expr>,
    /// Fresh commuting symbols for partial-party moments that are not known.
    pub extra_columns: Vec<Symbol>,
    /// Monomial behind each extra column, when requested.
    pub column_names: Option<Vec<Monomial>>,
}

fn factorization_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Family prefix for a party's columns: the first character of its first
/// monomial, lowercased, followed by `_`.
fn column_prefix(first: &Monomial) -> String {
    let rendered = first.to_string();
    let head: String = rendered.chars().take(1).collect();
    let head = head.split('_').next().unwrap_or_default().to_lowercase();
    format!("{head}_")
}

/// Columns of one party: its monomials mapped to either a known moment or a
/// fresh symbol, plus the identity mapped to `1`.
struct PartyColumns {
    lookup: HashMap<Monomial, Expr>,
}

impl PartyColumns {
    fn column(&self, party: usize, factor: &Monomial) -> Result<&Expr, NlocError> {
        self.lookup.get(factor).ok_or_else(|| {
            NlocError::Factorization(
                factorization_error("party-lookup", "factor is missing from its party's monomials")
                    .with_context("party", party.to_string())
                    .with_context("factor", factor.to_string())
                    .with_hint("the party structure and substitutions disagree on this product"),
            )
        })
    }
}

fn operator_owners(parties: &[Party]) -> Result<HashMap<Symbol, usize>, NlocError> {
    let mut owners = HashMap::new();
    for (idx, party) in parties.iter().enumerate() {
        for symbol in party.iter().flatten() {
            if let Some(previous) = owners.insert(symbol.clone(), idx) {
                if previous != idx {
                    return Err(NlocError::Factorization(
                        factorization_error(
                            "duplicate-operator",
                            "operator is listed by more than one party",
                        )
                        .with_context("operator", symbol.to_string())
                        .with_context("parties", format!("{previous},{idx}")),
                    ));
                }
            }
        }
    }
    Ok(owners)
}

fn split_by_party(
    monomial: &Monomial,
    owners: &HashMap<Symbol, usize>,
    num_parties: usize,
) -> Result<Vec<Monomial>, NlocError> {
    let mut per_party: Vec<Vec<Symbol>> = vec![Vec::new(); num_parties];
    for symbol in monomial.factors() {
        let Some(&party) = owners.get(symbol) else {
            return Err(NlocError::Factorization(
                factorization_error("unknown-operator", "operator belongs to no party")
                    .with_context("operator", symbol.to_string())
                    .with_context("monomial", monomial.to_string()),
            ));
        };
        per_party[party].push(symbol.clone());
    }
    Ok(per_party.into_iter().map(Monomial::from_symbols).collect())
}

fn insert_constraint(
    constraints: &mut BTreeMap<Monomial, Expr>,
    key: Monomial,
    item: Expr,
) -> Result<bool, NlocError> {
    if Expr::from_monomial(&key).algebraic_eq(&item) {
        return Ok(false);
    }
    match constraints.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(item);
            Ok(true)
        }
        Entry::Occupied(existing) => {
            if existing.get().algebraic_eq(&item) {
                Ok(false)
            } else {
                Err(NlocError::Factorization(
                    factorization_error(
                        "constraint-collision",
                        "two different factorizations derived for one monomial",
                    )
                    .with_context("monomial", existing.key().to_string())
                    .with_context("existing", existing.get().to_string())
                    .with_context("new", item.to_string()),
                ))
            }
        }
    }
}

/// Derives the n-locality constraints `<P_i P_j ...> = <P_i><P_j>...` for the
/// moment matrix of the given `level`.
///
/// Each party's products up to degree `2*level - 1` get an extra column,
/// replaced by its value when the product is already in `moments`. Unless
/// `all_parties` is set the last party gets no columns: its factor is taken
/// from `moments` directly, or left as the operator product when unknown.
/// Every joint monomial up to degree `level` is then paired with each extra
/// column and with `1`; longer monomials up to `2*level` are used unpaired as
/// long as each party's share stays below `2*level`. Constraints whose two
/// sides coincide are skipped.
#[instrument(skip_all, fields(parties = parties.len(), level = level))]
pub fn get_factorization_constraints(
    parties: &[Party],
    moments: &Moments,
    substitutions: &Substitutions,
    level: usize,
    opts: FactorizationOpts,
) -> Result<FactorizationConstraints, NlocError> {
    if level == 0 {
        return Err(NlocError::Factorization(
            factorization_error("invalid-level", "the relaxation level must be at least 1")
                .with_context("level", "0"),
        ));
    }
    if parties.is_empty() {
        return Err(NlocError::Factorization(factorization_error(
            "empty-parties",
            "at least one party is required",
        )));
    }
    let owners = operator_owners(parties)?;
    let last_party = parties.len() - 1;
    let column_parties = if opts.all_parties {
        parties.len()
    } else {
        last_party
    };

    let mut party_monomials = Vec::with_capacity(column_parties);
    for party in &parties[..column_parties] {
        let operators = flatten(party);
        let monomials = get_all_monomials(&operators, &[], substitutions, 2 * level - 1)?;
        party_monomials.push(monomials.into_iter().skip(1).collect::<Vec<_>>());
    }

    let mut prefixes: HashMap<String, usize> = HashMap::new();
    let mut extra_columns = Vec::new();
    let mut column_names = Vec::new();
    let mut columns = Vec::with_capacity(column_parties);
    for (idx, monomials) in party_monomials.iter().enumerate() {
        let mut lookup = HashMap::with_capacity(monomials.len() + 1);
        if let Some(first) = monomials.first() {
            let prefix = column_prefix(first);
            if let Some(previous) = prefixes.insert(prefix.clone(), idx) {
                return Err(NlocError::Factorization(
                    factorization_error(
                        "column-collision",
                        "two parties would share the same extra column names",
                    )
                    .with_context("prefix", prefix)
                    .with_context("parties", format!("{previous},{idx}"))
                    .with_hint("give each party a label starting with a distinct letter"),
                ));
            }
            let symbols = generate_variables(&prefix, monomials.len());
            let mut unresolved = 0usize;
            for (monomial, symbol) in monomials.iter().zip(symbols) {
                let value = match moments.get(monomial) {
                    Some(known) => known.clone(),
                    None => {
                        unresolved += 1;
                        extra_columns.push(symbol.clone());
                        column_names.push(monomial.clone());
                        Expr::Symbol(symbol)
                    }
                };
                lookup.insert(monomial.clone(), value);
            }
            debug!(
                party = idx,
                prefix = %prefix,
                monomials = monomials.len(),
                unresolved,
                "generated party columns"
            );
        }
        lookup.insert(Monomial::identity(), Expr::one());
        columns.push(PartyColumns { lookup });
    }

    // Right-hand side of a constraint without the leading column factor.
    let factorized = |factors: &[Monomial]| -> Result<Expr, NlocError> {
        let mut item = Expr::one();
        for (idx, factor) in factors.iter().enumerate().take(column_parties) {
            item = &item * columns[idx].column(idx, factor)?;
        }
        if !opts.all_parties {
            let last = &factors[last_party];
            let value = moments
                .get(last)
                .cloned()
                .unwrap_or_else(|| Expr::from_monomial(last));
            item = &item * &value;
        }
        Ok(item)
    };

    let operators: Vec<Symbol> = parties.iter().flat_map(|party| flatten(party)).collect();
    let joint = get_all_monomials(&operators, &[], substitutions, 2 * level)?;
    let mut constraints = BTreeMap::new();
    let mut vacuous = 0usize;
    for monomial in joint.iter().skip(1) {
        let factors = split_by_party(monomial, &owners, parties.len())?;
        let joint_key = factors
            .iter()
            .fold(Monomial::identity(), |acc, factor| acc.product(factor));
        if monomial.degree() <= level {
            let base = factorized(&factors)?;
            let multipliers = extra_columns.iter().cloned().map(Some).chain(iter::once(None));
            for column in multipliers {
                let (key, item) = match column {
                    Some(column) => (
                        Monomial::from_symbol(column.clone()).product(&joint_key),
                        &Expr::Symbol(column) * &base,
                    ),
                    None => (joint_key.clone(), base.clone()),
                };
                if !insert_constraint(&mut constraints, key, item)? {
                    vacuous += 1;
                }
            }
        } else if factors.iter().all(|factor| factor.degree() < 2 * level) {
            let item = factorized(&factors)?;
            if !insert_constraint(&mut constraints, joint_key, item)? {
                vacuous += 1;
            }
        }
    }

    info!(
        constraints = constraints.len(),
        extra_columns = extra_columns.len(),
        joint_monomials = joint.len() - 1,
        skipped = vacuous,
        "derived factorization constraints"
    );
    Ok(FactorizationConstraints {
        constraints,
        extra_columns,
        column_names: opts.return_column_names.then_some(column_names),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_uses_first_character_lowercased() {
        let a = Monomial::from_symbol(Symbol::operator("Alice0"));
        assert_eq!(column_prefix(&a), "a_");
        let underscored = Monomial::from_symbol(Symbol::operator("_x"));
        assert_eq!(column_prefix(&underscored), "_");
    }

    #[test]
    fn split_keeps_order_within_parties() {
        let a0 = Symbol::operator("A0");
        let a1 = Symbol::operator("A1");
        let b0 = Symbol::operator("B0");
        let parties = vec![vec![vec![a0.clone()], vec![a1.clone()]], vec![vec![b0.clone()]]];
        let owners = operator_owners(&parties).unwrap();
        let monomial = Monomial::from_symbols([a1.clone(), b0.clone(), a0.clone()]);
        let factors = split_by_party(&monomial, &owners, 2).unwrap();
        assert_eq!(factors[0], Monomial::from_symbols([a1, a0]));
        assert_eq!(factors[1], Monomial::from_symbol(b0));
    }

    #[test]
    fn foreign_operators_are_rejected() {
        let parties = vec![vec![vec![Symbol::operator("A0")]]];
        let owners = operator_owners(&parties).unwrap();
        let monomial = Monomial::from_symbol(Symbol::operator("Z9"));
        let err = split_by_party(&monomial, &owners, 1).unwrap_err();
        assert_eq!(err.code(), "unknown-operator");
    }

    #[test]
    fn shared_operators_are_rejected() {
        let shared = Symbol::operator("S");
        let parties = vec![vec![vec![shared.clone()]], vec![vec![shared]]];
        assert_eq!(operator_owners(&parties).unwrap_err().code(), "duplicate-operator");
    }
}
