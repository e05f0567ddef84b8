use nloc_core::NlocError;

use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::substitutions::Substitutions;
use crate::symbol::Symbol;

/// Projector symbols of one measurement (one per outcome but the last).
pub type Measurement = Vec<Symbol>;

/// Measurements available to one spacelike-separated party.
pub type Party = Vec<Measurement>;

fn indexed_names(prefix: &str, count: usize) -> Vec<String> {
    if count == 1 {
        return vec![prefix.to_string()];
    }
    (0..count).map(|idx| format!("{prefix}{idx}")).collect()
}

/// `count` fresh commuting real symbols named `prefix0 ..`, or just `prefix`
/// when a single symbol is requested.
pub fn generate_variables(prefix: &str, count: usize) -> Vec<Symbol> {
    indexed_names(prefix, count)
        .into_iter()
        .map(Symbol::commuting)
        .collect()
}

/// Non-commuting Hermitian operators, named like [`generate_variables`].
pub fn generate_operators(name: &str, count: usize) -> Vec<Symbol> {
    indexed_names(name, count)
        .into_iter()
        .map(Symbol::operator)
        .collect()
}

/// Projectors for a party whose `i`-th measurement has `outcomes[i]` outcomes.
///
/// The last outcome of every measurement is left implicit, so measurement
/// `i` contributes `outcomes[i] - 1` operators named from `label` and `i`.
pub fn generate_measurements(outcomes: &[usize], label: &str) -> Party {
    outcomes
        .iter()
        .enumerate()
        .map(|(idx, &count)| generate_operators(&format!("{label}{idx}"), count.saturating_sub(1)))
        .collect()
}

/// Rewrite rules for projective measurements.
///
/// Every projector is idempotent, distinct projectors of one measurement are
/// orthogonal, and projectors of different parties commute, with the earlier
/// party written first.
pub fn projective_measurement_constraints(parties: &[Party]) -> Result<Substitutions, NlocError> {
    let mut substitutions = Substitutions::new();
    for party in parties {
        for measurement in party {
            for first in measurement {
                for second in measurement {
                    if first == second {
                        substitutions.insert(
                            Monomial::from_symbols([first.clone(), first.clone()]),
                            Expr::Symbol(first.clone()),
                        )?;
                    } else {
                        substitutions.insert(
                            Monomial::from_symbols([first.clone(), second.clone()]),
                            Expr::zero(),
                        )?;
                        substitutions.insert(
                            Monomial::from_symbols([second.clone(), first.clone()]),
                            Expr::zero(),
                        )?;
                    }
                }
            }
        }
    }
    for (idx, earlier) in parties.iter().enumerate() {
        for later in &parties[idx + 1..] {
            for earlier_projector in earlier.iter().flatten() {
                for later_projector in later.iter().flatten() {
                    substitutions.insert(
                        Monomial::from_symbols([later_projector.clone(), earlier_projector.clone()]),
                        Expr::from(Monomial::from_symbols([
                            earlier_projector.clone(),
                            later_projector.clone(),
                        ])),
                    )?;
                }
            }
        }
    }
    Ok(substitutions)
}
