use std::collections::btree_map::Entry;

use nloc_algebra::{Expr, Monomial, Symbol};
use nloc_core::{ErrorInfo, NlocError};
use tracing::debug;

use crate::moments::Moments;

/// Moments of the extended matrix: every known moment multiplied by every
/// extra column, `<m> * z` keyed by the monomial `m*z`.
///
/// Inputs are left untouched. Two pairs that land on the same monomial must
/// agree on the value; otherwise the call fails with `extracol-collision`
/// instead of letting one overwrite the other.
pub fn get_moments_extracols(
    moments: &Moments,
    extra_columns: &[Symbol],
) -> Result<Moments, NlocError> {
    let mut extended = Moments::new();
    let mut repeated = 0usize;
    for (monomial, value) in moments {
        for column in extra_columns {
            let key = monomial.product(&Monomial::from_symbol(column.clone()));
            let item = value * &Expr::Symbol(column.clone());
            match extended.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
                Entry::Occupied(existing) => {
                    if !existing.get().algebraic_eq(&item) {
                        return Err(NlocError::Moment(
                            ErrorInfo::new(
                                "extracol-collision",
                                "two moment and column pairs give the same product",
                            )
                            .with_context("monomial", existing.key().to_string())
                            .with_context("existing", existing.get().to_string())
                            .with_context("new", item.to_string())
                            .with_hint("extra columns must be distinct from the moment symbols"),
                        ));
                    }
                    repeated += 1;
                }
            }
        }
    }
    debug!(
        moments = moments.len(),
        extra_columns = extra_columns.len(),
        entries = extended.len(),
        repeated,
        "expanded moments over extra columns"
    );
    Ok(extended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_each_moment_by_each_column() {
        let a = Symbol::operator("A");
        let c = Symbol::commuting("c");
        let mut moments = Moments::new();
        moments.insert(Monomial::from_symbol(a), Expr::real(0.5));
        let extended = get_moments_extracols(&moments, &[c]).unwrap();
        assert_eq!(extended.len(), 1);
        let (key, value) = extended.iter().next().unwrap();
        assert_eq!(key.to_string(), "c*A");
        assert_eq!(value.to_string(), "0.5*c");
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        let mut moments = Moments::new();
        assert!(get_moments_extracols(&moments, &[Symbol::commuting("c")]).unwrap().is_empty());
        moments.insert(Monomial::from_symbol(Symbol::operator("A")), Expr::real(0.5));
        assert!(get_moments_extracols(&moments, &[]).unwrap().is_empty());
    }

    #[test]
    fn conflicting_products_are_rejected() {
        let c = Symbol::commuting("c");
        let d = Symbol::commuting("d");
        let mut moments = Moments::new();
        // c * d == d * c, but the values differ.
        moments.insert(Monomial::from_symbol(c.clone()), Expr::real(1.0));
        moments.insert(Monomial::from_symbol(d.clone()), Expr::real(2.0));
        let err = get_moments_extracols(&moments, &[c, d]).unwrap_err();
        assert_eq!(err.code(), "extracol-collision");
    }
}
