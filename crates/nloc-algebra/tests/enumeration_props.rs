use std::collections::BTreeSet;

use nloc_algebra::{
    flatten, generate_measurements, get_all_monomials, get_monomials,
    projective_measurement_constraints, Monomial,
};
use proptest::prelude::*;

fn outcome_lists() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(2usize..4, 1..3), 1..3)
}

proptest! {
    #[test]
    fn reduced_enumeration_is_unique_and_irreducible(outcomes in outcome_lists(), degree in 1usize..4) {
        let parties: Vec<_> = outcomes
            .iter()
            .enumerate()
            .map(|(idx, party)| generate_measurements(party, &((b'A' + idx as u8) as char).to_string()))
            .collect();
        let subs = projective_measurement_constraints(&parties).unwrap();
        let operators = flatten(&parties.iter().map(|party| flatten(party)).collect::<Vec<_>>());
        let monomials = get_all_monomials(&operators, &[], &subs, degree).unwrap();

        prop_assert!(monomials[0].is_identity());
        let distinct: BTreeSet<&Monomial> = monomials.iter().collect();
        prop_assert_eq!(distinct.len(), monomials.len());
        for monomial in &monomials {
            prop_assert!(monomial.degree() <= degree);
            let reduced = subs.reduce(monomial).unwrap();
            prop_assert_eq!(reduced.as_ref(), Some(monomial));
        }
    }

    #[test]
    fn raw_enumeration_counts_all_words(count in 1usize..4, degree in 1usize..4) {
        let operators = nloc_algebra::generate_operators("X", count);
        let expected: usize = (0..=degree).map(|d| count.pow(d as u32)).sum();
        prop_assert_eq!(get_monomials(&operators, degree).len(), expected);
    }
}
