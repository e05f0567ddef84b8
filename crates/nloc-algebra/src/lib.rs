#![deny(missing_docs)]
#![doc = "Symbolic substrate for n-locality scalar extensions: operator symbols, non-commutative monomials, tagged expressions, substitution rules and monomial enumeration."]

/// Monomial enumeration up to a given degree.
pub mod enumerate;
/// Tagged algebraic expressions with canonical arithmetic.
pub mod expr;
/// Variable, operator and measurement generators.
pub mod generate;
/// Canonical hashing helpers.
pub mod hash;
/// Ordered products of symbols.
pub mod monomial;
/// Canonical JSON helpers.
pub mod serde;
/// Algebraic rewrite rules.
pub mod substitutions;
/// Atomic symbols and name lookup.
pub mod symbol;

pub use enumerate::{flatten, get_all_monomials, get_monomials};
pub use expr::Expr;
pub use generate::{
    generate_measurements, generate_operators, generate_variables,
    projective_measurement_constraints, Measurement, Party,
};
pub use hash::stable_hash_string;
pub use monomial::Monomial;
pub use num_complex::Complex64;
pub use self::serde::{from_json_slice, to_canonical_json_bytes, to_canonical_json_pretty};
pub use substitutions::{Replacement, Substitutions};
pub use symbol::{Symbol, SymbolTable};
