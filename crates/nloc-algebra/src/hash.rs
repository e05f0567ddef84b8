use nloc_core::errors::NlocError;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::serde::to_canonical_json_bytes;

/// Hex encoded SHA-256 of the canonical JSON encoding of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, NlocError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(format!("{:x}", Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn hash_ignores_map_insertion_order() {
        let mut first = HashMap::new();
        first.insert("A0", 0.5);
        first.insert("B0", 0.25);
        let second: BTreeMap<_, _> = [("B0", 0.25), ("A0", 0.5)].into_iter().collect();
        assert_eq!(
            stable_hash_string(&first).unwrap(),
            stable_hash_string(&second).unwrap()
        );
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        assert_eq!(
            stable_hash_string(&vec![-0.0_f64]).unwrap(),
            stable_hash_string(&vec![0.0_f64]).unwrap()
        );
    }
}
