use std::collections::BTreeMap;
use std::iter::FromIterator;

use ::serde::{Deserialize, Serialize};
use nloc_core::errors::{ErrorInfo, NlocError};
use serde_json::{Map, Number, Value};

fn serde_error(code: &str, err: impl ToString) -> NlocError {
    NlocError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Sorts object keys recursively and folds `-0.0` into `0.0`, so that a moment
/// snapped to zero hashes identically regardless of the sign it carried.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, val)| (key, canonicalize(val)))
                .collect();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        Value::Number(number) => match number.as_f64() {
            Some(float) if float == 0.0 && number.is_f64() => {
                Value::Number(Number::from_f64(0.0).unwrap_or(number))
            }
            _ => Value::Number(number),
        },
        other => other,
    }
}

/// Serializes a value into canonical JSON bytes with deterministic ordering.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, NlocError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json-encode", err))?;
    serde_json::to_vec(&canonicalize(value)).map_err(|err| serde_error("json-write", err))
}

/// Serializes a value into indented canonical JSON, used for human facing artefacts.
pub fn to_canonical_json_pretty<T: Serialize>(value: &T) -> Result<String, NlocError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json-encode", err))?;
    serde_json::to_string_pretty(&canonicalize(value)).map_err(|err| serde_error("json-write", err))
}

/// Restores a value from canonical JSON bytes.
pub fn from_json_slice<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, NlocError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json-read", err))
}
