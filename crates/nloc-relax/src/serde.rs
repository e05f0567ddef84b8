use nloc_algebra::{from_json_slice, to_canonical_json_bytes, to_canonical_json_pretty};
use nloc_core::{ErrorInfo, NlocError};

use crate::report::RelaxationReport;

fn serde_error(code: &str, err: impl ToString) -> NlocError {
    NlocError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Encodes a report as canonical JSON, pretty printed when `pretty` is set.
pub fn report_to_json(report: &RelaxationReport, pretty: bool) -> Result<Vec<u8>, NlocError> {
    if pretty {
        to_canonical_json_pretty(report).map(String::into_bytes)
    } else {
        to_canonical_json_bytes(report)
    }
}

/// Decodes a report written by [`report_to_json`].
pub fn report_from_json(data: &[u8]) -> Result<RelaxationReport, NlocError> {
    from_json_slice(data)
}

/// Serializes a report into a compact binary blob.
pub fn to_bytes(report: &RelaxationReport) -> Result<Vec<u8>, NlocError> {
    bincode::serialize(report).map_err(|err| serde_error("bincode-serialize", err))
}

/// Rehydrates a report from [`to_bytes`] output.
pub fn from_bytes(bytes: &[u8]) -> Result<RelaxationReport, NlocError> {
    bincode::deserialize(bytes).map_err(|err| serde_error("bincode-deserialize", err))
}
