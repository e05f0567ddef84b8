#![deny(missing_docs)]
#![doc = "Error and provenance types shared by the nloc scalar-extension crates."]

pub mod errors;
pub mod provenance;

pub use errors::{ErrorInfo, NlocError};
pub use provenance::{RunProvenance, SchemaVersion};

/// Convenience alias used throughout the workspace.
pub type NlocResult<T> = Result<T, NlocError>;
