#![deny(missing_docs)]
#![doc = "Scalar-extension helpers for n-locality SDP relaxations: moment cleaning, factorization constraints and extra-column moments."]

mod extracols;
mod factorization;
mod moments;
mod report;
mod serde;

pub use extracols::get_moments_extracols;
pub use factorization::{
    get_factorization_constraints, FactorizationConstraints, FactorizationOpts,
};
pub use moments::{fix_moments, CleanSummary, Moments};
pub use report::{
    build_report, MomentRecord, RelaxOpts, RelaxationReport, ReportSummary,
    REPORT_SCHEMA_VERSION,
};
pub use self::serde::{from_bytes, report_from_json, report_to_json, to_bytes};
