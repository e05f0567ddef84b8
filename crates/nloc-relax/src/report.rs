use std::collections::BTreeMap;

use nloc_algebra::{stable_hash_string, Expr, Monomial, Party, Substitutions, Symbol};
use nloc_core::{NlocError, RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extracols::get_moments_extracols;
use crate::factorization::{get_factorization_constraints, FactorizationOpts};
use crate::moments::{fix_moments, CleanSummary, Moments};

/// Schema version stamped on every [`RelaxationReport`].
pub const REPORT_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 0, 0);

fn default_level() -> usize {
    1
}

fn default_tolerance() -> f64 {
    1e-9
}

/// Options for [`build_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxOpts {
    /// Relaxation level of the moment matrix.
    #[serde(default = "default_level")]
    pub level: usize,
    /// Noise tolerance handed to the moment cleaner.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Factorization builder options.
    #[serde(default)]
    pub factorization: FactorizationOpts,
    /// Timestamp recorded in the provenance; left empty when absent so that
    /// repeated runs hash identically.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Default for RelaxOpts {
    fn default() -> Self {
        Self {
            level: default_level(),
            tolerance: default_tolerance(),
            factorization: FactorizationOpts::default(),
            created_at: None,
        }
    }
}

/// One `monomial -> value` entry, with display text for human readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentRecord {
    /// Monomial side of the entry.
    pub key: Monomial,
    /// Value side of the entry.
    pub value: Expr,
    /// Rendered monomial, e.g. `a_*B0`.
    pub key_text: String,
    /// Rendered value, e.g. `0.5*a_`.
    pub value_text: String,
}

impl MomentRecord {
    /// Captures one entry together with its rendered text.
    pub fn new(key: &Monomial, value: &Expr) -> Self {
        Self {
            key: key.clone(),
            value: value.clone(),
            key_text: key.to_string(),
            value_text: value.to_string(),
        }
    }
}

fn records(map: &BTreeMap<Monomial, Expr>) -> Vec<MomentRecord> {
    map.iter()
        .map(|(key, value)| MomentRecord::new(key, value))
        .collect()
}

/// Aggregate counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of known moments after cleaning.
    pub moments: usize,
    /// Number of factorization constraints.
    pub constraints: usize,
    /// Number of extra columns introduced.
    pub extra_columns: usize,
    /// Number of extra-column moments.
    pub extracol_moments: usize,
}

/// Everything derived from one scenario: cleaned moments, factorization
/// constraints, extra columns and their moments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationReport {
    /// Schema version of this payload.
    pub schema_version: SchemaVersion,
    /// Hashes and options of the run.
    pub provenance: RunProvenance,
    /// Factorization options the constraints were built with.
    pub factorization: FactorizationOpts,
    /// Tolerance applied by the cleaner.
    pub tolerance: f64,
    /// Cleaner counters.
    pub clean: CleanSummary,
    /// Known moments after cleaning, in monomial order.
    pub moments: Vec<MomentRecord>,
    /// Factorization constraints, in monomial order.
    pub constraints: Vec<MomentRecord>,
    /// Extra column symbols in creation order.
    pub extra_columns: Vec<Symbol>,
    /// Monomial behind each extra column, when requested.
    pub column_names: Option<Vec<Monomial>>,
    /// Known moments multiplied by every extra column.
    pub extracol_moments: Vec<MomentRecord>,
    /// Aggregate counts.
    pub summary: ReportSummary,
    /// SHA-256 of the canonical JSON of the report with this field and
    /// `provenance.created_at` blank.
    pub report_hash: String,
}

impl RelaxationReport {
    /// Recomputes the content hash the report should carry.
    pub fn compute_hash(&self) -> Result<String, NlocError> {
        let mut unstamped = self.clone();
        unstamped.report_hash = String::new();
        unstamped.provenance.created_at = String::new();
        stable_hash_string(&unstamped)
    }

    /// Cleaned moments as a map.
    pub fn moments_map(&self) -> Moments {
        self.moments
            .iter()
            .map(|record| (record.key.clone(), record.value.clone()))
            .collect()
    }

    /// Factorization constraints as a map.
    pub fn constraints_map(&self) -> BTreeMap<Monomial, Expr> {
        self.constraints
            .iter()
            .map(|record| (record.key.clone(), record.value.clone()))
            .collect()
    }
}

#[derive(Serialize)]
struct InputDigest<'a> {
    parties: &'a [Party],
    moments: Vec<(&'a Monomial, &'a Expr)>,
    level: usize,
    tolerance: f64,
    factorization: FactorizationOpts,
}

fn make_provenance(
    parties: &[Party],
    moments: &Moments,
    substitutions: &Substitutions,
    opts: &RelaxOpts,
) -> Result<RunProvenance, NlocError> {
    let digest = InputDigest {
        parties,
        moments: moments.iter().collect(),
        level: opts.level,
        tolerance: opts.tolerance,
        factorization: opts.factorization,
    };
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "nloc-relax".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        input_hash: stable_hash_string(&digest)?,
        substitutions_hash: stable_hash_string(substitutions)?,
        level: opts.level,
        created_at: opts.created_at.clone().unwrap_or_default(),
        tool_versions,
    })
}

/// Runs the cleaner, the factorization builder and the extra-column expander
/// on one scenario and bundles their outputs.
///
/// `moments` is copied before cleaning; the caller's map is not modified.
pub fn build_report(
    parties: &[Party],
    moments: &Moments,
    substitutions: &Substitutions,
    opts: &RelaxOpts,
) -> Result<RelaxationReport, NlocError> {
    let provenance = make_provenance(parties, moments, substitutions, opts)?;

    let mut cleaned = moments.clone();
    let clean = fix_moments(&mut cleaned, opts.tolerance)?;
    let built = get_factorization_constraints(
        parties,
        &cleaned,
        substitutions,
        opts.level,
        opts.factorization,
    )?;
    let extracol_moments = get_moments_extracols(&cleaned, &built.extra_columns)?;

    let summary = ReportSummary {
        moments: cleaned.len(),
        constraints: built.constraints.len(),
        extra_columns: built.extra_columns.len(),
        extracol_moments: extracol_moments.len(),
    };
    let mut report = RelaxationReport {
        schema_version: REPORT_SCHEMA_VERSION,
        provenance,
        factorization: opts.factorization,
        tolerance: opts.tolerance,
        clean,
        moments: records(&cleaned),
        constraints: records(&built.constraints),
        extra_columns: built.extra_columns,
        column_names: built.column_names,
        extracol_moments: records(&extracol_moments),
        summary,
        report_hash: String::new(),
    };
    report.report_hash = report.compute_hash()?;

    info!(
        moments = summary.moments,
        constraints = summary.constraints,
        extra_columns = summary.extra_columns,
        report_hash = %report.report_hash,
        "built relaxation report"
    );
    Ok(report)
}
