use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use nloc_algebra::{
    generate_measurements, projective_measurement_constraints, Expr, Monomial, Party,
    Substitutions, SymbolTable,
};
use nloc_core::{ErrorInfo, NlocError, NlocResult};
use nloc_relax::{FactorizationOpts, Moments, RelaxOpts};
use serde::{Deserialize, Serialize};

fn config_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

fn invalid(message: impl Into<String>) -> NlocError {
    NlocError::Config(config_error("invalid-config", message))
}

/// YAML description of one n-locality scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Relaxation level of the moment matrix.
    #[serde(default = "default_level")]
    pub level: usize,
    /// Noise tolerance for the moment cleaner.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Generate extra columns for the last party as well.
    #[serde(default)]
    pub all_parties: bool,
    /// Record the monomial behind every extra column.
    #[serde(default)]
    pub return_column_names: bool,
    /// Rewrite rules applied during enumeration.
    #[serde(default)]
    pub substitutions: SubstitutionPolicy,
    /// Parties in causal order.
    pub parties: Vec<PartyConfig>,
    /// Known moments keyed by monomial text such as `A0*B0`.
    #[serde(default)]
    pub moments: BTreeMap<String, MomentValue>,
}

fn default_level() -> usize {
    1
}

fn default_tolerance() -> f64 {
    1e-9
}

/// Which rewrite rules to derive from the party structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubstitutionPolicy {
    /// Idempotent, orthogonal projectors commuting across parties.
    #[default]
    Projective,
    /// Free non-commuting operators.
    None,
}

/// One party: a label and the number of outcomes of each of its measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyConfig {
    /// Operator name prefix, e.g. `A` for operators `A0`, `A1`.
    pub label: String,
    /// Outcome count per measurement.
    pub outcomes: Vec<usize>,
}

/// A known expectation value, either real or `{ re, im }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MomentValue {
    /// Real value.
    Real(f64),
    /// Complex value, possibly carrying numerical noise.
    Complex {
        /// Real part.
        re: f64,
        /// Imaginary part.
        #[serde(default)]
        im: f64,
    },
}

impl MomentValue {
    fn to_expr(self) -> Expr {
        match self {
            MomentValue::Real(value) => Expr::real(value),
            MomentValue::Complex { re, im } => Expr::complex(re, im),
        }
    }
}

/// Inputs for the relaxation routines resolved from a [`ScenarioConfig`].
#[derive(Debug, Clone)]
pub struct Scenario {
    pub parties: Vec<Party>,
    pub substitutions: Substitutions,
    /// Known moments keyed by their normal form.
    pub moments: Moments,
    pub opts: RelaxOpts,
}

/// Reads and validates a scenario file.
pub fn load_config(path: &Path) -> NlocResult<ScenarioConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        NlocError::Config(
            config_error("io", err.to_string()).with_context("path", path.display().to_string()),
        )
    })?;
    let config: ScenarioConfig = serde_yaml::from_str(&contents).map_err(|err| {
        NlocError::Config(
            config_error("invalid-config", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    config.validate()?;
    Ok(config)
}

fn valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    chars.next().is_some_and(|head| head.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

impl ScenarioConfig {
    /// Checks the structural constraints serde cannot express.
    pub fn validate(&self) -> NlocResult<()> {
        if self.level == 0 {
            return Err(invalid("level must be at least 1"));
        }
        if !(self.tolerance > 0.0) {
            return Err(invalid("tolerance must be positive"));
        }
        if self.parties.is_empty() {
            return Err(invalid("at least one party is required"));
        }
        let mut labels = BTreeSet::new();
        for party in &self.parties {
            if !valid_label(&party.label) {
                return Err(NlocError::Config(
                    config_error("invalid-config", "party labels must be identifiers")
                        .with_context("label", party.label.clone()),
                ));
            }
            if !labels.insert(party.label.as_str()) {
                return Err(NlocError::Config(
                    config_error("invalid-config", "party labels must be unique")
                        .with_context("label", party.label.clone()),
                ));
            }
            if party.outcomes.is_empty() || party.outcomes.iter().any(|&count| count < 2) {
                return Err(NlocError::Config(
                    config_error("invalid-config", "every measurement needs at least two outcomes")
                        .with_context("label", party.label.clone()),
                ));
            }
        }
        Ok(())
    }

    /// Generates the operators, rewrite rules and moments described by the file.
    ///
    /// Moment keys are brought to normal form with the rewrite rules, so
    /// `B0*A0` and `A0*B0` name the same moment under projective rules.
    pub fn build(&self, created_at: Option<String>) -> NlocResult<Scenario> {
        let parties: Vec<Party> = self
            .parties
            .iter()
            .map(|party| generate_measurements(&party.outcomes, &party.label))
            .collect();
        let table = SymbolTable::from_symbols(parties.iter().flatten().flatten());
        let substitutions = match self.substitutions {
            SubstitutionPolicy::Projective => projective_measurement_constraints(&parties)?,
            SubstitutionPolicy::None => Substitutions::new(),
        };
        let mut moments = Moments::new();
        for (text, value) in &self.moments {
            let parsed = Monomial::parse(text, &table)?;
            let Some(monomial) = substitutions.reduce(&parsed)? else {
                return Err(NlocError::Config(
                    config_error("invalid-config", "moment of a vanishing product")
                        .with_context("monomial", text.clone()),
                ));
            };
            if moments.insert(monomial, value.to_expr()).is_some() {
                return Err(NlocError::Config(
                    config_error("invalid-config", "moment listed twice")
                        .with_context("monomial", text.clone()),
                ));
            }
        }
        Ok(Scenario {
            parties,
            substitutions,
            moments,
            opts: RelaxOpts {
                level: self.level,
                tolerance: self.tolerance,
                factorization: FactorizationOpts {
                    all_parties: self.all_parties,
                    return_column_names: self.return_column_names,
                },
                created_at,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL: &str = r#"
level: 1
return_column_names: true
parties:
  - label: A
    outcomes: [2, 2]
  - label: B
    outcomes: [2]
moments:
  A0: 0.5
  "B0 * A0": { re: 0.25, im: 1.0e-12 }
"#;

    #[test]
    fn parses_defaults_and_moments() {
        let config: ScenarioConfig = serde_yaml::from_str(BELL).unwrap();
        assert_eq!(config.tolerance, 1e-9);
        assert_eq!(config.substitutions, SubstitutionPolicy::Projective);
        assert!(!config.all_parties);
        config.validate().unwrap();

        let scenario = config.build(None).unwrap();
        assert_eq!(scenario.parties.len(), 2);
        assert_eq!(scenario.parties.iter().flatten().flatten().count(), 3);
        assert_eq!(scenario.substitutions.len(), 5);
        let texts: Vec<String> = scenario.moments.keys().map(ToString::to_string).collect();
        assert_eq!(texts, ["A0", "A0*B0"]);
        assert!(scenario.opts.factorization.return_column_names);
    }

    #[test]
    fn rejects_bad_structure() {
        let mut config: ScenarioConfig = serde_yaml::from_str(BELL).unwrap();
        config.parties[1].outcomes = vec![1];
        assert_eq!(config.validate().unwrap_err().code(), "invalid-config");

        let mut config: ScenarioConfig = serde_yaml::from_str(BELL).unwrap();
        config.parties[1].label = "A".into();
        assert_eq!(config.validate().unwrap_err().code(), "invalid-config");

        let mut config: ScenarioConfig = serde_yaml::from_str(BELL).unwrap();
        config.tolerance = 0.0;
        assert_eq!(config.validate().unwrap_err().code(), "invalid-config");
    }

    #[test]
    fn unknown_moment_operator_fails() {
        let mut config: ScenarioConfig = serde_yaml::from_str(BELL).unwrap();
        config.moments.insert("C0".into(), MomentValue::Real(0.1));
        assert_eq!(config.build(None).unwrap_err().code(), "unknown-symbol");
    }
}
