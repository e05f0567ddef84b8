use std::collections::BTreeMap;

use nloc_algebra::{Expr, Monomial};
use nloc_core::{ErrorInfo, NlocError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Known moments: monomial to numeric value or symbolic expression.
pub type Moments = BTreeMap<Monomial, Expr>;

/// Counts reported by [`fix_moments`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanSummary {
    /// Number of entries inspected.
    pub entries: usize,
    /// Entries whose residual imaginary part was discarded.
    pub imaginary_dropped: usize,
    /// Entries replaced by an exact zero.
    pub snapped_to_zero: usize,
}

fn moment_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Removes floating point noise from `moments` in place.
///
/// Numeric values lose an imaginary part no larger than `tolerance` and are
/// snapped to exact zero when their magnitude is below it. A symbolic value
/// with several children is zeroed when its first child is a constant below
/// `tolerance`. Only the first child is inspected: canonical sums put their
/// constant first, but a hand-built tree such as `Expr::Sum(vec![x, 1e-12])`
/// keeps its negligible constant.
///
/// Entries are processed in key order. A moment whose imaginary part exceeds
/// `tolerance` aborts the pass with `non-real-moment`, leaving earlier entries
/// already cleaned; callers should discard the map in that case.
pub fn fix_moments(moments: &mut Moments, tolerance: f64) -> Result<CleanSummary, NlocError> {
    if !(tolerance > 0.0) {
        return Err(NlocError::Moment(
            moment_error("invalid-tolerance", "the tolerance should be positive")
                .with_context("tolerance", tolerance.to_string()),
        ));
    }

    let mut summary = CleanSummary {
        entries: moments.len(),
        ..CleanSummary::default()
    };
    for (monomial, value) in moments.iter_mut() {
        if let Expr::Const(constant) = *value {
            if constant.im != 0.0 {
                if constant.im.abs() > tolerance {
                    return Err(NlocError::Moment(
                        moment_error("non-real-moment", "moment has a complex expectation value")
                            .with_context("monomial", monomial.to_string())
                            .with_context("value", value.to_string())
                            .with_context("tolerance", tolerance.to_string()),
                    ));
                }
                *value = Expr::real(constant.re);
                summary.imaginary_dropped += 1;
            }
        }

        match *value {
            Expr::Const(constant) => {
                if constant.re.abs() < tolerance {
                    if constant.re != 0.0 {
                        summary.snapped_to_zero += 1;
                    }
                    *value = Expr::zero();
                }
            }
            _ => {
                let args = value.args();
                if args.len() > 1 && args[0].is_constant() {
                    let negligible = args[0]
                        .constant_value()
                        .is_some_and(|lead| lead.norm() < tolerance);
                    if negligible {
                        *value = Expr::zero();
                        summary.snapped_to_zero += 1;
                    }
                }
            }
        }
    }

    debug!(
        entries = summary.entries,
        imaginary_dropped = summary.imaginary_dropped,
        snapped_to_zero = summary.snapped_to_zero,
        tolerance,
        "cleaned moments"
    );
    Ok(summary)
}
