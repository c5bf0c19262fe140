//! Deterministic diagnostic evaluation.
//!
//! Every check is a plain function of a borrowed [`Context`]. A pass runs
//! each check in declaration order and records every result; nothing is
//! skipped because an earlier check failed.
//!
//! # Module Structure
//!
//! - `checks`: System check library (store, theme, embed, widget, zone)
//! - `chain`: Five-stage widget-visibility chain
//! - `audience`: Shopper visibility decision list
//! - `remediation`: Instant-fix ledger
//! - `error`: Rejected engine operations

mod audience;
mod chain;
mod checks;
mod error;
mod remediation;

pub use audience::AudienceSimulator;
pub use chain::DependencyChainBuilder;
pub use checks::SystemChecklist;
pub use error::{EngineError, FixRejection};
pub use remediation::RemediationLedger;

use tracing::debug;

use crate::models::{CheckResult, Context, DiagnosticReport};

// ============================================================================
// Check
// ============================================================================

/// A single evaluable rule.
///
/// `run` must not panic for any well-formed Context; missing optional data
/// is reported through the returned result instead.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&Context) -> CheckResult,
}

impl Check {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        run: fn(&Context) -> CheckResult,
    ) -> Self {
        Self {
            name,
            description,
            run,
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Run `checks` in order against `ctx`.
///
/// Results keep declaration order. The same inputs always give an
/// identical report.
pub fn evaluate(checks: &[Check], ctx: &Context) -> DiagnosticReport {
    let results = checks
        .iter()
        .map(|check| {
            let result = (check.run)(ctx);
            debug!(
                "check {} -> {} ({})",
                check.name, result.status, result.detail
            );
            result
        })
        .collect();

    DiagnosticReport::new(results)
}
