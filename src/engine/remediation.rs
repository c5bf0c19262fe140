use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::models::{CheckStatus, DependencyChain, DiagnosticReport, ReportId};

use super::error::{EngineError, FixRejection};

/// Records which report entries have been fixed.
///
/// Keyed by report identity and index. Every evaluation starts a new
/// identity, so old fixes never carry over to a re-run. A fix flips
/// exactly one entry; downstream entries are left for the next evaluation
/// to recompute.
///
/// Entries are kept until [`clear`](Self::clear) is called for their
/// lineage. Long-lived callers clear a report once it is replaced or no
/// longer offered for fixing.
#[derive(Debug, Default)]
pub struct RemediationLedger {
    fixed: Mutex<BTreeMap<ReportId, BTreeSet<usize>>>,
}

impl RemediationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<ReportId, BTreeSet<usize>>> {
        // A panicking holder cannot leave a half-written index set behind
        self.fixed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fix entry `index` of `report`, returning the updated report.
    ///
    /// The check and the ledger write happen under one lock, so two callers
    /// racing on the same entry see exactly one success.
    pub fn apply_fix(
        &self,
        report: &DiagnosticReport,
        index: usize,
    ) -> Result<DiagnosticReport, EngineError> {
        let result = report.get(index).ok_or_else(|| {
            EngineError::invalid_fix(index, FixRejection::OutOfRange { len: report.len() })
        })?;

        if result.fixed {
            warn!("Rejected fix for {}#{}: already fixed", report.id(), index);
            return Err(EngineError::invalid_fix(index, FixRejection::AlreadyFixed));
        }

        if result.status != CheckStatus::Fail {
            warn!("Rejected fix for {}#{}: status {}", report.id(), index, result.status);
            return Err(EngineError::invalid_fix(
                index,
                FixRejection::NotFailing {
                    status: result.status,
                },
            ));
        }

        if !result.fixable {
            warn!("Rejected fix for {}#{}: not fixable", report.id(), index);
            return Err(EngineError::invalid_fix(index, FixRejection::NotFixable));
        }

        let mut entries = self.entries();
        let fixed = entries.entry(report.id().clone()).or_default();
        if !fixed.insert(index) {
            warn!("Rejected fix for {}#{}: already fixed", report.id(), index);
            return Err(EngineError::invalid_fix(index, FixRejection::AlreadyFixed));
        }
        drop(entries);

        info!("Applied fix to {}#{} ({})", report.id(), index, result.step);
        Ok(report.with_fixed(index))
    }

    /// Chain form of [`apply_fix`](Self::apply_fix)
    pub fn apply_chain_fix(
        &self,
        chain: &DependencyChain,
        index: usize,
    ) -> Result<DependencyChain, EngineError> {
        let report = self.apply_fix(chain.report(), index)?;
        Ok(DependencyChain::new(chain.widget_id().to_string(), report))
    }

    pub fn is_fixed(&self, report: &DiagnosticReport, index: usize) -> bool {
        self.entries()
            .get(report.id())
            .is_some_and(|set| set.contains(&index))
    }

    /// Indices fixed so far for this report lineage, ascending
    pub fn fixed_indices(&self, report: &DiagnosticReport) -> Vec<usize> {
        self.entries()
            .get(report.id())
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Forget every fix recorded for this report lineage
    pub fn clear(&self, report: &DiagnosticReport) {
        self.entries().remove(report.id());
    }

    /// Number of report lineages with recorded fixes
    pub fn lineages(&self) -> usize {
        self.entries().len()
    }
}
