use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::context::Context;

// ============================================================================
// Check Status
// ============================================================================

/// Outcome of a single check.
///
/// Variants are declared in ascending severity so `Ord` gives
/// `Pass < Warning < Fail`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Warning => write!(f, "warning"),
            CheckStatus::Fail => write!(f, "fail"),
        }
    }
}

// ============================================================================
// Remediation ("instant fix")
// ============================================================================

/// Automated fix a failing check can offer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remediation {
    EnableAppEmbed,
    EnableCart,
    InjectZone { zone: String },
    VerifyThemeIntegration,
}

impl Remediation {
    /// Detail recorded on the check once the fix has been applied
    pub fn fixed_detail(&self) -> String {
        match self {
            Remediation::EnableAppEmbed => "App Embed enabled automatically".to_string(),
            Remediation::EnableCart => "Cart drawer re-enabled automatically".to_string(),
            Remediation::InjectZone { zone } => {
                format!("App block for zone '{}' injected into theme.liquid", zone)
            }
            Remediation::VerifyThemeIntegration => {
                "App Block verified in published theme".to_string()
            }
        }
    }

    /// Produce the Context the store would have after this fix.
    ///
    /// The input is never modified.
    pub fn apply(&self, ctx: &Context) -> Context {
        let mut next = ctx.clone();
        match self {
            Remediation::EnableAppEmbed => next.store.app_embed_enabled = true,
            Remediation::EnableCart => next.store.cart_enabled = true,
            Remediation::InjectZone { zone } => {
                next.store.theme_zones.insert(zone.clone());
            }
            Remediation::VerifyThemeIntegration => next.store.theme_integration_verified = true,
        }
        next
    }
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of evaluating one check against a Context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Step name shown in the causal narrative (e.g., "Campaign", "App Embed")
    pub step: String,
    /// Short subject of the step (campaign name, zone id, theme name)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub status: CheckStatus,
    pub detail: String,
    /// Whether an instant fix is offered
    pub fixable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
    /// Set once a fix has been applied to this entry
    #[serde(default)]
    pub fixed: bool,
}

impl CheckResult {
    fn new(step: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            label: String::new(),
            status,
            detail: detail.into(),
            fixable: false,
            remediation: None,
            fixed: false,
        }
    }

    pub fn pass(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(step, CheckStatus::Pass, detail)
    }

    pub fn warning(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(step, CheckStatus::Warning, detail)
    }

    pub fn fail(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(step, CheckStatus::Fail, detail)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Attach an instant fix. Only failing results can be fixed, so this is
    /// ignored for pass/warning results.
    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        if self.status == CheckStatus::Fail {
            self.fixable = true;
            self.remediation = Some(remediation);
        }
        self
    }

    /// The entry as it reads after its fix has been applied
    pub(crate) fn into_fixed(self) -> Self {
        let detail = self
            .remediation
            .as_ref()
            .map(Remediation::fixed_detail)
            .unwrap_or_else(|| self.detail.clone());
        Self {
            status: CheckStatus::Pass,
            detail,
            fixed: true,
            ..self
        }
    }
}

// ============================================================================
// Diagnostic Report
// ============================================================================

static NEXT_LINEAGE: AtomicU64 = AtomicU64::new(1);

/// Short SHA-256 digest of a result sequence (16 hex chars)
fn content_fingerprint(results: &[CheckResult]) -> String {
    let mut hasher = Sha256::new();
    for r in results {
        hasher.update(r.step.as_bytes());
        hasher.update([0u8]);
        hasher.update(r.label.as_bytes());
        hasher.update([0u8]);
        hasher.update(r.status.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(r.detail.as_bytes());
        hasher.update([u8::from(r.fixable), u8::from(r.fixed), 0xff]);
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Identity of a report lineage.
///
/// Minted once per evaluation: the content fingerprint plus a process-wide
/// sequence number, so two reports with equal content never share an id.
/// Fixed copies keep the id of the report they came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    fn mint(results: &[CheckResult]) -> Self {
        let seq = NEXT_LINEAGE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{:06x}", content_fingerprint(results), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered results of one evaluation pass, in evaluation order.
///
/// Reports are never edited in place; a fix yields a new report that keeps
/// the identity of the report it was derived from.
///
/// Equality compares results only. Two evaluations of the same Context are
/// equal even though each starts its own lineage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    id: ReportId,
    results: Vec<CheckResult>,
}

impl PartialEq for DiagnosticReport {
    fn eq(&self, other: &Self) -> bool {
        self.results == other.results
    }
}

impl DiagnosticReport {
    /// Wrap freshly evaluated results in a new lineage
    pub fn new(results: Vec<CheckResult>) -> Self {
        Self {
            id: ReportId::mint(&results),
            results,
        }
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    /// Content digest of the results, stable across evaluations
    pub fn fingerprint(&self) -> String {
        content_fingerprint(&self.results)
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn get(&self, index: usize) -> Option<&CheckResult> {
        self.results.get(index)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Worst status across all results (`Pass` for an empty report)
    pub fn severity(&self) -> CheckStatus {
        self.results
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or(CheckStatus::Pass)
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status == CheckStatus::Fail)
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Copy of this report with `index` replaced by its fixed form
    pub(crate) fn with_fixed(&self, index: usize) -> Self {
        let results = self
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| if i == index { r.clone().into_fixed() } else { r.clone() })
            .collect();
        Self {
            id: self.id.clone(),
            results,
        }
    }
}

// ============================================================================
// Dependency Chain
// ============================================================================

/// The five widget-visibility stages, in evaluation order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    Campaign,
    Experience,
    Audience,
    Zone,
    Theme,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Campaign,
        Stage::Experience,
        Stage::Audience,
        Stage::Zone,
        Stage::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Campaign => "Campaign",
            Stage::Experience => "Experience",
            Stage::Audience => "Audience",
            Stage::Zone => "Zone",
            Stage::Theme => "Theme",
        }
    }

    /// Position of this stage in a chain
    pub fn index(&self) -> usize {
        match self {
            Stage::Campaign => 0,
            Stage::Experience => 1,
            Stage::Audience => 2,
            Stage::Zone => 3,
            Stage::Theme => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget-visibility trace: one result per [`Stage`], always all five
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyChain {
    widget_id: String,
    report: DiagnosticReport,
}

impl DependencyChain {
    pub(crate) fn new(widget_id: String, report: DiagnosticReport) -> Self {
        Self { widget_id, report }
    }

    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    pub fn report(&self) -> &DiagnosticReport {
        &self.report
    }

    pub fn into_report(self) -> DiagnosticReport {
        self.report
    }

    pub fn stage(&self, stage: Stage) -> Option<&CheckResult> {
        self.report.get(stage.index())
    }

    pub fn statuses(&self) -> Vec<CheckStatus> {
        self.report.results().iter().map(|r| r.status).collect()
    }
}

// ============================================================================
// Visibility Verdict
// ============================================================================

/// Would the simulated shopper see the widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityVerdict {
    pub visible: bool,
    pub reason: String,
}

impl VisibilityVerdict {
    pub fn visible(reason: impl Into<String>) -> Self {
        Self {
            visible: true,
            reason: reason.into(),
        }
    }

    pub fn hidden(reason: impl Into<String>) -> Self {
        Self {
            visible: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for VisibilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.visible { "VISIBLE" } else { "HIDDEN" };
        write!(f, "{}: {}", prefix, self.reason)
    }
}
