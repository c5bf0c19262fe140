//! Ticket triage: the consumer side of the diagnostic engine.
//!
//! Turns finished reports into ticket metadata and guards the ticket
//! status machine. Agents trigger every transition; the only rule
//! enforced against diagnostics is that `Critical` needs a failing check.

mod error;
mod intake;
mod store;

pub use error::{IntakeError, TriageError};
pub use intake::{DeviceScope, IntakeWizard, IssueScope, WizardStep};
pub use store::{TicketUpdate, Workspace, WorkspaceStore};

use crate::models::{CheckStatus, DiagnosticReport, TicketPriority, TicketStatus, TicketType};

/// Ticket fields collected by the intake flow, before triage
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    pub ticket_type: TicketType,
    pub priority: TicketPriority,
    pub merchant_name: String,
    pub merchant_email: Option<String>,
    pub store_url: String,
    pub issue_url: Option<String>,
    pub widget_id: Option<String>,
    pub campaign_id: Option<String>,
}

/// Confirm the requested priority against the diagnostics.
///
/// Low/Medium/High pass through; Critical needs at least one failing entry
/// in any of the reports.
pub fn finalize_priority(
    requested: TicketPriority,
    diagnostics: &[DiagnosticReport],
) -> Result<TicketPriority, TriageError> {
    if requested == TicketPriority::Critical && !diagnostics.iter().any(|r| r.has_failures()) {
        return Err(TriageError::UncorroboratedCritical(requested));
    }
    Ok(requested)
}

/// Tags for a new ticket: the type label, then the step of every failing or
/// warning entry in report order, without duplicates.
pub fn derive_tags(ticket_type: TicketType, diagnostics: &[DiagnosticReport]) -> Vec<String> {
    let mut tags = vec![ticket_type.as_str().to_string()];
    let flagged = diagnostics
        .iter()
        .flat_map(|r| r.results())
        .filter(|r| r.status != CheckStatus::Pass)
        .map(|r| r.step.as_str());

    for step in flagged {
        if !tags.iter().any(|t| t == step) {
            tags.push(step.to_string());
        }
    }
    tags
}

/// Validate an agent-triggered status change.
///
/// Any non-terminal status may move anywhere; `Resolved` is final.
pub fn transition(
    ticket_id: &str,
    from: TicketStatus,
    to: TicketStatus,
) -> Result<TicketStatus, TriageError> {
    if from == to {
        return Ok(to);
    }
    if from.is_terminal() {
        return Err(TriageError::TicketResolved {
            id: ticket_id.to_string(),
            requested: to,
        });
    }
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckResult;

    fn failing() -> DiagnosticReport {
        DiagnosticReport::new(vec![
            CheckResult::pass("Store API Connection", "Stable"),
            CheckResult::fail("App Embed", "disabled"),
            CheckResult::warning("Widget Status", "Inactive"),
        ])
    }

    fn passing() -> DiagnosticReport {
        DiagnosticReport::new(vec![CheckResult::pass("Store API Connection", "Stable")])
    }

    #[test]
    fn test_critical_requires_failure() {
        assert_eq!(
            finalize_priority(TicketPriority::Critical, &[passing()]),
            Err(TriageError::UncorroboratedCritical(TicketPriority::Critical))
        );
        assert_eq!(
            finalize_priority(TicketPriority::Critical, &[passing(), failing()]),
            Ok(TicketPriority::Critical)
        );
        assert!(finalize_priority(TicketPriority::Critical, &[]).is_err());
    }

    #[test]
    fn test_non_critical_maps_directly() {
        for p in [TicketPriority::Low, TicketPriority::Medium, TicketPriority::High] {
            assert_eq!(finalize_priority(p, &[]), Ok(p));
        }
    }

    #[test]
    fn test_tags_follow_report_order() {
        let tags = derive_tags(TicketType::Bug, &[failing(), failing()]);
        assert_eq!(tags, vec!["Bug", "App Embed", "Widget Status"]);
        assert_eq!(derive_tags(TicketType::Styling, &[passing()]), vec!["Styling"]);
    }

    #[test]
    fn test_resolved_is_terminal() {
        assert_eq!(
            transition("tkt_1", TicketStatus::Open, TicketStatus::WaitingForApproval),
            Ok(TicketStatus::WaitingForApproval)
        );
        assert_eq!(
            transition("tkt_1", TicketStatus::InReview, TicketStatus::Open),
            Ok(TicketStatus::Open)
        );
        assert!(matches!(
            transition("tkt_1", TicketStatus::Resolved, TicketStatus::Open),
            Err(TriageError::TicketResolved { .. })
        ));
        assert_eq!(
            transition("tkt_1", TicketStatus::Resolved, TicketStatus::Resolved),
            Ok(TicketStatus::Resolved)
        );
    }
}
