//! Five-step ticket intake: Store → Scope → Triage → Evidence → Review.
//!
//! Diagnostics run when the merchant leaves the Evidence step. Instant
//! fixes offered in Review go through the remediation ledger, and the
//! final report is rendered into the ticket description.

use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{RemediationLedger, SystemChecklist};
use crate::models::{Context, DiagnosticReport, TicketPriority, TicketType};

use super::{IntakeError, TicketDraft};

const DESCRIPTION_TEMPLATE: &str = r#"**Contact:** {{ contact_name }} ({{ contact_email }})
**Context:** {{ scope }}
**Category:** {{ category }} > {{ subcategory }}
**Impact:** {{ impact }}
**Device:** {{ device }}

**Issue Description:**
{{ description }}

**System Diagnostics:**
{% for r in diagnostics -%}
[{{ r.status | upper }}] {{ r.step }}: {{ r.detail }}{% if r.fixed %} (fixed){% endif %}
{% endfor %}
**Attachments:**
{% if attachments %}{{ attachments | join(", ") }}{% else %}None{% endif %}"#;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Store,
    Scope,
    Triage,
    Evidence,
    Review,
}

impl WizardStep {
    fn next(self) -> Self {
        match self {
            WizardStep::Store => WizardStep::Scope,
            WizardStep::Scope => WizardStep::Triage,
            WizardStep::Triage => WizardStep::Evidence,
            WizardStep::Evidence | WizardStep::Review => WizardStep::Review,
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::Store | WizardStep::Scope => WizardStep::Store,
            WizardStep::Triage => WizardStep::Scope,
            WizardStep::Evidence => WizardStep::Triage,
            WizardStep::Review => WizardStep::Evidence,
        }
    }
}

/// What the issue is about
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IssueScope {
    Widget(String),
    Campaign(String),
    #[default]
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceScope {
    Desktop,
    Mobile,
    #[default]
    Both,
}

impl std::fmt::Display for DeviceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceScope::Desktop => write!(f, "Desktop"),
            DeviceScope::Mobile => write!(f, "Mobile"),
            DeviceScope::Both => write!(f, "Both"),
        }
    }
}

/// Intake form state and step gating
#[derive(Debug, Clone)]
pub struct IntakeWizard {
    step: WizardStep,
    pub contact_name: String,
    pub contact_email: String,
    pub store_url: String,
    pub scope: IssueScope,
    pub category: TicketType,
    pub subcategory: Option<String>,
    pub impact: TicketPriority,
    pub subject: String,
    pub description: String,
    pub issue_url: Option<String>,
    pub attachments: Vec<String>,
    pub device: DeviceScope,
    diagnostics: Option<DiagnosticReport>,
}

impl IntakeWizard {
    pub fn new(
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
        store_url: impl Into<String>,
    ) -> Self {
        Self {
            step: WizardStep::Store,
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            store_url: store_url.into(),
            scope: IssueScope::default(),
            category: TicketType::default(),
            subcategory: None,
            impact: TicketPriority::default(),
            subject: String::new(),
            description: String::new(),
            issue_url: None,
            attachments: Vec::new(),
            device: DeviceScope::default(),
            diagnostics: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Latest diagnostic report, with any applied fixes
    pub fn diagnostics(&self) -> Option<&DiagnosticReport> {
        self.diagnostics.as_ref()
    }

    pub fn selected_widget(&self) -> Option<&str> {
        match &self.scope {
            IssueScope::Widget(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn selected_campaign(&self) -> Option<&str> {
        match &self.scope {
            IssueScope::Campaign(id) => Some(id.as_str()),
            _ => None,
        }
    }

    fn validate_current(&self) -> Result<(), IntakeError> {
        match self.step {
            WizardStep::Store => {
                if self.store_url.trim().is_empty() {
                    return Err(IntakeError::MissingStoreUrl);
                }
                if self.contact_email.trim().is_empty() {
                    return Err(IntakeError::MissingContactEmail);
                }
            }
            WizardStep::Scope => match &self.scope {
                IssueScope::Widget(id) if id.trim().is_empty() => {
                    return Err(IntakeError::MissingWidget);
                }
                IssueScope::Campaign(id) if id.trim().is_empty() => {
                    return Err(IntakeError::MissingCampaign);
                }
                _ => {}
            },
            WizardStep::Triage => {
                let Some(sub) = &self.subcategory else {
                    return Err(IntakeError::MissingSubcategory);
                };
                if !self.category.subcategories().contains(&sub.as_str()) {
                    return Err(IntakeError::InvalidSubcategory {
                        category: self.category.to_string(),
                        subcategory: sub.clone(),
                    });
                }
            }
            WizardStep::Evidence => return Err(IntakeError::DiagnosticsRequired),
            WizardStep::Review => {}
        }
        Ok(())
    }

    /// Move forward one step if the current step is complete.
    ///
    /// Evidence can only be left through [`run_diagnostics`](Self::run_diagnostics).
    pub fn advance(&mut self) -> Result<WizardStep, IntakeError> {
        self.validate_current()?;
        self.step = self.step.next();
        debug!("Intake advanced to {:?}", self.step);
        Ok(self.step)
    }

    /// Step back; leaving Review keeps the last report for comparison
    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    /// Run the system checklist and move to Review.
    ///
    /// Allowed from Evidence, or from Review to re-run after the Context
    /// changed. A re-run replaces the previous report and drops its fixes
    /// from `ledger`.
    pub fn run_diagnostics(
        &mut self,
        checklist: &SystemChecklist,
        ctx: &Context,
        ledger: &RemediationLedger,
    ) -> Result<&DiagnosticReport, IntakeError> {
        if self.step < WizardStep::Evidence {
            return Err(IntakeError::WrongStep {
                expected: WizardStep::Evidence,
                actual: self.step,
            });
        }

        if let Some(previous) = self.diagnostics.take() {
            ledger.clear(&previous);
        }

        let report = checklist.run_all(ctx);
        info!(
            "Intake diagnostics: {} fail, {} warning",
            report.count(crate::models::CheckStatus::Fail),
            report.count(crate::models::CheckStatus::Warning)
        );
        self.step = WizardStep::Review;
        Ok(self.diagnostics.insert(report))
    }

    /// Apply an instant fix to entry `index` of the current report
    pub fn apply_fix(
        &mut self,
        ledger: &RemediationLedger,
        index: usize,
    ) -> Result<&DiagnosticReport, IntakeError> {
        let current = match (&self.diagnostics, self.step) {
            (Some(report), WizardStep::Review) => report,
            _ => {
                return Err(IntakeError::WrongStep {
                    expected: WizardStep::Review,
                    actual: self.step,
                });
            }
        };
        let fixed = ledger.apply_fix(current, index)?;
        Ok(self.diagnostics.insert(fixed))
    }

    fn scope_line(&self) -> String {
        match &self.scope {
            IssueScope::Widget(id) => format!("Widget: {}", id),
            IssueScope::Campaign(id) => format!("Campaign: {}", id),
            IssueScope::Global => "Global Issue".to_string(),
        }
    }

    /// Render the ticket description from the collected answers
    pub fn render_description(&self) -> Result<String, IntakeError> {
        let mut env = Environment::new();
        env.add_template("ticket_description.md", DESCRIPTION_TEMPLATE)?;
        let template = env.get_template("ticket_description.md")?;

        let diagnostics = self
            .diagnostics
            .as_ref()
            .map(|r| r.results().to_vec())
            .unwrap_or_default();

        let rendered = template.render(context! {
            contact_name => self.contact_name,
            contact_email => self.contact_email,
            scope => self.scope_line(),
            category => self.category.as_str(),
            subcategory => self.subcategory.as_deref().unwrap_or_default(),
            impact => self.impact.to_string(),
            device => self.device.to_string(),
            description => self.description,
            diagnostics => diagnostics,
            attachments => self.attachments,
        })?;
        Ok(rendered.trim().to_string())
    }

    /// Finish the intake and produce a ticket draft.
    ///
    /// Requires the Review step with a completed report.
    pub fn submit(&self) -> Result<TicketDraft, IntakeError> {
        if self.step != WizardStep::Review || self.diagnostics.is_none() {
            return Err(IntakeError::DiagnosticsRequired);
        }

        let subject = if self.subject.trim().is_empty() {
            format!("{} Issue", self.subcategory.as_deref().unwrap_or("General"))
        } else {
            self.subject.trim().to_string()
        };

        Ok(TicketDraft {
            subject,
            description: self.render_description()?,
            ticket_type: self.category,
            priority: self.impact,
            merchant_name: self.contact_name.clone(),
            merchant_email: Some(self.contact_email.clone()).filter(|e| !e.is_empty()),
            store_url: self.store_url.clone(),
            issue_url: self.issue_url.clone(),
            widget_id: self.selected_widget().map(String::from),
            campaign_id: self.selected_campaign().map(String::from),
        })
    }
}
