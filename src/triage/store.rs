use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::SystemChecklist;
use crate::models::{
    Campaign, Context, DiagnosticReport, DiscountLog, Message, MigrationStatus, Sender,
    ShopperContext, StoreHealth, Ticket, TicketPriority, TicketStatus, Widget,
};

use super::{TicketDraft, TriageError, derive_tags, finalize_priority, transition};

/// Everything the dashboard keeps in memory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub store: StoreHealth,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    /// Newest first
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub discount_logs: Vec<DiscountLog>,
}

/// Partial ticket edit from the agent workspace
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub tags: Option<Vec<String>>,
}

/// Owner of the workspace data.
///
/// All mutation goes through these methods. Readers get cloned snapshots
/// or freshly derived Contexts, never a live reference into the store.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceStore {
    data: Workspace,
}

impl WorkspaceStore {
    pub fn new(data: Workspace) -> Self {
        Self { data }
    }

    /// Immutable copy of the current state
    pub fn snapshot(&self) -> Workspace {
        self.data.clone()
    }

    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.data.tickets.iter().find(|t| t.id == id)
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.data.widgets.iter().find(|w| w.id == id)
    }

    fn ticket_mut(&mut self, id: &str) -> Result<&mut Ticket, TriageError> {
        self.data
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TriageError::UnknownTicket(id.to_string()))
    }

    /// Tickets whose subject, merchant or tags contain `query`
    /// (case-insensitive), optionally restricted to one priority
    pub fn filter_tickets(&self, query: &str, priority: Option<TicketPriority>) -> Vec<&Ticket> {
        let needle = query.to_lowercase();
        self.data
            .tickets
            .iter()
            .filter(|t| {
                t.subject.to_lowercase().contains(&needle)
                    || t.merchant_name.to_lowercase().contains(&needle)
                    || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
            })
            .filter(|t| priority.is_none_or(|p| t.priority == p))
            .collect()
    }

    // ========================================================================
    // Context Derivation
    // ========================================================================

    /// Build a read-only evaluation Context.
    ///
    /// The campaign is the one the widget links to, when it resolves.
    pub fn context_for(
        &self,
        widget_id: Option<&str>,
        shopper: Option<ShopperContext>,
    ) -> Result<Context, TriageError> {
        let mut ctx = Context::new(self.data.store.clone())
            .with_discount_logs(self.data.discount_logs.clone());

        if let Some(id) = widget_id {
            let widget = self
                .widget(id)
                .cloned()
                .ok_or_else(|| TriageError::UnknownWidget(id.to_string()))?;
            if let Some(campaign_id) = &widget.campaign_id {
                if let Some(c) = self.data.campaigns.iter().find(|c| c.id == *campaign_id) {
                    ctx = ctx.with_campaign(c.clone());
                }
            }
            ctx = ctx.with_widget(widget);
        }

        if let Some(shopper) = shopper {
            ctx = ctx.with_shopper(shopper);
        }
        Ok(ctx)
    }

    /// Run the system checklist for an existing ticket.
    ///
    /// Resolved tickets are closed to diagnostics.
    pub fn diagnose_ticket(
        &self,
        ticket_id: &str,
        checklist: &SystemChecklist,
    ) -> Result<DiagnosticReport, TriageError> {
        let ticket = self
            .ticket(ticket_id)
            .ok_or_else(|| TriageError::UnknownTicket(ticket_id.to_string()))?;
        if ticket.status.is_terminal() {
            return Err(TriageError::DiagnosticsClosed(ticket_id.to_string()));
        }

        let ctx = self.context_for(ticket.widget_id.as_deref(), None)?;
        Ok(checklist.run_all(&ctx))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn next_ticket_id(&self) -> String {
        let mut n = self.data.tickets.len() + 1;
        loop {
            let id = format!("tkt_{:03}", n);
            if self.ticket(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    /// File a new ticket from an intake draft and its diagnostics
    pub fn create_ticket(
        &mut self,
        draft: TicketDraft,
        diagnostics: &[DiagnosticReport],
    ) -> Result<Ticket, TriageError> {
        let priority = finalize_priority(draft.priority, diagnostics)?;
        let tags = derive_tags(draft.ticket_type, diagnostics);

        let ticket = Ticket {
            id: self.next_ticket_id(),
            subject: draft.subject,
            description: draft.description,
            ticket_type: draft.ticket_type,
            status: TicketStatus::Open,
            priority,
            merchant_name: draft.merchant_name,
            merchant_email: draft.merchant_email,
            store_url: draft.store_url,
            issue_url: draft.issue_url,
            created_at: Utc::now(),
            widget_id: draft.widget_id,
            campaign_id: draft.campaign_id,
            messages: Vec::new(),
            migration_tasks: Vec::new(),
            tags,
        };

        info!("Created ticket {} ({}, {})", ticket.id, ticket.ticket_type, ticket.priority);
        self.data.tickets.insert(0, ticket.clone());
        Ok(ticket)
    }

    /// Apply an agent edit; status changes follow the triage transition rules
    pub fn update_ticket(&mut self, id: &str, update: TicketUpdate) -> Result<Ticket, TriageError> {
        let ticket = self.ticket_mut(id)?;

        if let Some(status) = update.status {
            ticket.status = transition(id, ticket.status, status)?;
            info!("Ticket {} -> {}", id, ticket.status);
        }
        if let Some(priority) = update.priority {
            ticket.priority = priority;
        }
        if let Some(tags) = update.tags {
            ticket.tags = tags;
        }
        Ok(ticket.clone())
    }

    pub fn add_message(
        &mut self,
        ticket_id: &str,
        sender: Sender,
        content: impl Into<String>,
        is_internal: bool,
    ) -> Result<Message, TriageError> {
        let ticket = self.ticket_mut(ticket_id)?;
        let message = Message {
            id: format!("msg_{}", ticket.messages.len() + 1),
            sender,
            content: content.into(),
            timestamp: Utc::now(),
            is_internal,
        };
        ticket.messages.push(message.clone());
        Ok(message)
    }

    /// Replace a widget's opaque configuration payload
    pub fn update_widget_config(
        &mut self,
        widget_id: &str,
        config: serde_json::Value,
    ) -> Result<Widget, TriageError> {
        let widget = self
            .data
            .widgets
            .iter_mut()
            .find(|w| w.id == widget_id)
            .ok_or_else(|| TriageError::UnknownWidget(widget_id.to_string()))?;
        widget.config = config;
        info!("Updated configuration of widget {}", widget_id);
        Ok(widget.clone())
    }

    /// Agent-set migration progress; nothing advances it automatically
    pub fn set_migration_status(
        &mut self,
        ticket_id: &str,
        task_id: &str,
        status: MigrationStatus,
    ) -> Result<(), TriageError> {
        let ticket = self.ticket_mut(ticket_id)?;
        let task = ticket
            .migration_tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| TriageError::UnknownMigrationTask {
                ticket: ticket_id.to_string(),
                task: task_id.to_string(),
            })?;
        task.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::demo_workspace;
    use crate::models::{CheckResult, TicketType};

    fn draft(priority: TicketPriority) -> TicketDraft {
        TicketDraft {
            subject: "Widget Not Loading Issue".to_string(),
            description: "It does not load".to_string(),
            ticket_type: TicketType::Bug,
            priority,
            merchant_name: "Sarah Jenkins".to_string(),
            merchant_email: Some("sarah@gymshark-lite.com".to_string()),
            store_url: "gymshark-lite.myshopify.com".to_string(),
            issue_url: None,
            widget_id: Some("wdg_123".to_string()),
            campaign_id: None,
        }
    }

    #[test]
    fn test_create_ticket_prepends_and_tags() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        let report = DiagnosticReport::new(vec![CheckResult::fail("Zone", "missing")]);

        let ticket = store
            .create_ticket(draft(TicketPriority::Critical), &[report])
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.id, "tkt_004");
        assert_eq!(ticket.tags, vec!["Bug", "Zone"]);
        assert_eq!(store.snapshot().tickets[0].id, ticket.id);
    }

    #[test]
    fn test_uncorroborated_critical_is_not_filed() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        let before = store.snapshot().tickets.len();
        let err = store.create_ticket(draft(TicketPriority::Critical), &[]);
        assert!(err.is_err());
        assert_eq!(store.snapshot().tickets.len(), before);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        let snap = store.snapshot();
        store
            .update_widget_config("wdg_123", serde_json::json!({ "threshold": 75 }))
            .unwrap();
        assert_ne!(snap, store.snapshot());
        assert_eq!(snap.widgets[0].config["threshold"], 50);
    }

    #[test]
    fn test_resolved_ticket_rejects_transitions_and_diagnostics() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        store
            .update_ticket(
                "tkt_003",
                TicketUpdate {
                    status: Some(TicketStatus::Resolved),
                    ..Default::default()
                },
            )
            .unwrap();

        let reopen = store.update_ticket(
            "tkt_003",
            TicketUpdate {
                status: Some(TicketStatus::Open),
                ..Default::default()
            },
        );
        assert!(matches!(reopen, Err(TriageError::TicketResolved { .. })));

        let diag = store.diagnose_ticket("tkt_003", &SystemChecklist::default());
        assert_eq!(diag, Err(TriageError::DiagnosticsClosed("tkt_003".to_string())));
    }

    #[test]
    fn test_context_for_resolves_campaign() {
        let store = WorkspaceStore::new(demo_workspace().unwrap());
        let ctx = store.context_for(Some("wdg_123"), None).unwrap();
        assert_eq!(ctx.campaign.unwrap().id, "cmp_003");
        assert!(store.context_for(Some("wdg_000"), None).is_err());
    }

    #[test]
    fn test_filter_tickets() {
        let store = WorkspaceStore::new(demo_workspace().unwrap());
        let audience = store.filter_tickets("audience", None);
        assert_eq!(audience.len(), 1);
        assert_eq!(audience[0].id, "tkt_003");

        let high = store.filter_tickets("", Some(TicketPriority::High));
        assert_eq!(high.len(), 2);
    }

    #[test]
    fn test_migration_status_is_set_manually() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        store
            .set_migration_status("tkt_002", "mt_3", MigrationStatus::Staging)
            .unwrap();
        let ticket = store.ticket("tkt_002").unwrap();
        assert_eq!(ticket.migration_tasks[2].status, MigrationStatus::Staging);
        assert!(store.set_migration_status("tkt_002", "mt_9", MigrationStatus::Live).is_err());
    }

    #[test]
    fn test_add_message() {
        let mut store = WorkspaceStore::new(demo_workspace().unwrap());
        let msg = store
            .add_message("tkt_001", Sender::Agent, "Could you grant theme access?", false)
            .unwrap();
        assert_eq!(msg.id, "msg_1");
        assert_eq!(store.ticket("tkt_001").unwrap().messages.len(), 1);
    }
}
