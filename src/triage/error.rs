use thiserror::Error;

use crate::engine::EngineError;
use crate::models::{TicketPriority, TicketStatus};

use super::intake::WizardStep;

/// Rejected ticket operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    #[error("{0} priority requires at least one failing diagnostic")]
    UncorroboratedCritical(TicketPriority),

    #[error("Ticket {id} is resolved; it cannot move to {requested}")]
    TicketResolved {
        id: String,
        requested: TicketStatus,
    },

    #[error("Ticket {0} is resolved; no further diagnostics run against it")]
    DiagnosticsClosed(String),

    #[error("Unknown ticket: {0}")]
    UnknownTicket(String),

    #[error("Unknown widget: {0}")]
    UnknownWidget(String),

    #[error("Unknown migration task {task} on ticket {ticket}")]
    UnknownMigrationTask { ticket: String, task: String },
}

/// Reasons the intake wizard refuses to move on
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Store URL is required")]
    MissingStoreUrl,

    #[error("Contact email is required")]
    MissingContactEmail,

    #[error("Select a widget for a widget-scoped issue")]
    MissingWidget,

    #[error("Select a campaign for a campaign-scoped issue")]
    MissingCampaign,

    #[error("Select a sub-category")]
    MissingSubcategory,

    #[error("'{subcategory}' is not a sub-category of {category}")]
    InvalidSubcategory { category: String, subcategory: String },

    #[error("Run diagnostics to leave the evidence step")]
    DiagnosticsRequired,

    #[error("Action requires the {expected:?} step, wizard is at {actual:?}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to render ticket description: {0}")]
    Render(#[from] minijinja::Error),
}
