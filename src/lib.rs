pub mod config;
pub mod engine;
pub mod models;
pub mod output;
pub mod presentation;
pub mod qa;
pub mod triage;

// Re-export main types
pub use config::{CliConfig, EngineConfig, OutputConfig, PresentationConfig};
pub use engine::{
    AudienceSimulator, Check, DependencyChainBuilder, EngineError, FixRejection,
    RemediationLedger, SystemChecklist, evaluate,
};
pub use models::{
    CheckResult, CheckStatus, Context, DependencyChain, DiagnosticReport, ReportId, Stage,
    VisibilityVerdict,
};
pub use output::{FileSnapshotWriter, SnapshotWriter};
pub use presentation::DelayedReveal;
pub use qa::{AuditChecklist, RegressionSuite};
pub use triage::{IntakeError, IntakeWizard, TicketDraft, TriageError, Workspace, WorkspaceStore};
