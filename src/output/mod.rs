pub mod files;

pub use files::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DependencyChain, DiagnosticReport, Ticket};

/// Trait for persisting engine results
#[async_trait]
pub trait SnapshotWriter: Send + Sync {
    /// Write a diagnostic report (JSON plus markdown rendering)
    async fn write_report(&self, report: &DiagnosticReport) -> Result<()>;

    /// Write a widget's dependency chain
    async fn write_chain(&self, chain: &DependencyChain) -> Result<()>;

    /// Write a ticket as created or last updated
    async fn write_ticket(&self, ticket: &Ticket) -> Result<()>;
}
