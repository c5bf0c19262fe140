use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::config::OutputConfig;
use crate::models::{CheckStatus, DependencyChain, DiagnosticReport, Ticket};

use super::SnapshotWriter;

/// File-based snapshot writer: pretty JSON plus a markdown report
pub struct FileSnapshotWriter {
    config: OutputConfig,
}

impl FileSnapshotWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    async fn ensure_dir(&self, sub: &str) -> Result<PathBuf> {
        let dir = self.config.snapshots_dir.join(sub);
        fs::create_dir_all(&dir)
            .await
            .context(format!("Failed to create snapshot directory {:?}", dir))?;
        Ok(dir)
    }

    fn status_marker(status: CheckStatus) -> &'static str {
        match status {
            CheckStatus::Pass => "✅",
            CheckStatus::Warning => "⚠️",
            CheckStatus::Fail => "❌",
        }
    }

    /// Render a report as a markdown table
    pub fn report_to_markdown(&self, title: &str, report: &DiagnosticReport) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", title));
        md.push_str(&format!("**Report**: `{}`\n", report.id()));
        md.push_str(&format!("**Severity**: {}\n", report.severity()));
        md.push_str(&format!(
            "**Summary**: {} pass, {} warning, {} fail\n\n",
            report.count(CheckStatus::Pass),
            report.count(CheckStatus::Warning),
            report.count(CheckStatus::Fail)
        ));

        md.push_str("| # | Step | Status | Detail |\n");
        md.push_str("|---|------|--------|--------|\n");
        for (i, r) in report.results().iter().enumerate() {
            let step = if r.label.is_empty() {
                r.step.clone()
            } else {
                format!("{} ({})", r.step, r.label)
            };
            let mut detail = r.detail.replace('|', "\\|");
            if r.fixed {
                detail.push_str(" **Fixed**");
            } else if r.fixable {
                detail.push_str(" _(instant fix available)_");
            }
            md.push_str(&format!(
                "| {} | {} | {} {} | {} |\n",
                i,
                step,
                Self::status_marker(r.status),
                r.status,
                detail
            ));
        }
        md.push('\n');

        md
    }

    async fn write_json<T: serde::Serialize + Sync>(
        &self,
        sub: &str,
        name: &str,
        value: &T,
    ) -> Result<PathBuf> {
        let dir = self.ensure_dir(sub).await?;
        let path = dir.join(format!("{}.json", name));
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .await
            .context(format!("Failed to write {:?}", path))?;
        info!("Wrote {:?}", path);
        Ok(path)
    }
}

#[async_trait]
impl SnapshotWriter for FileSnapshotWriter {
    async fn write_report(&self, report: &DiagnosticReport) -> Result<()> {
        let name = format!("report-{}", report.id());
        let json_path = self.write_json("reports", &name, report).await?;

        let md_path = json_path.with_extension("md");
        fs::write(&md_path, self.report_to_markdown("System Diagnostics", report))
            .await
            .context("Failed to write report markdown")?;
        info!("Wrote {:?}", md_path);
        Ok(())
    }

    async fn write_chain(&self, chain: &DependencyChain) -> Result<()> {
        let name = format!("chain-{}-{}", chain.widget_id(), chain.report().id());
        let json_path = self.write_json("chains", &name, chain).await?;

        let title = format!("Dependency Chain: {}", chain.widget_id());
        let md_path = json_path.with_extension("md");
        fs::write(&md_path, self.report_to_markdown(&title, chain.report()))
            .await
            .context("Failed to write chain markdown")?;
        info!("Wrote {:?}", md_path);
        Ok(())
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.write_json("tickets", &ticket.id, ticket).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckResult;
    use tempfile::TempDir;

    fn writer(dir: &TempDir) -> FileSnapshotWriter {
        FileSnapshotWriter::new(OutputConfig {
            snapshots_dir: dir.path().to_path_buf(),
        })
    }

    fn sample() -> DiagnosticReport {
        DiagnosticReport::new(vec![
            CheckResult::pass("Store API Connection", "Stable"),
            CheckResult::fail("Zone", "Zone 'cart_drawer' not detected").with_label("cart_drawer"),
        ])
    }

    #[test]
    fn test_markdown_lists_every_result() {
        let dir = TempDir::new().unwrap();
        let md = writer(&dir).report_to_markdown("System Diagnostics", &sample());
        assert!(md.starts_with("# System Diagnostics"));
        assert!(md.contains("**Summary**: 1 pass, 0 warning, 1 fail"));
        assert!(md.contains("| 1 | Zone (cart_drawer) | ❌ fail |"));
    }

    #[tokio::test]
    async fn test_write_report_creates_json_and_markdown() {
        let dir = TempDir::new().unwrap();
        let report = sample();
        writer(&dir).write_report(&report).await.unwrap();

        let base = dir.path().join("reports").join(format!("report-{}", report.id()));
        let json = std::fs::read_to_string(base.with_extension("json")).unwrap();
        let parsed: DiagnosticReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(base.with_extension("md").exists());
    }
}
