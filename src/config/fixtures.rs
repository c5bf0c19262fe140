//! Bundled demo workspace.
//!
//! The workspace is embedded with include_str! and used whenever no
//! `--workspace` file is given.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::triage::Workspace;

/// Bundled demo workspace (YAML)
pub const DEMO_WORKSPACE: &str = include_str!("../../fixtures/demo_workspace.yaml");

/// Parse the bundled demo workspace
pub fn demo_workspace() -> Result<Workspace> {
    serde_yaml::from_str(DEMO_WORKSPACE).context("Failed to parse bundled demo workspace")
}

/// Load a workspace file, YAML or JSON by extension
pub fn load_workspace(path: &Path) -> Result<Workspace> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read workspace file: {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    debug!("Loading workspace from {:?} (json: {})", path, is_json);
    if is_json {
        serde_json::from_str(&content).context(format!("Failed to parse workspace JSON {:?}", path))
    } else {
        serde_yaml::from_str(&content).context(format!("Failed to parse workspace YAML {:?}", path))
    }
}

/// Load `path` if given, otherwise the bundled demo
pub fn load_workspace_or_demo(path: Option<&Path>) -> Result<Workspace> {
    match path {
        Some(p) => load_workspace(p),
        None => demo_workspace(),
    }
}
