use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::AudienceRule;

/// Main CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Tags excluded by the fallback audience rule (widgets without their own rule)
    pub excluded_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Directory for report, chain and ticket snapshots.
    /// Defaults to ~/.config/support-diagnostics/snapshots/
    pub snapshots_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PresentationConfig {
    /// Simulated latency before results are shown (0 disables)
    pub reveal_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            excluded_tags: vec!["Wholesale".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshots_dir: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("support-diagnostics/snapshots"),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output: OutputConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Audience rule applied when a widget carries none
    pub fn fallback_audience(&self) -> AudienceRule {
        AudienceRule::excluding("Default", self.excluded_tags.iter().cloned())
    }
}

impl CliConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if file doesn't exist
    pub fn load_or_default(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config =
            CliConfig::load_or_default(Some(&PathBuf::from("/nonexistent/config.yaml"))).unwrap();
        assert_eq!(config.engine.excluded_tags, vec!["Wholesale"]);
        assert_eq!(config.presentation.reveal_delay_ms, 0);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "presentation:\n  reveal_delay_ms: 800\n").unwrap();

        let config = CliConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.presentation.reveal_delay_ms, 800);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_fallback_audience_excludes_configured_tags() {
        let rule = EngineConfig::default().fallback_audience();
        assert!(rule.excluded_tags.contains("Wholesale"));
        assert!(rule.required_tags.is_empty());
    }
}
