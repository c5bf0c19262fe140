mod fixtures;
mod settings;

pub use fixtures::{DEMO_WORKSPACE, demo_workspace, load_workspace, load_workspace_or_demo};
pub use settings::{CliConfig, EngineConfig, OutputConfig, PresentationConfig};
