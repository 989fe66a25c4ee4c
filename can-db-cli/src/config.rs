//! Run configuration loading and parsing

use anyhow::{Context, Result};
use can_db_matrix::WantedSignal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main run configuration (loaded from a TOML file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Directory the per-channel file lists are resolved against
    pub root_dir: PathBuf,
    /// Channel key -> ordered database file stack. Later files overwrite
    /// earlier ones on message-id collision.
    #[serde(default)]
    pub channels: BTreeMap<String, Vec<PathBuf>>,
    #[serde(default)]
    pub worklist: Option<WorklistConfig>,
}

/// The externally supplied signal worklist
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorklistConfig {
    /// Identity key used when no worklist name matches the camera-id
    /// heuristic
    #[serde(default = "default_identity")]
    pub fallback_identity: String,
    #[serde(default)]
    pub signals: Vec<WantedSignal>,
}

fn default_identity() -> String {
    "Cam_id".to_string()
}

/// Load and parse a run configuration file
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: RunConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
root_dir = "/databases"

[channels]
Ch3 = ["powertrain.dbc", "powertrain_override.dbc"]
Ch4 = []

[worklist]
fallback_identity = "Cam_id"

[[worklist.signals]]
name = "Mode"
categorical = true

[[worklist.signals]]
name = "EngineSpeed"
categorical = false
"#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/databases"));
        assert_eq!(config.channels["Ch3"].len(), 2);
        assert!(config.channels["Ch4"].is_empty());
        let worklist = config.worklist.unwrap();
        assert_eq!(worklist.fallback_identity, "Cam_id");
        assert_eq!(worklist.signals.len(), 2);
        assert!(worklist.signals[0].categorical);
    }

    #[test]
    fn test_worklist_is_optional() {
        let text = r#"
root_dir = "."

[channels]
Ch3 = ["a.dbc"]
"#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert!(config.worklist.is_none());
    }
}
