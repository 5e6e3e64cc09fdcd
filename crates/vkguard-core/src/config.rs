use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level validation configuration, loaded from vkguard.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub checks: CheckConfig,
    /// Forward every diagnostic to the configured sink
    #[serde(default = "default_true")]
    pub report_diagnostics: bool,
}

/// Per-category check toggles. Disabled categories are skipped entirely;
/// the operations themselves still run and register their objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Object lifetime tracking (destroyed-object and in-use checks)
    #[serde(default = "default_true")]
    pub lifetime: bool,
    /// Creation-time render pass checks (usage conflicts, dependency DAG)
    #[serde(default = "default_true")]
    pub render_pass: bool,
    /// Record-time compatibility checks (framebuffer binding, inheritance)
    #[serde(default = "default_true")]
    pub compatibility: bool,
    /// Probably-unintended heuristics (load/store op findings)
    #[serde(default = "default_true")]
    pub heuristics: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            checks: CheckConfig::default(),
            report_diagnostics: true,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            lifetime: true,
            render_pass: true,
            compatibility: true,
            heuristics: true,
        }
    }
}

impl ValidationConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

fn default_true() -> bool {
    true
}
