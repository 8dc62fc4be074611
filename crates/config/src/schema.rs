//! Config schema types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default file name for persisted middleware customizations.
pub const DEFAULT_CUSTOMIZATIONS_FILE: &str = "middleware-customizations.json";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Overrides the resolved data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// File name (relative to the data directory) or absolute path of the
    /// customization store.
    pub customizations_file: PathBuf,
    pub gate: GateConfig,
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            customizations_file: PathBuf::from(DEFAULT_CUSTOMIZATIONS_FILE),
            gate: GateConfig::default(),
        }
    }
}

impl SwitchyardConfig {
    /// Path of the customization store, resolved against `data_dir`.
    pub fn customizations_path(&self, data_dir: &std::path::Path) -> PathBuf {
        if self.customizations_file.is_absolute() {
            self.customizations_file.clone()
        } else {
            data_dir.join(&self.customizations_file)
        }
    }
}

/// Platform gate installed ahead of user middleware on every chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Platforms allowed through. Empty means every platform is allowed.
    /// Entries match case-insensitively and may use `*` wildcards.
    pub allowed_platforms: Vec<String>,
}
