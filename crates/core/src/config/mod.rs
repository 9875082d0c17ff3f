//! Configuration for the hooks registry

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::hooks::{FailureReporter, ReportLevel, TracingReporter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Name given to the registry's default scope
    #[serde(default = "default_scope_name")]
    pub default_scope: String,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Level used to log callback failures: "error" | "warn" | "off"
    #[serde(default)]
    pub level: ReportLevel,
}

fn default_scope_name() -> String {
    "default".to_string()
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            default_scope: default_scope_name(),
            report: ReportConfig::default(),
        }
    }
}

impl HooksConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HooksConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reporter used by scopes built from this config
    pub fn reporter(&self) -> Arc<dyn FailureReporter> {
        Arc::new(TracingReporter::new(self.report.level))
    }
}
