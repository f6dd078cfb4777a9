//! Host function configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [host]
//! namespace = "holomush"
//! query_timeout_ms = 5000
//!
//! [plugins.weather]
//! capabilities = ["world.read.**", "kv.*"]
//! ```

use crate::error::ConfigError;
use holomush_capability::Enforcer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Global name host functions are installed under.
pub const DEFAULT_NAMESPACE: &str = "holomush";

/// Bridge configuration plus static plugin grants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub host: HostSettings,
    /// Capabilities to grant per plugin name.
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginGrants>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSettings {
    /// Default: "holomush"
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Upper bound on each KV or world call.
    /// Default: 5000
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginGrants {
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl HostSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl FromStr for HostConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: HostConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl HostConfig {
    /// Load and validate configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "host.namespace cannot be empty".to_string(),
            ));
        }

        if self.host.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "host.query_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.plugins.contains_key("") {
            return Err(ConfigError::Invalid(
                "plugin name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Register every configured plugin's grants with `enforcer`.
    ///
    /// Stops at the first plugin whose patterns do not compile. That
    /// plugin's previous grants are left as they were.
    pub fn apply_grants(&self, enforcer: &Enforcer) -> Result<(), ConfigError> {
        for (plugin, grants) in &self.plugins {
            enforcer
                .set_grants(plugin, &grants.capabilities)
                .map_err(|source| ConfigError::Grants {
                    plugin: plugin.clone(),
                    source,
                })?;
            info!(
                plugin = %plugin,
                capabilities = grants.capabilities.len(),
                "Applied configured capability grants"
            );
        }
        Ok(())
    }
}
