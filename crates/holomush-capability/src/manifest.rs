//! Plugin manifest parsing.
//!
//! Each plugin ships a `manifest.toml` naming the plugin and declaring the
//! capabilities it needs. The declared list is what gets registered with the
//! [`Enforcer`](crate::Enforcer).

use crate::error::{CapabilityError, CapabilityResult};
use crate::pattern::CapabilityPattern;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

const MAX_NAME_LENGTH: usize = 64;

/// Plugin manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin metadata.
    pub plugin: PluginMetadata,

    /// Requested capability patterns.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Plugin metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique plugin name; doubles as the plugin identity.
    pub name: String,

    /// Version string.
    pub version: String,

    /// Plugin description.
    #[serde(default)]
    pub description: Option<String>,

    /// Plugin author(s).
    #[serde(default)]
    pub authors: Vec<String>,

    /// Script entry file, relative to the plugin directory.
    #[serde(default)]
    pub entry: Option<String>,
}

impl PluginManifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> CapabilityResult<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Validate the manifest.
    ///
    /// Capability patterns are compiled here as well so a bad manifest is
    /// reported when it is read, not when grants are applied.
    pub fn validate(&self) -> CapabilityResult<()> {
        validate_name(&self.plugin.name)?;

        if self.plugin.version.is_empty() {
            return Err(CapabilityError::InvalidManifest(
                "version is required".to_string(),
            ));
        }

        for (index, pattern) in self.capabilities.iter().enumerate() {
            CapabilityPattern::parse(pattern).map_err(|source| CapabilityError::InvalidPattern {
                index,
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Get the entry file name.
    pub fn entry(&self) -> &str {
        self.plugin.entry.as_deref().unwrap_or("main.lua")
    }
}

impl FromStr for PluginManifest {
    type Err = CapabilityError;

    fn from_str(content: &str) -> CapabilityResult<Self> {
        let manifest: PluginManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }
}

/// Names start with a-z and contain only a-z, 0-9 and single hyphens,
/// never ending in a hyphen.
fn validate_name(name: &str) -> CapabilityResult<()> {
    let invalid = || {
        CapabilityError::InvalidManifest(format!(
            "name {name:?} must start with a-z, contain only a-z, 0-9, single hyphens, and not end with a hyphen"
        ))
    };

    if name.len() > MAX_NAME_LENGTH {
        return Err(CapabilityError::InvalidManifest(format!(
            "name must be {MAX_NAME_LENGTH} characters or less, got {}",
            name.len()
        )));
    }

    let bytes = name.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_lowercase() => {}
        _ => return Err(invalid()),
    }
    if bytes.last() == Some(&b'-') || name.contains("--") {
        return Err(invalid());
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    {
        return Err(invalid());
    }

    Ok(())
}
