//! Command introspection for plugins.

use crate::error::AccessError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::error;

/// A registered command as plugins see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    /// One-line summary.
    pub help: String,
    pub usage: String,
    /// Full help text.
    #[serde(default)]
    pub help_text: String,
    /// Capabilities a character needs to run the command; empty means anyone.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Where the command came from, e.g. `core` or a plugin name.
    pub source: String,
}

impl CommandEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            usage: String::new(),
            help_text: String::new(),
            capabilities: Vec::new(),
            source: source.into(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>, usage: impl Into<String>) -> Self {
        self.help = help.into();
        self.usage = usage.into();
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only view of the server's commands.
pub trait CommandRegistry: Send + Sync {
    /// Every registered command.
    fn all(&self) -> Vec<CommandEntry>;

    /// A command by exact name.
    fn get(&self, name: &str) -> Option<CommandEntry>;
}

/// Decides whether a subject may perform an action on a resource.
#[async_trait]
pub trait AccessEngine: Send + Sync {
    async fn is_allowed(
        &self,
        subject: &str,
        action: &str,
        resource: &str,
    ) -> Result<bool, AccessError>;
}

/// True if `subject` holds every capability `command` needs.
///
/// Commands without capabilities are open to everyone. An evaluation
/// error denies the command.
pub async fn can_execute(engine: &dyn AccessEngine, subject: &str, command: &CommandEntry) -> bool {
    for capability in &command.capabilities {
        match engine.is_allowed(subject, "execute", capability).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                error!(
                    subject = %subject,
                    action = "execute",
                    resource = %capability,
                    error = %e,
                    "Access evaluation failed"
                );
                return false;
            }
        }
    }
    true
}

/// In-memory command registry.
#[derive(Debug, Default)]
pub struct MemoryCommandRegistry {
    commands: RwLock<HashMap<String, CommandEntry>>,
}

impl MemoryCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a command.
    pub fn register(&self, command: CommandEntry) {
        let mut commands = self
            .commands
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        commands.insert(command.name.clone(), command);
    }
}

impl CommandRegistry for MemoryCommandRegistry {
    /// Sorted by name.
    fn all(&self) -> Vec<CommandEntry> {
        let commands = self
            .commands
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut all: Vec<CommandEntry> = commands.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn get(&self, name: &str) -> Option<CommandEntry> {
        self.commands
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}
