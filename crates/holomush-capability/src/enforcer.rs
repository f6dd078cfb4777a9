//! Runtime capability enforcement.
//!
//! The [`Enforcer`] maps plugin names to the capability patterns granted to
//! them. It is shared by every concurrent guest invocation: checks take a
//! read lock, grant changes take the write lock, and no lock is held longer
//! than the map lookup or mutation itself.

use crate::error::{CapabilityError, CapabilityResult};
use crate::manifest::PluginManifest;
use crate::pattern::CapabilityPattern;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Checks plugin capabilities at runtime.
///
/// `Enforcer::default()` is ready to use; an enforcer with no entries treats
/// every plugin as unregistered.
#[derive(Debug, Default)]
pub struct Enforcer {
    grants: RwLock<HashMap<String, Vec<CapabilityPattern>>>,
}

impl Enforcer {
    /// Create an empty enforcer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capabilities granted to `plugin`.
    ///
    /// Every pattern is compiled before the grant map is touched, so a batch
    /// containing one invalid pattern leaves the previous grants (or the
    /// absence of any) exactly as they were.
    pub fn set_grants<I, S>(&self, plugin: &str, patterns: I) -> CapabilityResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if plugin.is_empty() {
            return Err(CapabilityError::InvalidArgument(
                "plugin name cannot be empty".to_string(),
            ));
        }

        let compiled = patterns
            .into_iter()
            .enumerate()
            .map(|(index, pattern)| {
                let pattern = pattern.as_ref();
                CapabilityPattern::parse(pattern).map_err(|source| {
                    CapabilityError::InvalidPattern {
                        index,
                        pattern: pattern.to_string(),
                        source,
                    }
                })
            })
            .collect::<CapabilityResult<Vec<_>>>()?;

        debug!(plugin = %plugin, count = compiled.len(), "Setting capability grants");
        self.write().insert(plugin.to_string(), compiled);
        Ok(())
    }

    /// Register the capabilities declared by a plugin manifest.
    pub fn set_grants_from_manifest(&self, manifest: &PluginManifest) -> CapabilityResult<()> {
        self.set_grants(&manifest.plugin.name, &manifest.capabilities)
    }

    /// Unregister a plugin. Unknown plugins are a no-op.
    pub fn remove_grants(&self, plugin: &str) -> CapabilityResult<()> {
        if plugin.is_empty() {
            return Err(CapabilityError::InvalidArgument(
                "plugin name cannot be empty".to_string(),
            ));
        }

        if self.write().remove(plugin).is_some() {
            debug!(plugin = %plugin, "Removed capability grants");
        }
        Ok(())
    }

    /// Returns true if the plugin has been registered via [`Enforcer::set_grants`].
    ///
    /// Lets callers tell "never registered" apart from "registered but lacking
    /// a capability"; it has no bearing on [`Enforcer::check`].
    pub fn is_registered(&self, plugin: &str) -> bool {
        !plugin.is_empty() && self.read().contains_key(plugin)
    }

    /// A copy of the patterns granted to `plugin`, or `None` if unregistered.
    pub fn get_grants(&self, plugin: &str) -> Option<Vec<String>> {
        if plugin.is_empty() {
            return None;
        }
        self.read().get(plugin).map(|patterns| {
            patterns
                .iter()
                .map(|p| p.as_str().to_string())
                .collect()
        })
    }

    /// All registered plugin names, in no particular order.
    pub fn list_plugins(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Returns true only if `plugin` is registered and one of its patterns
    /// matches `capability`. Denies by default and gives no reason.
    pub fn check(&self, plugin: &str, capability: &str) -> bool {
        if plugin.is_empty() || capability.is_empty() {
            return false;
        }

        self.read()
            .get(plugin)
            .is_some_and(|patterns| patterns.iter().any(|p| p.matches(capability)))
    }

    // The map is only ever replaced entry-by-entry, so a poisoned lock
    // still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<CapabilityPattern>>> {
        self.grants.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<CapabilityPattern>>> {
        self.grants.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatternError;

    #[test]
    fn test_default_enforcer_denies_everything() {
        let enforcer = Enforcer::default();
        assert!(!enforcer.check("p1", "kv.read"));
        assert!(!enforcer.is_registered("p1"));
        assert!(enforcer.get_grants("p1").is_none());
        assert!(enforcer.list_plugins().is_empty());
        assert!(enforcer.remove_grants("p1").is_ok());
    }

    #[test]
    fn test_check_denies_empty_inputs() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["**"]).unwrap();

        assert!(!enforcer.check("", "kv.read"));
        assert!(!enforcer.check("p1", ""));
        assert!(enforcer.check("p1", "kv.read"));
    }

    #[test]
    fn test_set_grants_rejects_empty_plugin() {
        let enforcer = Enforcer::new();
        let err = enforcer.set_grants("", ["kv.read"]).unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArgument(_)));
        assert!(enforcer.list_plugins().is_empty());
    }

    #[test]
    fn test_set_grants_reports_offending_index() {
        let enforcer = Enforcer::new();
        let err = enforcer
            .set_grants("p1", ["kv.read", "kv.", "world.read"])
            .unwrap_err();

        match err {
            CapabilityError::InvalidPattern {
                index,
                pattern,
                source,
            } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "kv.");
                assert_eq!(source, PatternError::EmptySegment(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_set_grants_is_atomic() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["kv.read"]).unwrap();

        assert!(enforcer.set_grants("p1", ["kv.write", ""]).is_err());
        assert_eq!(enforcer.get_grants("p1"), Some(vec!["kv.read".to_string()]));
        assert!(!enforcer.check("p1", "kv.write"));

        assert!(enforcer.set_grants("p2", ["kv.read", "a..b"]).is_err());
        assert!(!enforcer.is_registered("p2"));
    }

    #[test]
    fn test_set_grants_replaces_previous_grants() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["kv.read"]).unwrap();
        enforcer.set_grants("p1", ["kv.write"]).unwrap();

        assert!(!enforcer.check("p1", "kv.read"));
        assert!(enforcer.check("p1", "kv.write"));
    }

    #[test]
    fn test_empty_grant_set_is_registered_but_denied() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", Vec::<String>::new()).unwrap();

        assert!(enforcer.is_registered("p1"));
        assert!(!enforcer.check("p1", "kv.read"));
        assert_eq!(enforcer.get_grants("p1"), Some(vec![]));
    }

    #[test]
    fn test_remove_grants() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["kv.read"]).unwrap();
        enforcer.remove_grants("p1").unwrap();

        assert!(!enforcer.is_registered("p1"));
        assert!(!enforcer.check("p1", "kv.read"));
        assert!(matches!(
            enforcer.remove_grants(""),
            Err(CapabilityError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_returned_collections_are_copies() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["kv.read"]).unwrap();

        let mut grants = enforcer.get_grants("p1").unwrap();
        grants[0] = "**".to_string();
        grants.push("world.write.**".to_string());

        let mut plugins = enforcer.list_plugins();
        plugins.clear();

        assert!(!enforcer.check("p1", "world.write.object"));
        assert_eq!(enforcer.get_grants("p1"), Some(vec!["kv.read".to_string()]));
        assert_eq!(enforcer.list_plugins(), vec!["p1".to_string()]);
    }

    #[test]
    fn test_grants_are_isolated_per_plugin() {
        let enforcer = Enforcer::new();
        enforcer.set_grants("p1", ["kv.read"]).unwrap();
        enforcer.set_grants("p2", ["kv.write"]).unwrap();

        assert!(enforcer.check("p1", "kv.read"));
        assert!(!enforcer.check("p1", "kv.write"));
        assert!(enforcer.check("p2", "kv.write"));
        assert!(!enforcer.check("p2", "kv.read"));

        let mut plugins = enforcer.list_plugins();
        plugins.sort();
        assert_eq!(plugins, vec!["p1".to_string(), "p2".to_string()]);
    }
}
