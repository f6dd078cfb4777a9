//! Integration tests for holomush-capability.
//!
//! These tests cover:
//! - Grant scenarios across the wildcard grammar
//! - Manifest files feeding the enforcer
//! - Concurrent readers and writers

use holomush_capability::{CapabilityError, Enforcer, PluginManifest};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

fn write_manifest(dir: &Path, name: &str, capabilities: &[&str]) -> PathBuf {
    let plugin_dir = dir.join(name);
    std::fs::create_dir_all(&plugin_dir).unwrap();

    let caps = capabilities
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let manifest = format!(
        "capabilities = [{caps}]\n\n[plugin]\nname = \"{name}\"\nversion = \"0.1.0\"\n"
    );

    let path = plugin_dir.join("manifest.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(manifest.as_bytes()).unwrap();
    path
}

// ==============================================================================
// Grant Scenarios
// ==============================================================================

#[test]
fn test_recursive_grant_requires_a_child_segment() {
    let enforcer = Enforcer::new();
    enforcer.set_grants("p1", ["world.read.**"]).unwrap();

    assert!(enforcer.check("p1", "world.read.character.name"));
    assert!(enforcer.check("p1", "world.read.location"));
    assert!(!enforcer.check("p1", "world.read"));
    assert!(!enforcer.check("p1", "world.write.object"));
}

#[test]
fn test_never_registered_versus_missing_capability() {
    let enforcer = Enforcer::new();
    enforcer.set_grants("p1", ["kv.read"]).unwrap();

    assert!(!enforcer.check("p1", "kv.write"));
    assert!(enforcer.is_registered("p1"));

    assert!(!enforcer.check("p2", "kv.write"));
    assert!(!enforcer.is_registered("p2"));
    assert!(!enforcer.is_registered(""));
}

#[test]
fn test_failed_batch_does_not_register_plugin() {
    let enforcer = Enforcer::new();
    let err = enforcer.set_grants("p1", ["kv.read", ""]).unwrap_err();

    assert!(matches!(err, CapabilityError::InvalidPattern { index: 1, .. }));
    assert!(!enforcer.is_registered("p1"));
    assert!(enforcer.list_plugins().is_empty());
}

// ==============================================================================
// Manifests
// ==============================================================================

#[test]
fn test_grants_from_manifest_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(temp_dir.path(), "weather", &["kv.*", "world.read.location"]);

    let manifest = PluginManifest::from_file(&path).unwrap();
    let enforcer = Enforcer::new();
    enforcer.set_grants_from_manifest(&manifest).unwrap();

    assert!(enforcer.check("weather", "kv.read"));
    assert!(enforcer.check("weather", "kv.write"));
    assert!(enforcer.check("weather", "world.read.location"));
    assert!(!enforcer.check("weather", "world.read.object"));
    assert_eq!(
        enforcer.get_grants("weather"),
        Some(vec!["kv.*".to_string(), "world.read.location".to_string()])
    );
}

#[test]
fn test_missing_manifest_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = PluginManifest::from_file(&temp_dir.path().join("manifest.toml")).unwrap_err();
    assert!(matches!(err, CapabilityError::Io(_)));
}

#[test]
fn test_malformed_manifest_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.toml");
    std::fs::write(&path, "[plugin\nname = ").unwrap();

    let err = PluginManifest::from_file(&path).unwrap_err();
    assert!(matches!(err, CapabilityError::Toml(_)));
}

// ==============================================================================
// Concurrency
// ==============================================================================

#[test]
fn test_concurrent_checks_and_regrants() {
    let enforcer = Arc::new(Enforcer::new());
    enforcer.set_grants("stable", ["kv.read"]).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|n| {
            let enforcer = Arc::clone(&enforcer);
            thread::spawn(move || {
                let plugin = format!("churn-{n}");
                for i in 0..200 {
                    if i % 2 == 0 {
                        enforcer.set_grants(&plugin, ["world.**"]).unwrap();
                    } else {
                        enforcer.remove_grants(&plugin).unwrap();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let enforcer = Arc::clone(&enforcer);
            thread::spawn(move || {
                for _ in 0..500 {
                    assert!(enforcer.check("stable", "kv.read"));
                    assert!(!enforcer.check("stable", "kv.write"));
                    let _ = enforcer.list_plugins();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    // Each writer ends on a removal.
    assert_eq!(enforcer.list_plugins(), vec!["stable".to_string()]);
}
