//! # holomush-capability
//!
//! Capability grants for HoloMUSH plugins.
//!
//! This crate provides:
//! - Capability pattern compilation and matching
//! - The [`Enforcer`], a per-plugin grant table checked on every host call
//! - Plugin manifest parsing (declared capabilities)
//!
//! ## Capability Names
//!
//! Capabilities are dot-separated names (`kv.read`, `world.read.location`).
//! Grants may use `*` for one segment and `**` for any number of segments:
//!
//! ```
//! use holomush_capability::Enforcer;
//!
//! let enforcer = Enforcer::new();
//! enforcer.set_grants("weather", ["world.read.**", "kv.*"]).unwrap();
//!
//! assert!(enforcer.check("weather", "world.read.character.name"));
//! assert!(!enforcer.check("weather", "world.read"));
//! assert!(!enforcer.check("weather", "world.write.object"));
//! ```

pub mod enforcer;
pub mod error;
pub mod manifest;
pub mod pattern;

pub use enforcer::Enforcer;
pub use error::{CapabilityError, CapabilityResult, PatternError};
pub use manifest::{PluginManifest, PluginMetadata};
pub use pattern::CapabilityPattern;
