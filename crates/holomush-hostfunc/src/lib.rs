//! # holomush-hostfunc
//!
//! Host functions for HoloMUSH plugins.
//!
//! This crate provides:
//! - [`Functions`], the capability-checked host function catalog
//! - [`WorldAdapter`], world access attributed to a single plugin
//! - The guest runtime boundary: [`GuestRuntime`], [`GuestState`], [`HostReturn`]
//! - Collaborator traits for KV storage and commands, with in-memory versions
//! - Error sanitization with correlation IDs
//!
//! ## Example
//!
//! ```
//! use holomush_capability::Enforcer;
//! use holomush_hostfunc::{Functions, GuestState, HostReturn, MemoryKvStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let enforcer = Arc::new(Enforcer::new());
//!     enforcer.set_grants("greeter", ["kv.*"]).unwrap();
//!
//!     let functions = Functions::new(enforcer).with_kv_store(Arc::new(MemoryKvStore::new()));
//!     let mut state = GuestState::new();
//!     functions.register(&mut state, "greeter");
//!
//!     state.call("holomush", "kv_set", vec![json!("motd"), json!("hello")]).await.unwrap();
//!     let motd = state.call("holomush", "kv_get", vec![json!("motd")]).await.unwrap();
//!     assert_eq!(motd, HostReturn::Value(json!("hello")));
//! });
//! ```

pub mod adapter;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod functions;
pub mod guest;
pub mod kv;
pub mod sanitize;

pub use adapter::WorldAdapter;
pub use commands::{AccessEngine, CommandEntry, CommandRegistry, MemoryCommandRegistry};
pub use config::HostConfig;
pub use context::DEFAULT_QUERY_TIMEOUT;
pub use error::{AccessError, ConfigError, GuestError, HostError, KvError, QueryError};
pub use functions::{operation, Functions, Operation, OPERATIONS};
pub use guest::{GuestRuntime, GuestState, GuestValue, HostFunction, HostModule, HostReturn};
pub use kv::{KvStore, MemoryKvStore};
pub use sanitize::sanitize_error;
