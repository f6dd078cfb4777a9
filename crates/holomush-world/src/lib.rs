//! # holomush-world
//!
//! World data as seen by the plugin host.
//!
//! This crate provides:
//! - Entity types: [`Location`], [`Character`], [`Object`], [`Exit`]
//! - The [`WorldService`] and [`WorldMutator`] traits the host calls into
//! - The [`PropertyRegistry`] of properties plugins may address by name
//! - [`MemoryWorld`], an in-memory implementation of both traits

pub mod error;
pub mod memory;
pub mod property;
pub mod service;
pub mod types;

pub use error::{WorldError, WorldResult};
pub use memory::MemoryWorld;
pub use property::PropertyRegistry;
pub use service::{
    character_subject, plugin_subject, WorldMutator, WorldService, CHARACTER_SUBJECT_PREFIX,
    PLUGIN_SUBJECT_PREFIX,
};
pub use types::{Character, Containment, Exit, Location, LocationType, Object, Visibility};
pub use ulid::Ulid;
