//! World service traits consumed by the plugin host.
//!
//! Every call carries an authorization subject. Plugins are presented as
//! `system:plugin:<name>`, characters as `character:<id>`.

use crate::error::WorldResult;
use crate::types::{Character, Exit, Location, Object};
use async_trait::async_trait;
use ulid::Ulid;

/// Subject prefix for plugin callers.
pub const PLUGIN_SUBJECT_PREFIX: &str = "system:plugin:";

/// Subject prefix for character callers.
pub const CHARACTER_SUBJECT_PREFIX: &str = "character:";

/// The authorization subject for a plugin.
pub fn plugin_subject(plugin: &str) -> String {
    format!("{PLUGIN_SUBJECT_PREFIX}{plugin}")
}

/// The authorization subject for a character.
pub fn character_subject(character_id: Ulid) -> String {
    format!("{CHARACTER_SUBJECT_PREFIX}{character_id}")
}

/// Read access to world data, checked against the subject.
///
/// Single-entity reads return `Ok(None)` when the service has nothing to
/// return; a listing may return `Ok(None)` in place of an empty list.
#[async_trait]
pub trait WorldService: Send + Sync {
    async fn get_location(&self, subject: &str, id: Ulid) -> WorldResult<Option<Location>>;

    async fn get_character(&self, subject: &str, id: Ulid) -> WorldResult<Option<Character>>;

    async fn get_characters_by_location(
        &self,
        subject: &str,
        location_id: Ulid,
    ) -> WorldResult<Option<Vec<Character>>>;

    async fn get_object(&self, subject: &str, id: Ulid) -> WorldResult<Option<Object>>;

    /// The write side of this service, if it has one.
    fn as_mutator(&self) -> Option<&dyn WorldMutator> {
        None
    }
}

/// Write access to world data, checked against the subject.
#[async_trait]
pub trait WorldMutator: WorldService {
    async fn create_location(&self, subject: &str, location: &Location) -> WorldResult<()>;

    async fn create_exit(&self, subject: &str, exit: &Exit) -> WorldResult<()>;

    async fn create_object(&self, subject: &str, object: &Object) -> WorldResult<()>;

    async fn update_location(&self, subject: &str, location: &Location) -> WorldResult<()>;

    async fn update_object(&self, subject: &str, object: &Object) -> WorldResult<()>;

    /// Find a location by exact name.
    async fn find_location_by_name(&self, subject: &str, name: &str) -> WorldResult<Option<Location>>;
}
