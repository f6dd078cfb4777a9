//! World access on behalf of a single plugin.
//!
//! [`WorldAdapter`] presents every call to the world service as the
//! plugin's authorization subject (`system:plugin:<name>`), tags failures
//! with the entity type and plugin, and smooths over services that report
//! success without a value.

use crate::error::QueryError;
use holomush_world::{
    plugin_subject, Character, Exit, Location, Object, Ulid, WorldError, WorldMutator,
    WorldResult, WorldService,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// A world service scoped to one plugin.
///
/// Holds only a service handle and the plugin name, so building one per
/// call is cheap.
#[derive(Clone)]
pub struct WorldAdapter {
    service: Arc<dyn WorldService>,
    plugin: String,
    subject: String,
}

impl WorldAdapter {
    /// Scope `service` to `plugin`.
    ///
    /// An empty plugin name is a wiring defect and is rejected.
    pub fn new(service: Arc<dyn WorldService>, plugin: &str) -> WorldResult<Self> {
        if plugin.is_empty() {
            return Err(WorldError::Validation(
                "world adapter requires a plugin name".to_string(),
            ));
        }

        Ok(Self {
            service,
            plugin: plugin.to_string(),
            subject: plugin_subject(plugin),
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    /// The subject presented to the world service.
    pub fn subject_id(&self) -> &str {
        &self.subject
    }

    /// True if the underlying service accepts writes.
    pub fn supports_mutation(&self) -> bool {
        self.service.as_mutator().is_some()
    }

    pub async fn get_location(&self, id: Ulid) -> Result<Location, QueryError> {
        let found = self.service.get_location(&self.subject, id).await;
        self.single("location", id, found)
    }

    pub async fn get_character(&self, id: Ulid) -> Result<Character, QueryError> {
        let found = self.service.get_character(&self.subject, id).await;
        self.single("character", id, found)
    }

    /// Characters at a location. A missing list is treated as empty.
    pub async fn get_characters_by_location(
        &self,
        location_id: Ulid,
    ) -> Result<Vec<Character>, QueryError> {
        match self
            .service
            .get_characters_by_location(&self.subject, location_id)
            .await
        {
            Ok(Some(characters)) => Ok(characters),
            Ok(None) => {
                debug!(
                    plugin = %self.plugin,
                    location_id = %location_id,
                    "World service returned no character list, using empty list"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(self.tag("location", e)),
        }
    }

    pub async fn get_object(&self, id: Ulid) -> Result<Object, QueryError> {
        let found = self.service.get_object(&self.subject, id).await;
        self.single("object", id, found)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn create_location(&self, location: &Location) -> Result<(), QueryError> {
        let mutator = self.mutator("location")?;
        mutator
            .create_location(&self.subject, location)
            .await
            .map_err(|e| self.tag("location", e))
    }

    pub async fn create_exit(&self, exit: &Exit) -> Result<(), QueryError> {
        let mutator = self.mutator("exit")?;
        mutator
            .create_exit(&self.subject, exit)
            .await
            .map_err(|e| self.tag("exit", e))
    }

    pub async fn create_object(&self, object: &Object) -> Result<(), QueryError> {
        let mutator = self.mutator("object")?;
        mutator
            .create_object(&self.subject, object)
            .await
            .map_err(|e| self.tag("object", e))
    }

    pub async fn update_location(&self, location: &Location) -> Result<(), QueryError> {
        let mutator = self.mutator("location")?;
        mutator
            .update_location(&self.subject, location)
            .await
            .map_err(|e| self.tag("location", e))
    }

    pub async fn update_object(&self, object: &Object) -> Result<(), QueryError> {
        let mutator = self.mutator("object")?;
        mutator
            .update_object(&self.subject, object)
            .await
            .map_err(|e| self.tag("object", e))
    }

    pub async fn find_location_by_name(&self, name: &str) -> Result<Location, QueryError> {
        let mutator = self.mutator("location")?;
        match mutator.find_location_by_name(&self.subject, name).await {
            Ok(Some(location)) => Ok(location),
            Ok(None) => {
                warn!(
                    plugin = %self.plugin,
                    name = %name,
                    "World service returned no location and no error"
                );
                Err(self.tag("location", WorldError::not_found("location")))
            }
            Err(e) => Err(self.tag("location", e)),
        }
    }

    fn mutator(&self, entity_type: &'static str) -> Result<&dyn WorldMutator, QueryError> {
        self.service.as_mutator().ok_or_else(|| {
            self.tag(
                entity_type,
                WorldError::Storage("world service does not support mutations".to_string()),
            )
        })
    }

    fn single<T>(
        &self,
        entity_type: &'static str,
        id: Ulid,
        found: WorldResult<Option<T>>,
    ) -> Result<T, QueryError> {
        match found {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => {
                warn!(
                    plugin = %self.plugin,
                    entity_type = %entity_type,
                    entity_id = %id,
                    "World service returned no entity and no error"
                );
                Err(self.tag(entity_type, WorldError::not_found(entity_type)))
            }
            Err(e) => Err(self.tag(entity_type, e)),
        }
    }

    fn tag(&self, entity_type: &'static str, source: WorldError) -> QueryError {
        QueryError {
            plugin: self.plugin.clone(),
            entity_type,
            source,
        }
    }
}

impl std::fmt::Debug for WorldAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldAdapter")
            .field("plugin", &self.plugin)
            .field("subject", &self.subject)
            .finish()
    }
}
