//! In-memory world service.
//!
//! Backs tests and single-process setups. Authorization is a simple deny
//! list of subjects; every other subject may read and write.

use crate::error::{WorldError, WorldResult};
use crate::service::{WorldMutator, WorldService};
use crate::types::{Character, Containment, Exit, Location, Object};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

#[derive(Debug, Default)]
struct WorldState {
    locations: HashMap<Ulid, Location>,
    characters: HashMap<Ulid, Character>,
    objects: HashMap<Ulid, Object>,
    exits: HashMap<Ulid, Exit>,
    denied: HashSet<String>,
}

impl WorldState {
    fn authorize(&self, subject: &str) -> WorldResult<()> {
        if self.denied.contains(subject) {
            Err(WorldError::PermissionDenied(subject.to_string()))
        } else {
            Ok(())
        }
    }

    fn check_containment(&self, containment: &Containment) -> WorldResult<()> {
        let exists = match containment {
            Containment::Location(id) => self.locations.contains_key(id),
            Containment::Character(id) => self.characters.contains_key(id),
            Containment::Object(id) => self.objects.get(id).is_some_and(|o| o.is_container),
        };
        if exists {
            Ok(())
        } else {
            Err(WorldError::not_found(containment.type_name()))
        }
    }
}

/// A world held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: RwLock<WorldState>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call from `subject` fail with permission denied.
    pub async fn deny_subject(&self, subject: impl Into<String>) {
        self.state.write().await.denied.insert(subject.into());
    }

    /// Add a location without authorization checks.
    pub async fn insert_location(&self, location: Location) {
        self.state.write().await.locations.insert(location.id, location);
    }

    /// Add a character without authorization checks.
    pub async fn insert_character(&self, character: Character) {
        self.state.write().await.characters.insert(character.id, character);
    }

    /// Add an object without authorization checks.
    pub async fn insert_object(&self, object: Object) {
        self.state.write().await.objects.insert(object.id, object);
    }

    /// Look up an exit by ID without authorization checks.
    pub async fn exit(&self, id: Ulid) -> Option<Exit> {
        self.state.read().await.exits.get(&id).cloned()
    }

    /// Number of stored entities of every kind.
    pub async fn entity_count(&self) -> usize {
        let state = self.state.read().await;
        state.locations.len() + state.characters.len() + state.objects.len() + state.exits.len()
    }
}

#[async_trait]
impl WorldService for MemoryWorld {
    async fn get_location(&self, subject: &str, id: Ulid) -> WorldResult<Option<Location>> {
        let state = self.state.read().await;
        state.authorize(subject)?;
        Ok(state.locations.get(&id).cloned())
    }

    async fn get_character(&self, subject: &str, id: Ulid) -> WorldResult<Option<Character>> {
        let state = self.state.read().await;
        state.authorize(subject)?;
        Ok(state.characters.get(&id).cloned())
    }

    async fn get_characters_by_location(
        &self,
        subject: &str,
        location_id: Ulid,
    ) -> WorldResult<Option<Vec<Character>>> {
        let state = self.state.read().await;
        state.authorize(subject)?;
        if !state.locations.contains_key(&location_id) {
            return Err(WorldError::not_found("location"));
        }

        let mut characters: Vec<Character> = state
            .characters
            .values()
            .filter(|c| c.location_id == Some(location_id))
            .cloned()
            .collect();
        characters.sort_by_key(|c| c.id);
        Ok(Some(characters))
    }

    async fn get_object(&self, subject: &str, id: Ulid) -> WorldResult<Option<Object>> {
        let state = self.state.read().await;
        state.authorize(subject)?;
        Ok(state.objects.get(&id).cloned())
    }

    fn as_mutator(&self) -> Option<&dyn WorldMutator> {
        Some(self)
    }
}

#[async_trait]
impl WorldMutator for MemoryWorld {
    async fn create_location(&self, subject: &str, location: &Location) -> WorldResult<()> {
        location.validate()?;
        let mut state = self.state.write().await;
        state.authorize(subject)?;
        debug!(subject = %subject, location_id = %location.id, "Creating location");
        state.locations.insert(location.id, location.clone());
        Ok(())
    }

    async fn create_exit(&self, subject: &str, exit: &Exit) -> WorldResult<()> {
        exit.validate()?;
        let mut state = self.state.write().await;
        state.authorize(subject)?;
        for id in [exit.from_location_id, exit.to_location_id] {
            if !state.locations.contains_key(&id) {
                return Err(WorldError::not_found("location"));
            }
        }

        if exit.bidirectional {
            if let Some(return_name) = &exit.return_name {
                let mut reverse = Exit::new(exit.to_location_id, exit.from_location_id, return_name.clone());
                reverse.return_name = Some(exit.name.clone());
                reverse.bidirectional = true;
                state.exits.insert(reverse.id, reverse);
            }
        }

        debug!(subject = %subject, exit_id = %exit.id, "Creating exit");
        state.exits.insert(exit.id, exit.clone());
        Ok(())
    }

    async fn create_object(&self, subject: &str, object: &Object) -> WorldResult<()> {
        object.validate()?;
        let mut state = self.state.write().await;
        state.authorize(subject)?;
        state.check_containment(&object.containment)?;
        debug!(subject = %subject, object_id = %object.id, "Creating object");
        state.objects.insert(object.id, object.clone());
        Ok(())
    }

    async fn update_location(&self, subject: &str, location: &Location) -> WorldResult<()> {
        location.validate()?;
        let mut state = self.state.write().await;
        state.authorize(subject)?;
        match state.locations.get_mut(&location.id) {
            Some(existing) => {
                *existing = location.clone();
                Ok(())
            }
            None => Err(WorldError::not_found("location")),
        }
    }

    async fn update_object(&self, subject: &str, object: &Object) -> WorldResult<()> {
        object.validate()?;
        let mut state = self.state.write().await;
        state.authorize(subject)?;
        match state.objects.get_mut(&object.id) {
            Some(existing) => {
                *existing = object.clone();
                Ok(())
            }
            None => Err(WorldError::not_found("object")),
        }
    }

    async fn find_location_by_name(&self, subject: &str, name: &str) -> WorldResult<Option<Location>> {
        let state = self.state.read().await;
        state.authorize(subject)?;
        Ok(state.locations.values().find(|l| l.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::plugin_subject;
    use crate::types::LocationType;

    #[tokio::test]
    async fn test_denied_subject() {
        let world = MemoryWorld::new();
        let location = Location::new("Lobby", "", LocationType::Persistent);
        let id = location.id;
        world.insert_location(location).await;
        world.deny_subject(plugin_subject("spy")).await;

        let err = world.get_location(&plugin_subject("spy"), id).await.unwrap_err();
        assert!(matches!(err, WorldError::PermissionDenied(_)));

        let found = world.get_location(&plugin_subject("ok"), id).await.unwrap();
        assert_eq!(found.map(|l| l.name), Some("Lobby".to_string()));
    }

    #[tokio::test]
    async fn test_bidirectional_exit_creates_return() {
        let world = MemoryWorld::new();
        let a = Location::new("A", "", LocationType::Persistent);
        let b = Location::new("B", "", LocationType::Persistent);
        let (a_id, b_id) = (a.id, b.id);
        world.insert_location(a).await;
        world.insert_location(b).await;

        let mut exit = Exit::new(a_id, b_id, "north");
        exit.bidirectional = true;
        exit.return_name = Some("south".to_string());
        world.create_exit("system:plugin:builder", &exit).await.unwrap();

        assert_eq!(world.entity_count().await, 4);
        assert_eq!(world.exit(exit.id).await.map(|e| e.name), Some("north".to_string()));
    }

    #[tokio::test]
    async fn test_object_needs_existing_container() {
        let world = MemoryWorld::new();
        let object = Object::new("lamp", Containment::Location(Ulid::new()));
        let err = world.create_object("system:plugin:builder", &object).await.unwrap_err();
        assert_eq!(err, WorldError::not_found("location"));
    }
}
