//! Integration tests for holomush-world.
//!
//! These tests cover:
//! - Reads and writes through the service traits
//! - Subject-based denial
//! - Containment rules for objects

use holomush_world::{
    character_subject, plugin_subject, Character, Containment, Location, LocationType,
    MemoryWorld, Object, Ulid, WorldError, WorldMutator, WorldService,
};
use std::sync::Arc;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

const BUILDER: &str = "system:plugin:builder";

async fn world_with_room() -> (MemoryWorld, Ulid) {
    let world = MemoryWorld::new();
    let room = Location::new("Courtyard", "Open sky.", LocationType::Persistent);
    let room_id = room.id;
    world.insert_location(room).await;
    (world, room_id)
}

// ==============================================================================
// Subjects
// ==============================================================================

#[test]
fn test_subject_formats() {
    assert_eq!(plugin_subject("weather"), "system:plugin:weather");
    let id = Ulid::new();
    assert_eq!(character_subject(id), format!("character:{id}"));
}

// ==============================================================================
// Reads
// ==============================================================================

#[tokio::test]
async fn test_characters_by_location() {
    let (world, room_id) = world_with_room().await;

    let mut here = Character::new(Ulid::new(), "Ada");
    here.location_id = Some(room_id);
    world.insert_character(here.clone()).await;
    world.insert_character(Character::new(Ulid::new(), "Away")).await;

    let found = world
        .get_characters_by_location(BUILDER, room_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, vec![here]);

    let err = world
        .get_characters_by_location(BUILDER, Ulid::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_entities_are_none() {
    let world = MemoryWorld::new();
    assert!(world.get_location(BUILDER, Ulid::new()).await.unwrap().is_none());
    assert!(world.get_character(BUILDER, Ulid::new()).await.unwrap().is_none());
    assert!(world.get_object(BUILDER, Ulid::new()).await.unwrap().is_none());
}

// ==============================================================================
// Writes
// ==============================================================================

#[tokio::test]
async fn test_object_containment_rules() {
    let (world, room_id) = world_with_room().await;

    let mut chest = Object::new("chest", Containment::Location(room_id));
    chest.is_container = true;
    world.create_object(BUILDER, &chest).await.unwrap();

    let coin = Object::new("coin", Containment::Object(chest.id));
    world.create_object(BUILDER, &coin).await.unwrap();

    let pebble = Object::new("pebble", Containment::Object(coin.id));
    let err = world.create_object(BUILDER, &pebble).await.unwrap_err();
    assert_eq!(err, WorldError::not_found("object"));

    let stored = world.get_object(BUILDER, coin.id).await.unwrap().unwrap();
    assert_eq!(stored.contained_in_object_id(), Some(chest.id));
}

#[tokio::test]
async fn test_update_and_find_location() {
    let (world, room_id) = world_with_room().await;

    let mut room = world.get_location(BUILDER, room_id).await.unwrap().unwrap();
    room.name = "Garden".to_string();
    world.update_location(BUILDER, &room).await.unwrap();

    assert!(world.find_location_by_name(BUILDER, "Courtyard").await.unwrap().is_none());
    let found = world.find_location_by_name(BUILDER, "Garden").await.unwrap();
    assert_eq!(found.map(|l| l.id), Some(room_id));

    let ghost = Location::new("Ghost", "", LocationType::Scene);
    let err = world.update_location(BUILDER, &ghost).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_invalid_entities_rejected_before_storage() {
    let world = MemoryWorld::new();
    let nameless = Location::new("  ", "", LocationType::Instance);

    let err = world.create_location(BUILDER, &nameless).await.unwrap_err();
    assert!(matches!(err, WorldError::Validation(_)));
    assert_eq!(world.entity_count().await, 0);
}

// ==============================================================================
// Authorization
// ==============================================================================

#[tokio::test]
async fn test_denied_subject_cannot_write() {
    let (world, room_id) = world_with_room().await;
    let spy = plugin_subject("spy");
    world.deny_subject(spy.clone()).await;

    let object = Object::new("bug", Containment::Location(room_id));
    let err = world.create_object(&spy, &object).await.unwrap_err();
    assert_eq!(err, WorldError::PermissionDenied(spy));
    assert_eq!(world.entity_count().await, 1);
}

#[tokio::test]
async fn test_used_through_trait_objects() {
    let (world, room_id) = world_with_room().await;
    let service: Arc<dyn WorldService> = Arc::new(world);

    let mutator = service.as_mutator().expect("memory world accepts writes");
    let exit_target = Location::new("Gate", "", LocationType::Persistent);
    mutator.create_location(BUILDER, &exit_target).await.unwrap();

    let found = service.get_location(BUILDER, room_id).await.unwrap();
    assert_eq!(found.map(|l| l.name), Some("Courtyard".to_string()));
}
