//! World entities: locations, characters, objects and exits.

use crate::error::{WorldError, WorldResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 4000;

/// Checks a display name: non-blank and at most 100 characters.
pub fn validate_name(name: &str) -> WorldResult<()> {
    if name.trim().is_empty() {
        return Err(WorldError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(WorldError::Validation(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Checks a description: at most 4000 characters, may be empty.
pub fn validate_description(description: &str) -> WorldResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(WorldError::Validation(format!(
            "description exceeds {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// Locations
// ============================================================================

/// The kind of location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Persistent,
    Scene,
    Instance,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Persistent => "persistent",
            LocationType::Scene => "scene",
            LocationType::Instance => "instance",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = WorldError;

    fn from_str(s: &str) -> WorldResult<Self> {
        match s {
            "persistent" => Ok(LocationType::Persistent),
            "scene" => Ok(LocationType::Scene),
            "instance" => Ok(LocationType::Instance),
            other => Err(WorldError::Validation(format!(
                "invalid location type: {other}"
            ))),
        }
    }
}

/// A room in the game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Ulid,
    pub location_type: LocationType,
    pub name: String,
    pub description: String,
    pub owner_id: Option<Ulid>,
    pub created_at: DateTime<Utc>,
}

impl Location {
    /// Create a location with a fresh ID.
    pub fn new(name: impl Into<String>, description: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id: Ulid::new(),
            location_type,
            name: name.into(),
            description: description.into(),
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> WorldResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)
    }
}

// ============================================================================
// Characters
// ============================================================================

/// A player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: Ulid,
    pub player_id: Ulid,
    pub name: String,
    pub description: String,
    /// Current location; `None` when the character is not in the world.
    pub location_id: Option<Ulid>,
    pub created_at: DateTime<Utc>,
}

impl Character {
    pub fn new(player_id: Ulid, name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            player_id,
            name: name.into(),
            description: String::new(),
            location_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> WorldResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)
    }
}

// ============================================================================
// Objects
// ============================================================================

/// Where an object is. An object is always in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Containment {
    Location(Ulid),
    Character(Ulid),
    Object(Ulid),
}

impl Containment {
    /// `"location"`, `"character"` or `"object"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Containment::Location(_) => "location",
            Containment::Character(_) => "character",
            Containment::Object(_) => "object",
        }
    }

    /// ID of the containing location, character or object.
    pub fn id(&self) -> Ulid {
        match self {
            Containment::Location(id) | Containment::Character(id) | Containment::Object(id) => *id,
        }
    }
}

/// An item in the game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub containment: Containment,
    pub is_container: bool,
    pub owner_id: Option<Ulid>,
    pub created_at: DateTime<Utc>,
}

impl Object {
    pub fn new(name: impl Into<String>, containment: Containment) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            description: String::new(),
            containment,
            is_container: false,
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn location_id(&self) -> Option<Ulid> {
        match self.containment {
            Containment::Location(id) => Some(id),
            _ => None,
        }
    }

    pub fn held_by_character_id(&self) -> Option<Ulid> {
        match self.containment {
            Containment::Character(id) => Some(id),
            _ => None,
        }
    }

    pub fn contained_in_object_id(&self) -> Option<Ulid> {
        match self.containment {
            Containment::Object(id) => Some(id),
            _ => None,
        }
    }

    pub fn validate(&self) -> WorldResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        if self.containment == Containment::Object(self.id) {
            return Err(WorldError::Validation(
                "object cannot contain itself".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Exits
// ============================================================================

/// Who can see an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    All,
    Owner,
    List,
}

/// A connection between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub id: Ulid,
    pub from_location_id: Ulid,
    pub to_location_id: Ulid,
    pub name: String,
    pub aliases: Vec<String>,
    pub bidirectional: bool,
    pub return_name: Option<String>,
    pub visibility: Visibility,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl Exit {
    pub fn new(from_location_id: Ulid, to_location_id: Ulid, name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            from_location_id,
            to_location_id,
            name: name.into(),
            aliases: Vec::new(),
            bidirectional: false,
            return_name: None,
            visibility: Visibility::All,
            locked: false,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> WorldResult<()> {
        validate_name(&self.name)?;
        if self.bidirectional {
            match &self.return_name {
                Some(name) => validate_name(name)?,
                None => {
                    return Err(WorldError::Validation(
                        "bidirectional exit requires a return name".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_round_trip_names() {
        for ty in [LocationType::Persistent, LocationType::Scene, LocationType::Instance] {
            assert_eq!(ty.as_str().parse::<LocationType>().unwrap(), ty);
        }
        assert!("dungeon".parse::<LocationType>().is_err());
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("Town Square").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_object_containment_accessors() {
        let room = Ulid::new();
        let object = Object::new("lamp", Containment::Location(room));

        assert_eq!(object.location_id(), Some(room));
        assert_eq!(object.held_by_character_id(), None);
        assert_eq!(object.containment.type_name(), "location");
        assert_eq!(object.containment.id(), room);
    }

    #[test]
    fn test_object_cannot_contain_itself() {
        let mut object = Object::new("box", Containment::Location(Ulid::new()));
        object.containment = Containment::Object(object.id);
        assert!(object.validate().is_err());
    }

    #[test]
    fn test_bidirectional_exit_needs_return_name() {
        let mut exit = Exit::new(Ulid::new(), Ulid::new(), "north");
        exit.bidirectional = true;
        assert!(exit.validate().is_err());

        exit.return_name = Some("south".to_string());
        assert!(exit.validate().is_ok());
    }
}
