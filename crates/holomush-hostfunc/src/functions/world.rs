//! World queries.

use super::{Functions, WORLD_UNAVAILABLE};
use crate::adapter::WorldAdapter;
use crate::context::run_until;
use crate::error::HostError;
use crate::guest::{CallFrame, HostResult, HostReturn};
use holomush_world::{Character, Location, Object, Ulid};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

impl Functions {
    /// An adapter scoped to the calling plugin, or the `(nil, message)` to
    /// return when there is no world service.
    pub(super) fn world_adapter(&self, frame: &CallFrame) -> Result<WorldAdapter, HostReturn> {
        let Some(world) = &self.world else {
            error!(
                plugin = %frame.plugin,
                function = %frame.function,
                hint = "use Functions::with_world_service when building the host functions",
                "World service unavailable"
            );
            return Err(HostReturn::error(WORLD_UNAVAILABLE));
        };

        WorldAdapter::new(world.clone(), &frame.plugin)
            .map_err(|e| self.failure(frame, "world", &frame.plugin, &HostError::from(e)))
    }

    pub(super) async fn query_location(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let raw = frame.check_string(1)?;
        let id = match parse_id(frame, raw, "location ID") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };

        match run_until(self.deadline(frame), adapter.get_location(id)).await {
            Ok(location) => Ok(HostReturn::Value(location_table(&location))),
            Err(e) => Ok(self.failure(frame, "location", raw, &e)),
        }
    }

    pub(super) async fn query_character(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let raw = frame.check_string(1)?;
        let id = match parse_id(frame, raw, "character ID") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };

        match run_until(self.deadline(frame), adapter.get_character(id)).await {
            Ok(character) => Ok(HostReturn::Value(character_table(&character))),
            Err(e) => Ok(self.failure(frame, "character", raw, &e)),
        }
    }

    /// Lightweight `{id, name}` entries; `query_character` has the rest.
    pub(super) async fn query_location_characters(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let raw = frame.check_string(1)?;
        let id = match parse_id(frame, raw, "location ID") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };

        match run_until(self.deadline(frame), adapter.get_characters_by_location(id)).await {
            Ok(characters) => Ok(HostReturn::Value(Value::Array(
                characters
                    .iter()
                    .map(|c| json!({ "id": c.id.to_string(), "name": c.name }))
                    .collect(),
            ))),
            Err(e) => Ok(self.failure(frame, "location", raw, &e)),
        }
    }

    pub(super) async fn query_object(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let raw = frame.check_string(1)?;
        let id = match parse_id(frame, raw, "object ID") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };

        match run_until(self.deadline(frame), adapter.get_object(id)).await {
            Ok(object) => Ok(HostReturn::Value(object_table(&object))),
            Err(e) => Ok(self.failure(frame, "object", raw, &e)),
        }
    }
}

/// Parse a ULID argument, or build the `(nil, "invalid <param>: ...")` reply.
pub(super) fn parse_id(frame: &CallFrame, raw: &str, param: &str) -> Result<Ulid, HostReturn> {
    Ulid::from_string(raw).map_err(|e| {
        debug!(
            plugin = %frame.plugin,
            function = %frame.function,
            param = %param,
            value = %raw,
            error = %e,
            "Invalid ID argument"
        );
        HostReturn::error(format!("invalid {param}: {e}"))
    })
}

fn location_table(location: &Location) -> Value {
    json!({
        "id": location.id.to_string(),
        "name": location.name,
        "description": location.description,
        "type": location.location_type.as_str(),
    })
}

fn character_table(character: &Character) -> Value {
    let mut table = Map::new();
    table.insert("id".into(), json!(character.id.to_string()));
    table.insert("player_id".into(), json!(character.player_id.to_string()));
    table.insert("name".into(), json!(character.name));
    table.insert("description".into(), json!(character.description));
    if let Some(location_id) = character.location_id {
        table.insert("location_id".into(), json!(location_id.to_string()));
    }
    Value::Object(table)
}

fn object_table(object: &Object) -> Value {
    let mut table = Map::new();
    table.insert("id".into(), json!(object.id.to_string()));
    table.insert("name".into(), json!(object.name));
    table.insert("description".into(), json!(object.description));
    table.insert("is_container".into(), json!(object.is_container));

    let optional = [
        ("location_id", object.location_id()),
        ("held_by_character_id", object.held_by_character_id()),
        ("contained_in_object_id", object.contained_in_object_id()),
        ("owner_id", object.owner_id),
    ];
    for (key, id) in optional {
        if let Some(id) = id {
            table.insert(key.into(), json!(id.to_string()));
        }
    }

    table.insert(
        "containment_type".into(),
        json!(object.containment.type_name()),
    );
    Value::Object(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use holomush_world::{Containment, LocationType};

    #[test]
    fn test_object_table_optional_fields() {
        let character = Ulid::new();
        let object = Object::new("coin", Containment::Character(character));
        let table = object_table(&object);

        assert_eq!(table["held_by_character_id"], json!(character.to_string()));
        assert_eq!(table["containment_type"], "character");
        assert!(table.get("location_id").is_none());
        assert!(table.get("owner_id").is_none());
        assert_eq!(table["is_container"], false);
    }

    #[test]
    fn test_location_table() {
        let location = Location::new("Lobby", "A quiet room.", LocationType::Scene);
        let table = location_table(&location);
        assert_eq!(table["type"], "scene");
        assert_eq!(table["id"], json!(location.id.to_string()));
    }

    #[test]
    fn test_character_table_without_location() {
        let character = Character::new(Ulid::new(), "Ada");
        let table = character_table(&character);
        assert_eq!(table["name"], "Ada");
        assert!(table.get("location_id").is_none());
    }
}
