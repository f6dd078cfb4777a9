//! World mutations and named properties.

use super::world::parse_id;
use super::{Functions, MUTATIONS_UNSUPPORTED, SEARCH_UNSUPPORTED};
use crate::adapter::WorldAdapter;
use crate::context::run_until;
use crate::error::{GuestError, QueryError};
use crate::guest::{CallFrame, GuestTable, HostResult, HostReturn};
use holomush_world::{Containment, Exit, Location, LocationType, Object, Ulid};
use serde_json::{json, Value};
use tracing::warn;

/// Entity types addressable by `get_property` and `set_property`.
const PROPERTY_ENTITY_TYPES: [&str; 2] = ["location", "object"];

/// Validated arguments of a property call.
struct PropertyArgs<'a> {
    entity_type: &'a str,
    entity_id: Ulid,
    raw_id: &'a str,
    property: &'a str,
    value: Option<&'a str>,
}

/// The reply for a write the world service cannot perform.
///
/// Checked after the arguments, so malformed calls still raise.
fn require_mutation(frame: &CallFrame, adapter: &WorldAdapter) -> Result<(), HostReturn> {
    if adapter.supports_mutation() {
        return Ok(());
    }
    warn!(
        plugin = %frame.plugin,
        function = %frame.function,
        "World service does not support mutations"
    );
    Err(HostReturn::error(MUTATIONS_UNSUPPORTED))
}

impl Functions {
    pub(super) async fn create_location(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let name = frame.check_string(1)?;
        let description = frame.check_string(2)?;
        let raw_type = frame.check_string(3)?;

        let Ok(location_type) = raw_type.parse::<LocationType>() else {
            return Ok(HostReturn::error(format!("invalid location type: {raw_type}")));
        };
        let location = Location::new(name, description, location_type);
        if let Err(e) = location.validate() {
            return Ok(HostReturn::error(format!("invalid location: {e}")));
        }
        if let Err(reply) = require_mutation(frame, &adapter) {
            return Ok(reply);
        }

        match run_until(self.deadline(frame), adapter.create_location(&location)).await {
            Ok(()) => Ok(created(location.id, &location.name)),
            Err(e) => Ok(self.failure(frame, "location", name, &e)),
        }
    }

    /// `create_exit(from_id, to_id, name, opts?)` with
    /// `opts = { bidirectional = bool, return_name = string }`.
    pub(super) async fn create_exit(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let raw_from = frame.check_string(1)?;
        let raw_to = frame.check_string(2)?;
        let name = frame.check_string(3)?;

        let from_id = match parse_id(frame, raw_from, "from_id") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };
        let to_id = match parse_id(frame, raw_to, "to_id") {
            Ok(id) => id,
            Err(invalid) => return Ok(invalid),
        };

        let mut exit = Exit::new(from_id, to_id, name);
        if let Some(opts) = frame.opt_table(4) {
            if let Some(bidirectional) = opts.get("bidirectional").and_then(Value::as_bool) {
                exit.bidirectional = bidirectional;
            }
            if let Some(return_name) = opts.get("return_name").and_then(Value::as_str) {
                exit.return_name = Some(return_name.to_string());
            }
        }
        if let Err(e) = exit.validate() {
            return Ok(HostReturn::error(format!("invalid exit: {e}")));
        }
        if let Err(reply) = require_mutation(frame, &adapter) {
            return Ok(reply);
        }

        match run_until(self.deadline(frame), adapter.create_exit(&exit)).await {
            Ok(()) => Ok(created(exit.id, &exit.name)),
            Err(e) => Ok(self.failure(frame, "exit", name, &e)),
        }
    }

    /// `create_object(name, opts)` where `opts` names exactly one of
    /// `location_id`, `character_id` or `container_id`, plus an optional
    /// `description`.
    pub(super) async fn create_object(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let name = frame.check_string(1)?;
        let Some(opts) = frame.opt_table(2) else {
            return Ok(HostReturn::error("second argument must be an options table"));
        };

        let containment = match containment_from(opts) {
            Ok(containment) => containment,
            Err(message) => return Ok(HostReturn::error(message)),
        };

        let mut object = Object::new(name, containment);
        if let Some(description) = opts.get("description").and_then(Value::as_str) {
            object.description = description.to_string();
        }
        if let Err(e) = object.validate() {
            return Ok(HostReturn::error(format!("invalid object: {e}")));
        }
        if let Err(reply) = require_mutation(frame, &adapter) {
            return Ok(reply);
        }

        match run_until(self.deadline(frame), adapter.create_object(&object)).await {
            Ok(()) => Ok(created(object.id, &object.name)),
            Err(e) => Ok(self.failure(frame, "object", name, &e)),
        }
    }

    pub(super) async fn find_location(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let name = frame.check_string(1)?;
        if !adapter.supports_mutation() {
            warn!(
                plugin = %frame.plugin,
                "find_location called but world service does not support location search"
            );
            return Ok(HostReturn::error(SEARCH_UNSUPPORTED));
        }

        match run_until(self.deadline(frame), adapter.find_location_by_name(name)).await {
            Ok(location) => Ok(created(location.id, &location.name)),
            Err(e) => Ok(self.failure(frame, "location", name, &e)),
        }
    }

    pub(super) async fn get_property(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let args = match self.property_args(frame, false)? {
            Ok(args) => args,
            Err(invalid) => return Ok(invalid),
        };

        let lookup = async {
            match args.entity_type {
                "location" => {
                    let location = adapter.get_location(args.entity_id).await?;
                    Ok::<_, QueryError>(read_field(&location.name, &location.description, args.property))
                }
                _ => {
                    let object = adapter.get_object(args.entity_id).await?;
                    Ok::<_, QueryError>(read_field(&object.name, &object.description, args.property))
                }
            }
        };

        match run_until(self.deadline(frame), lookup).await {
            Ok(value) => Ok(HostReturn::Value(Value::String(value))),
            Err(e) => Ok(self.failure(frame, args.entity_type, args.raw_id, &e)),
        }
    }

    pub(super) async fn set_property(&self, frame: &CallFrame) -> HostResult {
        let adapter = match self.world_adapter(frame) {
            Ok(adapter) => adapter,
            Err(unavailable) => return Ok(unavailable),
        };
        let args = match self.property_args(frame, true)? {
            Ok(args) => args,
            Err(invalid) => return Ok(invalid),
        };
        if let Err(reply) = require_mutation(frame, &adapter) {
            return Ok(reply);
        }
        let value = args.value.unwrap_or_default();

        let update = async {
            match args.entity_type {
                "location" => {
                    let mut location = adapter.get_location(args.entity_id).await?;
                    write_field(&mut location.name, &mut location.description, args.property, value);
                    adapter.update_location(&location).await
                }
                _ => {
                    let mut object = adapter.get_object(args.entity_id).await?;
                    write_field(&mut object.name, &mut object.description, args.property, value);
                    adapter.update_object(&object).await
                }
            }
        };

        match run_until(self.deadline(frame), update).await {
            Ok(()) => Ok(HostReturn::Value(Value::Bool(true))),
            Err(e) => Ok(self.failure(frame, args.entity_type, args.raw_id, &e)),
        }
    }

    /// Check `(entity_type, entity_id, property)`, plus the value at
    /// position 4 when `with_value` is set.
    ///
    /// Wrong argument types raise; an unknown entity type, bad ID or
    /// unregistered property is an ordinary error reply.
    fn property_args<'a>(
        &self,
        frame: &'a CallFrame,
        with_value: bool,
    ) -> Result<Result<PropertyArgs<'a>, HostReturn>, GuestError> {
        let entity_type = frame.check_string(1)?;
        let raw_id = frame.check_string(2)?;
        let property = frame.check_string(3)?;
        let value = if with_value {
            Some(frame.check_string(4)?)
        } else {
            None
        };

        if !PROPERTY_ENTITY_TYPES.contains(&entity_type) {
            return Ok(Err(HostReturn::error(format!(
                "invalid entity type: {entity_type} (must be 'location' or 'object')"
            ))));
        }

        let entity_id = match parse_id(frame, raw_id, "entity_id") {
            Ok(id) => id,
            Err(invalid) => return Ok(Err(invalid)),
        };

        if !self.properties.valid_for(entity_type, property) {
            return Ok(Err(HostReturn::error(format!(
                "invalid property: {property} for {entity_type}"
            ))));
        }

        Ok(Ok(PropertyArgs {
            entity_type,
            entity_id,
            raw_id,
            property,
            value,
        }))
    }
}

/// The `{id, name}` table returned by creates and lookups.
fn created(id: Ulid, name: &str) -> HostReturn {
    HostReturn::Value(json!({ "id": id.to_string(), "name": name }))
}

fn containment_from(opts: &GuestTable) -> Result<Containment, String> {
    let mut found = Vec::with_capacity(1);
    let fields: [(&str, fn(Ulid) -> Containment); 3] = [
        ("location_id", Containment::Location),
        ("character_id", Containment::Character),
        ("container_id", Containment::Object),
    ];

    for (field, wrap) in fields {
        if let Some(raw) = opts.get(field).and_then(Value::as_str) {
            let id = Ulid::from_string(raw).map_err(|e| format!("invalid {field}: {e}"))?;
            found.push(wrap(id));
        }
    }

    match found.as_slice() {
        [containment] => Ok(*containment),
        _ => Err(
            "must specify exactly one containment: location_id, character_id, or container_id"
                .to_string(),
        ),
    }
}

fn read_field(name: &str, description: &str, property: &str) -> String {
    match property {
        "name" => name.to_string(),
        "description" => description.to_string(),
        _ => String::new(),
    }
}

fn write_field(name: &mut String, description: &mut String, property: &str, value: &str) {
    match property {
        "name" => *name = value.to_string(),
        "description" => *description = value.to_string(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn opts(value: Value) -> GuestTable {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_containment_exactly_one() {
        let room = Ulid::new();
        let containment =
            containment_from(&opts(json!({ "location_id": room.to_string() }))).unwrap();
        assert_eq!(containment, Containment::Location(room));

        assert!(containment_from(&opts(json!({}))).is_err());
        assert!(containment_from(&opts(json!({
            "location_id": Ulid::new().to_string(),
            "container_id": Ulid::new().to_string(),
        })))
        .is_err());
    }

    #[test]
    fn test_containment_bad_id() {
        let err = containment_from(&opts(json!({ "character_id": "not-a-ulid" }))).unwrap_err();
        assert!(err.starts_with("invalid character_id: "));
    }

    #[test]
    fn test_fields() {
        let (mut name, mut description) = ("Lobby".to_string(), String::new());
        write_field(&mut name, &mut description, "description", "Quiet.");
        assert_eq!(read_field(&name, &description, "description"), "Quiet.");
        assert_eq!(read_field(&name, &description, "name"), "Lobby");
    }
}
