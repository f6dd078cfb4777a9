//! Command listing and help.

use super::{Functions, ACCESS_UNAVAILABLE, COMMANDS_UNAVAILABLE};
use crate::commands::can_execute;
use crate::context::run_until;
use crate::error::{GuestError, HostError};
use crate::guest::{CallFrame, HostResult, HostReturn};
use holomush_world::{character_subject, Ulid};
use serde_json::{json, Value};

impl Functions {
    /// Commands the given character may run, as `{name, help, usage, source}`.
    pub(super) async fn list_commands(&self, frame: &CallFrame) -> HostResult {
        let raw_id = frame.check_string(1)?;
        if raw_id.is_empty() {
            return Err(GuestError::Runtime("character ID cannot be empty".to_string()));
        }
        let Ok(character_id) = Ulid::from_string(raw_id) else {
            return Err(GuestError::Runtime(format!("invalid character ID: {raw_id}")));
        };

        let Some(registry) = &self.commands else {
            return Ok(HostReturn::error(COMMANDS_UNAVAILABLE));
        };
        let Some(engine) = &self.access else {
            return Ok(HostReturn::error(ACCESS_UNAVAILABLE));
        };

        let subject = character_subject(character_id);
        let filter = async {
            let mut visible = Vec::new();
            for command in registry.all() {
                if can_execute(&**engine, &subject, &command).await {
                    visible.push(json!({
                        "name": command.name,
                        "help": command.help,
                        "usage": command.usage,
                        "source": command.source,
                    }));
                }
            }
            Ok::<_, HostError>(visible)
        };

        match run_until(self.deadline(frame), filter).await {
            Ok(visible) => Ok(HostReturn::Value(Value::Array(visible))),
            Err(e) => Ok(self.failure(frame, "command", raw_id, &e)),
        }
    }

    /// Full details of one command.
    pub(super) fn get_command_help(&self, frame: &CallFrame) -> HostResult {
        let name = frame.check_string(1)?;
        if name.is_empty() {
            return Err(GuestError::Runtime("command name cannot be empty".to_string()));
        }

        let Some(registry) = &self.commands else {
            return Ok(HostReturn::error(COMMANDS_UNAVAILABLE));
        };
        let Some(command) = registry.get(name) else {
            return Ok(HostReturn::error(format!("command not found: {name}")));
        };

        Ok(HostReturn::Value(json!({
            "name": command.name,
            "help": command.help,
            "usage": command.usage,
            "help_text": command.help_text,
            "source": command.source,
            "capabilities": command.capabilities,
        })))
    }
}
